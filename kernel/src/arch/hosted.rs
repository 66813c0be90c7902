// Hosted stand-ins for the machine primitives
//
// Used by `cargo test` and by non-riscv64 builds. Interrupt state is a plain
// flag and the hart "halts" by spinning. There is no context switch on the
// host; scheduler tests drive the process table directly.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::proc::Context;

static INTERRUPTS_ENABLED: AtomicBool = AtomicBool::new(false);

/// # Safety
/// Never valid on a hosted build.
pub unsafe fn switch_context(_from: *mut Context, _to: *const Context) {
    panic!("context switching requires a riscv64 hart");
}

#[inline(always)]
pub fn halt() {
    core::hint::spin_loop();
}

pub fn wait_for_interrupt() {
    core::hint::spin_loop();
}

pub fn interrupts_enabled() -> bool {
    INTERRUPTS_ENABLED.load(Ordering::Relaxed)
}

pub fn enable_interrupts() {
    INTERRUPTS_ENABLED.store(true, Ordering::Relaxed);
}

pub fn disable_interrupts() {
    INTERRUPTS_ENABLED.store(false, Ordering::Relaxed);
}

pub fn enable_timer_interrupt() {}

pub fn install_trap_vector() {}

pub fn activate_page_table(_root_ppn: usize) {}

pub fn hart_id() -> usize {
    0
}

pub fn trap_state() -> (usize, usize, usize) {
    (0, 0, 0)
}
