// Interrupt Subsystem Orchestration
//
// Top-level coordination of machine-mode traps: the trap frame layout shared
// with the assembly vector, the global tick counter, and bring-up of the
// vector, the CLINT timer and the interrupt enables.
//
// Initialization flow:
// - `init()` installs the direct-mode trap vector in `mtvec`
// - Arms the first CLINT timer deadline
// - Enables the machine timer interrupt (`mie.MTIE`) and then the global
//   machine interrupt bit (`mstatus.MIE`)
//
// Runtime services:
// - `get_ticks()` exposes the global timer tick counter
// - `TrapFrame` gives typed access to the saved registers of a trap
//
// Correctness and safety notes:
// - The vector must be installed before interrupts are enabled
// - Ticks are counted only; they never cause a reschedule
// - The counter is monotonic and is not expected to wrap

pub mod handlers;
pub mod timer;

use core::sync::atomic::{AtomicU64, Ordering};

pub use handlers::{handle_trap, TrapCause, TrapOutcome};

static TICKS: AtomicU64 = AtomicU64::new(0);

pub fn get_ticks() -> u64 {
    TICKS.load(Ordering::Relaxed)
}

pub(crate) fn tick() -> u64 {
    TICKS.fetch_add(1, Ordering::Relaxed) + 1
}

/// Register save area built by the trap vector on the interrupted stack.
///
/// Slot 0 holds `mepc`, slots 1..=31 hold `x1..x31`, then `mstatus` and one
/// word of padding to keep the frame 16-byte aligned.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapFrame {
    pub regs: [usize; 32],
    pub mstatus: usize,
    _pad: usize,
}

impl TrapFrame {
    pub const EPC: usize = 0;
    pub const SP: usize = 2;
    pub const A0: usize = 10;
    pub const A1: usize = 11;
    pub const A2: usize = 12;
    pub const A7: usize = 17;

    pub const fn zeroed() -> Self {
        Self {
            regs: [0; 32],
            mstatus: 0,
            _pad: 0,
        }
    }

    pub fn epc(&self) -> usize {
        self.regs[Self::EPC]
    }

    pub fn set_epc(&mut self, epc: usize) {
        self.regs[Self::EPC] = epc;
    }

    /// Syscall argument `n` (`a0 + n`).
    pub fn arg(&self, n: usize) -> usize {
        self.regs[Self::A0 + n]
    }

    pub fn syscall_number(&self) -> usize {
        self.regs[Self::A7]
    }

    pub fn set_return(&mut self, value: isize) {
        self.regs[Self::A0] = value as usize;
    }
}

#[cfg(all(target_arch = "riscv64", not(test)))]
pub fn init() {
    use crate::{arch, log_info};

    const LOG_ORIGIN: &str = "trap";

    arch::install_trap_vector();
    let deadline = timer::arm_next(&mut timer::Clint::new(arch::hart_id()));
    arch::enable_timer_interrupt();
    arch::enable_interrupts();

    log_info!(
        LOG_ORIGIN,
        "machine traps enabled: first timer deadline at mtime={}",
        deadline
    );
}
