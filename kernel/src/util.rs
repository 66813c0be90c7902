// Kernel Utilities
//
// Provides common utility functions and primitives used across the kernel.
//
// Key features:
// - Interrupt-safe critical sections
// - Page alignment helpers

use crate::arch;
use crate::config::PAGE_SIZE;

/// Run `f` with machine interrupts disabled, restoring the previous state.
#[inline(always)]
pub fn without_interrupts<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let was_enabled = arch::interrupts_enabled();
    arch::disable_interrupts();

    let result = f();

    if was_enabled {
        arch::enable_interrupts();
    }

    result
}

#[inline]
pub const fn page_round_up(addr: usize) -> usize {
    (addr + PAGE_SIZE - 1) & !(PAGE_SIZE - 1)
}

#[inline]
pub const fn page_round_down(addr: usize) -> usize {
    addr & !(PAGE_SIZE - 1)
}

#[inline]
pub const fn is_page_aligned(addr: usize) -> bool {
    addr & (PAGE_SIZE - 1) == 0
}
