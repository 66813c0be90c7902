// CLINT machine timer
//
// `mtime` counts at 10 MHz on QEMU virt; writing `mtimecmp` for a hart
// schedules its next machine timer interrupt. The `Timer` trait lets the
// trap handler be exercised without the MMIO block.

use crate::config::TICK_INTERVAL;
#[cfg(all(target_arch = "riscv64", not(test)))]
use crate::config::{clint_mtimecmp, CLINT_MTIME};

pub trait Timer {
    /// Current `mtime` value.
    fn now(&self) -> u64;

    /// Program the comparator; the interrupt fires once `mtime >= deadline`.
    fn set_deadline(&mut self, deadline: u64);
}

/// CLINT registers of one hart.
#[cfg(all(target_arch = "riscv64", not(test)))]
pub struct Clint {
    hart: usize,
}

#[cfg(all(target_arch = "riscv64", not(test)))]
impl Clint {
    pub const fn new(hart: usize) -> Self {
        Self { hart }
    }
}

#[cfg(all(target_arch = "riscv64", not(test)))]
impl Timer for Clint {
    fn now(&self) -> u64 {
        unsafe { core::ptr::read_volatile(CLINT_MTIME as *const u64) }
    }

    fn set_deadline(&mut self, deadline: u64) {
        unsafe { core::ptr::write_volatile(clint_mtimecmp(self.hart) as *mut u64, deadline) };
    }
}

/// Schedule the next tick `TICK_INTERVAL` cycles from now.
pub fn arm_next<T: Timer>(timer: &mut T) -> u64 {
    let deadline = timer.now() + TICK_INTERVAL;
    timer.set_deadline(deadline);
    deadline
}

#[cfg(test)]
pub(crate) mod mock {
    use super::Timer;

    #[derive(Debug, Default)]
    pub struct MockTimer {
        pub now: u64,
        pub deadline: Option<u64>,
    }

    impl Timer for MockTimer {
        fn now(&self) -> u64 {
            self.now
        }

        fn set_deadline(&mut self, deadline: u64) {
            self.deadline = Some(deadline);
        }
    }
}
