// Kernel Configuration
//
// Compile-time configuration for the Cinder kernel on the QEMU `virt`
// machine. Everything the boot path, the memory managers and the trap
// layer need to agree on lives here, so a board port touches one file.
//
// Key contents:
// - Physical memory layout (RAM base and top, MMIO windows)
// - CLINT timer registers and the timer tick interval
// - Process table and file store capacities
// - The address window accepted for syscall buffer arguments
// - `MemoryLayout`, the runtime description handed to `pmm::init` and
//   `vm::kvminit` (derived from linker symbols on hardware, synthesized
//   over heap arenas in host tests)
//
// Correctness notes:
// - `KERNBASE` must match the load address in `linker.ld`
// - `PHYSTOP` must not exceed the RAM given to QEMU (`-m 128M`)

use crate::log::LogLevel;

pub const PAGE_SIZE: usize = 4096;

/// Start of RAM and load address of the kernel image.
pub const KERNBASE: usize = 0x8000_0000;
/// End of the RAM the kernel manages.
pub const PHYSTOP: usize = KERNBASE + 128 * 1024 * 1024;

/// NS16550 UART registers.
pub const UART0: usize = 0x1000_0000;

pub const CLINT_BASE: usize = 0x0200_0000;
pub const CLINT_MTIME: usize = CLINT_BASE + 0xBFF8;

#[inline]
pub const fn clint_mtimecmp(hart: usize) -> usize {
    CLINT_BASE + 0x4000 + 8 * hart
}

/// `mtime` cycles between timer interrupts (0.1 s at 10 MHz).
pub const TICK_INTERVAL: u64 = 1_000_000;
/// `mtime` frequency on QEMU `virt`.
pub const TIMEBASE_HZ: u64 = 10_000_000;

/// One past the highest virtual address Sv39 can translate.
pub const MAXVA: usize = 1 << 39;

/// Process table capacity.
pub const NPROC: usize = 16;

/// Capacity of the file store and its descriptor table.
pub const NFILE: usize = 16;
pub const NOFILE: usize = 16;
/// First descriptor the file store hands out; 0..=2 belong to the console.
pub const FIRST_FILE_FD: usize = 3;

/// Bounce buffer used when moving syscall data in or out.
pub const STAGING_BUF_LEN: usize = 256;

#[cfg(feature = "verbose")]
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Debug;
#[cfg(not(feature = "verbose"))]
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

/// Physical ranges the memory managers operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLayout {
    /// Start of kernel text (identity mapped RX).
    pub kernel_base: usize,
    /// End of kernel text; everything above it up to `phys_top` is RW.
    pub text_end: usize,
    /// End of the kernel image; the page allocator starts here.
    pub kernel_end: usize,
    pub phys_top: usize,
    /// Device page mapped RW.
    pub uart_base: usize,
}

impl MemoryLayout {
    /// Layout of the running image, taken from `linker.ld`.
    #[cfg(all(target_arch = "riscv64", not(test)))]
    pub fn from_linker() -> Self {
        extern "C" {
            static __text_end: u8;
            static __kernel_end: u8;
        }

        // Only the addresses of the linker symbols are used.
        let text_end = unsafe { core::ptr::addr_of!(__text_end) as usize };
        let kernel_end = unsafe { core::ptr::addr_of!(__kernel_end) as usize };

        Self {
            kernel_base: KERNBASE,
            text_end,
            kernel_end,
            phys_top: PHYSTOP,
            uart_base: UART0,
        }
    }
}

/// Address range syscall buffers must fall into.
///
/// There is no user address translation: a pointer is accepted only when the
/// whole range it names sits inside this window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressWindow {
    pub start: usize,
    pub end: usize,
}

impl AddressWindow {
    /// `[KERNBASE, MAXVA)`: anything below the kernel base is rejected.
    pub const KERNEL: AddressWindow = AddressWindow {
        start: KERNBASE,
        end: MAXVA,
    };

    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains_range(&self, addr: usize, len: usize) -> bool {
        match addr.checked_add(len) {
            Some(last) => addr >= self.start && last <= self.end,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_window_rejects_low_and_out_of_range_addresses() {
        let w = AddressWindow::KERNEL;
        assert!(!w.contains_range(0x1000, 16));
        assert!(!w.contains_range(KERNBASE - 1, 2));
        assert!(w.contains_range(KERNBASE, PAGE_SIZE));
        assert!(!w.contains_range(MAXVA - 4, 8));
        assert!(!w.contains_range(usize::MAX - 2, 8));
    }

    #[test]
    fn mtimecmp_is_per_hart() {
        assert_eq!(clint_mtimecmp(0), 0x0200_4000);
        assert_eq!(clint_mtimecmp(1), 0x0200_4008);
    }
}
