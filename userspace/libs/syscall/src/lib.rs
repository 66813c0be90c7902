// Cinder Syscall Library
//
// Shared definition of the Cinder system call ABI. The kernel takes its
// syscall numbers from here, and kernel-thread programs use the wrappers
// to enter the kernel through `ecall`.
//
// ABI summary:
// - Syscall number in `a7`, up to three arguments in `a0..a2`
// - Result comes back in `a0`; every failure is reported as `-1`
// - Numbers outside `1..=SYS_MAX` are rejected without side effects
//
// This library is designed to be:
// - Completely standalone (no kernel dependencies)
// - Usable from hosted builds (numbers, flags and error decoding only;
//   the `ecall` wrappers exist on riscv64 alone)

#![cfg_attr(not(test), no_std)]

pub mod error;
pub mod fcntl;
pub mod raw;

#[cfg(target_arch = "riscv64")]
pub mod io;
#[cfg(target_arch = "riscv64")]
pub mod process;

pub use error::{SyscallError, SyscallResult};
#[cfg(target_arch = "riscv64")]
pub use raw::{syscall0, syscall1, syscall2, syscall3};
