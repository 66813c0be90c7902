// Cinder kernel library
//
// Every subsystem of the kernel lives in this crate so it can be unit tested
// on the host; `main.rs` only provides the boot entry, `kmain` and the panic
// handler for the bare-metal image.
//
// Subsystem map:
// - `log`, `console`: leveled diagnostics over the NS16550 UART
// - `mm`: physical page free list and the Sv39 kernel page table
// - `proc`, `sched`: process table and the cooperative scheduler
// - `interrupts`: trap frame, CLINT timer and trap routing
// - `syscall`: dispatcher, user buffer validation and kernel services
// - `fs`: in-memory file store behind the file syscalls
// - `arch`: the only RISC-V specific code (CSRs, trap vector, switch)
//
// Host builds (`cargo test`) replace `arch` with inert stand-ins and the
// UART with stdout; everything else compiles unchanged.

#![cfg_attr(not(test), no_std)]

pub mod log;
pub mod console;

pub mod arch;
pub mod build_info;
pub mod config;
pub mod fs;
pub mod interrupts;
pub mod mm;
pub mod proc;
pub mod sched;
pub mod syscall;
pub mod util;

#[cfg(all(target_arch = "riscv64", not(test)))]
pub mod init_process;

#[cfg(test)]
mod testing;
