// Architecture Abstraction Layer
//
// The only place the kernel touches RISC-V specific state: CSRs, `wfi`,
// `sfence.vma`, the trap vector and the context switch. Everything above
// this module is architecture-neutral and runs unchanged in host tests.
//
// Key responsibilities:
// - Machine interrupt enable state (`mstatus.MIE`) and timer enable
// - Halting and idling the hart
// - Installing the machine trap vector
// - Activating a page table (`satp` + TLB flush)
// - `switch_context`: save callee-saved registers, resume another context
//
// Design principles:
// - Bare-metal riscv64 builds use `riscv64.rs` (the `riscv` crate plus
//   `global_asm!` stubs)
// - Every other build, including `cargo test`, uses `hosted.rs`, which
//   keeps the same API with inert implementations
//
// Correctness and safety notes:
// - `switch_context` is the single control transfer between a process and
//   the scheduler; callers must not hold any lock across it

#[cfg(all(target_arch = "riscv64", not(test)))]
mod riscv64;
#[cfg(all(target_arch = "riscv64", not(test)))]
pub use riscv64::*;

#[cfg(not(all(target_arch = "riscv64", not(test))))]
mod hosted;
#[cfg(not(all(target_arch = "riscv64", not(test))))]
pub use hosted::*;

/// Park the hart permanently.
pub fn halt_forever() -> ! {
    disable_interrupts();
    loop {
        halt();
    }
}
