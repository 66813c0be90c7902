// RISC-V (RV64, machine mode) primitives
//
// Context layout shared with `proc::Context`:
//   0: ra   8: sp   16..104: s0..s11
//
// Trap frame layout shared with `interrupts::TrapFrame` (34 words):
//   slot 0: mepc   slots 1..=31: x1..x31   slot 32: mstatus   slot 33: pad

use core::arch::global_asm;

use riscv::register::mtvec::{self, TrapMode};
use riscv::register::{mcause, mepc, mhartid, mie, mstatus, mtval, satp};

use crate::proc::Context;

global_asm!(
    r#"
    .section .text
    .globl cinder_switch
    .align 2
cinder_switch:
    sd ra, 0(a0)
    sd sp, 8(a0)
    sd s0, 16(a0)
    sd s1, 24(a0)
    sd s2, 32(a0)
    sd s3, 40(a0)
    sd s4, 48(a0)
    sd s5, 56(a0)
    sd s6, 64(a0)
    sd s7, 72(a0)
    sd s8, 80(a0)
    sd s9, 88(a0)
    sd s10, 96(a0)
    sd s11, 104(a0)

    ld ra, 0(a1)
    ld sp, 8(a1)
    ld s0, 16(a1)
    ld s1, 24(a1)
    ld s2, 32(a1)
    ld s3, 40(a1)
    ld s4, 48(a1)
    ld s5, 56(a1)
    ld s6, 64(a1)
    ld s7, 72(a1)
    ld s8, 80(a1)
    ld s9, 88(a1)
    ld s10, 96(a1)
    ld s11, 104(a1)
    ret
"#
);

global_asm!(
    r#"
    .section .text
    .globl cinder_trap_vector
    .align 4
cinder_trap_vector:
    addi sp, sp, -272

    sd x1, 8(sp)
    sd x3, 24(sp)
    sd x4, 32(sp)
    sd x5, 40(sp)
    sd x6, 48(sp)
    sd x7, 56(sp)
    sd x8, 64(sp)
    sd x9, 72(sp)
    sd x10, 80(sp)
    sd x11, 88(sp)
    sd x12, 96(sp)
    sd x13, 104(sp)
    sd x14, 112(sp)
    sd x15, 120(sp)
    sd x16, 128(sp)
    sd x17, 136(sp)
    sd x18, 144(sp)
    sd x19, 152(sp)
    sd x20, 160(sp)
    sd x21, 168(sp)
    sd x22, 176(sp)
    sd x23, 184(sp)
    sd x24, 192(sp)
    sd x25, 200(sp)
    sd x26, 208(sp)
    sd x27, 216(sp)
    sd x28, 224(sp)
    sd x29, 232(sp)
    sd x30, 240(sp)
    sd x31, 248(sp)

    addi t0, sp, 272
    sd t0, 16(sp)
    csrr t0, mepc
    sd t0, 0(sp)
    csrr t0, mstatus
    sd t0, 256(sp)

    mv a0, sp
    call cinder_trap_handler

    ld t0, 0(sp)
    csrw mepc, t0
    ld t0, 256(sp)
    csrw mstatus, t0

    ld x1, 8(sp)
    ld x3, 24(sp)
    ld x4, 32(sp)
    ld x5, 40(sp)
    ld x6, 48(sp)
    ld x7, 56(sp)
    ld x8, 64(sp)
    ld x9, 72(sp)
    ld x10, 80(sp)
    ld x11, 88(sp)
    ld x12, 96(sp)
    ld x13, 104(sp)
    ld x14, 112(sp)
    ld x15, 120(sp)
    ld x16, 128(sp)
    ld x17, 136(sp)
    ld x18, 144(sp)
    ld x19, 152(sp)
    ld x20, 160(sp)
    ld x21, 168(sp)
    ld x22, 176(sp)
    ld x23, 184(sp)
    ld x24, 192(sp)
    ld x25, 200(sp)
    ld x26, 208(sp)
    ld x27, 216(sp)
    ld x28, 224(sp)
    ld x29, 232(sp)
    ld x30, 240(sp)
    ld x31, 248(sp)

    addi sp, sp, 272
    mret
"#
);

extern "C" {
    fn cinder_switch(from: *mut Context, to: *const Context);
    fn cinder_trap_vector();
}

/// Save the callee-saved registers into `from` and resume `to`.
///
/// # Safety
/// Both pointers must reference live contexts; `to` must have been produced
/// by a previous switch or by process allocation.
#[inline(always)]
pub unsafe fn switch_context(from: *mut Context, to: *const Context) {
    cinder_switch(from, to);
}

#[inline(always)]
pub fn halt() {
    unsafe { riscv::asm::wfi() };
}

/// Idle until the next interrupt with machine interrupts enabled.
pub fn wait_for_interrupt() {
    let was_enabled = interrupts_enabled();
    unsafe {
        mstatus::set_mie();
        riscv::asm::wfi();
        if !was_enabled {
            mstatus::clear_mie();
        }
    }
}

#[inline(always)]
pub fn interrupts_enabled() -> bool {
    mstatus::read().mie()
}

#[inline(always)]
pub fn enable_interrupts() {
    unsafe { mstatus::set_mie() };
}

#[inline(always)]
pub fn disable_interrupts() {
    unsafe { mstatus::clear_mie() };
}

pub fn enable_timer_interrupt() {
    unsafe { mie::set_mtimer() };
}

pub fn install_trap_vector() {
    unsafe { mtvec::write(cinder_trap_vector as usize, TrapMode::Direct) };
}

/// Load `root_ppn` into `satp` in Sv39 mode and flush the TLB.
pub fn activate_page_table(root_ppn: usize) {
    unsafe {
        satp::set(satp::Mode::Sv39, 0, root_ppn);
        riscv::asm::sfence_vma_all();
    }
}

#[inline(always)]
pub fn hart_id() -> usize {
    mhartid::read()
}

/// `(mcause, mepc, mtval)` of the trap being handled.
#[inline(always)]
pub fn trap_state() -> (usize, usize, usize) {
    (mcause::read().bits(), mepc::read(), mtval::read())
}
