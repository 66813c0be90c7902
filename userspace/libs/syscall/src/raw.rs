// Raw syscall invocation primitives
//
// These functions place the number and arguments in the ABI registers and
// execute `ecall`. They are unsafe because:
// - The caller must ensure pointer arguments reference memory the kernel
//   is allowed to touch
// - `exit` never returns, and the caller must not rely on the result

/// Syscall numbers (the kernel dispatcher matches on these directly)
pub mod numbers {
    pub const SYS_GETPID: usize = 1;
    pub const SYS_EXIT: usize = 2;
    pub const SYS_WAIT: usize = 3;
    pub const SYS_KILL: usize = 4;
    pub const SYS_WRITE: usize = 5;
    pub const SYS_FORK: usize = 6;
    pub const SYS_OPEN: usize = 7;
    pub const SYS_CLOSE: usize = 8;
    pub const SYS_READ: usize = 9;

    /// Highest valid syscall number.
    pub const SYS_MAX: usize = SYS_READ;

    pub const fn name(num: usize) -> &'static str {
        match num {
            SYS_GETPID => "getpid",
            SYS_EXIT => "exit",
            SYS_WAIT => "wait",
            SYS_KILL => "kill",
            SYS_WRITE => "write",
            SYS_FORK => "fork",
            SYS_OPEN => "open",
            SYS_CLOSE => "close",
            SYS_READ => "read",
            _ => "unknown",
        }
    }
}

/// Raw syscall with no arguments
#[cfg(target_arch = "riscv64")]
#[inline(always)]
pub unsafe fn syscall0(num: usize) -> isize {
    let result: isize;
    core::arch::asm!(
        "ecall",
        lateout("a0") result,
        in("a7") num,
        options(nostack)
    );
    result
}

/// Raw syscall with 1 argument
#[cfg(target_arch = "riscv64")]
#[inline(always)]
pub unsafe fn syscall1(num: usize, arg0: usize) -> isize {
    let result: isize;
    core::arch::asm!(
        "ecall",
        inlateout("a0") arg0 => result,
        in("a7") num,
        options(nostack)
    );
    result
}

/// Raw syscall with 2 arguments
#[cfg(target_arch = "riscv64")]
#[inline(always)]
pub unsafe fn syscall2(num: usize, arg0: usize, arg1: usize) -> isize {
    let result: isize;
    core::arch::asm!(
        "ecall",
        inlateout("a0") arg0 => result,
        in("a1") arg1,
        in("a7") num,
        options(nostack)
    );
    result
}

/// Raw syscall with 3 arguments
#[cfg(target_arch = "riscv64")]
#[inline(always)]
pub unsafe fn syscall3(num: usize, arg0: usize, arg1: usize, arg2: usize) -> isize {
    let result: isize;
    core::arch::asm!(
        "ecall",
        inlateout("a0") arg0 => result,
        in("a1") arg1,
        in("a2") arg2,
        in("a7") num,
        options(nostack)
    );
    result
}
