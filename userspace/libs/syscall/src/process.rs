// Process management syscalls

use crate::error::{check, SyscallResult};
use crate::raw::{numbers::*, syscall0, syscall1};

/// Identifier of the calling process
#[inline]
pub fn getpid() -> SyscallResult<usize> {
    check(unsafe { syscall0(SYS_GETPID) })
}

/// Terminate the calling process with `status`
///
/// This function never returns. The slot stays a zombie until the parent
/// collects the status with `wait`.
#[inline]
pub fn exit(status: i32) -> ! {
    unsafe {
        syscall1(SYS_EXIT, status as isize as usize);
    }
    // Safety: syscall should not return, but if it does, loop forever
    loop {
        core::hint::spin_loop();
    }
}

/// Block until a child exits; returns `(pid, status)`
///
/// Blocks forever when the caller has no child that will ever exit.
#[inline]
pub fn wait() -> SyscallResult<(usize, i32)> {
    let mut status: i32 = 0;
    let pid = check(unsafe { syscall1(SYS_WAIT, &mut status as *mut i32 as usize) })?;
    Ok((pid, status))
}

/// Mark `pid` as killed; a sleeping target is woken
#[inline]
pub fn kill(pid: usize) -> SyscallResult<()> {
    check(unsafe { syscall1(SYS_KILL, pid) }).map(|_| ())
}

/// Register-clone fork
///
/// Returns the child id in the parent and `0` in the child. Only register
/// state is duplicated; the child runs on a fresh, empty stack from the
/// parent's entry function.
#[inline]
pub fn fork() -> SyscallResult<usize> {
    check(unsafe { syscall0(SYS_FORK) })
}
