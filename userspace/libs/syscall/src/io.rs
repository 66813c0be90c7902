// Console and file store syscalls
//
// Descriptors 1 and 2 write to the console. Descriptors returned by `open`
// start at 3 and address the kernel's in-memory file store.

use crate::error::{check, SyscallResult};
use crate::fcntl::NAME_LEN;
use crate::raw::{numbers::*, syscall1, syscall2, syscall3};

/// Write `buf` to `fd`; returns the number of bytes accepted
#[inline]
pub fn write(fd: usize, buf: &[u8]) -> SyscallResult<usize> {
    check(unsafe { syscall3(SYS_WRITE, fd, buf.as_ptr() as usize, buf.len()) })
}

/// Read up to `buf.len()` bytes from `fd`
#[inline]
pub fn read(fd: usize, buf: &mut [u8]) -> SyscallResult<usize> {
    check(unsafe { syscall3(SYS_READ, fd, buf.as_mut_ptr() as usize, buf.len()) })
}

/// Open `name` with `flags` (see `fcntl`)
///
/// Names longer than `NAME_LEN - 1` bytes are truncated.
pub fn open(name: &str, flags: usize) -> SyscallResult<usize> {
    let mut path = [0u8; NAME_LEN];
    let len = name.len().min(NAME_LEN - 1);
    path[..len].copy_from_slice(&name.as_bytes()[..len]);

    check(unsafe { syscall2(SYS_OPEN, path.as_ptr() as usize, flags) })
}

/// Release a descriptor returned by `open`
#[inline]
pub fn close(fd: usize) -> SyscallResult<()> {
    check(unsafe { syscall1(SYS_CLOSE, fd) }).map(|_| ())
}

/// Write a string to standard output
#[inline]
pub fn print(s: &str) -> SyscallResult<usize> {
    write(crate::fcntl::STDOUT, s.as_bytes())
}
