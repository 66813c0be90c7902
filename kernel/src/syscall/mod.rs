// kernel/src/syscall/mod.rs
//
// System Call Subsystem
//
// Decodes `ecall` requests from the trap frame, routes them to the process
// manager, the console or the file store, and writes the result back into
// the frame's `a0` slot.
//
// Dispatch model:
// - Number in `a7`, arguments in `a0..a2`, numbers shared with user code
//   through `cinder_syscall::raw::numbers`
// - Numbers outside `1..=SYS_MAX` return -1 without touching any handler
// - A single `match` provides explicit, auditable routing
// - Every failure is reported as -1
//
// Buffer handling:
// - Pointer arguments are validated against the services' address window
//   (`[KERNBASE, 2^39)` on hardware) and moved through a 256-byte staging
//   buffer in chunks
// - A transfer that fails after some bytes moved returns the partial count
//
// Process semantics:
// - `exit` does not return to the dispatcher on hardware
// - `fork` first consumes a pending fork-return override on the calling
//   process: a register-cloned child that reaches its `fork` call again sees
//   0 exactly once instead of forking a second time
//
// Design principles:
// - The dispatcher is generic over `Services`, so it is tested against a
//   mock; `KernelServices` binds it to the global kernel state

pub mod services;
pub mod usercopy;

pub use cinder_syscall::raw::numbers::*;
pub use services::KernelServices;

use crate::config::{AddressWindow, STAGING_BUF_LEN};
use crate::fs::FsError;
use crate::interrupts::TrapFrame;
use crate::proc::{Pid, ProcError};
use crate::{log_debug, log_warn};
use cinder_syscall::fcntl::{NAME_LEN, STDERR, STDIN, STDOUT};
use usercopy::{copy_in, copy_in_str, copy_out};

const LOG_ORIGIN: &str = "syscall";

/// Failure value placed in `a0`.
pub const SYSCALL_FAILED: isize = -1;

/// Kernel operations the dispatcher relies on.
pub trait Services {
    fn current_pid(&self) -> Option<Pid>;

    /// Terminate the caller. Never returns on hardware.
    fn exit(&mut self, status: i32);

    fn wait(&mut self) -> Result<(Pid, i32), ProcError>;
    fn kill(&mut self, pid: Pid) -> Result<(), ProcError>;
    fn fork(&mut self) -> Result<Pid, ProcError>;
    fn take_fork_return(&mut self) -> Option<isize>;

    fn console_write(&mut self, bytes: &[u8]);

    fn open(&mut self, name: &[u8], flags: usize) -> Result<usize, FsError>;
    fn close(&mut self, fd: usize) -> Result<(), FsError>;
    fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize, FsError>;
    fn write(&mut self, fd: usize, buf: &[u8]) -> Result<usize, FsError>;

    /// Range syscall pointers must fall into.
    fn user_window(&self) -> AddressWindow {
        AddressWindow::KERNEL
    }
}

/// Handle the `ecall` described by `frame`.
pub fn dispatch<S: Services>(frame: &mut TrapFrame, sys: &mut S) {
    let num = frame.syscall_number();
    let (arg0, arg1, arg2) = (frame.arg(0), frame.arg(1), frame.arg(2));

    log_debug!(
        LOG_ORIGIN,
        "{}({:#x}, {:#x}, {:#x}) from pid {:?}",
        name(num),
        arg0,
        arg1,
        arg2,
        sys.current_pid()
    );

    if num == 0 || num > SYS_MAX {
        log_warn!(LOG_ORIGIN, "Unknown syscall number: {}", num);
        frame.set_return(SYSCALL_FAILED);
        return;
    }

    let ret = match num {
        SYS_GETPID => sys_getpid(sys),
        SYS_EXIT => {
            sys.exit(arg0 as i32);
            return;
        }
        SYS_WAIT => sys_wait(sys, arg0),
        SYS_KILL => sys_kill(sys, arg0 as isize),
        SYS_WRITE => sys_write(sys, arg0 as isize, arg1, arg2 as isize),
        SYS_FORK => sys_fork(sys),
        SYS_OPEN => sys_open(sys, arg0, arg1),
        SYS_CLOSE => sys_close(sys, arg0 as isize),
        SYS_READ => sys_read(sys, arg0 as isize, arg1, arg2 as isize),
        _ => SYSCALL_FAILED,
    };

    frame.set_return(ret);
}

fn sys_getpid<S: Services>(sys: &mut S) -> isize {
    sys.current_pid()
        .map(|pid| pid.as_u32() as isize)
        .unwrap_or(SYSCALL_FAILED)
}

fn sys_wait<S: Services>(sys: &mut S, status_ptr: usize) -> isize {
    let window = sys.user_window();
    let status_len = core::mem::size_of::<i32>();

    if status_ptr != 0 && !window.contains_range(status_ptr, status_len) {
        return SYSCALL_FAILED;
    }

    match sys.wait() {
        Ok((pid, status)) => {
            if status_ptr != 0 && copy_out(&window, status_ptr, &status.to_ne_bytes()).is_err() {
                return SYSCALL_FAILED;
            }
            pid.as_u32() as isize
        }
        Err(_) => SYSCALL_FAILED,
    }
}

fn sys_kill<S: Services>(sys: &mut S, pid: isize) -> isize {
    let raw = match u32::try_from(pid) {
        Ok(raw) if raw > 0 => raw,
        _ => return SYSCALL_FAILED,
    };

    match sys.kill(Pid::new(raw)) {
        Ok(()) => 0,
        Err(_) => SYSCALL_FAILED,
    }
}

fn sys_fork<S: Services>(sys: &mut S) -> isize {
    if let Some(value) = sys.take_fork_return() {
        return value;
    }

    match sys.fork() {
        Ok(child) => child.as_u32() as isize,
        Err(err) => {
            log_warn!(LOG_ORIGIN, "fork failed: {:?}", err);
            SYSCALL_FAILED
        }
    }
}

fn sys_write<S: Services>(sys: &mut S, fd: isize, buf: usize, len: isize) -> isize {
    if len <= 0 {
        return 0;
    }
    if buf == 0 || fd < 0 {
        return SYSCALL_FAILED;
    }

    let fd = fd as usize;
    let len = len as usize;
    let window = sys.user_window();
    let mut staging = [0u8; STAGING_BUF_LEN];
    let mut done = 0usize;

    while done < len {
        let n = STAGING_BUF_LEN.min(len - done);
        let chunk = &mut staging[..n];

        let Some(src) = buf.checked_add(done) else {
            return partial_or_failed(done);
        };
        if copy_in(&window, chunk, src).is_err() {
            return partial_or_failed(done);
        }

        let wrote = if fd == STDOUT || fd == STDERR {
            sys.console_write(chunk);
            n
        } else {
            match sys.write(fd, chunk) {
                Ok(wrote) => wrote,
                Err(_) => return partial_or_failed(done),
            }
        };

        done += wrote;
        if wrote < n {
            break;
        }
    }

    done as isize
}

fn sys_read<S: Services>(sys: &mut S, fd: isize, buf: usize, len: isize) -> isize {
    if fd < 0 || buf == 0 || len < 0 {
        return SYSCALL_FAILED;
    }
    let fd = fd as usize;
    if fd == STDIN || fd == STDOUT || fd == STDERR {
        return SYSCALL_FAILED;
    }

    let len = len as usize;
    let window = sys.user_window();
    let mut staging = [0u8; STAGING_BUF_LEN];
    let mut done = 0usize;

    while done < len {
        let n = STAGING_BUF_LEN.min(len - done);

        let got = match sys.read(fd, &mut staging[..n]) {
            Ok(got) => got,
            Err(_) => return partial_or_failed(done),
        };
        if got == 0 {
            break;
        }

        let Some(dst) = buf.checked_add(done) else {
            return partial_or_failed(done);
        };
        if copy_out(&window, dst, &staging[..got]).is_err() {
            return partial_or_failed(done);
        }

        done += got;
        if got < n {
            break;
        }
    }

    done as isize
}

fn sys_open<S: Services>(sys: &mut S, path: usize, flags: usize) -> isize {
    if path == 0 {
        return SYSCALL_FAILED;
    }

    let mut name = [0u8; NAME_LEN];
    let Ok(len) = copy_in_str(&sys.user_window(), path, &mut name) else {
        return SYSCALL_FAILED;
    };

    match sys.open(&name[..len], flags) {
        Ok(fd) => fd as isize,
        Err(err) => {
            log_debug!(LOG_ORIGIN, "open failed: {:?}", err);
            SYSCALL_FAILED
        }
    }
}

fn sys_close<S: Services>(sys: &mut S, fd: isize) -> isize {
    if fd < 0 {
        return SYSCALL_FAILED;
    }
    match sys.close(fd as usize) {
        Ok(()) => 0,
        Err(_) => SYSCALL_FAILED,
    }
}

fn partial_or_failed(done: usize) -> isize {
    if done > 0 {
        done as isize
    } else {
        SYSCALL_FAILED
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;
    use crate::fs::MemFs;
    use crate::testing::Arena;
    use cinder_syscall::fcntl::O_CREATE;

    struct MockKernel {
        pid: Option<Pid>,
        window: AddressWindow,
        console: Vec<u8>,
        exited: Option<i32>,
        zombie: Option<(Pid, i32)>,
        killed: Vec<Pid>,
        next_child: u32,
        fork_ret: Option<isize>,
        forks: usize,
        fs: MemFs,
        arena: Arena,
    }

    impl MockKernel {
        fn new() -> Self {
            Self {
                pid: Some(Pid::new(1)),
                window: AddressWindow::new(1, usize::MAX),
                console: Vec::new(),
                exited: None,
                zombie: None,
                killed: Vec::new(),
                next_child: 2,
                fork_ret: None,
                forks: 0,
                fs: MemFs::new(),
                arena: Arena::new(4),
            }
        }
    }

    impl Services for MockKernel {
        fn current_pid(&self) -> Option<Pid> {
            self.pid
        }

        fn exit(&mut self, status: i32) {
            self.exited = Some(status);
        }

        fn wait(&mut self) -> Result<(Pid, i32), ProcError> {
            self.pid.ok_or(ProcError::NoCurrentProcess)?;
            self.zombie.take().ok_or(ProcError::NoSuchProcess)
        }

        fn kill(&mut self, pid: Pid) -> Result<(), ProcError> {
            if Some(pid) == self.pid {
                return Err(ProcError::SelfKill);
            }
            if pid.as_u32() >= self.next_child {
                return Err(ProcError::NoSuchProcess);
            }
            self.killed.push(pid);
            Ok(())
        }

        fn fork(&mut self) -> Result<Pid, ProcError> {
            self.forks += 1;
            let child = Pid::new(self.next_child);
            self.next_child += 1;
            Ok(child)
        }

        fn take_fork_return(&mut self) -> Option<isize> {
            self.fork_ret.take()
        }

        fn console_write(&mut self, bytes: &[u8]) {
            self.console.extend_from_slice(bytes);
        }

        fn open(&mut self, name: &[u8], flags: usize) -> Result<usize, FsError> {
            self.fs.open(name, flags, self.arena.frames_mut())
        }

        fn close(&mut self, fd: usize) -> Result<(), FsError> {
            self.fs.close(fd)
        }

        fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize, FsError> {
            self.fs.read(fd, buf)
        }

        fn write(&mut self, fd: usize, buf: &[u8]) -> Result<usize, FsError> {
            self.fs.write(fd, buf)
        }

        fn user_window(&self) -> AddressWindow {
            self.window
        }
    }

    fn call(sys: &mut MockKernel, num: usize, args: [usize; 3]) -> isize {
        let mut frame = TrapFrame::zeroed();
        frame.regs[TrapFrame::A7] = num;
        frame.regs[TrapFrame::A0] = args[0];
        frame.regs[TrapFrame::A1] = args[1];
        frame.regs[TrapFrame::A2] = args[2];
        dispatch(&mut frame, sys);
        frame.regs[TrapFrame::A0] as isize
    }

    #[test]
    fn numbers_outside_the_table_fail() {
        let mut k = MockKernel::new();
        assert_eq!(call(&mut k, 0, [0; 3]), -1);
        assert_eq!(call(&mut k, SYS_MAX + 1, [0; 3]), -1);
        assert_eq!(call(&mut k, usize::MAX, [0; 3]), -1);
        assert_eq!(k.forks, 0);
    }

    #[test]
    fn getpid_reports_the_caller() {
        let mut k = MockKernel::new();
        assert_eq!(call(&mut k, SYS_GETPID, [0; 3]), 1);
        k.pid = None;
        assert_eq!(call(&mut k, SYS_GETPID, [0; 3]), -1);
    }

    #[test]
    fn write_boundaries() {
        let mut k = MockKernel::new();
        let msg = b"hi";
        let ptr = msg.as_ptr() as usize;

        assert_eq!(call(&mut k, SYS_WRITE, [1, ptr, 0]), 0);
        assert_eq!(call(&mut k, SYS_WRITE, [1, ptr, (-5isize) as usize]), 0);
        assert_eq!(call(&mut k, SYS_WRITE, [(-1isize) as usize, ptr, 2]), -1);
        assert_eq!(call(&mut k, SYS_WRITE, [1, 0, 2]), -1);
        assert!(k.console.is_empty());
    }

    #[test]
    fn console_write_goes_through_staging_chunks() {
        let mut k = MockKernel::new();
        let text = [b'z'; 600];

        assert_eq!(call(&mut k, SYS_WRITE, [1, text.as_ptr() as usize, 600]), 600);
        assert_eq!(call(&mut k, SYS_WRITE, [2, text.as_ptr() as usize, 10]), 10);
        assert_eq!(k.console.len(), 610);
    }

    #[test]
    fn console_write_rejects_low_addresses() {
        let mut k = MockKernel::new();
        k.window = AddressWindow::KERNEL;
        assert_eq!(call(&mut k, SYS_WRITE, [1, 0x1000, 4]), -1);
        assert!(k.console.is_empty());
    }

    #[test]
    fn read_rejections() {
        let mut k = MockKernel::new();
        let mut buf = [0u8; 8];
        let ptr = buf.as_mut_ptr() as usize;

        for fd in [0usize, 1, 2] {
            assert_eq!(call(&mut k, SYS_READ, [fd, ptr, 8]), -1);
        }
        assert_eq!(call(&mut k, SYS_READ, [(-3isize) as usize, ptr, 8]), -1);
        assert_eq!(call(&mut k, SYS_READ, [3, 0, 8]), -1);
        assert_eq!(call(&mut k, SYS_READ, [3, ptr, (-1isize) as usize]), -1);
        assert_eq!(call(&mut k, SYS_READ, [3, ptr, 8]), -1);
    }

    #[test]
    fn file_round_trip_through_syscalls() {
        let mut k = MockKernel::new();
        let name = b"log.txt\0";
        let body = [b'#'; 300];

        let fd = call(&mut k, SYS_OPEN, [name.as_ptr() as usize, O_CREATE, 0]);
        assert_eq!(fd, 3);
        assert_eq!(call(&mut k, SYS_WRITE, [3, body.as_ptr() as usize, 300]), 300);
        assert_eq!(call(&mut k, SYS_CLOSE, [3, 0, 0]), 0);
        assert_eq!(call(&mut k, SYS_CLOSE, [3, 0, 0]), -1);

        let fd = call(&mut k, SYS_OPEN, [name.as_ptr() as usize, 0, 0]) as usize;
        let mut back = [0u8; 512];
        assert_eq!(call(&mut k, SYS_READ, [fd, back.as_mut_ptr() as usize, 512]), 300);
        assert!(back[..300].iter().all(|&b| b == b'#'));
        assert_eq!(call(&mut k, SYS_READ, [fd, back.as_mut_ptr() as usize, 512]), 0);

        let missing = b"nope\0";
        assert_eq!(call(&mut k, SYS_OPEN, [missing.as_ptr() as usize, 0, 0]), -1);
        assert_eq!(call(&mut k, SYS_OPEN, [0, O_CREATE, 0]), -1);
    }

    #[test]
    fn write_to_unknown_descriptor_fails() {
        let mut k = MockKernel::new();
        let data = b"abc";
        assert_eq!(call(&mut k, SYS_WRITE, [0, data.as_ptr() as usize, 3]), -1);
        assert_eq!(call(&mut k, SYS_WRITE, [9, data.as_ptr() as usize, 3]), -1);
    }

    #[test]
    fn exit_does_not_write_a_result() {
        let mut k = MockKernel::new();
        let mut frame = TrapFrame::zeroed();
        frame.regs[TrapFrame::A7] = SYS_EXIT;
        frame.regs[TrapFrame::A0] = 42;
        dispatch(&mut frame, &mut k);
        assert_eq!(k.exited, Some(42));
        assert_eq!(frame.regs[TrapFrame::A0], 42);
    }

    #[test]
    fn wait_copies_the_status_out() {
        let mut k = MockKernel::new();
        k.zombie = Some((Pid::new(5), 17));
        let mut status: i32 = 0;

        let ret = call(&mut k, SYS_WAIT, [&mut status as *mut i32 as usize, 0, 0]);
        assert_eq!((ret, status), (5, 17));

        k.zombie = Some((Pid::new(6), 0));
        assert_eq!(call(&mut k, SYS_WAIT, [0, 0, 0]), 6);

        k.pid = None;
        assert_eq!(call(&mut k, SYS_WAIT, [0, 0, 0]), -1);
    }

    #[test]
    fn wait_rejects_a_bad_status_pointer_before_blocking() {
        let mut k = MockKernel::new();
        k.window = AddressWindow::KERNEL;
        k.zombie = Some((Pid::new(5), 1));
        assert_eq!(call(&mut k, SYS_WAIT, [0x10, 0, 0]), -1);
        assert!(k.zombie.is_some());
    }

    #[test]
    fn kill_results() {
        let mut k = MockKernel::new();
        k.next_child = 4;
        assert_eq!(call(&mut k, SYS_KILL, [3, 0, 0]), 0);
        assert_eq!(call(&mut k, SYS_KILL, [1, 0, 0]), -1);
        assert_eq!(call(&mut k, SYS_KILL, [0, 0, 0]), -1);
        assert_eq!(call(&mut k, SYS_KILL, [(-2isize) as usize, 0, 0]), -1);
        assert_eq!(call(&mut k, SYS_KILL, [99, 0, 0]), -1);
        assert_eq!(k.killed, [Pid::new(3)]);
    }

    #[test]
    fn fork_override_replaces_the_result_once() {
        let mut k = MockKernel::new();
        assert_eq!(call(&mut k, SYS_FORK, [0; 3]), 2);

        // Now running as the child, which carries the one-shot override.
        k.pid = Some(Pid::new(2));
        k.fork_ret = Some(0);
        assert_eq!(call(&mut k, SYS_FORK, [0; 3]), 0);
        assert_eq!(k.forks, 1);
        assert_eq!(call(&mut k, SYS_FORK, [0; 3]), 3);
        assert_eq!(k.forks, 2);
    }
}
