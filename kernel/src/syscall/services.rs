// Kernel-side implementation of the syscall services.
//
// Forwards each request to the global process table, scheduler, console and
// file store. Lock order: FILES before PMM, PROCS before PMM.

use super::Services;
use crate::console;
use crate::fs::{FsError, FILES};
use crate::mm::pmm::PMM;
use crate::proc::{self, Pid, ProcError};
use crate::sched;

pub struct KernelServices;

impl Services for KernelServices {
    fn current_pid(&self) -> Option<Pid> {
        proc::current_pid()
    }

    fn exit(&mut self, status: i32) {
        sched::exit(status)
    }

    fn wait(&mut self) -> Result<(Pid, i32), ProcError> {
        sched::wait()
    }

    fn kill(&mut self, pid: Pid) -> Result<(), ProcError> {
        proc::kill(pid)
    }

    fn fork(&mut self) -> Result<Pid, ProcError> {
        proc::fork()
    }

    fn take_fork_return(&mut self) -> Option<isize> {
        proc::take_fork_return()
    }

    fn console_write(&mut self, bytes: &[u8]) {
        console::write_bytes(bytes);
    }

    fn open(&mut self, name: &[u8], flags: usize) -> Result<usize, FsError> {
        FILES.lock().open(name, flags, &mut *PMM.lock())
    }

    fn close(&mut self, fd: usize) -> Result<(), FsError> {
        FILES.lock().close(fd)
    }

    fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize, FsError> {
        FILES.lock().read(fd, buf)
    }

    fn write(&mut self, fd: usize, buf: &[u8]) -> Result<usize, FsError> {
        FILES.lock().write(fd, buf)
    }
}
