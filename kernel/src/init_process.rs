// kernel/src/init_process.rs
//
// Init Process and Boot Demonstrations
//
// The first process the kernel creates. It spawns a handful of short-lived
// demonstration processes that exercise each syscall end to end, collects
// every exit status with `wait`, and prints a summary.
//
// Demonstrations:
// - syscall: `getpid`, console `write`, and a write from an address below
//   `KERNBASE` that must fail
// - files: create, write, close, reopen and read back through the file store
// - fork: the child sees 0 and exits with a known status; the parent waits
// - sleeper: blocks on a channel forever until init kills it
//
// Implementation details:
// - Processes are kernel functions that enter the kernel through `ecall`
//   using the `cinder_syscall` wrappers, exactly as a program would
// - Init knows how many children it started and waits exactly that often,
//   since `wait` with no exiting child blocks forever
//
// If init cannot be created the kernel halts.

use cinder_syscall::fcntl::{O_CREATE, O_RDWR, STDOUT};
use cinder_syscall::raw::numbers::{SYS_MAX, SYS_WRITE};
use cinder_syscall::{io, process, syscall0, syscall3};

use crate::fs::FILES;
use crate::mm::pmm;
use crate::proc::{self, Channel, Pid, ProcError};
use crate::sched;
use crate::{log_error, log_info, log_warn};

const LOG_ORIGIN: &str = "init";

const DEMO_FILE: &str = "hello.txt";
const DEMO_TEXT: &[u8] = b"written through the file store";
const FORK_CHILD_STATUS: i32 = 42;

static SLEEP_CHANNEL: u8 = 0;

pub fn launch() -> Result<Pid, ProcError> {
    proc::create(init_main)
}

fn init_main() {
    let _ = io::print("init: starting demonstrations\n");

    let mut children = 0usize;
    for (name, entry) in [
        ("syscall", syscall_demo as fn()),
        ("files", file_demo as fn()),
        ("fork", fork_demo as fn()),
    ] {
        match proc::create(entry) {
            Ok(pid) => {
                log_info!(LOG_ORIGIN, "spawned {} demo as pid {}", name, pid);
                children += 1;
            }
            Err(err) => log_error!(LOG_ORIGIN, "cannot spawn {} demo: {:?}", name, err),
        }
    }

    match proc::create(sleeper) {
        Ok(pid) => {
            children += 1;
            sched::yield_now();
            match process::kill(pid.as_u32() as usize) {
                Ok(()) => log_info!(LOG_ORIGIN, "killed sleeper pid {}", pid),
                Err(_) => log_warn!(LOG_ORIGIN, "kill of pid {} failed", pid),
            }
        }
        Err(err) => log_error!(LOG_ORIGIN, "cannot spawn sleeper: {:?}", err),
    }

    let mut failures = 0usize;
    for _ in 0..children {
        match process::wait() {
            Ok((pid, status)) => {
                log_info!(LOG_ORIGIN, "child {} exited with status {}", pid, status);
                if status != 0 && status != -1 {
                    failures += 1;
                }
            }
            Err(_) => {
                log_error!(LOG_ORIGIN, "wait failed");
                break;
            }
        }
    }

    proc::dump();
    FILES.lock().dump();
    let stats = pmm::stats();
    log_info!(
        LOG_ORIGIN,
        "memory: {} of {} pages free",
        stats.free_pages,
        stats.total_pages
    );

    if failures == 0 {
        let _ = io::print("init: all demonstrations passed\n");
    } else {
        log_error!(LOG_ORIGIN, "{} demonstrations failed", failures);
    }
}

fn syscall_demo() {
    let pid = process::getpid().unwrap_or(0);
    log_info!(LOG_ORIGIN, "syscall demo running as pid {}", pid);

    let _ = io::print("syscall: hello from the console\n");

    // Addresses below KERNBASE are outside the accepted window.
    let rejected = unsafe { syscall3(SYS_WRITE, STDOUT, 0x1000, 8) };
    let bogus = unsafe { syscall0(SYS_MAX + 1) };

    if rejected != -1 || bogus != -1 {
        process::exit(1);
    }
}

fn file_demo() {
    let Ok(fd) = io::open(DEMO_FILE, O_CREATE | O_RDWR) else {
        process::exit(2);
    };
    let wrote = io::write(fd, DEMO_TEXT).unwrap_or(0);
    let _ = io::close(fd);

    let Ok(fd) = io::open(DEMO_FILE, O_RDWR) else {
        process::exit(3);
    };
    let mut buf = [0u8; 64];
    let got = io::read(fd, &mut buf).unwrap_or(0);
    let _ = io::close(fd);

    log_info!(
        LOG_ORIGIN,
        "file demo: wrote {} bytes, read back {:?}",
        wrote,
        core::str::from_utf8(&buf[..got]).unwrap_or("<binary>")
    );

    if wrote != DEMO_TEXT.len() || &buf[..got] != DEMO_TEXT {
        process::exit(4);
    }
}

fn fork_demo() {
    match process::fork() {
        Ok(0) => {
            let _ = io::print("fork: hello from the child\n");
            process::exit(FORK_CHILD_STATUS);
        }
        Ok(child) => {
            log_info!(LOG_ORIGIN, "fork demo: parent created child {}", child);
            match process::wait() {
                Ok((pid, FORK_CHILD_STATUS)) if pid == child => {}
                _ => process::exit(5),
            }
        }
        Err(_) => process::exit(6),
    }
}

fn sleeper() {
    loop {
        sched::sleep(Channel::of(&SLEEP_CHANNEL));
    }
}
