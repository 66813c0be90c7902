// Kernel Scheduler
//
// Cooperative round-robin scheduler over the process table. The scheduler
// runs on the boot stack in its own saved context and is never a process
// itself; processes give up the hart only by yielding, sleeping, waiting or
// exiting. Timer interrupts advance the tick counter but never preempt.
//
// Key responsibilities:
// - Sweep the table in slot order and switch into each runnable process
// - Finalize killed processes at scheduling checkpoints
// - Reclaim zombies that have no living parent
// - Idle the hart with `wfi` when a sweep finds nothing to run
// - Provide the blocking process operations (`yield_now`, `sleep`, `wait`,
//   `exit`) and the trampoline every new process starts in
//
// Implementation details:
// - `sweep` is generic over the table lock, the frame allocator lock and a
//   `run` callback; `run_scheduler` passes the real context switch, tests
//   pass a closure that plays the role of the process
// - No lock is held across a context switch: each operation takes the
//   `Switch` pointers under the lock, drops it, then switches
// - Switches happen with machine interrupts disabled; the previous
//   interrupt state is restored when the process resumes
//
// Correctness and safety notes:
// - `wait` busy-yields until a child exits and can block forever
// - `exit` outside any process is a kernel bug: logged, hart halted

use spin::Mutex;

use crate::arch;
use crate::config::NPROC;
use crate::mm::pmm::PMM;
use crate::mm::FrameAllocator;
use crate::proc::{Channel, Dispatch, Pid, ProcError, ProcTable, Switch, PROCS};
use crate::util::without_interrupts;
use crate::{log_debug, log_info, log_panic};

const LOG_ORIGIN: &str = "sched";

/// Counters from one pass over the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub ran: usize,
    pub killed: usize,
    pub reaped: usize,
}

/// One pass over every slot in ascending order.
pub fn sweep<A, F>(procs: &Mutex<ProcTable>, frames: &Mutex<A>, mut run: F) -> SweepReport
where
    A: FrameAllocator,
    F: FnMut(usize, Switch),
{
    let mut report = SweepReport::default();

    for slot in 0..NPROC {
        let dispatch = procs.lock().begin_run(slot, &mut *frames.lock());

        match dispatch {
            Dispatch::Idle => {}
            Dispatch::Killed { pid, reaped } => {
                log_debug!(LOG_ORIGIN, "slot {} (pid {:?}) killed before running", slot, pid);
                report.killed += 1;
                if reaped {
                    report.reaped += 1;
                }
            }
            Dispatch::Run(switch) => {
                report.ran += 1;
                run(slot, switch);

                if let Some(pid) = procs.lock().finish_run(slot, &mut *frames.lock()) {
                    log_debug!(LOG_ORIGIN, "reaped pid {} (slot {})", pid, slot);
                    report.reaped += 1;
                }
            }
        }
    }

    report.reaped += procs.lock().reap_orphans(&mut *frames.lock());
    report
}

/// Scheduler loop on the boot hart. Never returns.
pub fn run_scheduler() -> ! {
    log_info!(LOG_ORIGIN, "scheduler started");

    loop {
        let report = sweep(&PROCS, &PMM, |_, switch| unsafe { switch_to(switch) });

        if report.ran == 0 {
            arch::wait_for_interrupt();
        }
    }
}

unsafe fn switch_to(switch: Switch) {
    without_interrupts(|| unsafe { arch::switch_context(switch.from, switch.to) });
}

/// First code a new process runs, entered from the scheduler's switch.
pub fn trampoline() -> ! {
    let entry = PROCS.lock().current_entry();

    arch::enable_interrupts();
    if let Some(entry) = entry {
        entry();
    }

    exit(0)
}

/// Give up the hart; returns when the scheduler picks this process again.
pub fn yield_now() {
    let switch = PROCS.lock().prepare_yield();
    if let Some(switch) = switch {
        unsafe { switch_to(switch) };
    }
}

/// Block on `chan` until a `wakeup(chan)` or a `kill`.
pub fn sleep(chan: Channel) {
    let switch = PROCS.lock().prepare_sleep(chan);
    if let Some(switch) = switch {
        unsafe { switch_to(switch) };
    }
}

pub fn exit(status: i32) -> ! {
    let prepared = PROCS.lock().prepare_exit(status);

    match prepared {
        Ok(switch) => {
            unsafe { switch_to(switch) };
            log_panic!(LOG_ORIGIN, "zombie process resumed");
        }
        Err(err) => {
            log_panic!(LOG_ORIGIN, "exit({}) outside any process: {:?}", status, err);
        }
    }

    arch::halt_forever()
}

/// Wait for any child to exit; returns its id and status.
pub fn wait() -> Result<(Pid, i32), ProcError> {
    loop {
        {
            let mut table = PROCS.lock();
            let me = table.current_pid().ok_or(ProcError::NoCurrentProcess)?;
            if let Some(reaped) = table.reap_child(me, &mut *PMM.lock()) {
                return Ok(reaped);
            }
        }

        yield_now();
    }
}
