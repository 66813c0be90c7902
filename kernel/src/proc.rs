// Process Management
//
// Defines the process abstraction of the Cinder kernel: a fixed table of
// sixteen slots, each holding one kernel-thread style process with its own
// kernel stack page and saved register context.
//
// Key responsibilities:
// - Process identity (`Pid`), lifecycle state and wait channels
// - Slot allocation with a fresh kernel stack from the PMM
// - State transitions for yield, sleep, wakeup, exit, kill and wait
// - The register-clone `fork`
// - The per-slot decisions the scheduler loop makes (`begin_run`,
//   `finish_run`, orphan reaping)
//
// Process model:
// - Lifecycle: Unused -> Used -> Runnable -> Running ->
//   {Runnable | Sleeping | Zombie} -> Unused
// - Identifiers increase monotonically from 1 and are never reused, even
//   when the allocation that consumed one fails
// - A zombie whose parent is alive waits for the parent's `wait`; a zombie
//   without a living parent is reclaimed by the scheduler
// - Wait channels are opaque tokens compared by value only
//
// Implementation details:
// - `ProcTable` is plain data; the global instance lives in `PROCS`
// - Transitions that leave the running process (`prepare_yield`,
//   `prepare_sleep`, `prepare_exit`, `begin_run`) return a `Switch`: raw
//   pointers to the two contexts involved. The caller drops the table lock
//   and only then performs the switch
// - Every operation that frees a stack takes the `FrameAllocator` as an
//   argument, so tests run the table over a heap arena
//
// Correctness and safety notes:
// - `Switch` pointers stay valid because the table is never moved while a
//   process is suspended (it is a `static` on hardware)
// - Lock order is PROCS before PMM
// - The kernel stack is freed exactly once, when the slot returns to Unused

use core::fmt;
use core::ptr::{addr_of, addr_of_mut};

use spin::Mutex;

use crate::config::{NPROC, PAGE_SIZE};
use crate::mm::pmm::PMM;
use crate::mm::FrameAllocator;
use crate::{log_debug, log_info, log_warn};

const LOG_ORIGIN: &str = "proc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(u32);

impl Pid {
    pub const fn new(raw: u32) -> Self {
        Pid(raw)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque key a process sleeps on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel(usize);

impl Channel {
    pub const fn new(key: usize) -> Self {
        Channel(key)
    }

    /// Channel keyed by the address of `obj`.
    pub fn of<T>(obj: &T) -> Self {
        Channel(obj as *const T as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    Unused,
    Used,
    Runnable,
    Running,
    Sleeping,
    Zombie,
}

/// Callee-saved registers preserved across `switch_context`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    pub ra: usize,
    pub sp: usize,
    pub s: [usize; 12],
}

impl Context {
    pub const fn zero() -> Self {
        Self {
            ra: 0,
            sp: 0,
            s: [0; 12],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcError {
    TableFull,
    OutOfMemory,
    NoCurrentProcess,
    NoSuchProcess,
    SelfKill,
}

pub type Entry = fn();

#[derive(Debug, Clone, Copy)]
pub struct Proc {
    pub pid: Option<Pid>,
    pub state: ProcState,
    pub kstack: Option<usize>,
    pub context: Context,
    pub entry: Option<Entry>,
    pub chan: Option<Channel>,
    pub killed: bool,
    pub xstate: i32,
    pub parent: Option<Pid>,
    /// One-shot value the next `fork` syscall returns instead of forking.
    pub fork_ret: Option<isize>,
}

impl Proc {
    const UNUSED: Proc = Proc {
        pid: None,
        state: ProcState::Unused,
        kstack: None,
        context: Context::zero(),
        entry: None,
        chan: None,
        killed: false,
        xstate: 0,
        parent: None,
        fork_ret: None,
    };

    /// Neither free nor finished.
    fn is_alive(&self) -> bool {
        !matches!(self.state, ProcState::Unused | ProcState::Zombie)
    }
}

/// Contexts to save into and resume from.
#[derive(Debug, Clone, Copy)]
pub struct Switch {
    pub from: *mut Context,
    pub to: *const Context,
}

/// What the scheduler should do with one slot.
#[derive(Debug)]
pub enum Dispatch {
    /// Not runnable.
    Idle,
    /// Killed before it could run; finalized with status -1.
    Killed { pid: Option<Pid>, reaped: bool },
    /// Marked running and current; switch into it.
    Run(Switch),
}

pub struct ProcTable {
    procs: [Proc; NPROC],
    next_pid: u32,
    current: Option<usize>,
    scheduler: Context,
    trampoline: fn() -> !,
}

impl ProcTable {
    pub const fn new(trampoline: fn() -> !) -> Self {
        Self {
            procs: [Proc::UNUSED; NPROC],
            next_pid: 1,
            current: None,
            scheduler: Context::zero(),
            trampoline,
        }
    }

    pub fn get(&self, slot: usize) -> Option<&Proc> {
        self.procs.get(slot)
    }

    /// Slot of the non-free process with `pid`.
    pub fn find(&self, pid: Pid) -> Option<usize> {
        self.procs
            .iter()
            .position(|p| p.state != ProcState::Unused && p.pid == Some(pid))
    }

    pub fn current_slot(&self) -> Option<usize> {
        self.current
    }

    pub fn current_pid(&self) -> Option<Pid> {
        self.current.and_then(|slot| self.procs[slot].pid)
    }

    pub fn current_entry(&self) -> Option<Entry> {
        self.current.and_then(|slot| self.procs[slot].entry)
    }

    pub fn count(&self, state: ProcState) -> usize {
        self.procs.iter().filter(|p| p.state == state).count()
    }

    fn trampoline_addr(&self) -> usize {
        self.trampoline as usize
    }

    /// Claim a free slot with a fresh stack; the slot is left `Used`.
    pub fn allocate<A: FrameAllocator>(&mut self, frames: &mut A) -> Result<usize, ProcError> {
        let slot = self
            .procs
            .iter()
            .position(|p| p.state == ProcState::Unused)
            .ok_or(ProcError::TableFull)?;

        let pid = Pid(self.next_pid);
        self.next_pid += 1;
        self.procs[slot].state = ProcState::Used;
        self.procs[slot].pid = Some(pid);

        let Some(stack) = frames.alloc_page() else {
            log_warn!(LOG_ORIGIN, "allocate: no stack page for pid {}", pid);
            self.procs[slot] = Proc::UNUSED;
            return Err(ProcError::OutOfMemory);
        };

        let trampoline = self.trampoline_addr();
        let p = &mut self.procs[slot];
        p.kstack = Some(stack);
        p.context = Context {
            ra: trampoline,
            sp: stack + PAGE_SIZE,
            s: [0; 12],
        };
        p.entry = None;
        p.chan = None;
        p.killed = false;
        p.xstate = 0;
        p.parent = None;
        p.fork_ret = None;

        Ok(slot)
    }

    /// New runnable process starting at `entry`, child of the current process.
    pub fn create<A: FrameAllocator>(
        &mut self,
        entry: Entry,
        frames: &mut A,
    ) -> Result<Pid, ProcError> {
        let parent = self.current_pid();
        let slot = self.allocate(frames)?;

        let p = &mut self.procs[slot];
        p.entry = Some(entry);
        p.parent = parent;
        p.state = ProcState::Runnable;

        p.pid.ok_or(ProcError::NoSuchProcess)
    }

    fn free_slot<A: FrameAllocator>(&mut self, slot: usize, frames: &mut A) {
        if let Some(stack) = self.procs[slot].kstack.take() {
            let _ = frames.free_page(stack);
        }
        self.procs[slot] = Proc::UNUSED;
    }

    fn has_living_parent(&self, slot: usize) -> bool {
        match self.procs[slot].parent {
            Some(parent) => self
                .procs
                .iter()
                .any(|p| p.pid == Some(parent) && p.is_alive()),
            None => false,
        }
    }

    /// Reclaim a zombie nobody can `wait` for.
    fn reap_if_orphan<A: FrameAllocator>(&mut self, slot: usize, frames: &mut A) -> bool {
        if self.procs[slot].state != ProcState::Zombie || self.has_living_parent(slot) {
            return false;
        }
        self.free_slot(slot, frames);
        true
    }

    pub fn reap_orphans<A: FrameAllocator>(&mut self, frames: &mut A) -> usize {
        let mut reaped = 0;
        for slot in 0..NPROC {
            if self.reap_if_orphan(slot, frames) {
                reaped += 1;
            }
        }
        reaped
    }

    fn leave_current(&mut self, state: ProcState) -> Option<(usize, Switch)> {
        let slot = self.current.take()?;
        self.procs[slot].state = state;

        let switch = Switch {
            from: addr_of_mut!(self.procs[slot].context),
            to: addr_of!(self.scheduler),
        };
        Some((slot, switch))
    }

    pub fn prepare_yield(&mut self) -> Option<Switch> {
        self.leave_current(ProcState::Runnable).map(|(_, sw)| sw)
    }

    pub fn prepare_sleep(&mut self, chan: Channel) -> Option<Switch> {
        let (slot, switch) = self.leave_current(ProcState::Sleeping)?;
        self.procs[slot].chan = Some(chan);
        Some(switch)
    }

    pub fn prepare_exit(&mut self, status: i32) -> Result<Switch, ProcError> {
        let (slot, switch) = self
            .leave_current(ProcState::Zombie)
            .ok_or(ProcError::NoCurrentProcess)?;
        self.procs[slot].xstate = status;
        Ok(switch)
    }

    /// Make every sleeper on `chan` runnable; returns how many woke.
    pub fn wakeup(&mut self, chan: Channel) -> usize {
        let mut woken = 0;
        for p in self.procs.iter_mut() {
            if p.state == ProcState::Sleeping && p.chan == Some(chan) {
                p.chan = None;
                p.state = ProcState::Runnable;
                woken += 1;
            }
        }
        woken
    }

    pub fn kill(&mut self, pid: Pid) -> Result<(), ProcError> {
        if self.current_pid() == Some(pid) {
            return Err(ProcError::SelfKill);
        }

        let slot = self.find(pid).ok_or(ProcError::NoSuchProcess)?;
        let p = &mut self.procs[slot];
        p.killed = true;

        if p.state == ProcState::Sleeping {
            let chan = p.chan.take();
            p.state = ProcState::Runnable;
            if let Some(chan) = chan {
                self.wakeup(chan);
            }
        }

        Ok(())
    }

    /// Register-clone fork of the current process.
    ///
    /// The child gets the parent's saved registers and entry, its own empty
    /// stack, and restarts at the trampoline. Stack contents are not copied.
    pub fn fork<A: FrameAllocator>(&mut self, frames: &mut A) -> Result<Pid, ProcError> {
        let parent_slot = self.current.ok_or(ProcError::NoCurrentProcess)?;
        let parent = self.procs[parent_slot];

        let slot = self.allocate(frames)?;
        let child = &mut self.procs[slot];

        let sp = child.context.sp;
        child.context = parent.context;
        child.context.sp = sp;
        child.context.ra = self.trampoline as usize;
        child.entry = parent.entry;
        child.parent = parent.pid;
        child.fork_ret = Some(0);
        child.state = ProcState::Runnable;

        let pid = child.pid.ok_or(ProcError::NoSuchProcess)?;
        log_debug!(
            LOG_ORIGIN,
            "fork: parent={:?} child={} slot={}",
            parent.pid,
            pid,
            slot
        );
        Ok(pid)
    }

    /// Consume the current process's pending fork-return override.
    pub fn take_fork_return(&mut self) -> Option<isize> {
        let slot = self.current?;
        self.procs[slot].fork_ret.take()
    }

    /// Collect the lowest-indexed zombie child of `parent`.
    pub fn reap_child<A: FrameAllocator>(
        &mut self,
        parent: Pid,
        frames: &mut A,
    ) -> Option<(Pid, i32)> {
        let slot = self
            .procs
            .iter()
            .position(|p| p.state == ProcState::Zombie && p.parent == Some(parent))?;

        let child = &self.procs[slot];
        let result = (child.pid?, child.xstate);
        self.free_slot(slot, frames);
        Some(result)
    }

    /// Scheduler step before running `slot`.
    pub fn begin_run<A: FrameAllocator>(&mut self, slot: usize, frames: &mut A) -> Dispatch {
        let p = &mut self.procs[slot];
        if p.state != ProcState::Runnable {
            return Dispatch::Idle;
        }

        if p.killed {
            p.state = ProcState::Zombie;
            p.xstate = -1;
            let pid = p.pid;
            let reaped = self.reap_if_orphan(slot, frames);
            return Dispatch::Killed { pid, reaped };
        }

        p.state = ProcState::Running;
        self.current = Some(slot);

        Dispatch::Run(Switch {
            from: addr_of_mut!(self.scheduler),
            to: addr_of!(self.procs[slot].context),
        })
    }

    /// Scheduler step after `slot` switched back; returns the reaped pid.
    pub fn finish_run<A: FrameAllocator>(&mut self, slot: usize, frames: &mut A) -> Option<Pid> {
        self.current = None;

        let p = &mut self.procs[slot];
        if p.killed && p.state != ProcState::Zombie && p.state != ProcState::Unused {
            p.state = ProcState::Zombie;
            p.xstate = -1;
        }
        if p.state == ProcState::Running {
            p.state = ProcState::Runnable;
        }

        let pid = p.pid;
        if self.reap_if_orphan(slot, frames) {
            pid
        } else {
            None
        }
    }

    #[cfg(test)]
    pub(crate) fn set_current(&mut self, slot: Option<usize>) {
        self.current = slot;
        if let Some(slot) = slot {
            self.procs[slot].state = ProcState::Running;
        }
    }
}

pub static PROCS: Mutex<ProcTable> = Mutex::new(ProcTable::new(crate::sched::trampoline));

pub fn create(entry: Entry) -> Result<Pid, ProcError> {
    let result = PROCS.lock().create(entry, &mut *PMM.lock());
    match result {
        Ok(pid) => log_info!(LOG_ORIGIN, "created process pid={}", pid),
        Err(err) => log_warn!(LOG_ORIGIN, "create failed: {:?}", err),
    }
    result
}

pub fn current_pid() -> Option<Pid> {
    PROCS.lock().current_pid()
}

pub fn wakeup(chan: Channel) {
    PROCS.lock().wakeup(chan);
}

pub fn kill(pid: Pid) -> Result<(), ProcError> {
    let result = PROCS.lock().kill(pid);
    log_debug!(LOG_ORIGIN, "kill pid={} -> {:?}", pid, result);
    result
}

pub fn fork() -> Result<Pid, ProcError> {
    PROCS.lock().fork(&mut *PMM.lock())
}

pub fn take_fork_return() -> Option<isize> {
    PROCS.lock().take_fork_return()
}

/// Log one line per occupied slot.
pub fn dump() {
    let table = PROCS.lock();
    for (slot, p) in table.procs.iter().enumerate() {
        if p.state == ProcState::Unused {
            continue;
        }
        log_info!(
            LOG_ORIGIN,
            "slot {:2}: pid={:?} state={:?} parent={:?} killed={}",
            slot,
            p.pid,
            p.state,
            p.parent,
            p.killed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Arena;

    fn fake_trampoline() -> ! {
        loop {
            core::hint::spin_loop();
        }
    }

    fn task_a() {}
    fn task_b() {}

    fn table() -> ProcTable {
        ProcTable::new(fake_trampoline)
    }

    #[test]
    fn create_assigns_increasing_ids_and_fresh_stacks() {
        let mut arena = Arena::new(4);
        let mut t = table();

        let a = t.create(task_a, arena.frames_mut()).unwrap();
        let b = t.create(task_b, arena.frames_mut()).unwrap();
        assert_eq!((a, b), (Pid::new(1), Pid::new(2)));

        let pa = t.get(0).unwrap();
        assert_eq!(pa.state, ProcState::Runnable);
        assert_eq!(pa.parent, None);
        let stack = pa.kstack.unwrap();
        assert_eq!(pa.context.sp, stack + PAGE_SIZE);
        assert_eq!(pa.context.ra, fake_trampoline as usize);
        assert_ne!(t.get(1).unwrap().kstack, Some(stack));
        assert_eq!(arena.frames().stats().free_pages, 2);
    }

    #[test]
    fn table_full_and_out_of_memory() {
        let mut arena = Arena::new(NPROC + 1);
        let mut t = table();
        for _ in 0..NPROC {
            t.create(task_a, arena.frames_mut()).unwrap();
        }
        assert_eq!(t.create(task_a, arena.frames_mut()), Err(ProcError::TableFull));

        let mut small = Arena::new(1);
        let mut t = table();
        t.create(task_a, small.frames_mut()).unwrap();
        assert_eq!(t.create(task_a, small.frames_mut()), Err(ProcError::OutOfMemory));
        assert_eq!(t.get(1).unwrap().state, ProcState::Unused);

        // The failed allocation still consumed an identifier.
        small.frames_mut().free_page(t.get(0).unwrap().kstack.unwrap()).unwrap();
        let mut t2 = table();
        let _ = t2.create(task_a, small.frames_mut()).unwrap();
        assert_eq!(t2.create(task_a, small.frames_mut()), Err(ProcError::OutOfMemory));
        assert_eq!(t2.next_pid, 3);
    }

    #[test]
    fn exit_then_wait_reaps_status_and_frees_slot() {
        let mut arena = Arena::new(4);
        let mut t = table();

        let parent = t.create(task_a, arena.frames_mut()).unwrap();
        t.set_current(Some(0));
        let child = t.create(task_b, arena.frames_mut()).unwrap();
        assert_eq!(t.get(1).unwrap().parent, Some(parent));

        // Parent waits: nothing yet.
        assert_eq!(t.reap_child(parent, arena.frames_mut()), None);
        t.prepare_yield().unwrap();

        t.set_current(Some(1));
        t.prepare_exit(7).unwrap();
        assert_eq!(t.get(1).unwrap().state, ProcState::Zombie);
        assert_eq!(t.current_slot(), None);

        let free_before = arena.frames().stats().free_pages;
        assert_eq!(t.reap_child(parent, arena.frames_mut()), Some((child, 7)));
        assert_eq!(t.get(1).unwrap().state, ProcState::Unused);
        assert_eq!(arena.frames().stats().free_pages, free_before + 1);

        // Slot 1 is reused with a new identifier.
        let next = t.create(task_b, arena.frames_mut()).unwrap();
        assert_eq!(next, Pid::new(3));
        assert_eq!(t.find(next), Some(1));
    }

    #[test]
    fn exit_outside_a_process_fails() {
        let mut t = table();
        assert_eq!(t.prepare_exit(0).unwrap_err(), ProcError::NoCurrentProcess);
        assert!(t.prepare_yield().is_none());
    }

    #[test]
    fn wakeup_is_a_broadcast_on_one_channel() {
        let mut arena = Arena::new(4);
        let mut t = table();
        for _ in 0..3 {
            t.create(task_a, arena.frames_mut()).unwrap();
        }
        let chan = Channel::new(0xC0FFEE);

        t.set_current(Some(0));
        t.prepare_sleep(chan).unwrap();
        t.set_current(Some(1));
        t.prepare_sleep(chan).unwrap();
        t.set_current(Some(2));
        t.prepare_sleep(Channel::new(1)).unwrap();

        assert_eq!(t.wakeup(chan), 2);
        assert_eq!(t.get(0).unwrap().state, ProcState::Runnable);
        assert_eq!(t.get(1).unwrap().chan, None);
        assert_eq!(t.get(2).unwrap().state, ProcState::Sleeping);
    }

    #[test]
    fn kill_rules() {
        let mut arena = Arena::new(4);
        let mut t = table();
        let a = t.create(task_a, arena.frames_mut()).unwrap();
        let b = t.create(task_b, arena.frames_mut()).unwrap();

        t.set_current(Some(0));
        assert_eq!(t.kill(a), Err(ProcError::SelfKill));
        assert_eq!(t.kill(Pid::new(99)), Err(ProcError::NoSuchProcess));
        assert_eq!(t.kill(b), Ok(()));
        assert!(t.get(1).unwrap().killed);
    }

    #[test]
    fn kill_wakes_a_sleeper() {
        let mut arena = Arena::new(4);
        let mut t = table();
        let _a = t.create(task_a, arena.frames_mut()).unwrap();
        let b = t.create(task_b, arena.frames_mut()).unwrap();

        t.set_current(Some(1));
        t.prepare_sleep(Channel::new(42)).unwrap();
        assert_eq!(t.get(1).unwrap().state, ProcState::Sleeping);

        t.set_current(Some(0));
        t.kill(b).unwrap();
        let pb = t.get(1).unwrap();
        assert_eq!(pb.state, ProcState::Runnable);
        assert_eq!(pb.chan, None);
    }

    #[test]
    fn fork_clones_registers_onto_a_new_stack() {
        let mut arena = Arena::new(4);
        let mut t = table();
        let parent = t.create(task_a, arena.frames_mut()).unwrap();
        t.set_current(Some(0));
        t.procs[0].context.s[3] = 0xABCD;

        let child = t.fork(arena.frames_mut()).unwrap();
        assert_eq!(child, Pid::new(2));

        let c = t.get(1).unwrap();
        assert_eq!(c.parent, Some(parent));
        assert_eq!(c.state, ProcState::Runnable);
        assert_eq!(c.context.s[3], 0xABCD);
        assert_eq!(c.context.sp, c.kstack.unwrap() + PAGE_SIZE);
        assert_ne!(c.kstack, t.get(0).unwrap().kstack);
        assert_eq!(c.entry.map(|f| f as usize), Some(task_a as usize));
    }

    #[test]
    fn fork_return_override_fires_once() {
        let mut arena = Arena::new(4);
        let mut t = table();
        t.create(task_a, arena.frames_mut()).unwrap();
        t.set_current(Some(0));
        t.fork(arena.frames_mut()).unwrap();

        // The parent has no override.
        assert_eq!(t.take_fork_return(), None);
        t.prepare_yield();

        t.set_current(Some(1));
        assert_eq!(t.take_fork_return(), Some(0));
        assert_eq!(t.take_fork_return(), None);
    }

    #[test]
    fn fork_needs_a_current_process() {
        let mut arena = Arena::new(2);
        let mut t = table();
        assert_eq!(t.fork(arena.frames_mut()), Err(ProcError::NoCurrentProcess));
    }

    #[test]
    fn killed_runnable_slot_is_finalized_without_running() {
        let mut arena = Arena::new(4);
        let mut t = table();
        let a = t.create(task_a, arena.frames_mut()).unwrap();
        t.procs[0].killed = true;

        match t.begin_run(0, arena.frames_mut()) {
            Dispatch::Killed { pid, reaped } => {
                assert_eq!(pid, Some(a));
                assert!(reaped);
            }
            other => panic!("unexpected dispatch {:?}", other),
        }
        assert_eq!(t.get(0).unwrap().state, ProcState::Unused);
        assert_eq!(arena.frames().stats().free_pages, 4);
    }

    #[test]
    fn zombie_with_living_parent_is_left_for_wait() {
        let mut arena = Arena::new(4);
        let mut t = table();
        let parent = t.create(task_a, arena.frames_mut()).unwrap();
        t.set_current(Some(0));
        t.create(task_b, arena.frames_mut()).unwrap();
        t.prepare_yield();

        assert!(matches!(t.begin_run(1, arena.frames_mut()), Dispatch::Run(_)));
        t.prepare_exit(0).unwrap();
        assert_eq!(t.finish_run(1, arena.frames_mut()), None);
        assert_eq!(t.get(1).unwrap().state, ProcState::Zombie);

        assert_eq!(t.reap_child(parent, arena.frames_mut()).map(|r| r.1), Some(0));
    }

    #[test]
    fn orphans_are_reaped_once_the_parent_is_gone() {
        let mut arena = Arena::new(4);
        let mut t = table();
        t.create(task_a, arena.frames_mut()).unwrap();
        t.set_current(Some(0));
        t.create(task_b, arena.frames_mut()).unwrap();
        t.prepare_yield();

        t.set_current(Some(1));
        t.prepare_exit(3).unwrap();
        assert_eq!(t.reap_orphans(arena.frames_mut()), 0);

        t.set_current(Some(0));
        t.prepare_exit(0).unwrap();
        assert_eq!(t.reap_orphans(arena.frames_mut()), 2);
        assert_eq!(t.count(ProcState::Unused), NPROC);
    }
}
