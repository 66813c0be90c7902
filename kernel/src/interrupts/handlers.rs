// Machine Trap Handlers
//
// Rust side of the trap path. The assembly vector in `arch` saves every
// general-purpose register plus `mepc` and `mstatus` into a `TrapFrame` on
// the interrupted stack and calls `cinder_trap_handler`; this module decodes
// `mcause` and routes the trap.
//
// Trap classes:
// - Machine timer interrupt: count a tick and arm the next CLINT deadline;
//   the interrupted code simply resumes
// - Environment call (from U, S or M mode): run the syscall dispatcher and
//   step `mepc` past the 4-byte `ecall`
// - Any other interrupt: logged and ignored
// - Any other exception: dump `mcause`, `mepc` and `mtval`, then halt
//
// Key structures:
// - `TrapCause`: decoded `mcause`
// - `TrapOutcome`: whether the vector should `mret` or the hart must stop
//
// Design principles:
// - `handle_trap` is generic over the timer and the syscall services so the
//   whole routing table runs in host tests
// - Only the `extern "C"` entry touches CSRs and global state
//
// Correctness and safety notes:
// - The frame pointer comes from the vector and is valid for the duration
//   of the call
// - Exceptions are fail-stop: nothing is resumed after an unexpected fault

use crate::interrupts::timer::{self, Timer};
use crate::interrupts::{tick, TrapFrame};
use crate::syscall::{self, Services};
use crate::{log_debug, log_panic, log_warn};

const LOG_ORIGIN: &str = "trap";

const INTERRUPT_BIT: usize = 1 << (usize::BITS - 1);
const MACHINE_TIMER_INTERRUPT: usize = 7;
const ECALL_FROM_U: usize = 8;
const ECALL_FROM_S: usize = 9;
const ECALL_FROM_M: usize = 11;
const ECALL_LEN: usize = 4;

const EXCEPTION_NAMES: [&str; 16] = [
    "Instruction address misaligned",
    "Instruction access fault",
    "Illegal instruction",
    "Breakpoint",
    "Load address misaligned",
    "Load access fault",
    "Store/AMO address misaligned",
    "Store/AMO access fault",
    "Environment call from U-mode",
    "Environment call from S-mode",
    "Reserved",
    "Environment call from M-mode",
    "Instruction page fault",
    "Load page fault",
    "Reserved",
    "Store/AMO page fault",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapCause {
    TimerInterrupt,
    Interrupt(usize),
    EnvironmentCall(usize),
    Exception(usize),
}

impl TrapCause {
    pub const fn from_mcause(mcause: usize) -> Self {
        let code = mcause & !INTERRUPT_BIT;

        if mcause & INTERRUPT_BIT != 0 {
            match code {
                MACHINE_TIMER_INTERRUPT => TrapCause::TimerInterrupt,
                _ => TrapCause::Interrupt(code),
            }
        } else {
            match code {
                ECALL_FROM_U | ECALL_FROM_S | ECALL_FROM_M => TrapCause::EnvironmentCall(code),
                _ => TrapCause::Exception(code),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapOutcome {
    Resume,
    Halt,
}

fn exception_name(code: usize) -> &'static str {
    EXCEPTION_NAMES.get(code).copied().unwrap_or("Unknown")
}

/// Route one trap; the caller returns with `mret` on `Resume`.
pub fn handle_trap<T: Timer, S: Services>(
    mcause: usize,
    mtval: usize,
    frame: &mut TrapFrame,
    timer: &mut T,
    sys: &mut S,
) -> TrapOutcome {
    match TrapCause::from_mcause(mcause) {
        TrapCause::TimerInterrupt => {
            tick();
            timer::arm_next(timer);
            TrapOutcome::Resume
        }
        TrapCause::Interrupt(code) => {
            log_warn!(LOG_ORIGIN, "unexpected interrupt {} ignored", code);
            TrapOutcome::Resume
        }
        TrapCause::EnvironmentCall(code) => {
            let epc = frame.epc();
            log_debug!(LOG_ORIGIN, "ecall (cause {}) at {:#x}", code, epc);

            syscall::dispatch(frame, sys);
            frame.set_epc(epc + ECALL_LEN);
            TrapOutcome::Resume
        }
        TrapCause::Exception(code) => {
            log_panic!(LOG_ORIGIN, "==================================================");
            log_panic!(LOG_ORIGIN, "unhandled exception: {}", exception_name(code));
            log_panic!(
                LOG_ORIGIN,
                "mcause={:#x} mepc={:#x} mtval={:#x}",
                mcause,
                frame.epc(),
                mtval
            );
            log_panic!(
                LOG_ORIGIN,
                "ra={:#x} sp={:#x} a0={:#x} a7={:#x}",
                frame.regs[1],
                frame.regs[TrapFrame::SP],
                frame.regs[TrapFrame::A0],
                frame.regs[TrapFrame::A7]
            );
            log_panic!(LOG_ORIGIN, "==================================================");
            TrapOutcome::Halt
        }
    }
}

/// Called by the trap vector with a pointer to the saved frame.
#[cfg(all(target_arch = "riscv64", not(test)))]
#[no_mangle]
pub extern "C" fn cinder_trap_handler(frame: &mut TrapFrame) {
    use crate::arch;
    use crate::syscall::KernelServices;

    let (mcause, _mepc, mtval) = arch::trap_state();
    let mut clint = timer::Clint::new(arch::hart_id());

    if handle_trap(mcause, mtval, frame, &mut clint, &mut KernelServices) == TrapOutcome::Halt {
        arch::halt_forever();
    }
}
