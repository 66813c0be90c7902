// Kernel Logging Subsystem
//
// Structured, leveled log output for bring-up and diagnostics. Every entry
// carries a tick-derived timestamp, a severity and the subsystem origin.
//
// Key responsibilities:
// - Provide standardized log levels (Debug, Info, Warn, Error, Panic)
// - Attach timestamps and subsystem origin to every log entry
// - Include source location only for DEBUG entries (file:line)
// - Color the severity tag with ANSI escapes on the console
//
// Implementation details:
// - The active level is an atomic, so filtering needs no lock
// - Timestamps are derived from timer ticks (coarse but monotonic)
// - Output goes through `console::_print`; host test builds print to stdout
//
// Developer ergonomics:
// - Convenience macros (`log_debug!`, `log_info!`, etc.) wrap `_log`
// - Macros automatically capture `file!()` and `line!()` for debug context
//
// Correctness notes:
// - Safe to call from trap context: the console lock is taken with machine
//   interrupts disabled
// - Before the timer is armed every entry reports t=0.000s

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::config::{TICK_INTERVAL, TIMEBASE_HZ};
use crate::console::{self, Color};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Panic = 4,
}

impl LogLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO ",
            LogLevel::Warn => "WARN ",
            LogLevel::Error => "ERROR",
            LogLevel::Panic => "PANIC",
        }
    }

    pub const fn color(&self) -> Color {
        match self {
            LogLevel::Debug => Color::DarkGray,
            LogLevel::Info => Color::White,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::LightRed,
            LogLevel::Panic => Color::Red,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            _ => LogLevel::Panic,
        }
    }
}

static CURRENT_LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

pub fn init() {
    set_level(crate::config::DEFAULT_LOG_LEVEL);
}

pub fn set_level(level: LogLevel) {
    CURRENT_LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn get_level() -> LogLevel {
    LogLevel::from_u8(CURRENT_LOG_LEVEL.load(Ordering::Relaxed))
}

fn get_timestamp_ms() -> u64 {
    let ticks = crate::interrupts::get_ticks();
    ticks * (TICK_INTERVAL * 1000 / TIMEBASE_HZ)
}

fn format_timestamp(ms: u64) -> (u64, u64) {
    (ms / 1000, ms % 1000)
}

pub fn _log(level: LogLevel, origin: &str, args: fmt::Arguments, file: &str, line: u32) {
    if level < get_level() {
        return;
    }

    let (seconds, milliseconds) = format_timestamp(get_timestamp_ms());

    if level == LogLevel::Debug {
        console::_print(format_args!(
            "[t={}.{:03}s] [{}{}{}] [{}] {} ({}:{})\n",
            seconds,
            milliseconds,
            level.color().ansi(),
            level.as_str(),
            Color::RESET,
            origin,
            args,
            file,
            line
        ));
    } else {
        console::_print(format_args!(
            "[t={}.{:03}s] [{}{}{}] [{}] {}\n",
            seconds,
            milliseconds,
            level.color().ansi(),
            level.as_str(),
            Color::RESET,
            origin,
            args
        ));
    }
}

#[macro_export]
macro_rules! log_debug {
    ($origin:expr, $($arg:tt)*) => {
        $crate::log::_log(
            $crate::log::LogLevel::Debug,
            $origin,
            format_args!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($origin:expr, $($arg:tt)*) => {
        $crate::log::_log(
            $crate::log::LogLevel::Info,
            $origin,
            format_args!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[macro_export]
macro_rules! log_warn {
    ($origin:expr, $($arg:tt)*) => {
        $crate::log::_log(
            $crate::log::LogLevel::Warn,
            $origin,
            format_args!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[macro_export]
macro_rules! log_error {
    ($origin:expr, $($arg:tt)*) => {
        $crate::log::_log(
            $crate::log::LogLevel::Error,
            $origin,
            format_args!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[macro_export]
macro_rules! log_panic {
    ($origin:expr, $($arg:tt)*) => {
        $crate::log::_log(
            $crate::log::LogLevel::Panic,
            $origin,
            format_args!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_round_trip_through_the_atomic() {
        for level in [
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Panic,
        ] {
            assert_eq!(LogLevel::from_u8(level as u8), level);
        }
    }

    #[test]
    fn timestamp_splits_seconds_and_millis() {
        assert_eq!(format_timestamp(12_345), (12, 345));
        assert_eq!(format_timestamp(0), (0, 0));
    }

    #[test]
    fn severity_orders_from_debug_to_panic() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Error < LogLevel::Panic);
    }
}
