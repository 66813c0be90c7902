// Console (Kernel Character Output)
//
// Byte-oriented console on top of the NS16550 UART of the QEMU `virt`
// machine. This is the ground-truth sink for the log subsystem and the
// target of `write` on descriptors 1 and 2.
//
// Key responsibilities:
// - Initialize the UART through the `uart_16550` MMIO driver
// - Provide byte, string and `fmt::Arguments` output
// - ANSI helpers for colored text and screen control
// - `console_print!` / `console_println!` macros
//
// Implementation details:
// - The port lives in a `spin::Mutex<Option<_>>`; output before `init()`
//   is dropped
// - Newlines are normalized to CRLF for terminal compatibility
// - `_print` runs with machine interrupts disabled so trap-context output
//   never deadlocks against an interrupted writer
// - Host test builds route output to stdout instead of MMIO
//
// Limitations:
// - Output-only: no console input

use core::fmt;

use crate::util::without_interrupts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
    White,
    DarkGray,
    LightRed,
    LightGreen,
    LightBlue,
}

impl Color {
    pub const RESET: &'static str = "\x1b[0m";

    pub const fn ansi(&self) -> &'static str {
        match self {
            Color::Black => "\x1b[30m",
            Color::Red => "\x1b[31m",
            Color::Green => "\x1b[32m",
            Color::Yellow => "\x1b[33m",
            Color::Blue => "\x1b[34m",
            Color::Cyan => "\x1b[36m",
            Color::White => "\x1b[37m",
            Color::DarkGray => "\x1b[90m",
            Color::LightRed => "\x1b[91m",
            Color::LightGreen => "\x1b[92m",
            Color::LightBlue => "\x1b[94m",
        }
    }
}

#[cfg(all(target_arch = "riscv64", not(test)))]
mod backend {
    use spin::Mutex;
    use uart_16550::MmioSerialPort;

    use crate::config::UART0;

    static UART: Mutex<Option<MmioSerialPort>> = Mutex::new(None);

    pub fn init() {
        // UART0 is the 16550 register block on QEMU virt.
        let mut port = unsafe { MmioSerialPort::new(UART0) };
        port.init();
        *UART.lock() = Some(port);
    }

    pub fn write_bytes(bytes: &[u8]) {
        if let Some(port) = UART.lock().as_mut() {
            for &byte in bytes {
                if byte == b'\n' {
                    port.send(b'\r');
                }
                port.send(byte);
            }
        }
    }
}


#[cfg(all(not(target_arch = "riscv64"), not(test)))]
mod backend {
    pub fn init() {}

    pub fn write_bytes(_bytes: &[u8]) {}
}

struct ConsoleWriter;

impl fmt::Write for ConsoleWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        backend::write_bytes(s.as_bytes());
        Ok(())
    }
}

pub fn init() {
    backend::init();
}

/// Raw bytes, not required to be UTF-8.
pub fn write_bytes(bytes: &[u8]) {
    without_interrupts(|| backend::write_bytes(bytes));
}

pub fn write_colored(text: &str, color: Color) {
    _print(format_args!("{}{}{}", color.ansi(), text, Color::RESET));
}

pub fn clear_screen() {
    write_bytes(b"\x1b[2J\x1b[H");
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    use core::fmt::Write;

    without_interrupts(|| {
        let _ = ConsoleWriter.write_fmt(args);
    });
}

#[macro_export]
macro_rules! console_print {
    ($($arg:tt)*) => ($crate::console::_print(format_args!($($arg)*)));
}

#[macro_export]
macro_rules! console_println {
    () => ($crate::console_print!("\n"));
    ($($arg:tt)*) => ($crate::console_print!("{}\n", format_args!($($arg)*)));
}
