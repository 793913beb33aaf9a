//! The host terminal: the keyboard/display device behind KBSR/KBDR and the
//! TRAP service, and the raw-mode lifecycle that makes its bytes arrive
//! unbuffered and unechoed.

use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use termios::{tcsetattr, Termios};
use termios::{BRKINT, ECHO, ICANON, ICRNL, IGNBRK, IGNCR, INLCR, ISTRIP, IXON, TCSANOW};

/// The four host-facing operations the core needs: a non-blocking keyboard
/// poll, a blocking keyboard read (for the TRAPs specified to block), and
/// unbuffered writes to the display. A trait so tests can substitute an
/// in-memory sink for real stdin/stdout.
pub trait Console {
    /// A single non-blocking attempt to read one byte.
    ///
    /// Returns `None` if no byte is currently available. Unlike a
    /// poll-then-blocking-read pair, this can never consume a byte that a
    /// separate poll already observed and then lose it to a race.
    fn poll_byte(&mut self) -> Option<u8>;

    /// Blocking read of one byte. Used only by TRAPs that are specified to
    /// block (GETC, IN), never by the KBSR MMIO path.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Writes a single byte to the display.
    fn write_byte(&mut self, byte: u8);

    /// Flushes buffered display output.
    fn flush(&mut self);
}

/// Owns the real host terminal for the lifetime of a run. Puts stdin into
/// raw mode (no line buffering, no local echo) on construction and restores
/// the original mode on drop, so the mode is released on every exit path --
/// clean halt, fatal abort, or unwind -- without the caller having to
/// remember to do it.
pub struct StdConsole {
    original_termios: Termios,
}

impl StdConsole {
    /// Disables input buffering and echo on stdin, returning a guard that
    /// restores the prior terminal state when dropped.
    pub fn acquire() -> io::Result<Self> {
        let fd = io::stdin().as_raw_fd();
        let original_termios = Termios::from_fd(fd)?;

        let mut raw = original_termios;
        raw.c_iflag &= !(IGNBRK | BRKINT | ISTRIP | INLCR | IGNCR | ICRNL | IXON);
        raw.c_lflag &= !(ICANON | ECHO);
        tcsetattr(fd, TCSANOW, &raw)?;

        Ok(Self { original_termios })
    }
}

impl Console for StdConsole {
    fn poll_byte(&mut self) -> Option<u8> {
        set_nonblocking(true);
        let mut buf = [0u8; 1];
        let result = io::stdin().read(&mut buf);
        set_nonblocking(false);

        match result {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        io::stdin().read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, byte: u8) {
        let _ = io::stdout().write_all(&[byte]);
    }

    fn flush(&mut self) {
        let _ = io::stdout().flush();
    }
}

impl Drop for StdConsole {
    fn drop(&mut self) {
        let fd = io::stdin().as_raw_fd();
        let _ = tcsetattr(fd, TCSANOW, &self.original_termios);
    }
}

fn set_nonblocking(nonblocking: bool) {
    unsafe {
        let fd = io::stdin().as_raw_fd();
        let flags = libc::fcntl(fd, libc::F_GETFL);
        let flags = if nonblocking {
            flags | libc::O_NONBLOCK
        } else {
            flags & !libc::O_NONBLOCK
        };
        libc::fcntl(fd, libc::F_SETFL, flags);
    }
}

/// An in-memory stand-in for [`StdConsole`], used by tests to drive TRAP and
/// MMIO behavior without a real terminal: bytes queued in `input` are
/// consumed front-to-back, and everything the core writes lands in `output`
/// instead of the process's real stdout.
#[cfg(test)]
pub struct TestConsole {
    input: std::collections::VecDeque<u8>,
    pub output: Vec<u8>,
}

#[cfg(test)]
impl TestConsole {
    pub fn new() -> Self {
        Self {
            input: std::collections::VecDeque::new(),
            output: Vec::new(),
        }
    }

    pub fn with_input(bytes: &[u8]) -> Self {
        Self {
            input: bytes.iter().copied().collect(),
            output: Vec::new(),
        }
    }

    pub fn output_as_str(&self) -> &str {
        std::str::from_utf8(&self.output).expect("non-UTF8 test output")
    }
}

#[cfg(test)]
impl Console for TestConsole {
    fn poll_byte(&mut self) -> Option<u8> {
        self.input.pop_front()
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        self.input
            .pop_front()
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
    }

    fn write_byte(&mut self, byte: u8) {
        self.output.push(byte);
    }

    fn flush(&mut self) {}
}
