//! The machine's view of the controlling terminal: raw-mode toggling, a
//! non-blocking "is a key waiting?" poll, and blocking single-byte read/write.
//!
//! The instruction-execution core only ever talks to a `&dyn TerminalAdapter`,
//! never to termios/libc directly, so the MMIO keyboard registers and the GETC/
//! IN/OUT/PUTS/PUTSP traps stay testable without a real tty (see `FakeTerminal`
//! in the integration tests).

use libc::STDIN_FILENO;
use nix::sys::select::{select, FdSet};
use nix::sys::termios::{tcgetattr, tcsetattr, LocalFlags, SetArg, Termios};
use nix::sys::time::{TimeVal, TimeValLike};
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

/// Process exit code used when the interrupt handler fires (SIGINT-equivalent).
pub const INTERRUPT_EXIT_CODE: i32 = -2;

pub trait TerminalAdapter {
    /// Put the controlling terminal into no-echo, no-line-buffering mode.
    fn enable_raw_mode(&self) -> io::Result<()>;

    /// Restore whatever mode was in effect before `enable_raw_mode`.
    fn restore_mode(&self) -> io::Result<()>;

    /// Non-blocking (bounded-wait) check for at least one byte of pending stdin.
    fn key_available(&self) -> bool;

    /// Blocking read of one byte from stdin.
    fn read_char(&self) -> u8;

    /// Blocking write of one byte to stdout, flushed immediately.
    fn write_char(&self, byte: u8);
}

/// POSIX terminal adapter built on `termios`/`nix`/`libc`. This is the only
/// backend shipped: the reference dependency stack (`nix`, `libc`) targets
/// Unix, so a Windows console backend is left as a second `TerminalAdapter`
/// implementation for a future platform port rather than built speculatively
/// here (see DESIGN.md).
pub struct PosixTerminal {
    original: Mutex<Option<Termios>>,
}

impl PosixTerminal {
    pub fn new() -> Self {
        PosixTerminal {
            original: Mutex::new(None),
        }
    }
}

impl Default for PosixTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalAdapter for PosixTerminal {
    fn enable_raw_mode(&self) -> io::Result<()> {
        let mut termios = tcgetattr(STDIN_FILENO).map_err(to_io_error)?;
        *self.original.lock().unwrap() = Some(termios.clone());

        termios.local_flags &= !(LocalFlags::ICANON | LocalFlags::ECHO);
        tcsetattr(STDIN_FILENO, SetArg::TCSANOW, &termios).map_err(to_io_error)
    }

    fn restore_mode(&self) -> io::Result<()> {
        if let Some(termios) = self.original.lock().unwrap().as_ref() {
            tcsetattr(STDIN_FILENO, SetArg::TCSANOW, termios).map_err(to_io_error)?;
        }
        Ok(())
    }

    fn key_available(&self) -> bool {
        let mut readfds = FdSet::new();
        readfds.insert(STDIN_FILENO);

        match select(None, &mut readfds, None, None, &mut TimeVal::zero()) {
            Ok(n) => n == 1,
            Err(_) => false,
        }
    }

    fn read_char(&self) -> u8 {
        let mut buffer = [0u8; 1];
        // EOF surfaces as the byte the buffer already held (0), matching the
        // "EOF is not a separate error" policy for program-visible reads.
        let _ = io::stdin().read_exact(&mut buffer);
        buffer[0]
    }

    fn write_char(&self, byte: u8) {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(&[byte]);
        let _ = stdout.flush();
    }
}

fn to_io_error(err: nix::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

/// Restores terminal mode, writes a newline, and exits with `INTERRUPT_EXIT_CODE`.
/// Installed once at startup; the handler runs on its own thread and never
/// returns control to the CPU loop.
pub fn install_interrupt_handler(terminal: Arc<PosixTerminal>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        let _ = terminal.restore_mode();
        println!();
        std::process::exit(INTERRUPT_EXIT_CODE);
    })
}
