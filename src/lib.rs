mod config;
mod cpu;
mod error;
pub mod instruction;
mod loader;
mod sign_extend;
pub mod state;
pub mod terminal;
pub mod trap_vector;

pub use crate::config::Config;
pub use crate::error::VmError;
pub use crate::instruction::{Instruction, Register};
pub use crate::state::{Condition, State};
pub use crate::terminal::{install_interrupt_handler, PosixTerminal, TerminalAdapter};
pub use crate::trap_vector::TrapVector;

use std::io;
use std::path::Path;
use std::sync::Arc;
use log::{info, warn};

/// Loads every image named in `config`, builds a fresh machine around a real
/// POSIX terminal, installs the Ctrl-C handler, and runs the fetch/decode/
/// execute loop until HALT. Returns once the machine halts; the interrupt
/// handler exits the process directly and never returns here.
pub fn run(config: Config) -> Result<(), VmError> {
    let posix_terminal = Arc::new(PosixTerminal::new());
    install_interrupt_handler(posix_terminal.clone()).map_err(|err| VmError::Io(to_io_error(err)))?;

    run_to_completion(&config.images, posix_terminal).map(|_| ())
}

/// Loads `images` in order onto a fresh machine built around `terminal` and
/// runs it to completion (HALT), restoring the terminal's original mode
/// before returning. This is the entry point integration tests drive
/// directly, with a fake `TerminalAdapter` standing in for a real tty.
pub fn run_to_completion(
    images: &[impl AsRef<Path>],
    terminal: Arc<dyn TerminalAdapter>,
) -> Result<State, VmError> {
    let mut state = State::new(terminal);

    for path in images {
        loader::load_image(&mut state, path.as_ref())?;
        info!("loaded image {}", path.as_ref().display());
    }

    state.terminal.enable_raw_mode()?;
    let state = cpu::run(state);

    if let Err(err) = state.terminal.restore_mode() {
        warn!("failed to restore terminal mode: {}", err);
    }

    Ok(state)
}

fn to_io_error(err: ctrlc::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}
