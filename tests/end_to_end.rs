use lc3vm::instruction::Register;
use lc3vm::state::Condition;
use lc3vm::terminal::TerminalAdapter;
use lc3vm::{run_to_completion, State};

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A `TerminalAdapter` for the integration suite: a scripted input queue and
/// a captured output buffer, with no real tty involved. Mirrors the crate's
/// own unit-test fake, but lives here because `tests/` compiles as a
/// separate crate from `src/` and can't see its `#[cfg(test)]` items.
#[derive(Default)]
struct FakeTerminal {
    input: Mutex<VecDeque<u8>>,
    output: Mutex<Vec<u8>>,
    raw_mode: AtomicBool,
}

impl FakeTerminal {
    fn with_input(bytes: &[u8]) -> Self {
        FakeTerminal {
            input: Mutex::new(bytes.iter().copied().collect()),
            output: Mutex::new(Vec::new()),
            raw_mode: AtomicBool::new(false),
        }
    }

    fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output.lock().unwrap()).into_owned()
    }

    fn is_raw(&self) -> bool {
        self.raw_mode.load(Ordering::SeqCst)
    }
}

impl TerminalAdapter for FakeTerminal {
    fn enable_raw_mode(&self) -> io::Result<()> {
        self.raw_mode.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn restore_mode(&self) -> io::Result<()> {
        self.raw_mode.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn key_available(&self) -> bool {
        !self.input.lock().unwrap().is_empty()
    }

    fn read_char(&self) -> u8 {
        self.input.lock().unwrap().pop_front().unwrap_or(0)
    }

    fn write_char(&self, byte: u8) {
        self.output.lock().unwrap().push(byte);
    }
}

/// Writes `words` as a big-endian LC-3 object image (origin first) to a temp
/// file and returns it, keeping the handle alive for the caller.
fn image(words: &[u16]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for word in words {
        file.write_all(&word.to_be_bytes()).unwrap();
    }
    file.flush().unwrap();
    file
}

fn run(words: &[u16]) -> (State, Arc<FakeTerminal>) {
    run_with_input(words, b"")
}

fn run_with_input(words: &[u16], input: &[u8]) -> (State, Arc<FakeTerminal>) {
    let file = image(words);
    let terminal = Arc::new(FakeTerminal::with_input(input));

    let state = run_to_completion(&[file.path()], terminal.clone()).unwrap();
    (state, terminal)
}

#[test]
fn immediate_add_and_halt() {
    let (state, terminal) = run(&[0x3000, 0x1025, 0xF025]);

    assert_eq!(state.registers.read(Register::R0), 0x0005);
    assert_eq!(state.condition, Condition::Pos);
    assert_eq!(terminal.output_string(), "HALT\n");
}

#[test]
fn terminal_mode_is_restored_after_a_normal_halt() {
    let (_state, terminal) = run(&[0x3000, 0xF025]);

    assert!(!terminal.is_raw());
}

#[test]
fn negative_immediate_sets_neg() {
    let (state, _terminal) = run(&[0x3000, 0x103F, 0xF025]);

    assert_eq!(state.registers.read(Register::R0), 0xFFFF);
    assert_eq!(state.condition, Condition::Neg);
}

#[test]
fn lea_then_puts() {
    let (_state, terminal) = run(&[
        0x3000, 0xE002, 0xF022, 0xF025, 0x0048, 0x0069, 0x0000,
    ]);

    assert_eq!(terminal.output_string(), "Hi".to_string() + "HALT\n");
}

#[test]
fn ldi_via_pointer() {
    let (state, _terminal) = run(&[
        0x3000, 0xA002, 0xF025, 0x0000, 0x3005, 0x0000, 0x1234,
    ]);

    assert_eq!(state.registers.read(Register::R0), 0x1234);
    assert_eq!(state.condition, Condition::Pos);
}

#[test]
fn br_taken_on_zro() {
    let (state, _terminal) = run(&[
        0x3000, 0x5020, 0x0401, 0xF025, 0x1023, 0xF025,
    ]);

    assert_eq!(state.registers.read(Register::R0), 0x0003);
    assert_eq!(state.condition, Condition::Pos);
}

#[test]
fn jsr_linkage() {
    let (state, _terminal) = run(&[
        0x3000, 0x4802, 0xF025, 0x0000, 0x1025, 0xC1C0,
    ]);

    assert_eq!(state.registers.read(Register::R0), 0x0005);
    assert_eq!(state.registers.read(Register::R7), 0x3001);
}

#[test]
fn getc_reads_without_echo() {
    let (state, terminal) = run_with_input(&[0x3000, 0xF020, 0xF025], b"q");

    assert_eq!(state.registers.read(Register::R0), u16::from(b'q'));
    assert_eq!(terminal.output_string(), "HALT\n");
}

#[test]
fn in_prompts_and_echoes() {
    let (state, terminal) = run_with_input(&[0x3000, 0xF023, 0xF025], b"q");

    assert_eq!(state.registers.read(Register::R0), u16::from(b'q'));
    assert_eq!(terminal.output_string(), "Enter a character: qHALT\n");
}

#[test]
fn multiple_images_load_in_order_and_overlap_wins_with_the_later_one() {
    let first = image(&[0x3000, 0x1111, 0x1111]);
    let second = image(&[0x3000, 0x1025, 0xF025]);
    let terminal = Arc::new(FakeTerminal::default());

    let state = run_to_completion(&[first.path(), second.path()], terminal).unwrap();

    assert_eq!(state.registers.read(Register::R0), 0x0005);
}
