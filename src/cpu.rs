use crate::instruction::Register::*;
use crate::instruction::Instruction;
use crate::sign_extend::SignExtend;
use crate::state::{Condition, State};
use crate::trap_vector::TrapVector;
use log::{debug, trace, warn};

/// Runs the fetch/decode/execute loop until a HALT trap clears `state.running`,
/// then returns the final state. Blocks on the GETC/IN traps and on the
/// bounded KBSR poll; nothing else in this loop suspends.
pub fn run(mut state: State) -> State {
    while state.running {
        let instruction = state.fetch();
        trace!("pc={:#06x} instr={:?}", state.pc, instruction);
        state = execute(state, instruction);
    }
    state
}

/// Executes a single decoded instruction against `state`, returning the
/// (possibly mutated) state. PC is incremented here, once, before the
/// instruction's own effects are applied — matching "offsets are added to PC
/// after the fetch has already incremented it".
pub fn execute(mut state: State, instruction: Instruction) -> State {
    state.pc = state.pc.wrapping_add(1);

    match instruction {
        // BR - branch to PC + sext(pc_offset, 9) if any tested condition bit is set.
        Instruction::BR(condition, pc_offset) => {
            let taken = (condition.n && state.condition == Condition::Neg)
                || (condition.z && state.condition == Condition::Zro)
                || (condition.p && state.condition == Condition::Pos);

            if taken {
                state.pc = state.pc.wrapping_add(pc_offset.sign_extend(9));
            }
        }

        // ADD - register form: DR <- SR1 + SR2.
        Instruction::ADD(dr, sr1, sr2) => {
            let value = state.registers.read(sr1).wrapping_add(state.registers.read(sr2));
            state.registers.write(dr, value);
            state.update_flags(dr);
        }

        // ADD - immediate form: DR <- SR1 + sext(imm5, 5).
        Instruction::ADDIMM(dr, sr1, immediate) => {
            let value = state.registers.read(sr1).wrapping_add(immediate.sign_extend(5));
            state.registers.write(dr, value);
            state.update_flags(dr);
        }

        // LD - DR <- mem[PC + sext(pc_offset, 9)].
        Instruction::LD(dr, pc_offset) => {
            let address = state.pc.wrapping_add(pc_offset.sign_extend(9));
            let value = state.memory.read(address, state.terminal.as_ref());

            state.registers.write(dr, value);
            state.update_flags(dr);
        }

        // ST - mem[PC + sext(pc_offset, 9)] <- SR.
        Instruction::ST(sr, pc_offset) => {
            let address = state.pc.wrapping_add(pc_offset.sign_extend(9));
            state.memory.write(address, state.registers.read(sr));
        }

        // JSR - R7 <- PC; PC <- PC + sext(pc_offset, 11).
        Instruction::JSR(pc_offset) => {
            let link = state.pc;
            state.pc = state.pc.wrapping_add(pc_offset.sign_extend(11));
            state.registers.write(R7, link);
        }

        // JSRR - R7 <- PC; PC <- reg[BaseR].
        Instruction::JSRR(base_r) => {
            let link = state.pc;
            state.pc = state.registers.read(base_r);
            state.registers.write(R7, link);
        }

        // AND - register form: DR <- SR1 & SR2.
        Instruction::AND(dr, sr1, sr2) => {
            let value = state.registers.read(sr1) & state.registers.read(sr2);
            state.registers.write(dr, value);
            state.update_flags(dr);
        }

        // AND - immediate form: DR <- SR1 & sext(imm5, 5).
        Instruction::ANDIMM(dr, sr1, immediate) => {
            let value = state.registers.read(sr1) & immediate.sign_extend(5);
            state.registers.write(dr, value);
            state.update_flags(dr);
        }

        // LDR - DR <- mem[reg[BaseR] + sext(offset, 6)].
        Instruction::LDR(dr, base_r, offset) => {
            let address = state.registers.read(base_r).wrapping_add(offset.sign_extend(6));
            let value = state.memory.read(address, state.terminal.as_ref());

            state.registers.write(dr, value);
            state.update_flags(dr);
        }

        // STR - mem[reg[BaseR] + sext(offset, 6)] <- SR.
        Instruction::STR(sr, base_r, offset) => {
            let address = state.registers.read(base_r).wrapping_add(offset.sign_extend(6));
            state.memory.write(address, state.registers.read(sr));
        }

        // NOT - DR <- !SR.
        Instruction::NOT(dr, sr) => {
            state.registers.write(dr, !state.registers.read(sr));
            state.update_flags(dr);
        }

        // LDI - DR <- mem[mem[PC + sext(pc_offset, 9)]]. Two memory accesses,
        // both MMIO-aware, so a pointer that happens to live at KBSR is
        // observed consistently with a direct load of KBSR.
        Instruction::LDI(dr, pc_offset) => {
            let pointer_address = state.pc.wrapping_add(pc_offset.sign_extend(9));
            let address = state.memory.read(pointer_address, state.terminal.as_ref());
            let value = state.memory.read(address, state.terminal.as_ref());

            state.registers.write(dr, value);
            state.update_flags(dr);
        }

        // STI - mem[mem[PC + sext(pc_offset, 9)]] <- SR.
        Instruction::STI(sr, pc_offset) => {
            let pointer_address = state.pc.wrapping_add(pc_offset.sign_extend(9));
            let address = state.memory.read(pointer_address, state.terminal.as_ref());

            state.memory.write(address, state.registers.read(sr));
        }

        // JMP - PC <- reg[BaseR]. RET is the special case BaseR = R7.
        Instruction::JMP(base_r) => {
            state.pc = state.registers.read(base_r);
        }

        // LEA - DR <- PC + sext(pc_offset, 9). Flags are updated here too:
        // that's the original LC-3 behavior, not a bug to "fix".
        Instruction::LEA(dr, pc_offset) => {
            let address = state.pc.wrapping_add(pc_offset.sign_extend(9));
            state.registers.write(dr, address);
            state.update_flags(dr);
        }

        Instruction::TRAP(trap_vector) => {
            let link = state.pc;
            state.registers.write(R7, link);
            state = dispatch_trap(state, trap_vector);
        }

        Instruction::Illegal(raw) => {
            panic!("illegal opcode {:#06x} (RTI/RES are not supported)", raw);
        }
    }

    state
}

fn dispatch_trap(mut state: State, trap_vector: TrapVector) -> State {
    debug!("trap {:?}", trap_vector);

    match trap_vector {
        // GETC - R0 <- next char from the terminal, no echo, no prompt.
        TrapVector::GETC => {
            let byte = state.terminal.read_char();
            state.registers.write(R0, u16::from(byte));
            state.update_flags(R0);
        }

        // OUT - write R0's low byte to stdout.
        TrapVector::OUT => {
            let byte = state.registers.read(R0) as u8;
            state.terminal.write_char(byte);
        }

        // PUTS - write one byte per word starting at R0 until a zero word.
        TrapVector::PUTS => {
            let mut address = state.registers.read(R0);

            loop {
                let word = state.memory.read(address, state.terminal.as_ref());
                if word == 0 {
                    break;
                }
                state.terminal.write_char(word as u8);
                address = address.wrapping_add(1);
            }
        }

        // IN - prompt, read and echo one character, R0 <- that character.
        TrapVector::IN => {
            for byte in b"Enter a character: " {
                state.terminal.write_char(*byte);
            }

            let byte = state.terminal.read_char();
            state.terminal.write_char(byte);

            state.registers.write(R0, u16::from(byte));
            state.update_flags(R0);
        }

        // PUTSP - two characters per word (low byte, then high byte if nonzero).
        TrapVector::PUTSP => {
            let mut address = state.registers.read(R0);

            loop {
                let word = state.memory.read(address, state.terminal.as_ref());
                if word == 0 {
                    break;
                }

                state.terminal.write_char((word & 0xff) as u8);
                let high = (word >> 8) as u8;
                if high != 0 {
                    state.terminal.write_char(high);
                }

                address = address.wrapping_add(1);
            }
        }

        // HALT - print "HALT", stop the loop.
        TrapVector::HALT => {
            for byte in b"HALT\n" {
                state.terminal.write_char(*byte);
            }
            state.running = false;
        }

        // Unrecognized trap vectors are silent no-ops (logged, not fatal).
        TrapVector::Unknown(vector) => {
            warn!("unrecognized trap vector {:#04x}, ignoring", vector);
        }
    }

    state
}
