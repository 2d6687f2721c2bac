use std::io::Read;

use tracing::{debug, trace};

use crate::console::Console;
use crate::error::{ConsoleError, Fault, LoadError};
use crate::instruction::{Instruction, Operand};
use crate::loader::{self, LoadedImage};
use crate::memory::Memory;
use crate::registers::{Register, Registers};
use crate::trap::{self, TrapOutcome, TrapRoutine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Running,
    /// Stopped by the HALT trap
    Halted,
    /// Stopped by an instruction the machine cannot execute
    Faulted(Fault),
}

/// A complete LC-3 machine: memory, registers and the console its traps talk to.
pub struct Emulator<C> {
    registers: Registers,
    memory: Memory,
    console: C,
    state: State,
    steps: u64,
}

impl<C: Console> Emulator<C> {
    pub fn new(console: C) -> Self {
        Self::with_memory(Memory::new(), console)
    }

    /// Starts a machine on already populated memory, with PC at 0x3000 and the Z flag set.
    pub fn with_memory(memory: Memory, console: C) -> Self {
        Emulator {
            registers: Registers::new(),
            memory,
            console,
            state: State::Running,
            steps: 0,
        }
    }

    pub fn load_image<R: Read>(&mut self, reader: R) -> Result<LoadedImage, LoadError> {
        loader::read_image(reader, &mut self.memory)
    }

    pub fn load_words(&mut self, origin: u16, words: &[u16]) -> usize {
        self.memory.load(origin, words)
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn into_console(self) -> C {
        self.console
    }

    /// Number of instructions fetched so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn read(&mut self, addr: u16) -> Result<u16, ConsoleError> {
        self.memory.read(addr, &mut self.console)
    }

    fn operand(&self, operand: Operand) -> u16 {
        match operand {
            Operand::Register(reg) => self.registers.get(reg),
            Operand::Immediate(imm) => imm as u16,
        }
    }

    fn pc_relative(&self, offset: i16) -> u16 {
        self.registers.pc.wrapping_add(offset as u16)
    }

    fn base_relative(&self, base_r: Register, offset: i16) -> u16 {
        self.registers.get(base_r).wrapping_add(offset as u16)
    }

    fn fault(&mut self, fault: Fault) {
        debug!(%fault, "Machine faulted");
        self.state = State::Faulted(fault);
    }

    /// Executes one decoded instruction. `addr` is where it was fetched from; PC already
    /// points past it.
    fn execute(&mut self, addr: u16, word: u16, instruction: Instruction) -> Result<(), ConsoleError> {
        let result = match instruction {
            Instruction::Add { dr, sr1, sr2 } => Some((
                dr,
                self.registers.get(sr1).wrapping_add(self.operand(sr2)),
            )),
            Instruction::And { dr, sr1, sr2 } => {
                Some((dr, self.registers.get(sr1) & self.operand(sr2)))
            }
            Instruction::Not { dr, sr } => Some((dr, !self.registers.get(sr))),

            // load effective address: just the address
            Instruction::Lea { dr, pc_offset } => Some((dr, self.pc_relative(pc_offset))),
            Instruction::Ld { dr, pc_offset } => {
                let value = self.read(self.pc_relative(pc_offset))?;
                Some((dr, value))
            }
            Instruction::Ldi { dr, pc_offset } => {
                let indirect_addr = self.read(self.pc_relative(pc_offset))?;
                let value = self.read(indirect_addr)?;
                Some((dr, value))
            }
            Instruction::Ldr { dr, base_r, offset } => {
                let value = self.read(self.base_relative(base_r, offset))?;
                Some((dr, value))
            }

            Instruction::St { sr, pc_offset } => {
                self.memory
                    .write(self.pc_relative(pc_offset), self.registers.get(sr));
                None
            }
            Instruction::Sti { sr, pc_offset } => {
                let indirect_addr = self.read(self.pc_relative(pc_offset))?;
                self.memory.write(indirect_addr, self.registers.get(sr));
                None
            }
            Instruction::Str { sr, base_r, offset } => {
                self.memory
                    .write(self.base_relative(base_r, offset), self.registers.get(sr));
                None
            }

            Instruction::Br { nzp, pc_offset } => {
                if nzp & self.registers.cond.bits() != 0 {
                    self.registers.pc = self.pc_relative(pc_offset);
                }
                None
            }
            Instruction::Jmp { base_r } => {
                self.registers.pc = self.registers.get(base_r);
                None
            }
            Instruction::Jsr { pc_offset } => {
                let old_pc = self.registers.pc;
                self.registers.pc = self.pc_relative(pc_offset);
                self.registers.set(Register::R7, old_pc);
                None
            }
            Instruction::Jsrr { base_r } => {
                let old_pc = self.registers.pc;
                // Read the target before R7 is overwritten, JSRR R7 must jump to the old R7
                self.registers.pc = self.registers.get(base_r);
                self.registers.set(Register::R7, old_pc);
                None
            }

            Instruction::Trap { vector } => {
                let Some(routine) = TrapRoutine::from_vector(vector) else {
                    self.fault(Fault::UndefinedTrap { addr, vector });
                    return Ok(());
                };
                self.registers.set(Register::R7, self.registers.pc);
                let outcome =
                    trap::run(routine, &mut self.registers, &self.memory, &mut self.console)?;
                if outcome == TrapOutcome::Halt {
                    self.state = State::Halted;
                }
                None
            }

            Instruction::Rti => {
                self.fault(Fault::UnimplementedOpcode {
                    addr,
                    instruction: word,
                });
                None
            }
            Instruction::Reserved => {
                self.fault(Fault::ReservedOpcode {
                    addr,
                    instruction: word,
                });
                None
            }
        };

        if let Some((dr, value)) = result {
            self.registers.set_with_flags(dr, value);
        }
        Ok(())
    }

    /// Fetches, decodes and executes a single instruction.
    ///
    /// Once the machine has halted or faulted this does nothing and keeps returning the
    /// final state.
    ///
    /// A console error leaves the machine as it was before the instruction, still running
    /// and with PC on the failed instruction, so stepping again retries it.
    pub fn step(&mut self) -> Result<&State, ConsoleError> {
        if self.state != State::Running {
            return Ok(&self.state);
        }

        let addr = self.registers.pc;
        let word = self.read(addr)?;
        self.registers.pc = addr.wrapping_add(1);
        self.steps += 1;

        let instruction = Instruction::decode(word);
        trace!(
            pc = format_args!("{addr:#06x}"),
            word = format_args!("{word:#06x}"),
            "{instruction}"
        );
        // Handlers only fail on console reads, before they store anything but R7
        let saved_r7 = self.registers.get(Register::R7);
        if let Err(e) = self.execute(addr, word, instruction) {
            self.registers.pc = addr;
            self.registers.set(Register::R7, saved_r7);
            self.steps -= 1;
            return Err(e);
        }
        Ok(&self.state)
    }

    /// Steps until the machine halts or faults.
    pub fn run(&mut self) -> Result<&State, ConsoleError> {
        while self.state == State::Running {
            self.step()?;
        }
        debug!(steps = self.steps, registers = ?self.registers, "Machine stopped");
        Ok(&self.state)
    }
}
