//! The built-in trap service routines.
//!
//! These run natively instead of jumping through a trap vector table in memory, so no
//! operating system image is needed to run a program.

use tracing::debug;

use crate::console::{Console, Result};
use crate::memory::{Memory, MEMORY_SIZE};
use crate::registers::{Register, Registers};

const IN_PROMPT: &[u8] = b"Enter a character: ";
const HALT_MESSAGE: &[u8] = b"HALT\n";

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapRoutine {
    /// Read a character without echo into R0
    Getc = 0x20,
    /// Write the character in R0
    Out = 0x21,
    /// Write the string at R0, one character per word
    Puts = 0x22,
    /// Prompt for a character, echo it and store it in R0
    In = 0x23,
    /// Write the string at R0, two characters per word
    Putsp = 0x24,
    /// Stop the machine
    Halt = 0x25,
}

impl TrapRoutine {
    pub const fn from_vector(vector: u8) -> Option<Self> {
        match vector {
            0x20 => Some(TrapRoutine::Getc),
            0x21 => Some(TrapRoutine::Out),
            0x22 => Some(TrapRoutine::Puts),
            0x23 => Some(TrapRoutine::In),
            0x24 => Some(TrapRoutine::Putsp),
            0x25 => Some(TrapRoutine::Halt),
            _ => None,
        }
    }

    pub const fn vector(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            TrapRoutine::Getc => "GETC",
            TrapRoutine::Out => "OUT",
            TrapRoutine::Puts => "PUTS",
            TrapRoutine::In => "IN",
            TrapRoutine::Putsp => "PUTSP",
            TrapRoutine::Halt => "HALT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapOutcome {
    Continue,
    Halt,
}

/// Words of the zero-terminated string starting at `start`, without the terminator.
/// Gives up after one lap around memory.
fn string_at(memory: &Memory, start: u16) -> impl Iterator<Item = u16> + '_ {
    (0..MEMORY_SIZE)
        .map(move |i| memory.peek(start.wrapping_add(i as u16)))
        .take_while(|&word| word != 0)
}

pub fn run<C: Console>(
    routine: TrapRoutine,
    registers: &mut Registers,
    memory: &Memory,
    console: &mut C,
) -> Result<TrapOutcome> {
    match routine {
        TrapRoutine::Getc => {
            let c = console.read_byte()?;
            registers.set_with_flags(Register::R0, u16::from(c));
        }

        TrapRoutine::Out => {
            console.write_byte(registers.get(Register::R0) as u8)?;
            console.flush()?;
        }

        TrapRoutine::Puts => {
            for word in string_at(memory, registers.get(Register::R0)) {
                console.write_byte(word as u8)?;
            }
            console.flush()?;
        }

        TrapRoutine::In => {
            console.write_all(IN_PROMPT)?;
            console.flush()?;
            let c = console.read_byte()?;
            console.write_byte(c)?;
            console.flush()?;
            registers.set_with_flags(Register::R0, u16::from(c));
        }

        TrapRoutine::Putsp => {
            for word in string_at(memory, registers.get(Register::R0)) {
                let [lo, hi] = word.to_le_bytes();
                console.write_byte(lo)?;
                if hi != 0 {
                    console.write_byte(hi)?;
                }
            }
            console.flush()?;
        }

        TrapRoutine::Halt => {
            console.write_all(HALT_MESSAGE)?;
            console.flush()?;
            debug!("HALT trap");
            return Ok(TrapOutcome::Halt);
        }
    }

    Ok(TrapOutcome::Continue)
}
