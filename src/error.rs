use std::io;

use thiserror::Error;

/// Failure of the character device backing the trap routines and the keyboard registers.
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("console i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("input ended while waiting for a character")]
    EndOfInput,

    #[error("interrupted by the operator")]
    Interrupted,
}

/// A condition that stops the machine for good. The machine enters the faulted state and
/// never executes another instruction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error("unimplemented opcode RTI ({instruction:#06x}) at {addr:#06x}")]
    UnimplementedOpcode { addr: u16, instruction: u16 },

    #[error("reserved opcode ({instruction:#06x}) at {addr:#06x}")]
    ReservedOpcode { addr: u16, instruction: u16 },

    #[error("undefined trap vector {vector:#04x} at {addr:#06x}")]
    UndefinedTrap { addr: u16, vector: u8 },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("image is too short to hold an origin word")]
    MissingOrigin,

    #[error("failed to read image: {0}")]
    Io(#[from] io::Error),
}
