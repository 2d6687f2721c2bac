//! An interpreter for the LC-3 educational instruction set.
//!
//! [`emulator::Emulator`] owns the machine state and runs programs loaded with
//! [`loader`]. All character I/O goes through a [`console::Console`].

pub mod bit_twiddling;
pub mod console;
pub mod disasm;
pub mod emulator;
pub mod error;
pub mod instruction;
pub mod loader;
pub mod memory;
pub mod opcode;
pub mod registers;
pub mod trap;

pub use console::{ChannelConsole, Console, StreamConsole, Terminal};
pub use emulator::{Emulator, State};
pub use error::{ConsoleError, Fault, LoadError};
