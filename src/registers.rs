use std::fmt;

/// Address the PC is reset to before a program runs.
pub const PC_START: u16 = 0x3000;

/// One of the eight general purpose registers, R0 through R7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register(u8);

impl Register {
    pub const R0: Register = Register(0);
    pub const R7: Register = Register(7);

    /// Builds a register from a 3-bit instruction field; higher bits are dropped.
    pub const fn from_field(field: u16) -> Self {
        Register((field & 0b111) as u8)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Condition code. Exactly one of N, Z or P is set at any time.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Positive = 0b001,
    Zero = 0b010,
    Negative = 0b100,
}

impl Condition {
    /// Condition of a result word read as two's complement.
    pub const fn of(value: u16) -> Self {
        if value == 0 {
            Condition::Zero
        } else if value & 0x8000 != 0 {
            Condition::Negative
        } else {
            Condition::Positive
        }
    }

    /// The `nzp` bit pattern as used by BR masks.
    pub const fn bits(self) -> u16 {
        self as u16
    }
}

pub struct Registers {
    /// R0 through R7
    gpr: [u16; 8],
    /// Program counter
    pub pc: u16,
    /// Condition code, updated by every instruction that writes a result register
    pub cond: Condition,
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            gpr: [0; 8],
            pc: PC_START,
            cond: Condition::Zero,
        }
    }

    pub fn get(&self, reg: Register) -> u16 {
        self.gpr[reg.index()]
    }

    /// Writes a register without touching the condition code.
    pub fn set(&mut self, reg: Register, value: u16) {
        self.gpr[reg.index()] = value;
    }

    /// Writes a result register and recomputes the condition code from it.
    pub fn set_with_flags(&mut self, reg: Register, value: u16) {
        self.set(reg, value);
        self.cond = Condition::of(value);
    }

    pub fn general(&self) -> &[u16; 8] {
        &self.gpr
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.gpr.iter().enumerate() {
            write!(f, "R{i}={value:#06x} ")?;
        }
        write!(f, "PC={:#06x} COND={:?}", self.pc, self.cond)
    }
}
