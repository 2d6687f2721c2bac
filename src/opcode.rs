use crate::bit_twiddling::get_bits;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Br = 0,
    Add = 1,
    Ld = 2,
    St = 3,
    Jsr = 4,
    And = 5,
    Ldr = 6,
    Str = 7,
    Rti = 8,
    Not = 9,
    Ldi = 10,
    Sti = 11,
    Jmp = 12, // also RET
    Reserved = 13,
    Lea = 14,
    Trap = 15,
}

impl Opcode {
    /// Opcode of an instruction word, taken from bits `[15:12]`. Every word has one.
    pub const fn of(instruction: u16) -> Self {
        Self::from_int(get_bits::<12, 15>(instruction) as u8)
    }

    /// Only the low nibble of `i` is considered.
    pub const fn from_int(i: u8) -> Self {
        match i & 0xF {
            0 => Opcode::Br,
            1 => Opcode::Add,
            2 => Opcode::Ld,
            3 => Opcode::St,
            4 => Opcode::Jsr,
            5 => Opcode::And,
            6 => Opcode::Ldr,
            7 => Opcode::Str,
            8 => Opcode::Rti,
            9 => Opcode::Not,
            10 => Opcode::Ldi,
            11 => Opcode::Sti,
            12 => Opcode::Jmp,
            13 => Opcode::Reserved,
            14 => Opcode::Lea,
            _ => Opcode::Trap,
        }
    }

    pub const fn to_int(self) -> u16 {
        self as u16
    }
}
