//! Typed decoding of instruction words.
//!
//! Every 16-bit word decodes to exactly one [`Instruction`]; the fields each
//! variant carries are already extracted and sign-extended, so execution never
//! has to look at raw bit positions again.

use crate::bit_twiddling::*;
use crate::opcode::Opcode;
use crate::registers::Register;

/// Second source operand of ADD and AND, selected by bit 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    Immediate(i16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Br { nzp: u16, pc_offset: i16 },
    Add { dr: Register, sr1: Register, sr2: Operand },
    Ld { dr: Register, pc_offset: i16 },
    St { sr: Register, pc_offset: i16 },
    /// PC-relative subroutine call (bit 11 set)
    Jsr { pc_offset: i16 },
    /// Register subroutine call (bit 11 clear)
    Jsrr { base_r: Register },
    And { dr: Register, sr1: Register, sr2: Operand },
    Ldr { dr: Register, base_r: Register, offset: i16 },
    Str { sr: Register, base_r: Register, offset: i16 },
    /// Return from interrupt. Not supported by this machine.
    Rti,
    Not { dr: Register, sr: Register },
    Ldi { dr: Register, pc_offset: i16 },
    Sti { sr: Register, pc_offset: i16 },
    /// Also RET when `base_r` is R7
    Jmp { base_r: Register },
    /// Opcode 13, never assigned.
    Reserved,
    Lea { dr: Register, pc_offset: i16 },
    Trap { vector: u8 },
}

fn reg_hi(word: u16) -> Register {
    Register::from_field(get_bits::<9, 11>(word))
}

fn reg_lo(word: u16) -> Register {
    Register::from_field(get_bits::<6, 8>(word))
}

fn pc_offset9(word: u16) -> i16 {
    sign_extend::<9>(word)
}

fn offset6(word: u16) -> i16 {
    sign_extend::<6>(word)
}

fn operand(word: u16) -> Operand {
    if get_bits::<5, 5>(word) == 1 {
        Operand::Immediate(sign_extend::<5>(word))
    } else {
        Operand::Register(Register::from_field(get_bits::<0, 2>(word)))
    }
}

impl Instruction {
    pub fn decode(word: u16) -> Self {
        match Opcode::of(word) {
            Opcode::Br => Instruction::Br {
                nzp: get_bits::<9, 11>(word),
                pc_offset: pc_offset9(word),
            },
            Opcode::Add => Instruction::Add {
                dr: reg_hi(word),
                sr1: reg_lo(word),
                sr2: operand(word),
            },
            Opcode::Ld => Instruction::Ld {
                dr: reg_hi(word),
                pc_offset: pc_offset9(word),
            },
            Opcode::St => Instruction::St {
                sr: reg_hi(word),
                pc_offset: pc_offset9(word),
            },
            Opcode::Jsr => {
                if get_bits::<11, 11>(word) == 1 {
                    Instruction::Jsr {
                        pc_offset: sign_extend::<11>(word),
                    }
                } else {
                    Instruction::Jsrr {
                        base_r: reg_lo(word),
                    }
                }
            }
            Opcode::And => Instruction::And {
                dr: reg_hi(word),
                sr1: reg_lo(word),
                sr2: operand(word),
            },
            Opcode::Ldr => Instruction::Ldr {
                dr: reg_hi(word),
                base_r: reg_lo(word),
                offset: offset6(word),
            },
            Opcode::Str => Instruction::Str {
                sr: reg_hi(word),
                base_r: reg_lo(word),
                offset: offset6(word),
            },
            Opcode::Rti => Instruction::Rti,
            Opcode::Not => Instruction::Not {
                dr: reg_hi(word),
                sr: reg_lo(word),
            },
            Opcode::Ldi => Instruction::Ldi {
                dr: reg_hi(word),
                pc_offset: pc_offset9(word),
            },
            Opcode::Sti => Instruction::Sti {
                sr: reg_hi(word),
                pc_offset: pc_offset9(word),
            },
            Opcode::Jmp => Instruction::Jmp {
                base_r: reg_lo(word),
            },
            Opcode::Reserved => Instruction::Reserved,
            Opcode::Lea => Instruction::Lea {
                dr: reg_hi(word),
                pc_offset: pc_offset9(word),
            },
            Opcode::Trap => Instruction::Trap {
                vector: get_bits::<0, 7>(word) as u8,
            },
        }
    }
}
