use std::fmt;

use crate::instruction::{Instruction, Operand};
use crate::trap::TrapRoutine;

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(reg) => write!(f, "{reg}"),
            Operand::Immediate(imm) => write!(f, "#{imm}"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Add { dr, sr1, sr2 } => write!(f, "ADD {dr}, {sr1}, {sr2}"),
            Instruction::And { dr, sr1, sr2 } => write!(f, "AND {dr}, {sr1}, {sr2}"),
            Instruction::Not { dr, sr } => write!(f, "NOT {dr}, {sr}"),

            Instruction::Br { nzp: 0, .. } => write!(f, "NOP"),
            Instruction::Br { nzp, pc_offset } => write!(
                f,
                "BR{}{}{} #{pc_offset}",
                if nzp & 0b100 == 0 { "" } else { "n" },
                if nzp & 0b010 == 0 { "" } else { "z" },
                if nzp & 0b001 == 0 { "" } else { "p" },
            ),

            Instruction::Jmp { base_r } if base_r.index() == 7 => write!(f, "RET"),
            Instruction::Jmp { base_r } => write!(f, "JMP {base_r}"),
            Instruction::Jsr { pc_offset } => write!(f, "JSR #{pc_offset}"),
            Instruction::Jsrr { base_r } => write!(f, "JSRR {base_r}"),

            Instruction::Ld { dr, pc_offset } => write!(f, "LD {dr}, #{pc_offset}"),
            Instruction::Ldi { dr, pc_offset } => write!(f, "LDI {dr}, #{pc_offset}"),
            Instruction::Lea { dr, pc_offset } => write!(f, "LEA {dr}, #{pc_offset}"),
            Instruction::St { sr, pc_offset } => write!(f, "ST {sr}, #{pc_offset}"),
            Instruction::Sti { sr, pc_offset } => write!(f, "STI {sr}, #{pc_offset}"),
            Instruction::Ldr { dr, base_r, offset } => write!(f, "LDR {dr}, {base_r}, #{offset}"),
            Instruction::Str { sr, base_r, offset } => write!(f, "STR {sr}, {base_r}, #{offset}"),

            Instruction::Rti => write!(f, "RTI"),
            Instruction::Reserved => write!(f, "[reserved]"),

            Instruction::Trap { vector } => match TrapRoutine::from_vector(vector) {
                Some(routine) => write!(f, "{}", routine.name()),
                None => write!(f, "TRAP x{vector:02X}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::instruction::Instruction;

    fn disasm(word: u16) -> String {
        Instruction::decode(word).to_string()
    }

    #[test]
    fn renders_arithmetic() {
        assert_eq!(disasm(0x1023), "ADD R0, R0, #3");
        assert_eq!(disasm(0x1642), "ADD R3, R1, R2");
        assert_eq!(disasm(0x5260), "AND R1, R1, #0");
        assert_eq!(disasm(0x967F), "NOT R3, R1");
    }

    #[test]
    fn renders_control_flow() {
        assert_eq!(disasm(0x0BFC), "BRnp #-4");
        assert_eq!(disasm(0x0E01), "BRnzp #1");
        assert_eq!(disasm(0x0000), "NOP");
        assert_eq!(disasm(0xC1C0), "RET");
        assert_eq!(disasm(0xC080), "JMP R2");
        assert_eq!(disasm(0x4802), "JSR #2");
        assert_eq!(disasm(0x4080), "JSRR R2");
    }

    #[test]
    fn renders_memory_access() {
        assert_eq!(disasm(0x6A7F), "LDR R5, R1, #-1");
        assert_eq!(disasm(0xE1FF), "LEA R0, #-1");
        assert_eq!(disasm(0xB202), "STI R1, #2");
    }

    #[test]
    fn renders_traps() {
        assert_eq!(disasm(0xF025), "HALT");
        assert_eq!(disasm(0xF022), "PUTS");
        assert_eq!(disasm(0xF0FF), "TRAP xFF");
        assert_eq!(disasm(0x8000), "RTI");
        assert_eq!(disasm(0xD000), "[reserved]");
    }
}
