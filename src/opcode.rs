//! The instruction set.
//!
//! Each variant's on-the-wire spelling (the object file's `opcode` string) is
//! its name lowercased, mirroring `original_source/machine.py`'s use of the
//! opcode string directly as a microcode-table key. Unlike
//! `original_source/isa.py`'s `get_opcode_by_name`, an unrecognised spelling
//! is rejected rather than silently treated as `nop`.

use util_derive::{EnumFromStr, EnumName};

#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumName, EnumFromStr)]
pub enum OpCode {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Inc,
    Dec,
    Not,
    Eql,
    Less,
    Lrg,
    Comp,
    Dup,
    Swap,
    Pop,
    Push,
    Read,
    Save,
    Jmp,
    Jmz,
    Jnz,
    Ret,
    Hlt,
    Nop,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub idx: usize,
    pub opcode: OpCode,
    pub operand: Option<i64>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_lowercase_spelling() {
        let parsed: OpCode = "jmz".parse().unwrap();
        assert_eq!(parsed, OpCode::Jmz);
        assert_eq!(OpCode::Jmz.name(), "jmz");
    }

    #[test]
    fn rejects_unknown_spelling() {
        assert!("bogus".parse::<OpCode>().is_err());
    }

    #[test]
    fn display_matches_wire_spelling() {
        assert_eq!(OpCode::Hlt.to_string(), "hlt");
    }
}
