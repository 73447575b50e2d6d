/// Human-oriented formatting for instructions (or parts of instructions).
use std::fmt::{self, Display, Formatter};

use crate::instruction::Condition;

/// One decoded operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Zero-based register index.
    Register(u8),
    Immediate(u32),
    /// The upper 16 bits carried by the second word of a
    /// full-immediate load.
    HighHalf(u16),
}

/// An instruction word in symbolic form.
///
/// The mnemonic is the unconditional name (`ADD`, not `ADDZ`); the
/// suffix is carried separately in `condition`.  Jumps always have
/// `Condition::Always`, since their condition is part of the
/// mnemonic.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolicInstruction {
    pub mnemonic: &'static str,
    pub condition: Condition,
    pub operands: Vec<Operand>,
}

/// Registers are written `r1` to `r8` and stored as 0 to 7.
impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Operand::Register(n) => write!(f, "r{}", u32::from(*n) + 1),
            // Hex literals need a leading digit to be read back as
            // numbers rather than words.
            Operand::Immediate(n) => write!(f, "0{n:X}h"),
            Operand::HighHalf(n) => write!(f, "0{n:X}h"),
        }
    }
}

impl Display for SymbolicInstruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}{}", self.mnemonic, self.condition.suffix())?;
        for (i, operand) in self.operands.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            operand.fmt(f)?;
        }
        if self
            .operands
            .iter()
            .any(|op| matches!(op, Operand::HighHalf(_)))
        {
            f.write_str(" # high half")?;
        }
        Ok(())
    }
}

#[test]
fn test_display_symbolic_instruction() {
    let inst = SymbolicInstruction {
        mnemonic: "ADD",
        condition: Condition::NotZero,
        operands: vec![
            Operand::Register(0),
            Operand::Register(1),
            Operand::Register(7),
        ],
    };
    assert_eq!(inst.to_string(), "ADDNZ r1, r2, r8");
}

#[test]
fn test_display_high_half() {
    let inst = SymbolicInstruction {
        mnemonic: "LOADWORDI",
        condition: Condition::Always,
        operands: vec![Operand::Register(0), Operand::HighHalf(0x12)],
    };
    assert_eq!(inst.to_string(), "LOADWORDI r1, 012h # high half");
}

#[test]
fn test_display_no_operands() {
    let inst = SymbolicInstruction {
        mnemonic: "HALT",
        condition: Condition::Always,
        operands: Vec::new(),
    };
    assert_eq!(inst.to_string(), "HALT");
}
