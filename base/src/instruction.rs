//! Binary and symbolic representations of instructions.
//!
//! An instruction occupies one 32-bit word, stored little-endian.
//! The word looks like this (least significant bit on the right, bits
//! numbered 0 to 31 in decimal):
//!
//! |Condition|Class  |R0     |R1     |R2     |R3     |R4     |Low bits |
//! |---------|-------|-------|-------|-------|-------|-------|---------|
//! |3 bits   |4 bits |3 bits |3 bits |3 bits |3 bits |3 bits |10 bits  |
//! |(29-31)  |(25-28)|(22-24)|(19-21)|(16-18)|(13-15)|(10-12)|(0-9)    |
//!
//! Not every class uses every field.  Immediates are OR-ed into the
//! low bits: a byte occupies bits 0-7, a halfword bits 0-15 and an
//! address bits 0-21.  So an address operand overlaps registers R1 to
//! R4, which is why no class takes both an address and more than one
//! register.
//!
//! The condition field holds one of the suffixes `Z`, `NZ`, `GT` and
//! `LS` (or nothing) for every class except the jumps.  Jumps (class
//! 8) use the same three bits to select the jump condition, which is
//! why `JZ` is not spelled `JMPZ`.
//!
//! Class 1 and class 15 have a secondary selector which sits in bits
//! that other classes use for registers; see [`OpcodeClass::decode`].

use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};

mod format;
pub use format::*;

pub const CONDITION_SHIFT: u32 = 29;
pub const CONDITION_MASK: u32 = 0b111 << CONDITION_SHIFT;
pub const CLASS_SHIFT: u32 = 25;
pub const CLASS_MASK: u32 = 0b1111 << CLASS_SHIFT;

/// Register fields are packed most-significant-first, starting here.
pub const FIRST_REGISTER_SHIFT: u32 = 22;
pub const REGISTER_FIELD_BITS: u32 = 3;
pub const REGISTER_COUNT: u8 = 1 << REGISTER_FIELD_BITS;
const REGISTER_FIELD_MASK: u32 = (1 << REGISTER_FIELD_BITS) - 1;

pub const MATH_OP_MASK: u32 = 0x7F;
pub const BYTE_MASK: u32 = 0xFF;
pub const HALFWORD_MASK: u32 = 0xFFFF;
pub const ADDRESS_MASK: u32 = 0x3F_FFFF;

/// Set in the second word of a two-word full-immediate load.
pub const HIGH_HALF_MARKER: u32 = 1 << 16;

/// The target of a jump which has not been patched yet.
pub const UNPATCHED_JUMP_TARGET: u32 = ADDRESS_MASK;

const IMMEDIATE_MODE_SHIFT: u32 = 17;
const IMMEDIATE_MODE_MASK: u32 = 0b11111;
const PERIPHERAL_SELECTOR_SHIFT: u32 = 8;
const PERIPHERAL_SELECTOR_MASK: u32 = 0x3FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisassemblyFailure {
    UnknownOpcode(u32),
}

impl Display for DisassemblyFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            DisassemblyFailure::UnknownOpcode(bits) => {
                write!(f, "{bits:#010X} does not decode to a known opcode")
            }
        }
    }
}

impl Error for DisassemblyFailure {}

/// The condition suffix of a non-jump instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Condition {
    Always = 0,
    Zero = 1,
    NotZero = 2,
    Greater = 3,
    LessOrEqual = 4,
}

impl Condition {
    pub const ALL: [Condition; 5] = [
        Condition::Always,
        Condition::Zero,
        Condition::NotZero,
        Condition::Greater,
        Condition::LessOrEqual,
    ];

    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Condition::Always => "",
            Condition::Zero => "Z",
            Condition::NotZero => "NZ",
            Condition::Greater => "GT",
            Condition::LessOrEqual => "LS",
        }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        (self as u32) << CONDITION_SHIFT
    }

    /// Decode the condition field of `word`.  Returns `None` for the
    /// field values (5 to 7) which only have a meaning for jumps.
    #[must_use]
    pub fn from_word(word: u32) -> Option<Condition> {
        Condition::ALL
            .into_iter()
            .find(|c| c.bits() == word & CONDITION_MASK)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JumpCondition {
    Always = 0,
    Zero = 1,
    NotZero = 2,
    Greater = 3,
    LessOrEqual = 4,
    Forward = 5,
    Backward = 6,
}

impl JumpCondition {
    pub const ALL: [JumpCondition; 7] = [
        JumpCondition::Always,
        JumpCondition::Zero,
        JumpCondition::NotZero,
        JumpCondition::Greater,
        JumpCondition::LessOrEqual,
        JumpCondition::Forward,
        JumpCondition::Backward,
    ];

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            JumpCondition::Always => "JMP",
            JumpCondition::Zero => "JZ",
            JumpCondition::NotZero => "JNZ",
            JumpCondition::Greater => "JGT",
            JumpCondition::LessOrEqual => "JLS",
            JumpCondition::Forward => "JFW",
            JumpCondition::Backward => "JBW",
        }
    }

    /// The complete base pattern of this jump (condition and class).
    #[must_use]
    pub const fn bits(self) -> u32 {
        ((self as u32) << CONDITION_SHIFT) | (JUMP_CLASS << CLASS_SHIFT)
    }

    fn from_word(word: u32) -> Option<JumpCondition> {
        JumpCondition::ALL
            .into_iter()
            .find(|j| (j.bits() & CONDITION_MASK) == word & CONDITION_MASK)
    }
}

const JUMP_CLASS: u32 = 8;

/// One letter of an operand signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperandKind {
    /// `r`: a register index.
    Register,
    /// `b`: an 8-bit immediate.
    Byte,
    /// `w`: a 16-bit immediate.
    HalfWord,
    /// `f`: a 32-bit immediate, emitted as two instructions.
    FullWord,
    /// `a`: a 22-bit address or offset.
    Address,
}

impl OperandKind {
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            OperandKind::Register => 'r',
            OperandKind::Byte => 'b',
            OperandKind::HalfWord => 'w',
            OperandKind::FullWord => 'f',
            OperandKind::Address => 'a',
        }
    }

    /// The bits of an instruction word occupied by an operand of this
    /// kind when it is the `position`th operand.
    #[must_use]
    pub const fn field_mask(self, position: usize) -> u32 {
        match self {
            OperandKind::Register => REGISTER_FIELD_MASK << register_shift(position),
            OperandKind::Byte => BYTE_MASK,
            OperandKind::HalfWord | OperandKind::FullWord => HALFWORD_MASK,
            OperandKind::Address => ADDRESS_MASK,
        }
    }

    /// Place `value` into the field for the `position`th operand.
    /// Excess high bits of `value` are discarded.
    #[must_use]
    pub const fn pack(self, position: usize, value: u32) -> u32 {
        match self {
            OperandKind::Register => (value & REGISTER_FIELD_MASK) << register_shift(position),
            _ => value & self.field_mask(position),
        }
    }

    /// The inverse of [`OperandKind::pack`].
    #[must_use]
    pub const fn extract(self, position: usize, word: u32) -> u32 {
        match self {
            OperandKind::Register => (word >> register_shift(position)) & REGISTER_FIELD_MASK,
            _ => word & self.field_mask(position),
        }
    }
}

const fn register_shift(position: usize) -> u32 {
    FIRST_REGISTER_SHIFT - REGISTER_FIELD_BITS * (position as u32)
}

/// The ordered operand kinds that follow a mnemonic, for example
/// `rrr` for `ADD` or `ra` for `LOADWORDIMEM`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperandSignature(&'static [OperandKind]);

mod signatures {
    use super::OperandKind::{Address, Byte, FullWord, HalfWord, Register};
    use super::{OperandKind, OperandSignature};

    const NONE: &[OperandKind] = &[];
    pub(super) const EMPTY: OperandSignature = OperandSignature(NONE);
    pub(super) const R: OperandSignature = OperandSignature(&[Register]);
    pub(super) const RR: OperandSignature = OperandSignature(&[Register, Register]);
    pub(super) const RRR: OperandSignature = OperandSignature(&[Register, Register, Register]);
    pub(super) const RRRRR: OperandSignature =
        OperandSignature(&[Register, Register, Register, Register, Register]);
    pub(super) const RB: OperandSignature = OperandSignature(&[Register, Byte]);
    pub(super) const RW: OperandSignature = OperandSignature(&[Register, HalfWord]);
    pub(super) const RF: OperandSignature = OperandSignature(&[Register, FullWord]);
    pub(super) const RA: OperandSignature = OperandSignature(&[Register, Address]);
    pub(super) const A: OperandSignature = OperandSignature(&[Address]);
    pub(super) const B: OperandSignature = OperandSignature(&[Byte]);
}

impl OperandSignature {
    #[must_use]
    pub fn kinds(&self) -> &'static [OperandKind] {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for the full-immediate forms, which occupy two words.
    #[must_use]
    pub fn is_two_words(&self) -> bool {
        self.0.contains(&OperandKind::FullWord)
    }

    /// Number of instruction words one source line with this
    /// signature turns into.
    #[must_use]
    pub fn word_count(&self) -> usize {
        if self.is_two_words() {
            2
        } else {
            1
        }
    }

    /// All the bits occupied by operands of this signature.
    #[must_use]
    pub fn operand_mask(&self) -> u32 {
        self.0
            .iter()
            .enumerate()
            .fold(0, |acc, (position, kind)| acc | kind.field_mask(position))
    }
}

impl Display for OperandSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        self.0
            .iter()
            .try_for_each(|kind| write!(f, "{}", kind.letter()))
    }
}

impl Debug for OperandSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "OperandSignature(\"{self}\")")
    }
}

/// Groups of class-0 sub-opcodes sharing an operand shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MathGroup {
    Halt,
    /// `ADD` to `XOR`.
    Arithmetic,
    /// `ABS` to `NOT`, apart from the random number generators.
    UnaryMath,
    /// `RNDI` and `RND`.
    Random,
    /// `MOV`, `XCHG` and `MALLOC`.
    RegisterPair,
    /// `INC`, `DEC`, `FTOI` and `ITOF`.
    RegisterSingle,
    /// `GOSUB` and `RETURN`.
    Subroutine,
    /// `LOADBYTE` to `STOREWORD`.
    MemoryAccess,
    MemoryCopy,
}

impl MathGroup {
    fn from_sub_opcode(sub: u32) -> Option<MathGroup> {
        match sub {
            0 => Some(MathGroup::Halt),
            1..=12 => Some(MathGroup::Arithmetic),
            24 | 25 => Some(MathGroup::Random),
            16..=31 => Some(MathGroup::UnaryMath),
            32 | 33 | 36 => Some(MathGroup::RegisterPair),
            34 | 35 | 37 | 38 => Some(MathGroup::RegisterSingle),
            62 | 63 => Some(MathGroup::Subroutine),
            // 0b1000_ss_d: size 0 to 2, direction bit.
            64..=69 => Some(MathGroup::MemoryAccess),
            72 => Some(MathGroup::MemoryCopy),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImmediateWidth {
    Byte,
    HalfWord,
    Word,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PeripheralOp {
    Call,
    MemorySize,
    /// `MEMSIZE` of the pseudo-device 0xFF.
    Uptime,
    Interrupt,
}

/// The closed set of instruction classes.  Every valid instruction
/// word decodes to exactly one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpcodeClass {
    Math(MathGroup),
    Compare,
    Immediate(ImmediateWidth),
    LoadIndirect,
    StoreIndirect,
    Push,
    Pop,
    PushImmediate,
    PopImmediate,
    Jump(JumpCondition),
    Peripheral(PeripheralOp),
}

impl OpcodeClass {
    /// Classify an instruction word (or a base pattern).
    ///
    /// # Errors
    ///
    /// `DisassemblyFailure::UnknownOpcode` when the class field, or
    /// the secondary selector of classes 0, 1 and 15, holds a value
    /// which no instruction uses.
    pub fn decode(word: u32) -> Result<OpcodeClass, DisassemblyFailure> {
        let unknown = || DisassemblyFailure::UnknownOpcode(word);
        let class = (word & CLASS_MASK) >> CLASS_SHIFT;
        match class {
            0 => MathGroup::from_sub_opcode(word & MATH_OP_MASK)
                .map(OpcodeClass::Math)
                .ok_or_else(unknown),
            1 => {
                let mode = (word >> IMMEDIATE_MODE_SHIFT) & IMMEDIATE_MODE_MASK;
                // The top three bits of the mode overlap the second
                // register of a comparison.
                match mode {
                    m if m & 0b11 == 0 => Ok(OpcodeClass::Compare),
                    1 => Ok(OpcodeClass::Immediate(ImmediateWidth::Byte)),
                    2 => Ok(OpcodeClass::Immediate(ImmediateWidth::HalfWord)),
                    3 => Ok(OpcodeClass::Immediate(ImmediateWidth::Word)),
                    _ => Err(unknown()),
                }
            }
            2 => Ok(OpcodeClass::LoadIndirect),
            3 => Ok(OpcodeClass::StoreIndirect),
            4 => Ok(OpcodeClass::Push),
            5 => Ok(OpcodeClass::Pop),
            6 => Ok(OpcodeClass::PushImmediate),
            7 => Ok(OpcodeClass::PopImmediate),
            JUMP_CLASS => JumpCondition::from_word(word)
                .map(OpcodeClass::Jump)
                .ok_or_else(unknown),
            15 => {
                let selector = (word >> PERIPHERAL_SELECTOR_SHIFT) & PERIPHERAL_SELECTOR_MASK;
                match selector {
                    0 => Ok(OpcodeClass::Peripheral(PeripheralOp::Call)),
                    1 if word & BYTE_MASK == BYTE_MASK => {
                        Ok(OpcodeClass::Peripheral(PeripheralOp::Uptime))
                    }
                    1 => Ok(OpcodeClass::Peripheral(PeripheralOp::MemorySize)),
                    PERIPHERAL_SELECTOR_MASK => Ok(OpcodeClass::Peripheral(PeripheralOp::Interrupt)),
                    _ => Err(unknown()),
                }
            }
            _ => Err(unknown()),
        }
    }

    #[must_use]
    pub fn signature(self) -> OperandSignature {
        use signatures::*;
        match self {
            OpcodeClass::Math(group) => match group {
                MathGroup::Halt | MathGroup::Subroutine => EMPTY,
                MathGroup::Arithmetic | MathGroup::MemoryAccess => RRR,
                MathGroup::UnaryMath | MathGroup::RegisterPair => RR,
                MathGroup::Random | MathGroup::RegisterSingle => R,
                MathGroup::MemoryCopy => RRRRR,
            },
            OpcodeClass::Compare => RR,
            OpcodeClass::Immediate(ImmediateWidth::Byte) => RB,
            OpcodeClass::Immediate(ImmediateWidth::HalfWord) => RW,
            OpcodeClass::Immediate(ImmediateWidth::Word) => RF,
            OpcodeClass::LoadIndirect | OpcodeClass::StoreIndirect => RA,
            OpcodeClass::Push | OpcodeClass::Pop => R,
            OpcodeClass::PushImmediate | OpcodeClass::Jump(_) => A,
            OpcodeClass::PopImmediate => EMPTY,
            OpcodeClass::Peripheral(PeripheralOp::Call | PeripheralOp::MemorySize) => RB,
            OpcodeClass::Peripheral(PeripheralOp::Uptime) => R,
            OpcodeClass::Peripheral(PeripheralOp::Interrupt) => B,
        }
    }

    /// True for classes whose condition field is part of the opcode
    /// rather than a suffix.
    #[must_use]
    pub fn is_jump(self) -> bool {
        matches!(self, OpcodeClass::Jump(_))
    }
}

/// A single instruction word.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction(u32);

impl Instruction {
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn condition_field(&self) -> u32 {
        (self.0 & CONDITION_MASK) >> CONDITION_SHIFT
    }

    #[must_use]
    pub const fn class_field(&self) -> u32 {
        (self.0 & CLASS_MASK) >> CLASS_SHIFT
    }

    /// The register index in the field for operand `position`.
    #[must_use]
    pub const fn register(&self, position: usize) -> u8 {
        OperandKind::Register.extract(position, self.0) as u8
    }

    #[must_use]
    pub const fn math_op(&self) -> u32 {
        self.0 & MATH_OP_MASK
    }

    #[must_use]
    pub const fn byte(&self) -> u8 {
        (self.0 & BYTE_MASK) as u8
    }

    #[must_use]
    pub const fn halfword(&self) -> u16 {
        (self.0 & HALFWORD_MASK) as u16
    }

    #[must_use]
    pub const fn address(&self) -> u32 {
        self.0 & ADDRESS_MASK
    }

    /// True for the second word of a full-immediate load.
    #[must_use]
    pub fn is_high_half(&self) -> bool {
        matches!(
            OpcodeClass::decode(self.0),
            Ok(OpcodeClass::Immediate(ImmediateWidth::Word))
        ) && self.0 & HIGH_HALF_MARKER != 0
    }

    /// # Errors
    ///
    /// See [`OpcodeClass::decode`].
    pub fn class(&self) -> Result<OpcodeClass, DisassemblyFailure> {
        OpcodeClass::decode(self.0)
    }

    #[must_use]
    pub fn to_le_bytes(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl From<u32> for Instruction {
    fn from(bits: u32) -> Instruction {
        Instruction(bits)
    }
}

impl From<Instruction> for u32 {
    fn from(inst: Instruction) -> u32 {
        inst.0
    }
}

impl Debug for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "Instruction({:#010X})", self.0)
    }
}
