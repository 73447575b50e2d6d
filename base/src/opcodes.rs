//! The table mapping mnemonics to base bit patterns.
//!
//! The table is built once, from the unconditional primitives crossed
//! with every [`Condition`] suffix, plus the jumps which are added as
//! they are.  Lookups are case-insensitive.
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::OnceLock;

use crate::instruction::{
    Condition, DisassemblyFailure, Instruction, JumpCondition, OpcodeClass, Operand,
    OperandKind, OperandSignature, SymbolicInstruction, CONDITION_MASK, HIGH_HALF_MARKER,
};

/// `MOV r1, r1`, which is what `NOP` assembles to.
pub const NOP_ENCODING: u32 = 0b10_0000;

const fn class(n: u32) -> u32 {
    n << crate::instruction::CLASS_SHIFT
}

const fn immediate_mode(bits: u32) -> u32 {
    class(1) | (bits << 16)
}

const PERIPHERAL: u32 = class(15);

/// Unconditional base patterns, in the order in which the
/// disassembler prefers them when two mnemonics share a pattern.
const PRIMITIVES: &[(&str, u32)] = &[
    ("HALT", 0),
    // Arithmetic, three registers.
    ("ADD", 0b00_0001),
    ("SUB", 0b00_0010),
    ("MUL", 0b00_0011),
    ("DIV", 0b00_0100),
    ("POW", 0b00_0101),
    ("MOD", 0b00_0110),
    ("SHL", 0b00_0111),
    ("SHR", 0b00_1000),
    ("USHR", 0b00_1001),
    ("AND", 0b00_1010),
    ("OR", 0b00_1011),
    ("XOR", 0b00_1100),
    // Unary maths.
    ("ABS", 0b01_0000),
    ("SIN", 0b01_0001),
    ("COS", 0b01_0010),
    ("TAN", 0b01_0011),
    ("FLOOR", 0b01_0100),
    ("CEIL", 0b01_0101),
    ("ROUND", 0b01_0110),
    ("LOG", 0b01_0111),
    ("RNDI", 0b01_1000),
    ("RND", 0b01_1001),
    ("SGN", 0b01_1010),
    ("SQRT", 0b01_1011),
    ("CBRT", 0b01_1100),
    ("INV", 0b01_1101),
    ("RAD", 0b01_1110),
    ("NOT", 0b01_1111),
    // Register transfer.
    ("MOV", 0b10_0000),
    ("XCHG", 0b10_0001),
    ("INC", 0b10_0010),
    ("DEC", 0b10_0011),
    ("MALLOC", 0b10_0100),
    ("FTOI", 0b10_0101),
    ("ITOF", 0b10_0110),
    ("GOSUB", 0b11_1110),
    ("RETURN", 0b11_1111),
    // Memory, 0b1000_ss_d where ss is the size and d the direction.
    ("LOADBYTE", 0b1000_00_0),
    ("STOREBYTE", 0b1000_00_1),
    ("LOADHWORD", 0b1000_01_0),
    ("STOREHWORD", 0b1000_01_1),
    ("LOADWORD", 0b1000_10_0),
    ("STOREWORD", 0b1000_10_1),
    ("MEMCPY", 0b100_1000),
    // Compare.
    ("CMP", class(1)),
    ("CMPII", class(1)),
    ("CMPIF", class(1) | 1),
    ("CMPFI", class(1) | 2),
    ("CMPFF", class(1) | 3),
    // Immediate loads and stores.
    ("LOADBYTEI", immediate_mode(0b00_0010)),
    ("STOREBYTEI", immediate_mode(0b00_0011)),
    ("LOADHWORDI", immediate_mode(0b00_0100)),
    ("STOREHWORDI", immediate_mode(0b00_0101)),
    ("LOADWORDI", immediate_mode(0b00_0110)),
    // Word transfer between register and memory.
    ("LOADWORDIMEM", class(2)),
    ("STOREWORDIMEM", class(3)),
    // Stack.
    ("PUSH", class(4)),
    ("POP", class(5)),
    ("PUSHWORDI", class(6)),
    ("POPWORDI", class(7)),
    // Peripherals.
    ("CALL", PERIPHERAL),
    ("MEMSIZE", PERIPHERAL | (1 << 8)),
    ("UPTIME", PERIPHERAL | (1 << 8) | 0xFF),
    ("INT", 0b1_1111_1111_1111_1111_1111 << 8),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMnemonic(pub String);

impl Display for UnknownMnemonic {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "unknown mnemonic '{}'", self.0)
    }
}

impl Error for UnknownMnemonic {}

#[derive(Debug)]
pub struct OpcodeTable {
    by_mnemonic: BTreeMap<String, u32>,
    /// Unconditional base pattern to primitive name.  Jumps are
    /// included with their condition bits.
    by_pattern: HashMap<u32, &'static str>,
}

impl OpcodeTable {
    fn build() -> OpcodeTable {
        let mut by_mnemonic: BTreeMap<String, u32> = BTreeMap::new();
        let mut by_pattern: HashMap<u32, &'static str> = HashMap::new();
        for condition in Condition::ALL {
            for (name, pattern) in PRIMITIVES {
                by_mnemonic
                    .entry(format!("{name}{}", condition.suffix()))
                    .or_insert(pattern | condition.bits());
            }
        }
        for (name, pattern) in PRIMITIVES {
            by_pattern.entry(*pattern).or_insert(*name);
        }
        for jump in JumpCondition::ALL {
            by_mnemonic.insert(jump.mnemonic().to_string(), jump.bits());
            by_pattern.insert(jump.bits(), jump.mnemonic());
        }
        OpcodeTable {
            by_mnemonic,
            by_pattern,
        }
    }

    /// Look up the base pattern for `mnemonic`, which may carry a
    /// condition suffix.
    ///
    /// # Errors
    ///
    /// `UnknownMnemonic` if there is no such instruction.
    pub fn encode(&self, mnemonic: &str) -> Result<u32, UnknownMnemonic> {
        self.by_mnemonic
            .get(&mnemonic.to_uppercase())
            .copied()
            .ok_or_else(|| UnknownMnemonic(mnemonic.to_string()))
    }

    /// All mnemonics, suffixed forms included, with their patterns.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.by_mnemonic
            .iter()
            .map(|(name, pattern)| (name.as_str(), *pattern))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_mnemonic.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_mnemonic.is_empty()
    }

    fn primitive_name(&self, pattern: u32) -> Option<&'static str> {
        self.by_pattern.get(&pattern).copied()
    }
}

/// The process-wide opcode table.
pub fn opcode_table() -> &'static OpcodeTable {
    static TABLE: OnceLock<OpcodeTable> = OnceLock::new();
    TABLE.get_or_init(OpcodeTable::build)
}

/// The operand shape of the instruction whose base pattern (or
/// complete word) is `pattern`.
///
/// # Errors
///
/// `DisassemblyFailure::UnknownOpcode` if the pattern belongs to no
/// opcode class.
pub fn operand_signature(pattern: u32) -> Result<OperandSignature, DisassemblyFailure> {
    OpcodeClass::decode(pattern).map(OpcodeClass::signature)
}

/// Convert an instruction word into symbolic form.
///
/// # Errors
///
/// `DisassemblyFailure::UnknownOpcode` when `word` is not a valid
/// instruction (for example, a word of data).
pub fn disassemble(word: u32) -> Result<SymbolicInstruction, DisassemblyFailure> {
    let unknown = || DisassemblyFailure::UnknownOpcode(word);
    let opcode_class = OpcodeClass::decode(word)?;
    let signature = opcode_class.signature();
    let high_half = Instruction::from(word).is_high_half();
    let (condition, base) = if opcode_class.is_jump() {
        (Condition::Always, word & !signature.operand_mask())
    } else {
        let condition = Condition::from_word(word).ok_or_else(unknown)?;
        let mut base = word & !(signature.operand_mask() | CONDITION_MASK);
        if high_half {
            base &= !HIGH_HALF_MARKER;
        }
        (condition, base)
    };
    let mnemonic = opcode_table().primitive_name(base).ok_or_else(unknown)?;
    let operands = signature
        .kinds()
        .iter()
        .enumerate()
        .map(|(position, kind)| {
            let value = kind.extract(position, word);
            match kind {
                // Register fields are three bits wide.
                OperandKind::Register => Operand::Register(value as u8),
                OperandKind::FullWord if high_half => Operand::HighHalf(value as u16),
                _ => Operand::Immediate(value),
            }
        })
        .collect();
    Ok(SymbolicInstruction {
        mnemonic,
        condition,
        operands,
    })
}

impl SymbolicInstruction {
    /// Convert back to an instruction word.  This is the inverse of
    /// [`disassemble`].
    ///
    /// # Errors
    ///
    /// `UnknownMnemonic` if `self.mnemonic` is not in the table.
    pub fn encode(&self) -> Result<Instruction, UnknownMnemonic> {
        let base = opcode_table().encode(self.mnemonic)?;
        Ok(Instruction::from(self.operands.iter().enumerate().fold(
            base | self.condition.bits(),
            |word, (position, operand)| {
                word | match operand {
                    Operand::Register(n) => OperandKind::Register.pack(position, u32::from(*n)),
                    Operand::Immediate(n) => *n,
                    Operand::HighHalf(n) => HIGH_HALF_MARKER | u32::from(*n),
                }
            },
        )))
    }
}
