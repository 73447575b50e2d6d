//! The statements of an assembly program, after parsing but before
//! any addresses are known.
use std::fmt::{self, Display, Formatter};

use super::symtab::LabelName;
use super::types::LineNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Section {
    Code,
    Data,
    /// Subroutine bodies.  Like data, these are stepped over by a
    /// jump so that execution falls through from one code section to
    /// the next.
    Func,
}

impl Display for Section {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(match self {
            Section::Code => ".CODE",
            Section::Data => ".DATA",
            Section::Func => ".FUNC",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ByteItem {
    Literal(u8),
    /// Emitted as the label's four-byte address.
    LabelAddress(LabelName),
}

impl ByteItem {
    fn size(&self) -> u32 {
        match self {
            ByteItem::Literal(_) => 1,
            ByteItem::LabelAddress(_) => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DataPayload {
    /// Text without its NUL terminator.
    String(Vec<u8>),
    Int(u32),
    Float(f32),
    Bytes(Vec<ByteItem>),
}

pub(crate) const WORD_BYTES: u32 = 4;

pub(crate) fn round_up_to_word(n: u32) -> u32 {
    n.div_ceil(WORD_BYTES) * WORD_BYTES
}

impl DataPayload {
    /// The number of bytes emitted for this payload, padding
    /// included.
    pub(crate) fn size(&self) -> u32 {
        match self {
            // One extra byte for the NUL terminator.
            DataPayload::String(text) => round_up_to_word(text.len() as u32 + 1),
            DataPayload::Int(_) | DataPayload::Float(_) => WORD_BYTES,
            DataPayload::Bytes(items) => round_up_to_word(items.iter().map(ByteItem::size).sum()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DataDeclaration {
    pub(crate) name: LabelName,
    pub(crate) payload: DataPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InstructionLine {
    pub(crate) mnemonic: String,
    pub(crate) operands: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StatementKind {
    SectionHeader(Section),
    /// Reserve this many words of stack ahead of the program.
    Stack(u32),
    Label(LabelName),
    Data(DataDeclaration),
    Instruction(InstructionLine),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement {
    pub(crate) line: LineNumber,
    pub(crate) kind: StatementKind,
}
