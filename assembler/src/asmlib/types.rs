use std::error::Error;
use std::ffi::{OsStr, OsString};
use std::fmt::{self, Display, Formatter};
use std::io::Error as IoError;
use std::path::PathBuf;

/// Source lines are counted from 1.
pub type LineNumber = u32;

#[derive(Debug)]
pub enum AssemblerFailure {
    UnknownMnemonic {
        line: LineNumber,
        mnemonic: String,
    },
    OperandCountMismatch {
        line: LineNumber,
        mnemonic: String,
        expected: usize,
        got: usize,
    },
    MalformedStringLiteral {
        line: LineNumber,
    },
    /// Text after the last `;` of the program.
    MissingTerminator {
        line: LineNumber,
    },
    IllegalByteLiteral {
        line: LineNumber,
        literal: String,
    },
    LabelConflict {
        line: LineNumber,
        name: String,
        old: u32,
        new: u32,
    },
    UndefinedLabel {
        line: LineNumber,
        name: String,
    },
    StackSectionMisuse {
        line: LineNumber,
        msg: String,
    },
    /// A register, integer or float operand that cannot be read.
    InvalidOperand {
        line: LineNumber,
        operand: String,
        msg: String,
    },
    InvalidStatement {
        line: LineNumber,
        text: String,
    },
    UnsupportedDataType {
        line: LineNumber,
        data_type: String,
    },
    /// The two passes disagreed; this is a bug in the assembler,
    /// not in the program being assembled.
    Internal(String),
    IoErrorOnStdout {
        error: IoError,
    },
    IoErrorOnInput {
        filename: OsString,
        error: IoError,
    },
    IoErrorOnOutput {
        filename: PathBuf,
        error: IoError,
    },
    BadImage {
        filename: OsString,
        msg: String,
    },
}

pub(crate) fn write_os_string(f: &mut Formatter<'_>, s: &OsStr) -> Result<(), fmt::Error> {
    match s.to_str() {
        Some(unicode_name) => f.write_str(unicode_name),
        None => write!(
            f,
            "{} (some non-Unicode characters changed to make it printable)",
            s.to_string_lossy(),
        ),
    }
}

impl Display for AssemblerFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            AssemblerFailure::UnknownMnemonic { line, mnemonic } => {
                write!(f, "line {line}: unknown mnemonic '{mnemonic}'")
            }
            AssemblerFailure::OperandCountMismatch {
                line,
                mnemonic,
                expected,
                got,
            } => {
                write!(
                    f,
                    "line {line}: {mnemonic} takes {expected} operand(s) but {got} were given"
                )
            }
            AssemblerFailure::MalformedStringLiteral { line } => {
                write!(
                    f,
                    "line {line}: malformed string declaration; the text must be surrounded by a pair of double quotes"
                )
            }
            AssemblerFailure::MissingTerminator { line } => {
                write!(f, "line {line}: statement is not terminated by ';'")
            }
            AssemblerFailure::IllegalByteLiteral { line, literal } => {
                write!(f, "line {line}: illegal byte literal '{literal}'")
            }
            AssemblerFailure::LabelConflict {
                line,
                name,
                old,
                new,
            } => {
                write!(
                    f,
                    "line {line}: label '{name}' is already defined as {old:#X} and cannot be redefined as {new:#X}"
                )
            }
            AssemblerFailure::UndefinedLabel { line, name } => {
                write!(f, "line {line}: label '{name}' is not defined")
            }
            AssemblerFailure::StackSectionMisuse { line, msg } => {
                write!(f, "line {line}: {msg}")
            }
            AssemblerFailure::InvalidOperand { line, operand, msg } => {
                write!(f, "line {line}: invalid operand '{operand}': {msg}")
            }
            AssemblerFailure::InvalidStatement { line, text } => {
                write!(f, "line {line}: invalid statement '{text}'")
            }
            AssemblerFailure::UnsupportedDataType { line, data_type } => {
                write!(
                    f,
                    "line {line}: unsupported data type '{data_type}' (or perhaps a missing semicolon?)"
                )
            }
            AssemblerFailure::Internal(msg) => {
                write!(f, "internal error in the assembler: {msg}")
            }
            AssemblerFailure::IoErrorOnStdout { error } => {
                write!(f, "error writing on stdout: {error}")
            }
            AssemblerFailure::IoErrorOnInput { filename, error } => {
                f.write_str("I/O error reading input file ")?;
                write_os_string(f, filename)?;
                write!(f, ": {error}")
            }
            AssemblerFailure::IoErrorOnOutput { filename, error } => {
                write!(
                    f,
                    "I/O error writing output file {}: {error}",
                    filename.display(),
                )
            }
            AssemblerFailure::BadImage { filename, msg } => {
                write_os_string(f, filename)?;
                write!(f, " is not a valid program image: {msg}")
            }
        }
    }
}

impl Error for AssemblerFailure {}
