use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Source lines are counted from 1.
pub type LineNumber = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    Syntax {
        line: LineNumber,
        msg: String,
    },
    /// A token the compiler refuses, such as `++` or a keyword of
    /// full C which this dialect does not support.
    IllegalToken {
        line: LineNumber,
        token: String,
        msg: String,
    },
    /// A literal which does not fit in 64 bits.
    Overflow {
        line: LineNumber,
        literal: String,
        target: &'static str,
    },
    /// A preprocessor directive nobody has heard of.
    UndefinedStatement {
        line: LineNumber,
        directive: String,
    },
    Unimplemented {
        line: LineNumber,
        feature: String,
    },
    /// The compiler got into a state it should never reach; this is
    /// a bug in the compiler, not in the program being compiled.
    Internal {
        line: Option<LineNumber>,
        msg: String,
    },
}

impl CompileError {
    pub(crate) fn syntax<S: Into<String>>(line: LineNumber, msg: S) -> CompileError {
        CompileError::Syntax {
            line,
            msg: msg.into(),
        }
    }

    pub(crate) fn illegal_token<S: Into<String>>(
        line: LineNumber,
        token: &str,
        msg: S,
    ) -> CompileError {
        CompileError::IllegalToken {
            line,
            token: token.to_string(),
            msg: msg.into(),
        }
    }

    /// The line at which the problem was found, if known.
    #[must_use]
    pub fn line(&self) -> Option<LineNumber> {
        match self {
            CompileError::Syntax { line, .. }
            | CompileError::IllegalToken { line, .. }
            | CompileError::Overflow { line, .. }
            | CompileError::UndefinedStatement { line, .. }
            | CompileError::Unimplemented { line, .. } => Some(*line),
            CompileError::Internal { line, .. } => *line,
        }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            CompileError::Syntax { line, msg } => {
                write!(f, "line {line}: syntax error: {msg}")
            }
            CompileError::IllegalToken { line, token, msg } => {
                write!(f, "line {line}: illegal token '{token}': {msg}")
            }
            CompileError::Overflow {
                line,
                literal,
                target,
            } => {
                write!(
                    f,
                    "line {line}: literal '{literal}' is too large for type {target}"
                )
            }
            CompileError::UndefinedStatement { line, directive } => {
                write!(f, "line {line}: unknown preprocessor directive '#{directive}'")
            }
            CompileError::Unimplemented { line, feature } => {
                write!(f, "line {line}: {feature} is not implemented")
            }
            CompileError::Internal {
                line: Some(line),
                msg,
            } => {
                write!(f, "line {line}: internal error: {msg}")
            }
            CompileError::Internal { line: None, msg } => {
                write!(f, "internal error: {msg}")
            }
        }
    }
}

impl Error for CompileError {}

/// Switches which change how source text is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Accept the two-character spellings `<:` `:>` `<%` `%>` and `%:`.
    pub use_digraphs: bool,
    /// Replace `??=` and friends before anything else happens.
    pub use_trigraphs: bool,
    /// Reject keywords of full C that this dialect does not support.
    pub error_incompatibles: bool,
}

impl Default for CompilerOptions {
    fn default() -> CompilerOptions {
        CompilerOptions {
            use_digraphs: false,
            use_trigraphs: false,
            error_incompatibles: true,
        }
    }
}
