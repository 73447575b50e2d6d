//! Splitting assembly source into statements, and statements into
//! words.
//!
//! Statements end with `;`.  A `#` starts a comment which runs to the
//! end of the line.  Neither is special inside a string literal, and
//! a string literal ends only where a double quote is immediately
//! followed by `;` (which also ends the statement).  So
//!
//! `STRING greeting "Hello; world";`
//!
//! is a single statement.
use super::types::{AssemblerFailure, LineNumber};

mod operand;
#[cfg(test)]
mod tests;

pub(crate) use operand::{classify_operand, OperandToken};

const STATEMENT_TERMINATOR: char = ';';
const COMMENT_MARKER: char = '#';
const LITERAL_MARKER: char = '"';

/// One `;`-terminated statement, with leading whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceLine {
    /// The line on which the statement's first character appears.
    pub(crate) line: LineNumber,
    pub(crate) text: String,
}

impl SourceLine {
    /// The statement's words.  Spaces, tabs and commas separate
    /// words; there are no empty words.
    pub(crate) fn words(&self) -> Vec<&str> {
        self.text
            .split([' ', '\t', ','])
            .filter(|w| !w.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Literal,
    Comment,
}

#[derive(Debug, Default)]
struct Splitter {
    lines: Vec<SourceLine>,
    current: String,
    /// Line on which `current` began, once it has any content.
    start: Option<LineNumber>,
}

impl Splitter {
    fn push(&mut self, ch: char, line: LineNumber) {
        if self.start.is_none() {
            if ch == ' ' {
                // Leading whitespace is dropped.
                return;
            }
            self.start = Some(line);
        }
        self.current.push(ch);
    }

    fn end_statement(&mut self) {
        if let Some(line) = self.start.take() {
            self.lines.push(SourceLine {
                line,
                text: std::mem::take(&mut self.current),
            });
        }
        self.current.clear();
    }
}

/// Split `source` into statements.
///
/// # Errors
///
/// `MalformedStringLiteral` if the program ends inside a string
/// literal, and `MissingTerminator` if there is text after the last
/// statement terminator.
pub(crate) fn split_lines(source: &str) -> Result<Vec<SourceLine>, AssemblerFailure> {
    let mut splitter = Splitter::default();
    let mut mode = Mode::Normal;
    let mut line: LineNumber = 1;
    let mut chars = source.chars().peekable();
    while let Some(ch) = chars.next() {
        match mode {
            Mode::Normal => match ch {
                STATEMENT_TERMINATOR => splitter.end_statement(),
                COMMENT_MARKER => mode = Mode::Comment,
                LITERAL_MARKER => {
                    splitter.push(ch, line);
                    mode = Mode::Literal;
                }
                ' ' => splitter.push(ch, line),
                c if c.is_whitespace() => (),
                c => splitter.push(c, line),
            },
            Mode::Literal => {
                if ch == LITERAL_MARKER && chars.peek() == Some(&STATEMENT_TERMINATOR) {
                    chars.next();
                    splitter.push(ch, line);
                    splitter.end_statement();
                    mode = Mode::Normal;
                } else {
                    splitter.push(ch, line);
                }
            }
            Mode::Comment => {
                if ch == '\n' {
                    mode = Mode::Normal;
                }
            }
        }
        if ch == '\n' {
            line += 1;
        }
    }
    match (mode, splitter.start) {
        (Mode::Literal, Some(line)) => Err(AssemblerFailure::MalformedStringLiteral { line }),
        (_, Some(line)) => Err(AssemblerFailure::MissingTerminator { line }),
        (_, None) => Ok(splitter.lines),
    }
}
