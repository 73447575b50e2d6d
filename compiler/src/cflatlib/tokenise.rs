//! Splits preprocessed source text into statements ("lines") of
//! tokens, recording how deeply each is nested in braces.
use std::fmt::{self, Display, Formatter};

use tracing::{event, span, Level};

use super::keywords::{EVIL_OPERATORS, OPERATORS, UNSUPPORTED_KEYWORDS};
use super::types::{CompileError, CompilerOptions, LineNumber};

#[cfg(test)]
mod tests;

/// One statement of the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStructure {
    /// The line on which the statement's first token appears.
    pub line_number: LineNumber,
    /// Number of enclosing braces.  A line which opens a block has
    /// the depth of the code around the block.
    pub depth: usize,
    pub tokens: Vec<String>,
    /// Set when the statement was ended by `{`.
    pub opens_block: bool,
}

impl Display for LineStructure {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{:>4} {:>2} ", self.line_number, self.depth)?;
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(token)?;
        }
        if self.opens_block {
            f.write_str(" {")?;
        }
        Ok(())
    }
}

fn digraph_replacement(pair: &[char]) -> Option<char> {
    match pair {
        ['<', ':'] => Some('['),
        [':', '>'] => Some(']'),
        ['<', '%'] => Some('{'),
        ['%', '>'] => Some('}'),
        ['%', ':'] => Some('#'),
        _ => None,
    }
}

fn escaped_char(c: char) -> Option<char> {
    match c {
        'a' => Some('\u{07}'),
        'b' => Some('\u{08}'),
        'f' => Some('\u{0C}'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\u{0B}'),
        '\\' | '\'' | '"' | '?' => Some(c),
        '0' => Some('\0'),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    StringLiteral,
    LineComment,
    BlockComment,
}

struct Tokeniser<'a> {
    options: &'a CompilerOptions,
    chars: Vec<char>,
    pos: usize,
    line: LineNumber,
    mode: Mode,
    depth: usize,
    paren_depth: usize,
    /// Where the outermost open `(` is.
    paren_line: LineNumber,
    /// The partly-read token.
    word: String,
    word_line: LineNumber,
    current: Option<LineStructure>,
    finished: Vec<LineStructure>,
}

impl<'a> Tokeniser<'a> {
    fn new(source: &str, options: &'a CompilerOptions) -> Tokeniser<'a> {
        Tokeniser {
            options,
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            mode: Mode::Code,
            depth: 0,
            paren_depth: 0,
            paren_line: 1,
            word: String::new(),
            word_line: 1,
            current: None,
            finished: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn looking_at(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek(i) == Some(c))
    }

    fn push_token(&mut self, token: String, line: LineNumber) {
        event!(Level::TRACE, "line {line}: token {token:?}");
        self.current
            .get_or_insert_with(|| LineStructure {
                line_number: line,
                depth: 0,
                tokens: Vec::new(),
                opens_block: false,
            })
            .tokens
            .push(token);
    }

    fn add_char(&mut self, c: char) {
        if self.word.is_empty() {
            self.word_line = self.line;
        }
        self.word.push(c);
    }

    fn flush_word(&mut self) -> Result<(), CompileError> {
        if self.word.is_empty() {
            return Ok(());
        }
        let word = std::mem::take(&mut self.word);
        if self.options.error_incompatibles && UNSUPPORTED_KEYWORDS.contains(&word.as_str()) {
            return Err(CompileError::illegal_token(
                self.word_line,
                &word,
                "this keyword is not supported",
            ));
        }
        self.push_token(word, self.word_line);
        Ok(())
    }

    fn end_line(&mut self, opens_block: bool) -> Result<(), CompileError> {
        self.flush_word()?;
        if let Some(mut line) = self.current.take() {
            line.depth = self.depth;
            line.opens_block = opens_block;
            self.finished.push(line);
        }
        Ok(())
    }

    fn unclosed_paren(&self) -> CompileError {
        CompileError::syntax(self.paren_line, "unbalanced '('")
    }

    fn operator_at_point(&self) -> Option<&'static str> {
        OPERATORS.iter().copied().find(|op| self.looking_at(op))
    }

    /// Decides whether the `.` at point is part of a number.
    fn is_decimal_point(&self) -> bool {
        if !self.word.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        let next = self.peek(1);
        if next.is_some_and(|c| c.is_ascii_digit()) {
            return true;
        }
        if matches!(next, Some('e' | 'E')) {
            let after = match self.peek(2) {
                Some('+' | '-') => self.peek(3),
                other => other,
            };
            if after.is_some_and(|c| c.is_ascii_digit()) {
                return true;
            }
        }
        !self.word.is_empty()
            && match next {
                None => true,
                Some(c) => c.is_whitespace() || "fF,);".contains(c),
            }
    }

    /// Consumes the fractional part (and exponent) of a number whose
    /// decimal point is at point.
    fn read_fraction(&mut self) {
        self.add_char('.');
        self.pos += 1;
        let mut previous = '.';
        while let Some(c) = self.peek(0) {
            let accepted = c.is_ascii_digit()
                || matches!(c, 'e' | 'E' | 'f' | 'F')
                || (matches!(c, '+' | '-') && matches!(previous, 'e' | 'E'));
            if !accepted {
                break;
            }
            self.add_char(c);
            previous = c;
            self.pos += 1;
        }
    }

    fn read_char_literal(&mut self) -> Result<(), CompileError> {
        let bad = || {
            CompileError::syntax(self.line, "a character literal must hold exactly one character")
        };
        let (value, len) = match (self.peek(1), self.peek(2)) {
            (Some('\\'), Some(e)) => match escaped_char(e) {
                Some(value) => (value, 4),
                None => {
                    return Err(CompileError::syntax(
                        self.line,
                        format!("unknown escape sequence \\{e}"),
                    ));
                }
            },
            (Some('\'') | None, _) => return Err(bad()),
            (Some(c), _) => (c, 3),
        };
        if self.peek(len - 1) != Some('\'') {
            return Err(bad());
        }
        self.flush_word()?;
        self.push_token(u32::from(value).to_string(), self.line);
        self.pos += len;
        Ok(())
    }

    /// Handles one character inside a string literal.  Escapes are
    /// decoded.  A raw newline is not kept in the literal: it only
    /// advances the line count, so `"a` newline `b"` reads as `"ab"`.
    fn step_string(&mut self, c: char) -> Result<(), CompileError> {
        match c {
            '\\' => {
                let Some(e) = self.peek(1) else {
                    return Err(CompileError::syntax(
                        self.word_line,
                        "string literal is not terminated",
                    ));
                };
                match escaped_char(e) {
                    Some(value) => self.add_char(value),
                    None => {
                        return Err(CompileError::syntax(
                            self.line,
                            format!("unknown escape sequence \\{e}"),
                        ));
                    }
                }
                self.pos += 2;
                return Ok(());
            }
            '"' => {
                self.add_char('"');
                self.mode = Mode::Code;
                self.flush_word()?;
            }
            '\n' => {
                self.line += 1;
            }
            _ => self.add_char(c),
        }
        self.pos += 1;
        Ok(())
    }

    fn step_code(&mut self, c: char) -> Result<(), CompileError> {
        if self.looking_at("//") {
            self.flush_word()?;
            self.mode = Mode::LineComment;
            self.pos += 2;
            return Ok(());
        }
        if self.looking_at("/*") {
            self.flush_word()?;
            self.mode = Mode::BlockComment;
            self.pos += 2;
            return Ok(());
        }
        if self.looking_at("*/") {
            return Err(CompileError::syntax(
                self.line,
                "'*/' appears outside a comment",
            ));
        }
        let digraph = if self.options.use_digraphs {
            let end = (self.pos + 2).min(self.chars.len());
            digraph_replacement(&self.chars[self.pos..end])
        } else {
            None
        };
        let (c, op) = match digraph {
            Some(replacement) => {
                self.pos += 1;
                (replacement, None)
            }
            None => (c, self.operator_at_point()),
        };
        if matches!(c, '{' | '}') && self.paren_depth > 0 {
            return Err(self.unclosed_paren());
        }
        match c {
            '\n' => {
                self.flush_word()?;
                self.line += 1;
            }
            c if c.is_whitespace() => self.flush_word()?,
            '{' => {
                self.end_line(true)?;
                self.depth += 1;
            }
            '}' => {
                if self.depth == 0 {
                    return Err(CompileError::syntax(self.line, "unbalanced '}'"));
                }
                self.flush_word()?;
                self.depth -= 1;
                self.end_line(false)?;
            }
            ';' if self.paren_depth == 0 => self.end_line(false)?,
            ';' => {
                self.flush_word()?;
                self.push_token(";".to_string(), self.line);
            }
            '"' => {
                self.flush_word()?;
                self.add_char('"');
                self.mode = Mode::StringLiteral;
            }
            '\'' => return self.read_char_literal(),
            '.' if self.is_decimal_point() => {
                self.read_fraction();
                return self.flush_word();
            }
            _ => match op {
                Some(op) => {
                    if EVIL_OPERATORS.contains(&op) {
                        return Err(CompileError::illegal_token(
                            self.line,
                            op,
                            "increment and decrement operators are not supported",
                        ));
                    }
                    match op {
                        "(" => {
                            if self.paren_depth == 0 {
                                self.paren_line = self.line;
                            }
                            self.paren_depth += 1;
                        }
                        ")" => {
                            if self.paren_depth == 0 {
                                return Err(CompileError::syntax(self.line, "unbalanced ')'"));
                            }
                            self.paren_depth -= 1;
                        }
                        _ => (),
                    }
                    self.flush_word()?;
                    self.push_token(op.to_string(), self.line);
                    self.pos += op.chars().count();
                    return Ok(());
                }
                None => self.add_char(c),
            },
        }
        self.pos += 1;
        Ok(())
    }

    fn run(mut self) -> Result<Vec<LineStructure>, CompileError> {
        while let Some(c) = self.peek(0) {
            match self.mode {
                Mode::Code => self.step_code(c)?,
                Mode::StringLiteral => self.step_string(c)?,
                Mode::LineComment => {
                    if c == '\n' {
                        self.line += 1;
                        self.mode = Mode::Code;
                    }
                    self.pos += 1;
                }
                Mode::BlockComment => {
                    if self.looking_at("*/") {
                        self.mode = Mode::Code;
                        self.pos += 2;
                    } else {
                        if c == '\n' {
                            self.line += 1;
                        }
                        self.pos += 1;
                    }
                }
            }
        }
        match self.mode {
            Mode::StringLiteral => {
                return Err(CompileError::syntax(
                    self.word_line,
                    "string literal is not terminated",
                ));
            }
            Mode::BlockComment => {
                return Err(CompileError::syntax(self.line, "comment is not terminated"));
            }
            Mode::Code | Mode::LineComment => (),
        }
        if self.paren_depth != 0 {
            return Err(self.unclosed_paren());
        }
        self.end_line(false)?;
        if self.depth != 0 {
            return Err(CompileError::syntax(self.line, "unbalanced '{'"));
        }
        Ok(self.finished)
    }
}

/// Splits `source` into statements.
///
/// Statements end at `;` (outside parentheses), `{`, `}` and the end
/// of the input.  Comments are dropped, character literals become
/// their integer code, and string literals keep their quotes.
///
/// # Errors
///
/// [`CompileError::IllegalToken`] for `++`, `--` and (when
/// `error_incompatibles` is set) unsupported keywords;
/// [`CompileError::Syntax`] for unterminated literals or comments and
/// for unbalanced braces or parentheses.
pub fn tokenise(
    source: &str,
    options: &CompilerOptions,
) -> Result<Vec<LineStructure>, CompileError> {
    let span = span!(Level::DEBUG, "tokenise");
    let _enter = span.enter();
    let lines = Tokeniser::new(source, options).run()?;
    event!(Level::DEBUG, "source holds {} statements", lines.len());
    Ok(lines)
}
