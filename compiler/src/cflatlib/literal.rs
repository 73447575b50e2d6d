//! Turns a single token into a leaf of the syntax tree.
use super::ast::{LiteralValue, ReturnType, SyntaxTreeNode};
use super::rx::LazyRegex;
use super::types::{CompileError, LineNumber};

static HEXADECIMAL: LazyRegex = LazyRegex::token(r"0[Xx][0-9A-Fa-f_]+");
static OCTAL: LazyRegex = LazyRegex::token(r"0[0-7_]+");
static BINARY: LazyRegex = LazyRegex::token(r"0[Bb][01_]+");
static DECIMAL: LazyRegex = LazyRegex::token(r"[-+]?[0-9_]+[Ll]?");
static FLOATING_POINT: LazyRegex =
    LazyRegex::token(r"[-+]?([0-9]+\.[0-9]*|\.[0-9]+|[0-9]+)([eE][-+]?[0-9]+)?[fF]?");
static IDENTIFIER: LazyRegex = LazyRegex::token(r"[A-Za-z_][A-Za-z0-9_]*");

pub(crate) fn is_identifier(token: &str) -> bool {
    IDENTIFIER.is_match(token)
}

/// Reads an integer literal, keeping only the low 32 bits of any
/// value which fits in 64.
fn integer(
    line: LineNumber,
    token: &str,
    digits: &str,
    radix: u32,
) -> Result<SyntaxTreeNode, CompileError> {
    let (negative, digits) = match digits.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, digits.strip_prefix('+').unwrap_or(digits)),
    };
    let digits: String = digits
        .chars()
        .filter(|c| *c != '_' && *c != 'L' && *c != 'l')
        .collect();
    let magnitude = u64::from_str_radix(&digits, radix).map_err(|_| CompileError::Overflow {
        line,
        literal: token.to_string(),
        target: "int",
    })?;
    let value = if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    };
    #[allow(clippy::cast_possible_truncation)]
    let low = value as u32 as i32;
    Ok(SyntaxTreeNode::literal(
        ReturnType::Int,
        LiteralValue::Int(low),
        line,
    ))
}

/// Classifies a lone token as a literal or a variable reference.
///
/// # Errors
///
/// [`CompileError::Overflow`] for integers wider than 64 bits and
/// [`CompileError::Syntax`] for tokens which are neither literals
/// nor names.
pub(crate) fn leaf(line: LineNumber, token: &str) -> Result<SyntaxTreeNode, CompileError> {
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        let text = &token[1..token.len() - 1];
        return Ok(SyntaxTreeNode::literal(
            ReturnType::Database,
            LiteralValue::Str(text.to_string()),
            line,
        ));
    }
    match token {
        "true" | "false" => {
            return Ok(SyntaxTreeNode::literal(
                ReturnType::Int,
                LiteralValue::Bool(token == "true"),
                line,
            ));
        }
        _ => (),
    }
    if HEXADECIMAL.is_match(token) {
        integer(line, token, &token[2..], 16)
    } else if OCTAL.is_match(token) {
        integer(line, token, &token[1..], 8)
    } else if BINARY.is_match(token) {
        integer(line, token, &token[2..], 2)
    } else if DECIMAL.is_match(token) {
        integer(line, token, token, 10)
    } else if FLOATING_POINT.is_match(token) {
        let digits = token.trim_end_matches(['f', 'F']);
        match digits.parse::<f64>() {
            Ok(value) => Ok(SyntaxTreeNode::literal(
                ReturnType::Float,
                LiteralValue::Double(value),
                line,
            )),
            Err(e) => Err(CompileError::Internal {
                line: Some(line),
                msg: format!("floating-point literal '{token}' could not be read: {e}"),
            }),
        }
    } else if is_identifier(token) {
        Ok(SyntaxTreeNode::variable_read(token, line))
    } else {
        Err(CompileError::syntax(
            line,
            format!("'{token}' is neither a literal nor a name"),
        ))
    }
}
