//! Classification of a single operand word.
use logos::Logos;

#[derive(Debug, Logos, PartialEq, Eq, Clone)]
pub(crate) enum OperandToken {
    /// The number as written, so `r1` is 1.
    #[regex("[rR][0-9]+", |lex| lex.slice()[1..].parse::<u32>().ok())]
    Register(u32),

    /// A label reference; the name excludes the `@`.
    #[regex("@[^ \t\n,;@]+", |lex| lex.slice()[1..].to_string())]
    Label(String),

    /// Any of the integer forms, as a 32-bit two's complement value.
    #[regex("-?[0-9]+", decimal)]
    #[regex("[0-9A-Fa-f]+[hH]", |lex| radix(lex.slice(), 16))]
    #[regex("[01]+[bB]", |lex| radix(lex.slice(), 2))]
    Integer(u32),

    /// The IEEE-754 single-precision bits of a decimal fraction.
    #[regex(r"-?[0-9]*\.[0-9]+([eE][-+]?[0-9]+)?[fF]?", float_bits)]
    Float(u32),
}

fn decimal(lex: &mut logos::Lexer<OperandToken>) -> Option<u32> {
    let n: i64 = lex.slice().parse().ok()?;
    if n < 0 {
        // Two's complement.
        i32::try_from(n).ok().map(|v| v as u32)
    } else {
        u32::try_from(n).ok()
    }
}

fn radix(text: &str, radix: u32) -> Option<u32> {
    // Drop the trailing `h` or `b`.
    u32::from_str_radix(&text[..text.len() - 1], radix).ok()
}

fn float_bits(lex: &mut logos::Lexer<OperandToken>) -> Option<u32> {
    lex.slice()
        .trim_end_matches(['f', 'F'])
        .parse::<f32>()
        .ok()
        .map(f32::to_bits)
}

/// Classify `word`, which must be a complete operand.  Returns `None`
/// if it is not exactly one operand token.
pub(crate) fn classify_operand(word: &str) -> Option<OperandToken> {
    let mut lexer = OperandToken::lexer(word);
    match (lexer.next(), lexer.next()) {
        (Some(Ok(token)), None) => Some(token),
        _ => None,
    }
}
