//! Word lists shared by the tokeniser and the tree builder.

/// Operators the tokeniser splits on, longest first so that `<<=` is
/// never read as `<<` followed by `=`.
pub(crate) const OPERATORS: [&str; 42] = [
    "...", "<<=", ">>=", ">>>", //
    "++", "--", "&&", "||", "<<", ">>", "->", "<=", ">=", "==", "!=", "+=", "-=", "*=", "/=",
    "%=", "&=", "^=", "|=", //
    "(", ")", "<", ">", "^", "|", "?", ":", "=", ",", ".", "+", "-", "!", "~", "*", "&", "/",
    "%",
];

/// Operators which are recognised only so that they can be refused.
pub(crate) const EVIL_OPERATORS: [&str; 2] = ["++", "--"];

/// Keywords of full C which this dialect does not support.
pub(crate) const UNSUPPORTED_KEYWORDS: [&str; 11] = [
    "auto", "register", "signed", "unsigned", "volatile", "static", "extern", "long", "short",
    "double", "bool",
];

/// Words which introduce a block (or stand alone) rather than
/// computing a value.
pub(crate) const CODE_BLOCK_KEYWORDS: [&str; 11] = [
    "do", "else", "enum", "for", "if", "struct", "switch", "union", "while", "forever", "repeat",
];

/// Words which may precede the name in a variable declaration.
pub(crate) const DECLARATION_PREWORDS: [&str; 14] = [
    "auto", "extern", "const", "register", "struct", "char", "short", "int", "long", "float",
    "double", "bool", "var", "val",
];

/// Words which may precede the return type of a function definition.
pub(crate) const FUNCTION_ANNOTATIONS: [&str; 6] =
    ["auto", "extern", "const", "register", "static", "inline"];

/// Words which may name the return type of a function definition.
pub(crate) const FUNCTION_TYPES: [&str; 8] = [
    "void", "char", "short", "int", "long", "float", "double", "bool",
];

pub(crate) const UNARY_PLUS: &str = "#_unaryplus";
pub(crate) const UNARY_MINUS: &str = "#_unaryminus";
pub(crate) const ADDRESS_OF: &str = "#_addressof";
pub(crate) const POINTER_DEREFERENCE: &str = "#_ptrderef";

pub(crate) fn is_operator(token: &str) -> bool {
    OPERATORS.contains(&token) || precedence(token).is_some()
}

/// Binding strength of an operator, from `,` (weakest) upwards.
pub(crate) fn precedence(op: &str) -> Option<u8> {
    let level = match op {
        "," => 0,
        "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "<<=" | ">>=" | "&=" | "^=" | "|=" => 1,
        "?" | ":" => 2,
        "||" => 3,
        "&&" => 4,
        "|" => 5,
        "^" => 6,
        "&" => 7,
        "==" | "!=" => 8,
        "<" | "<=" | ">" | ">=" => 9,
        "<<" | ">>" | ">>>" => 10,
        "+" | "-" => 11,
        "*" | "/" | "%" => 12,
        UNARY_PLUS | UNARY_MINUS | ADDRESS_OF | POINTER_DEREFERENCE | "!" | "~" | "sizeof" => 13,
        "++" | "--" | "." | "->" => 14,
        _ => return None,
    };
    Some(level)
}

/// Levels whose operators group from the right.
pub(crate) fn is_right_associative(level: u8) -> bool {
    matches!(level, 1 | 2 | 13)
}

pub(crate) fn is_unary(op: &str) -> bool {
    precedence(op) == Some(13)
}

pub(crate) fn is_assignment(op: &str) -> bool {
    precedence(op) == Some(1)
}

/// The name a `+`, `-`, `&` or `*` takes when it has only one operand.
pub(crate) fn unary_form(op: &str) -> Option<&'static str> {
    match op {
        "+" => Some(UNARY_PLUS),
        "-" => Some(UNARY_MINUS),
        "&" => Some(ADDRESS_OF),
        "*" => Some(POINTER_DEREFERENCE),
        _ => None,
    }
}
