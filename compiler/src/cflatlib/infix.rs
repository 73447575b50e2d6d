//! Operator-precedence resolution of infix expressions.
//!
//! Tokens are scanned from right to left with an operator stack and
//! an operand stack.  A `+`, `-`, `&` or `*` is unary when it starts
//! the expression or follows another operator.
use tracing::{event, Level};

use super::ast::{ExpressionType, SyntaxTreeNode};
use super::keywords::{
    is_assignment, is_operator, is_right_associative, is_unary, precedence, unary_form,
};
use super::literal::{is_identifier, leaf};
use super::tree::{as_tree_node, matching_paren};
use super::types::{CompileError, LineNumber};

enum Item<'a> {
    Token(&'a str),
    /// A function call, already turned into a tree.
    Call(SyntaxTreeNode),
}

impl Item<'_> {
    /// True if an operator appearing straight after this item has no
    /// left operand.
    fn leaves_operand_missing(&self) -> bool {
        match self {
            Item::Token(token) => *token != ")" && is_operator(token),
            Item::Call(_) => false,
        }
    }
}

/// Replaces each `name ( ... )` with the tree for that call.
fn fold_calls(line: LineNumber, tokens: &[String]) -> Result<Vec<Item<'_>>, CompileError> {
    let mut items = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let is_callee = is_identifier(token)
            && !is_operator(token)
            && tokens.get(i + 1).is_some_and(|next| next == "(");
        if is_callee {
            let Some(close) = matching_paren(tokens, i + 1) else {
                return Err(CompileError::syntax(
                    line,
                    format!("the argument list of {token} is not closed"),
                ));
            };
            items.push(Item::Call(as_tree_node(line, &tokens[i..=close])?));
            i = close + 1;
        } else {
            items.push(Item::Token(token));
            i += 1;
        }
    }
    Ok(items)
}

/// Pops the operands of `op` and pushes the resulting call.
fn commit(
    line: LineNumber,
    op: &str,
    operands: &mut Vec<SyntaxTreeNode>,
) -> Result<(), CompileError> {
    let arity = if is_unary(op) { 1 } else { 2 };
    if operands.len() < arity {
        return Err(CompileError::syntax(
            line,
            format!("operator '{op}' is missing an operand"),
        ));
    }
    let mut node = SyntaxTreeNode::function_call(op, line);
    // The left operand is nearest the top of the stack.
    for _ in 0..arity {
        if let Some(operand) = operands.pop() {
            node.arguments.push(operand);
        }
    }
    if is_assignment(op) {
        if let Some(target) = node.arguments.first_mut() {
            if target.expression_type == ExpressionType::VariableRead {
                target.expression_type = ExpressionType::VariableWrite;
            }
        }
    }
    operands.push(node);
    Ok(())
}

/// Builds the tree for an expression of several tokens.
///
/// # Errors
///
/// [`CompileError::Syntax`] for unbalanced parentheses, operators
/// without operands and unreadable leaves; [`CompileError::Internal`]
/// if the operands do not reduce to a single tree.
pub(crate) fn resolve_infix(
    line: LineNumber,
    tokens: &[String],
) -> Result<SyntaxTreeNode, CompileError> {
    let items = fold_calls(line, tokens)?;
    let prefix_position: Vec<bool> = (0..items.len())
        .map(|k| k == 0 || items[k - 1].leaves_operand_missing())
        .collect();

    let mut operators: Vec<&str> = Vec::new();
    let mut operands: Vec<SyntaxTreeNode> = Vec::new();
    for (item, prefix) in items.into_iter().zip(prefix_position).rev() {
        let token = match item {
            Item::Call(node) => {
                operands.push(node);
                continue;
            }
            Item::Token(token) => token,
        };
        match token {
            ")" => operators.push(token),
            "(" => loop {
                match operators.pop() {
                    Some(")") => break,
                    Some(op) => commit(line, op, &mut operands)?,
                    None => {
                        return Err(CompileError::syntax(line, "unbalanced '('"));
                    }
                }
            },
            _ if is_operator(token) => {
                let op = match unary_form(token) {
                    Some(unary) if prefix => unary,
                    _ => token,
                };
                let Some(level) = precedence(op) else {
                    return Err(CompileError::illegal_token(
                        line,
                        op,
                        "this operator cannot appear in an expression",
                    ));
                };
                while let Some(&top) = operators.last() {
                    let Some(top_level) = precedence(top) else {
                        // A `)` waiting for its `(`.
                        break;
                    };
                    if top_level > level || (top_level == level && is_right_associative(level)) {
                        operators.pop();
                        commit(line, top, &mut operands)?;
                    } else {
                        break;
                    }
                }
                operators.push(op);
            }
            _ => operands.push(leaf(line, token)?),
        }
    }
    while let Some(op) = operators.pop() {
        if op == ")" {
            return Err(CompileError::syntax(line, "unbalanced ')'"));
        }
        commit(line, op, &mut operands)?;
    }
    match (operands.pop(), operands.is_empty()) {
        (Some(tree), true) => Ok(tree),
        (tree, _) => {
            event!(
                Level::DEBUG,
                "line {line}: expression {tokens:?} left {} operands",
                operands.len() + usize::from(tree.is_some())
            );
            Err(CompileError::Internal {
                line: Some(line),
                msg: "expression did not reduce to a single value".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(text: &str) -> String {
        let tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        match resolve_infix(1, &tokens) {
            Ok(tree) => tree.expression().to_string(),
            Err(e) => panic!("failed to resolve {text:?}: {e}"),
        }
    }

    fn resolve_err(text: &str) -> CompileError {
        let tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        match resolve_infix(1, &tokens) {
            Ok(tree) => panic!("{text:?} should not resolve, got {}", tree.expression()),
            Err(e) => e,
        }
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(resolve("1 + 2 * 3"), "+(1, *(2, 3))");
        assert_eq!(resolve("1 * 2 + 3"), "+(*(1, 2), 3)");
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(resolve("a - b - c"), "-(-(a, b), c)");
        assert_eq!(resolve("a / b * c"), "*(/(a, b), c)");
    }

    #[test]
    fn test_right_associativity() {
        assert_eq!(resolve("a = b = c"), "=(a, =(b, c))");
        assert_eq!(resolve("c ? x : y"), "?(c, :(x, y))");
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(resolve("- 1 + 2"), "+(#_unaryminus(1), 2)");
        assert_eq!(resolve("a * - b"), "*(a, #_unaryminus(b))");
        assert_eq!(resolve("* p = & x"), "=(#_ptrderef(p), #_addressof(x))");
        assert_eq!(resolve("! a && ~ b"), "&&(!(a), ~(b))");
        assert_eq!(resolve("- - a"), "#_unaryminus(#_unaryminus(a))");
        assert_eq!(resolve("( a ) - b"), "-(a, b)");
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(resolve("( 1 + 2 ) * 3"), "*(+(1, 2), 3)");
        assert_eq!(resolve("- ( a + b )"), "#_unaryminus(+(a, b))");
    }

    #[test]
    fn test_calls_are_operands() {
        assert_eq!(resolve("f ( x , 1 ) + 2"), "+(f(x, 1), 2)");
        assert_eq!(resolve("g ( ) * h ( y + 1 )"), "*(g(), h(+(y, 1)))");
        assert_eq!(resolve("sizeof ( x ) + 1"), "+(sizeof(x), 1)");
    }

    #[test]
    fn test_comma_is_weakest() {
        assert_eq!(resolve("a = 1 , b = 2"), ",(=(a, 1), =(b, 2))");
    }

    #[test]
    fn test_assignment_target_is_a_write() {
        let tokens: Vec<String> = ["x", "+=", "y"].iter().map(|s| (*s).to_string()).collect();
        let tree = resolve_infix(1, &tokens).expect("valid");
        assert_eq!(
            tree.arguments[0].expression_type,
            ExpressionType::VariableWrite
        );
        assert_eq!(
            tree.arguments[1].expression_type,
            ExpressionType::VariableRead
        );
    }

    #[test]
    fn test_literals_are_classified() {
        assert_eq!(resolve("x == 0x10"), "==(x, 16)");
        assert_eq!(resolve("s = \"hi\""), "=(s, \"hi\")");
        assert_eq!(resolve("f = 1.5 * 2."), "=(f, *(1.5, 2.0))");
    }

    #[test]
    fn test_errors() {
        assert!(matches!(resolve_err("1 +"), CompileError::Syntax { .. }));
        assert!(matches!(resolve_err("( 1 + 2"), CompileError::Syntax { .. }));
        assert!(matches!(resolve_err("1 + 2 )"), CompileError::Syntax { .. }));
        assert!(matches!(resolve_err("a b"), CompileError::Internal { .. }));
    }
}
