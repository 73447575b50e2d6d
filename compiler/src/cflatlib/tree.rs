//! Turns tokenised statements into a syntax tree.
use tracing::{event, span, Level};

use super::ast::{ReturnType, SyntaxTreeNode, ROOT_NODE_NAME};
use super::infix::resolve_infix;
use super::keywords::{
    is_operator, CODE_BLOCK_KEYWORDS, DECLARATION_PREWORDS, FUNCTION_ANNOTATIONS, FUNCTION_TYPES,
};
use super::literal::{is_identifier, leaf};
use super::tokenise::LineStructure;
use super::types::{CompileError, LineNumber};

#[cfg(test)]
mod tests;

/// Index of the `)` which closes the `(` at `open`.
pub(crate) fn matching_paren(tokens: &[String], open: usize) -> Option<usize> {
    let mut depth = 0_usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.as_str() {
            "(" => depth += 1,
            ")" => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => (),
        }
    }
    None
}

/// Positions of `separator` outside any parentheses.
fn top_level_positions(tokens: &[String], separator: &str) -> Vec<usize> {
    let mut depth = 0_usize;
    let mut positions = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        match token.as_str() {
            "(" => depth += 1,
            ")" => depth = depth.saturating_sub(1),
            t if t == separator && depth == 0 => positions.push(i),
            _ => (),
        }
    }
    positions
}

fn split_top_level<'t>(tokens: &'t [String], separator: &str) -> Vec<&'t [String]> {
    let mut parts = Vec::new();
    let mut start = 0;
    for position in top_level_positions(tokens, separator) {
        parts.push(&tokens[start..position]);
        start = position + 1;
    }
    parts.push(&tokens[start..]);
    parts
}

/// True if there is a `(` at `open` and the last token closes it.
fn closes_at_end(tokens: &[String], open: usize) -> bool {
    tokens.get(open).is_some_and(|t| t == "(")
        && matching_paren(tokens, open) == Some(tokens.len() - 1)
}

fn resolve_type(line: LineNumber, word: &str) -> Result<ReturnType, CompileError> {
    match word {
        "void" => Ok(ReturnType::Nothing),
        "int" => Ok(ReturnType::Int),
        "float" => Ok(ReturnType::Float),
        _ => Err(CompileError::syntax(
            line,
            format!("type '{word}' cannot be used here"),
        )),
    }
}

fn for_loop(line: LineNumber, tokens: &[String]) -> Result<SyntaxTreeNode, CompileError> {
    if !closes_at_end(tokens, 1) {
        return Err(CompileError::syntax(
            line,
            "for must be followed by a parenthesised list of three clauses",
        ));
    }
    let inner = &tokens[2..tokens.len() - 1];
    let clauses: Vec<&[String]> = if top_level_positions(inner, ";").is_empty() {
        let commas = top_level_positions(inner, ",");
        match (commas.first(), commas.last()) {
            (Some(&first), Some(&last)) if first != last => vec![
                &inner[..first],
                &inner[first + 1..last],
                &inner[last + 1..],
            ],
            _ => Vec::new(),
        }
    } else {
        split_top_level(inner, ";")
    };
    if clauses.len() != 3 {
        return Err(CompileError::syntax(
            line,
            "for loop needs exactly three clauses",
        ));
    }
    let mut node = SyntaxTreeNode::function_call("for", line);
    for clause in clauses {
        node.arguments.push(if clause.is_empty() {
            SyntaxTreeNode::internal_call("#_nop", line)
        } else {
            as_tree_node(line, clause)?
        });
    }
    Ok(node)
}

/// Recognises `[annotation...] type name ( arguments )`.
fn function_definition(
    line: LineNumber,
    tokens: &[String],
) -> Option<Result<SyntaxTreeNode, CompileError>> {
    let open = tokens.iter().position(|t| t == "(")?;
    if !(2..=4).contains(&open) || !closes_at_end(tokens, open) {
        return None;
    }
    let (annotations, signature) = tokens[..open].split_at(open - 2);
    let (return_type, name) = (signature[0].as_str(), signature[1].as_str());
    let is_definition = annotations
        .iter()
        .all(|a| FUNCTION_ANNOTATIONS.contains(&a.as_str()))
        && FUNCTION_TYPES.contains(&return_type)
        && is_identifier(name)
        && !is_operator(name);
    if !is_definition {
        return None;
    }
    Some(build_function_definition(
        line,
        return_type,
        name,
        &tokens[open + 1..tokens.len() - 1],
    ))
}

fn build_function_definition(
    line: LineNumber,
    return_type: &str,
    name: &str,
    argument_tokens: &[String],
) -> Result<SyntaxTreeNode, CompileError> {
    let mut node = SyntaxTreeNode::function_def(name, resolve_type(line, return_type)?, line);
    if argument_tokens.is_empty() || argument_tokens == ["void"] {
        return Ok(node);
    }
    for group in split_top_level(argument_tokens, ",") {
        let Some((type_word, rest)) = group.split_first() else {
            return Err(CompileError::syntax(line, "misplaced comma in argument list"));
        };
        let argument_type = resolve_type(line, type_word)?;
        let stars = rest.iter().take_while(|t| *t == "*").count();
        match &rest[stars..] {
            [argument_name] if is_identifier(argument_name) => {
                node.arguments.push(SyntaxTreeNode::argument_def(
                    argument_name,
                    argument_type,
                    u32::try_from(stars).unwrap_or(u32::MAX),
                    line,
                ));
            }
            [] => {
                return Err(CompileError::syntax(
                    line,
                    format!("an argument of {name} has no name"),
                ));
            }
            [first, ..] => {
                return Err(CompileError::illegal_token(
                    line,
                    first,
                    format!("unexpected in the argument list of {name}"),
                ));
            }
        }
    }
    Ok(node)
}

fn is_call(tokens: &[String]) -> bool {
    tokens.len() >= 3
        && is_identifier(&tokens[0])
        && !is_operator(&tokens[0])
        && closes_at_end(tokens, 1)
}

fn function_call(line: LineNumber, tokens: &[String]) -> Result<SyntaxTreeNode, CompileError> {
    let name = tokens[0].as_str();
    let mut node = SyntaxTreeNode::function_call(name, line);
    let inner = &tokens[2..tokens.len() - 1];
    if inner.is_empty() {
        return Ok(node);
    }
    for argument in split_top_level(inner, ",") {
        if argument.is_empty() {
            return Err(CompileError::syntax(
                line,
                format!("misplaced comma in the arguments of {name}"),
            ));
        }
        node.arguments.push(as_tree_node(line, argument)?);
    }
    Ok(node)
}

/// Handles `return`, `break`, `continue`, `goto` and `comefrom`.
fn control_transfer(
    line: LineNumber,
    tokens: &[String],
) -> Option<Result<SyntaxTreeNode, CompileError>> {
    let keyword = tokens[0].as_str();
    let rest = &tokens[1..];
    let result = match keyword {
        "return" => {
            let mut node = SyntaxTreeNode::function_call(keyword, line);
            if !rest.is_empty() {
                match as_tree_node(line, rest) {
                    Ok(value) => node.arguments.push(value),
                    Err(e) => return Some(Err(e)),
                }
            }
            Ok(node)
        }
        "break" | "continue" => {
            if rest.is_empty() {
                Ok(SyntaxTreeNode::function_call(keyword, line))
            } else {
                Err(CompileError::syntax(
                    line,
                    format!("{keyword} takes no operands"),
                ))
            }
        }
        "goto" | "comefrom" => match rest {
            [label] if is_identifier(label) => {
                let mut node = SyntaxTreeNode::function_call(keyword, line);
                node.arguments.push(SyntaxTreeNode::raw(label, line));
                Ok(node)
            }
            _ => Err(CompileError::syntax(
                line,
                format!("{keyword} must be followed by a single label"),
            )),
        },
        _ => return None,
    };
    Some(result)
}

/// Recognises `[preword...] type [*...] name [= value]`.
fn declaration(
    line: LineNumber,
    tokens: &[String],
) -> Option<Result<SyntaxTreeNode, CompileError>> {
    let prewords = tokens
        .iter()
        .take(4)
        .take_while(|t| DECLARATION_PREWORDS.contains(&t.as_str()))
        .count();
    if prewords == 0 || prewords == tokens.len() {
        return None;
    }
    Some(build_declaration(line, tokens, prewords))
}

fn build_declaration(
    line: LineNumber,
    tokens: &[String],
    prewords: usize,
) -> Result<SyntaxTreeNode, CompileError> {
    let mut index = prewords;
    let mut type_name = tokens[prewords - 1].clone();
    if type_name == "struct" {
        type_name = format!("struct {}", tokens[index]);
        index += 1;
    }
    let stars = tokens[index..].iter().take_while(|t| *t == "*").count();
    index += stars;
    let pointer_depth = u32::try_from(stars).unwrap_or(u32::MAX);
    let name = match tokens.get(index) {
        Some(name) if is_identifier(name) => name.as_str(),
        Some(other) => {
            return Err(CompileError::syntax(
                line,
                format!("expected a variable name after {type_name}, found '{other}'"),
            ));
        }
        None => {
            return Err(CompileError::syntax(
                line,
                format!("declaration of {type_name} has no variable name"),
            ));
        }
    };
    match &tokens[index + 1..] {
        [] => {
            let mut node = SyntaxTreeNode::internal_call("#_declarevar", line);
            node.return_type = Some(ReturnType::Nothing);
            node.pointer_depth = pointer_depth;
            node.arguments.push(SyntaxTreeNode::raw(name, line));
            node.arguments.push(SyntaxTreeNode::raw(&type_name, line));
            Ok(node)
        }
        [equals, value @ ..] if equals == "=" && !value.is_empty() => {
            let mut node = SyntaxTreeNode::function_call("#_assignvar", line);
            node.return_type = Some(ReturnType::Nothing);
            node.pointer_depth = pointer_depth;
            node.arguments.push(SyntaxTreeNode::raw(name, line));
            node.arguments.push(SyntaxTreeNode::raw(&type_name, line));
            node.arguments.push(as_tree_node(line, value)?);
            Ok(node)
        }
        _ => Err(CompileError::syntax(
            line,
            format!("unexpected tokens after the declaration of {name}"),
        )),
    }
}

/// Builds the tree for one statement.
///
/// # Errors
///
/// Any [`CompileError`] found in the statement's structure or in the
/// expressions it contains.
pub fn as_tree_node(line: LineNumber, tokens: &[String]) -> Result<SyntaxTreeNode, CompileError> {
    let Some(first) = tokens.first() else {
        return Err(CompileError::Internal {
            line: Some(line),
            msg: "cannot build a tree from an empty statement".to_string(),
        });
    };
    if first == "for" {
        return for_loop(line, tokens);
    }
    if let Some(result) = function_definition(line, tokens) {
        return result;
    }
    if is_call(tokens) {
        return function_call(line, tokens);
    }
    if let Some(result) = control_transfer(line, tokens) {
        return result;
    }
    if let Some(result) = declaration(line, tokens) {
        return result;
    }
    if let Some(keyword) = tokens
        .iter()
        .find(|t| CODE_BLOCK_KEYWORDS.contains(&t.as_str()))
    {
        return if tokens.len() == 1 {
            Ok(SyntaxTreeNode::function_call(keyword, line))
        } else {
            Err(CompileError::syntax(
                line,
                format!("'{keyword}' cannot be used like this; put its body in braces"),
            ))
        };
    }
    match tokens {
        [only] => leaf(line, only),
        _ => resolve_infix(line, tokens),
    }
}

/// Gives each `if` which is directly followed by an `else` the form
/// `ifelse(condition) { #_then {...} #_else {...} }`.
fn merge_if_else(statements: Vec<SyntaxTreeNode>) -> Result<Vec<SyntaxTreeNode>, CompileError> {
    let mut merged = Vec::with_capacity(statements.len());
    let mut pending = statements.into_iter().peekable();
    while let Some(mut node) = pending.next() {
        if node.is_named("else") {
            return Err(CompileError::syntax(
                node.line_number,
                "else without a preceding if",
            ));
        }
        node.statements = merge_if_else(std::mem::take(&mut node.statements))?;
        if node.is_named("if") {
            if let Some(otherwise) = pending.next_if(|next| next.is_named("else")) {
                let mut then_part = SyntaxTreeNode::internal_call("#_then", node.line_number);
                then_part.statements = std::mem::take(&mut node.statements);
                let mut else_part =
                    SyntaxTreeNode::internal_call("#_else", otherwise.line_number);
                else_part.statements = merge_if_else(otherwise.statements)?;
                node.name = Some("ifelse".to_string());
                node.statements = vec![then_part, else_part];
            }
        }
        merged.push(node);
    }
    Ok(merged)
}

/// Each entry is a node whose block is still open, together with the
/// depth of the statements inside that block.
struct OpenBlocks {
    stack: Vec<(SyntaxTreeNode, usize)>,
}

impl OpenBlocks {
    fn body_depth(&self) -> usize {
        self.stack.last().map_or(0, |(_, depth)| *depth)
    }

    fn add(&mut self, node: SyntaxTreeNode) -> Result<(), CompileError> {
        match self.stack.last_mut() {
            Some((parent, _)) => {
                parent.statements.push(node);
                Ok(())
            }
            None => Err(CompileError::Internal {
                line: Some(node.line_number),
                msg: "the root of the tree was closed too early".to_string(),
            }),
        }
    }

    /// Closes the innermost block; the root is never closed.
    fn close_innermost(&mut self) -> Result<(), CompileError> {
        if self.stack.len() > 1 {
            if let Some((node, _)) = self.stack.pop() {
                return self.add(node);
            }
        }
        Ok(())
    }
}

/// Builds the whole program's tree from its statements.
///
/// The root is a function definition named `cflat_node_root`; a
/// statement which opens a block owns the statements inside it.
///
/// # Errors
///
/// Any error reported by [`as_tree_node`], and
/// [`CompileError::Syntax`] for an `else` with no `if` before it.
pub fn build_tree(lines: &[LineStructure]) -> Result<SyntaxTreeNode, CompileError> {
    let span = span!(Level::DEBUG, "build_tree");
    let _enter = span.enter();
    let mut open = OpenBlocks {
        stack: vec![(
            SyntaxTreeNode::function_def(ROOT_NODE_NAME, ReturnType::Nothing, 1),
            0,
        )],
    };
    for line in lines {
        while open.stack.len() > 1 && line.depth < open.body_depth() {
            open.close_innermost()?;
        }
        let node = as_tree_node(line.line_number, &line.tokens)?;
        event!(
            Level::TRACE,
            "line {}: {}",
            line.line_number,
            node.expression()
        );
        if line.opens_block {
            open.stack.push((node, line.depth + 1));
        } else {
            open.add(node)?;
        }
    }
    while open.stack.len() > 1 {
        open.close_innermost()?;
    }
    match open.stack.pop() {
        Some((mut root, _)) => {
            root.statements = merge_if_else(std::mem::take(&mut root.statements))?;
            Ok(root)
        }
        None => Err(CompileError::Internal {
            line: None,
            msg: "the root of the tree went missing".to_string(),
        }),
    }
}
