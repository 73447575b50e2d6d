#![deny(unreachable_pub)]
#![deny(unsafe_code)]
#![warn(clippy::must_use_candidate)]
#![warn(clippy::manual_string_new)]
#![warn(clippy::semicolon_if_nothing_returned)]
#![warn(clippy::return_self_not_must_use)]
#![warn(clippy::wildcard_imports)]
#![warn(clippy::bool_to_int_with_if)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(clippy::match_same_arms)]
#![warn(clippy::missing_errors_doc)]
#![warn(clippy::items_after_statements)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::unreadable_literal)]
#![warn(clippy::pedantic)]
#![allow(clippy::enum_glob_use)] // fix later
#![allow(clippy::redundant_else)] // fix later
#![allow(clippy::too_many_lines)] // fix later
#![allow(clippy::similar_names)] // fix later
#![allow(clippy::explicit_into_iter_loop)] // fix later
#![allow(clippy::default_trait_access)] // fix later
#![allow(clippy::match_wild_err_arm)] // fix later
#![allow(clippy::verbose_bit_mask)] // fix later
#![allow(clippy::redundant_closure_for_method_calls)] // fix later
#![allow(clippy::inconsistent_struct_constructor)] // fix soon
#![allow(clippy::needless_continue)] // fix soon
#![allow(clippy::manual_assert)] // fix soon
#![allow(clippy::if_not_else)] // fix soon
#![allow(clippy::doc_markdown)] // fix soon
#![allow(clippy::needless_pass_by_value)] // fix soon
#![allow(clippy::unused_self)] // fix soon
#![allow(clippy::inline_always)] // fix soon
#![allow(clippy::ignored_unit_patterns)] // fix soon
#![allow(clippy::match_wildcard_for_single_variants)] // fix soon
#![allow(clippy::inefficient_to_string)] // fix soon
#![allow(clippy::map_unwrap_or)] // fix soon
#![allow(clippy::trivially_copy_pass_by_ref)] // fix soon
#![allow(clippy::unnecessary_wraps)] // fix soon
#![allow(clippy::unnecessary_semicolon)] // fix soon

//! Front end of the C-flat compiler.
//!
//! [`parse_program`] runs source text through the preprocessor
//! ([`preprocess`]), the tokeniser ([`tokenise`]) and the tree
//! builder ([`build_tree`]).
use tracing::{event, span, Level};

mod ast;
mod infix;
mod keywords;
mod literal;
mod preprocess;
mod rx;
mod tokenise;
mod tree;
mod types;

pub use ast::{
    Expression, ExpressionType, LiteralValue, ReturnType, SyntaxTreeNode, ROOT_NODE_NAME,
};
pub use preprocess::preprocess;
pub use tokenise::{tokenise, LineStructure};
pub use tree::{as_tree_node, build_tree};
pub use types::{CompileError, CompilerOptions, LineNumber};

/// Preprocesses and tokenises `source`.
///
/// # Errors
///
/// Any error from [`preprocess`] or [`tokenise`].
pub fn tokenise_program(
    source: &str,
    options: &CompilerOptions,
) -> Result<Vec<LineStructure>, CompileError> {
    let text = preprocess(source, options)?;
    tokenise(&text, options)
}

/// Builds the syntax tree of a whole program.
///
/// # Errors
///
/// Any error from [`preprocess`], [`tokenise`] or [`build_tree`].
pub fn parse_program(
    source: &str,
    options: &CompilerOptions,
) -> Result<SyntaxTreeNode, CompileError> {
    let span = span!(Level::INFO, "parse_program");
    let _enter = span.enter();
    let lines = tokenise_program(source, options)?;
    let tree = build_tree(&lines)?;
    event!(
        Level::DEBUG,
        "program has {} top-level statements",
        tree.statements.len()
    );
    Ok(tree)
}
