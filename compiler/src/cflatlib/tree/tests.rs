use super::super::ast::{ExpressionType, ReturnType, SyntaxTreeNode, ROOT_NODE_NAME};
use super::super::tokenise::tokenise;
use super::super::types::{CompileError, CompilerOptions};
use super::{as_tree_node, build_tree};

fn build(source: &str) -> Result<SyntaxTreeNode, CompileError> {
    let lines = tokenise(source, &CompilerOptions::default())?;
    build_tree(&lines)
}

fn root(source: &str) -> SyntaxTreeNode {
    match build(source) {
        Ok(tree) => tree,
        Err(e) => panic!("failed to build a tree for {source:?}: {e}"),
    }
}

/// The one-line form of each top-level statement.
fn statements(source: &str) -> Vec<String> {
    root(source)
        .statements
        .iter()
        .map(|s| s.expression().to_string())
        .collect()
}

fn single(source: &str) -> String {
    match statements(source).as_slice() {
        [only] => only.clone(),
        other => panic!("expected one statement from {source:?}, got {other:?}"),
    }
}

#[test]
fn test_root_node() {
    let tree = root("x = 1;");
    assert_eq!(tree.expression_type, ExpressionType::FunctionDef);
    assert!(tree.is_named(ROOT_NODE_NAME));
    assert_eq!(tree.return_type, Some(ReturnType::Nothing));
    assert_eq!(statements("x = 1;"), vec!["=(x, 1)"]);
}

#[test]
fn test_empty_program() {
    assert!(root("").statements.is_empty());
}

#[test]
fn test_function_definition() {
    let tree = root("int add(int a, float *b) { return a + b; }");
    let function = &tree.statements[0];
    assert_eq!(function.expression_type, ExpressionType::FunctionDef);
    assert!(function.is_named("add"));
    assert_eq!(function.return_type, Some(ReturnType::Int));
    let arguments: Vec<(&str, Option<ReturnType>, u32)> = function
        .arguments
        .iter()
        .map(|a| (a.name.as_deref().unwrap_or(""), a.return_type, a.pointer_depth))
        .collect();
    assert_eq!(
        arguments,
        vec![
            ("a", Some(ReturnType::Int), 0),
            ("b", Some(ReturnType::Float), 1),
        ]
    );
    assert!(function
        .arguments
        .iter()
        .all(|a| a.expression_type == ExpressionType::FunctionArgumentDef));
    let body: Vec<String> = function
        .statements
        .iter()
        .map(|s| s.expression().to_string())
        .collect();
    assert_eq!(body, vec!["return(+(a, b))"]);
}

#[test]
fn test_function_without_arguments() {
    for source in ["void f(void) { }", "inline void f() { }"] {
        let tree = root(source);
        let function = &tree.statements[0];
        assert_eq!(function.return_type, Some(ReturnType::Nothing));
        assert!(function.arguments.is_empty(), "{source}");
    }
}

#[test]
fn test_function_with_unsupported_return_type() {
    assert!(matches!(
        build("char f() { }"),
        Err(CompileError::Syntax { line: 1, .. })
    ));
    assert!(matches!(
        build("int f(int) { }"),
        Err(CompileError::Syntax { .. })
    ));
}

#[test]
fn test_calls() {
    assert_eq!(single("print(\"hi\", 1 + 2);"), "print(\"hi\", +(1, 2))");
    assert_eq!(single("tick();"), "tick()");
    assert_eq!(single("f(g(1), 2);"), "f(g(1), 2)");
    assert!(matches!(build("f(1,,2);"), Err(CompileError::Syntax { .. })));
}

#[test]
fn test_declarations() {
    assert_eq!(single("int x;"), "#_declarevar(\"x\", \"int\")");
    assert_eq!(single("const int k = 2 * 3;"), "#_assignvar(\"k\", \"int\", *(2, 3))");
    assert_eq!(single("struct Point p;"), "#_declarevar(\"p\", \"struct Point\")");
    let tree = root("float **p = 1.5;");
    let declaration = &tree.statements[0];
    assert_eq!(
        declaration.expression().to_string(),
        "#_assignvar(\"p\", \"float\", 1.5)"
    );
    assert_eq!(declaration.expression_type, ExpressionType::FunctionCall);
    assert_eq!(declaration.pointer_depth, 2);
    assert_eq!(
        root("int x;").statements[0].expression_type,
        ExpressionType::InternalCall
    );
}

#[test]
fn test_bad_declarations() {
    assert!(matches!(build("int 3;"), Err(CompileError::Syntax { .. })));
    assert!(matches!(build("int x 3;"), Err(CompileError::Syntax { .. })));
    assert!(matches!(build("int x =;"), Err(CompileError::Syntax { .. })));
}

#[test]
fn test_for_loops() {
    let expected = "for(=(i, 0), <(i, 10), =(i, +(i, 1)))";
    assert_eq!(single("for (i = 0; i < 10; i = i + 1) { x = x + i; }"), expected);
    assert_eq!(single("for (i = 0, i < 10, i = i + 1) { }"), expected);
    assert_eq!(single("for (;;) { }"), "for(#_nop(), #_nop(), #_nop())");
    assert_eq!(
        root("for (;;) { x = 1; }").statements[0].statements.len(),
        1
    );
    assert!(matches!(build("for (a; b) { }"), Err(CompileError::Syntax { .. })));
    assert!(matches!(build("for (a) { }"), Err(CompileError::Syntax { .. })));
}

#[test]
fn test_control_transfer() {
    assert_eq!(
        statements("return; return x * 2; break; continue; goto end; comefrom top;"),
        vec![
            "return()",
            "return(*(x, 2))",
            "break()",
            "continue()",
            "goto(\"end\")",
            "comefrom(\"top\")",
        ]
    );
    assert!(matches!(build("break 2;"), Err(CompileError::Syntax { .. })));
    assert!(matches!(build("goto;"), Err(CompileError::Syntax { .. })));
}

#[test]
fn test_code_block_keyword_misuse() {
    assert!(matches!(build("if x;"), Err(CompileError::Syntax { .. })));
    assert!(matches!(build("y = while;"), Err(CompileError::Syntax { .. })));
}

#[test]
fn test_nesting() {
    let tree = root("void main() {\n  if (x) {\n    y = 1;\n  }\n  z = 2;\n}\n");
    assert_eq!(tree.statements.len(), 1);
    let main = &tree.statements[0];
    let body: Vec<String> = main
        .statements
        .iter()
        .map(|s| s.expression().to_string())
        .collect();
    assert_eq!(body, vec!["if(x)", "=(z, 2)"]);
    assert_eq!(main.statements[0].statements.len(), 1);
    assert_eq!(main.statements[0].statements[0].line_number, 3);
    assert_eq!(main.statements[1].line_number, 5);
}

#[test]
fn test_bare_block_has_no_owner() {
    let tree = root("x = 1; { y = 2; }");
    assert_eq!(statements("x = 1; { y = 2; }"), vec!["=(x, 1)", "=(y, 2)"]);
    assert!(tree.statements[0].statements.is_empty());
}

#[test]
fn test_if_else_merge() {
    let tree = root("if (a) { b = 1; } else { b = 2; b = 3; }\nc = 4;");
    assert_eq!(tree.statements.len(), 2);
    let merged = &tree.statements[0];
    assert_eq!(merged.expression().to_string(), "ifelse(a)");
    let branches: Vec<(String, usize)> = merged
        .statements
        .iter()
        .map(|s| (s.expression().to_string(), s.statements.len()))
        .collect();
    assert_eq!(
        branches,
        vec![("#_then()".to_string(), 1), ("#_else()".to_string(), 2)]
    );
    assert!(merged
        .statements
        .iter()
        .all(|s| s.expression_type == ExpressionType::InternalCall));
    assert_eq!(tree.statements[1].line_number, 2);
}

#[test]
fn test_nested_if_else_merge() {
    let tree = root("if (a) { if (b) { x = 1; } else { x = 2; } } else { x = 3; }");
    let outer = &tree.statements[0];
    assert!(outer.is_named("ifelse"));
    let then_part = &outer.statements[0];
    assert_eq!(then_part.statements.len(), 1);
    assert!(then_part.statements[0].is_named("ifelse"));
}

#[test]
fn test_if_without_else_is_unchanged() {
    assert_eq!(statements("if (a) { b = 1; } c = 2;"), vec!["if(a)", "=(c, 2)"]);
}

#[test]
fn test_else_without_if() {
    assert!(matches!(
        build("x = 1;\nelse { y = 2; }"),
        Err(CompileError::Syntax { line: 2, .. })
    ));
}

#[test]
fn test_single_token_statement() {
    let tree = as_tree_node(7, &["0x20".to_string()]).expect("valid");
    assert_eq!(tree.expression_type, ExpressionType::LiteralLeaf);
    assert_eq!(tree.line_number, 7);
    assert_eq!(tree.expression().to_string(), "32");
}

#[test]
fn test_empty_statement_is_internal_error() {
    assert!(matches!(
        as_tree_node(1, &[]),
        Err(CompileError::Internal { .. })
    ));
}

#[test]
fn test_braceless_bodies_are_rejected() {
    for source in ["if (x) y = 1;", "while (n > 0) n = n - 1;", "if (x)\n    f(y);"] {
        assert!(
            matches!(build(source), Err(CompileError::Syntax { line: 1, .. })),
            "{source:?} should be a syntax error"
        );
    }
}
