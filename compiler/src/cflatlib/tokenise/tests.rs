use super::super::types::{CompileError, CompilerOptions};
use super::{tokenise, LineStructure};

fn lines(source: &str) -> Vec<LineStructure> {
    match tokenise(source, &CompilerOptions::default()) {
        Ok(lines) => lines,
        Err(e) => panic!("failed to tokenise {source:?}: {e}"),
    }
}

fn tokens(source: &str) -> Vec<Vec<String>> {
    lines(source).into_iter().map(|line| line.tokens).collect()
}

fn words(text: &[&str]) -> Vec<String> {
    text.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn test_simple_statement() {
    assert_eq!(
        lines("int x = 1;"),
        vec![LineStructure {
            line_number: 1,
            depth: 0,
            tokens: words(&["int", "x", "=", "1"]),
            opens_block: false,
        }]
    );
}

#[test]
fn test_last_statement_needs_no_semicolon() {
    assert_eq!(tokens("a = 1; b = 2"), vec![words(&["a", "=", "1"]), words(&["b", "=", "2"])]);
}

#[test]
fn test_depth_and_line_numbers() {
    let got: Vec<(u32, usize, Vec<String>)> = lines(
        "void main() {\n  x = 1;\n  if (x) {\n    y = 2;\n  }\n}\n",
    )
    .into_iter()
    .map(|line| (line.line_number, line.depth, line.tokens))
    .collect();
    assert_eq!(
        got,
        vec![
            (1, 0, words(&["void", "main", "(", ")"])),
            (2, 1, words(&["x", "=", "1"])),
            (3, 1, words(&["if", "(", "x", ")"])),
            (4, 2, words(&["y", "=", "2"])),
        ]
    );
}

#[test]
fn test_block_openers_are_marked() {
    let got: Vec<bool> = lines("if (a)\n{\n  b = 1;\n}\nc = 2; { d = 3 }")
        .into_iter()
        .map(|line| line.opens_block)
        .collect();
    assert_eq!(got, vec![true, false, false, false]);
}

#[test]
fn test_else_after_closing_brace() {
    let got: Vec<(usize, Vec<String>)> = lines("if (a) { b = 1; } else { b = 2; }")
        .into_iter()
        .map(|line| (line.depth, line.tokens))
        .collect();
    assert_eq!(
        got,
        vec![
            (0, words(&["if", "(", "a", ")"])),
            (1, words(&["b", "=", "1"])),
            (0, words(&["else"])),
            (1, words(&["b", "=", "2"])),
        ]
    );
}

#[test]
fn test_longest_operator_wins() {
    assert_eq!(
        tokens("a <<= b>>>c; d<=e;"),
        vec![
            words(&["a", "<<=", "b", ">>>", "c"]),
            words(&["d", "<=", "e"]),
        ]
    );
    assert_eq!(tokens("p->q!=0"), vec![words(&["p", "->", "q", "!=", "0"])]);
}

#[test]
fn test_increment_is_refused() {
    match tokenise("x = 1;\ni++;", &CompilerOptions::default()) {
        Err(CompileError::IllegalToken { line, token, .. }) => {
            assert_eq!(line, 2);
            assert_eq!(token, "++");
        }
        other => panic!("expected an illegal token, got {other:?}"),
    }
    assert!(matches!(
        tokenise("x--;", &CompilerOptions::default()),
        Err(CompileError::IllegalToken { .. })
    ));
}

#[test]
fn test_unsupported_keywords() {
    match tokenise("unsigned x;", &CompilerOptions::default()) {
        Err(CompileError::IllegalToken { line: 1, token, .. }) => assert_eq!(token, "unsigned"),
        other => panic!("expected an illegal token, got {other:?}"),
    }
    let lenient = CompilerOptions {
        error_incompatibles: false,
        ..CompilerOptions::default()
    };
    assert_eq!(
        tokenise("unsigned x;", &lenient).expect("valid").len(),
        1
    );
}

#[test]
fn test_comments_are_dropped() {
    let got: Vec<(u32, Vec<String>)> = lines("a = 1; // one\n/* two\nthree */ b = 2;")
        .into_iter()
        .map(|line| (line.line_number, line.tokens))
        .collect();
    assert_eq!(
        got,
        vec![(1, words(&["a", "=", "1"])), (3, words(&["b", "=", "2"]))]
    );
}

#[test]
fn test_char_literals_become_numbers() {
    assert_eq!(
        tokens("c = 'A'; d = '\\n'; e='\\0'"),
        vec![
            words(&["c", "=", "65"]),
            words(&["d", "=", "10"]),
            words(&["e", "=", "0"]),
        ]
    );
    assert!(matches!(
        tokenise("c = '';", &CompilerOptions::default()),
        Err(CompileError::Syntax { .. })
    ));
    assert!(matches!(
        tokenise("c = 'ab';", &CompilerOptions::default()),
        Err(CompileError::Syntax { .. })
    ));
}

#[test]
fn test_string_literals_keep_their_quotes() {
    assert_eq!(
        tokens("s = \"a; {b}\"; t = \"x\\ty\";"),
        vec![
            words(&["s", "=", "\"a; {b}\""]),
            words(&["t", "=", "\"x\ty\""]),
        ]
    );
}

#[test]
fn test_newline_inside_string_is_dropped() {
    let got: Vec<(u32, Vec<String>)> = lines("s = \"a\nb\"; t = 1;")
        .into_iter()
        .map(|line| (line.line_number, line.tokens))
        .collect();
    assert_eq!(
        got,
        vec![
            (1, words(&["s", "=", "\"ab\""])),
            (2, words(&["t", "=", "1"])),
        ]
    );
}

#[test]
fn test_ellipsis_is_one_token() {
    assert_eq!(
        tokens("f(a, ...);"),
        vec![words(&["f", "(", "a", ",", "...", ")"])]
    );
}

#[test]
fn test_semicolons_inside_parentheses() {
    assert_eq!(
        tokens("for (i = 0; i < 3; i = i + 1) { }"),
        vec![words(&[
            "for", "(", "i", "=", "0", ";", "i", "<", "3", ";", "i", "=", "i", "+", "1", ")",
        ])]
    );
}

#[test]
fn test_decimal_points() {
    assert_eq!(
        tokens("x = 1.5 + .25 + 3.; y = 2.5e-3f * p.q;"),
        vec![
            words(&["x", "=", "1.5", "+", ".25", "+", "3."]),
            words(&["y", "=", "2.5e-3f", "*", "p", ".", "q"]),
        ]
    );
}

#[test]
fn test_digraphs() {
    let options = CompilerOptions {
        use_digraphs: true,
        ..CompilerOptions::default()
    };
    let got: Vec<(usize, Vec<String>)> = tokenise("if (x) <% y = 1; %>", &options)
        .expect("valid")
        .into_iter()
        .map(|line| (line.depth, line.tokens))
        .collect();
    assert_eq!(
        got,
        vec![(0, words(&["if", "(", "x", ")"])), (1, words(&["y", "=", "1"]))]
    );
}

#[test]
fn test_unterminated_things() {
    for source in ["s = \"abc;", "a = 1; /* never closed", "f(x;", "{ a = 1;", "a = 1; }", ")"] {
        assert!(
            matches!(
                tokenise(source, &CompilerOptions::default()),
                Err(CompileError::Syntax { .. })
            ),
            "{source:?} should be a syntax error"
        );
    }
}

#[test]
fn test_stray_comment_terminator() {
    assert!(matches!(
        tokenise("a = b */ c;", &CompilerOptions::default()),
        Err(CompileError::Syntax { .. })
    ));
}
