use super::super::types::AssemblerFailure;
use super::*;

fn texts(source: &str) -> Vec<String> {
    split_lines(source)
        .expect("source should split")
        .into_iter()
        .map(|line| line.text)
        .collect()
}

#[test]
fn test_statements_end_at_semicolon() {
    assert_eq!(texts("ADD r1,r2,r3;SUB r1, r1, r1;"), vec!["ADD r1,r2,r3", "SUB r1, r1, r1"]);
}

#[test]
fn test_leading_space_and_control_whitespace() {
    assert_eq!(texts("   \tMOV\tr1, r2;\n\n  HALT;"), vec!["MOVr1, r2", "HALT"]);
}

#[test]
fn test_comments_run_to_end_of_line() {
    assert_eq!(
        texts("# a comment; with a semicolon\nINC r1; # trailing\n  DEC r1;"),
        vec!["INC r1", "DEC r1"]
    );
}

#[test]
fn test_string_literal_may_contain_terminator_and_comment_marker() {
    assert_eq!(
        texts(".DATA;\nSTRING msg \"Hello; # world\";"),
        vec![".DATA", "STRING msg \"Hello; # world\""]
    );
}

#[test]
fn test_quote_then_space_does_not_close_literal() {
    assert_eq!(
        texts("STRING s \"a\" b\";"),
        vec!["STRING s \"a\" b\""]
    );
}

#[test]
fn test_line_numbers() {
    let lines = split_lines("\n\nHALT;\n# c\n\n  ADD r1,\n r2, r3;").expect("valid");
    assert_eq!(lines.iter().map(|l| l.line).collect::<Vec<_>>(), vec![3, 6]);
}

#[test]
fn test_empty_statements_are_dropped() {
    assert_eq!(texts(";;  ;HALT;"), vec!["HALT"]);
    assert!(texts("").is_empty());
    assert!(texts("# only a comment").is_empty());
}

#[test]
fn test_unterminated_literal() {
    match split_lines("HALT;\nSTRING s \"abc;\n") {
        Err(AssemblerFailure::MalformedStringLiteral { line }) => assert_eq!(line, 2),
        other => panic!("expected MalformedStringLiteral, got {other:?}"),
    }
}

#[test]
fn test_missing_terminator() {
    match split_lines("HALT;\nHALT") {
        Err(AssemblerFailure::MissingTerminator { line }) => assert_eq!(line, 2),
        other => panic!("expected MissingTerminator, got {other:?}"),
    }
}

#[test]
fn test_words() {
    let line = SourceLine {
        line: 1,
        text: "ADD r1,r2 ,\tr3".to_string(),
    };
    assert_eq!(line.words(), vec!["ADD", "r1", "r2", "r3"]);
}

#[test]
fn test_classify_registers_and_labels() {
    assert_eq!(classify_operand("r1"), Some(OperandToken::Register(1)));
    assert_eq!(classify_operand("R8"), Some(OperandToken::Register(8)));
    assert_eq!(
        classify_operand("@Loop"),
        Some(OperandToken::Label("Loop".to_string()))
    );
    assert_eq!(classify_operand("@"), None);
    assert_eq!(classify_operand("r1x"), None);
    assert_eq!(classify_operand(""), None);
}

#[test]
fn test_classify_integers() {
    assert_eq!(classify_operand("42"), Some(OperandToken::Integer(42)));
    assert_eq!(classify_operand("-1"), Some(OperandToken::Integer(u32::MAX)));
    assert_eq!(classify_operand("0FFh"), Some(OperandToken::Integer(255)));
    assert_eq!(classify_operand("FFH"), Some(OperandToken::Integer(255)));
    assert_eq!(classify_operand("1010b"), Some(OperandToken::Integer(10)));
    assert_eq!(classify_operand("4294967295"), Some(OperandToken::Integer(u32::MAX)));
    // Out of range.
    assert_eq!(classify_operand("4294967296"), None);
    assert_eq!(classify_operand("-2147483649"), None);
}

#[test]
fn test_classify_floats() {
    assert_eq!(
        classify_operand("1.5"),
        Some(OperandToken::Float(1.5_f32.to_bits()))
    );
    assert_eq!(
        classify_operand("-.25f"),
        Some(OperandToken::Float((-0.25_f32).to_bits()))
    );
    assert_eq!(
        classify_operand("2.0e3"),
        Some(OperandToken::Float(2000.0_f32.to_bits()))
    );
}
