//! Turns split source lines into [`Statement`]s.
//!
//! Whether a line is data or an instruction depends on the section
//! it is in, so the parser tracks the current section.  Nothing here
//! depends on addresses; that is left to the two passes.
use tracing::{event, Level};

use super::ast::{
    ByteItem, DataDeclaration, DataPayload, InstructionLine, Section, Statement, StatementKind,
};
use super::lexer::{classify_operand, OperandToken, SourceLine};
use super::symtab::LabelName;
use super::types::{AssemblerFailure, LineNumber};


const LABEL_DEFINITION_MARKER: char = ':';
const LABEL_REFERENCE_MARKER: char = '@';
const SECTION_MARKER: char = '.';

fn invalid_statement(source: &SourceLine) -> AssemblerFailure {
    AssemblerFailure::InvalidStatement {
        line: source.line,
        text: source.text.clone(),
    }
}

fn parse_section_header(source: &SourceLine, words: &[&str]) -> Result<StatementKind, AssemblerFailure> {
    let header = words[0].to_uppercase();
    let section = match header.as_str() {
        ".CODE" => Section::Code,
        ".DATA" => Section::Data,
        ".FUNC" => Section::Func,
        ".STACK" => {
            return match words {
                [_, count] => match classify_operand(count) {
                    Some(OperandToken::Integer(n)) => Ok(StatementKind::Stack(n)),
                    _ => Err(AssemblerFailure::InvalidOperand {
                        line: source.line,
                        operand: (*count).to_string(),
                        msg: "the stack size must be a number of words".to_string(),
                    }),
                },
                _ => Err(AssemblerFailure::StackSectionMisuse {
                    line: source.line,
                    msg: ".STACK takes exactly one operand, the number of words to reserve"
                        .to_string(),
                }),
            };
        }
        _ => {
            return Err(invalid_statement(source));
        }
    };
    if words.len() > 1 {
        return Err(invalid_statement(source));
    }
    Ok(StatementKind::SectionHeader(section))
}

fn parse_string_payload(source: &SourceLine) -> Result<DataPayload, AssemblerFailure> {
    let text = source.text.as_str();
    match (text.find('"'), text.rfind('"')) {
        (Some(start), Some(end)) if start < end => {
            Ok(DataPayload::String(text[start + 1..end].as_bytes().to_vec()))
        }
        _ => Err(AssemblerFailure::MalformedStringLiteral { line: source.line }),
    }
}

fn parse_byte_item(line: LineNumber, word: &str) -> Result<ByteItem, AssemblerFailure> {
    let illegal = || AssemblerFailure::IllegalByteLiteral {
        line,
        literal: word.to_string(),
    };
    match classify_operand(word) {
        Some(OperandToken::Integer(n)) => u8::try_from(n).map(ByteItem::Literal).map_err(|_| illegal()),
        Some(OperandToken::Label(name)) => Ok(ByteItem::LabelAddress(LabelName::new(&name))),
        _ => Err(illegal()),
    }
}

fn single_payload_word<'a>(
    source: &SourceLine,
    payload_words: &[&'a str],
) -> Result<Option<&'a str>, AssemblerFailure> {
    match payload_words {
        [] => Ok(None),
        [word] => Ok(Some(*word)),
        _ => Err(invalid_statement(source)),
    }
}

fn parse_data(source: &SourceLine, words: &[&str]) -> Result<StatementKind, AssemblerFailure> {
    let data_type = words[0].to_uppercase();
    let name = match words.get(1) {
        Some(name) if !name.starts_with('"') => LabelName::new(name),
        _ => {
            return Err(invalid_statement(source));
        }
    };
    let payload_words = &words[2..];
    let single_word = || single_payload_word(source, payload_words);
    let payload = match data_type.as_str() {
        "STRING" => parse_string_payload(source)?,
        "INT" => match single_word()? {
            None => DataPayload::Int(0),
            Some(word) => match classify_operand(word) {
                Some(OperandToken::Integer(n)) => DataPayload::Int(n),
                _ => {
                    return Err(AssemblerFailure::InvalidOperand {
                        line: source.line,
                        operand: word.to_string(),
                        msg: "expected an integer".to_string(),
                    });
                }
            },
        },
        "FLOAT" => match single_word()? {
            None => DataPayload::Float(0.0),
            Some(word) => match word.trim_end_matches(['f', 'F']).parse::<f32>() {
                Ok(value) => DataPayload::Float(value),
                Err(e) => {
                    return Err(AssemblerFailure::InvalidOperand {
                        line: source.line,
                        operand: word.to_string(),
                        msg: e.to_string(),
                    });
                }
            },
        },
        "BYTES" => DataPayload::Bytes(
            payload_words
                .iter()
                .map(|word| parse_byte_item(source.line, word))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        _ => {
            return Err(AssemblerFailure::UnsupportedDataType {
                line: source.line,
                data_type: words[0].to_string(),
            });
        }
    };
    Ok(StatementKind::Data(DataDeclaration { name, payload }))
}

fn parse_code(source: &SourceLine, words: &[&str]) -> Result<StatementKind, AssemblerFailure> {
    match words[0].strip_prefix(LABEL_DEFINITION_MARKER) {
        Some(name) if !name.is_empty() && words.len() == 1 => {
            Ok(StatementKind::Label(LabelName::new(name)))
        }
        Some(_) => Err(invalid_statement(source)),
        None => Ok(StatementKind::Instruction(InstructionLine {
            mnemonic: words[0].to_string(),
            operands: words[1..].iter().map(|w| (*w).to_string()).collect(),
        })),
    }
}

/// Parse every line of the program.
///
/// # Errors
///
/// Fails on the first line which is not a valid statement for the
/// section it appears in.
pub(crate) fn parse_program(lines: &[SourceLine]) -> Result<Vec<Statement>, AssemblerFailure> {
    let mut section = Section::Code;
    let mut statements: Vec<Statement> = Vec::with_capacity(lines.len());
    for source in lines {
        let words = source.words();
        if words.is_empty() {
            continue;
        }
        if source.text.starts_with(LABEL_REFERENCE_MARKER) {
            return Err(invalid_statement(source));
        }
        let kind = if words[0].starts_with(SECTION_MARKER) {
            parse_section_header(source, &words)?
        } else if section == Section::Data {
            parse_data(source, &words)?
        } else {
            parse_code(source, &words)?
        };
        match &kind {
            StatementKind::SectionHeader(s) => {
                event!(Level::TRACE, "line {}: entering {s}", source.line);
                section = *s;
            }
            StatementKind::Stack(_) => {
                let already = statements
                    .iter()
                    .any(|s| matches!(s.kind, StatementKind::Stack(_)));
                if already {
                    return Err(AssemblerFailure::StackSectionMisuse {
                        line: source.line,
                        msg: ".STACK is declared more than once".to_string(),
                    });
                }
                if !statements.is_empty() {
                    return Err(AssemblerFailure::StackSectionMisuse {
                        line: source.line,
                        msg: ".STACK must be the first statement of the program".to_string(),
                    });
                }
            }
            _ => (),
        }
        statements.push(Statement {
            line: source.line,
            kind,
        });
    }
    Ok(statements)
}
