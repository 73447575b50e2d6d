//! Encoding of a single instruction line into one or two words.
use base::prelude::{
    opcode_table, operand_signature, OperandKind, OperandSignature, HALFWORD_MASK,
    HIGH_HALF_MARKER, NOP_ENCODING, REGISTER_COUNT,
};

use super::ast::InstructionLine;
use super::lexer::{classify_operand, OperandToken};
use super::symtab::{LabelName, LabelTable};
use super::types::{AssemblerFailure, LineNumber};

const NOP: &str = "NOP";

fn is_nop(mnemonic: &str) -> bool {
    mnemonic.eq_ignore_ascii_case(NOP)
}

fn lookup(line: LineNumber, mnemonic: &str) -> Result<(u32, OperandSignature), AssemblerFailure> {
    let pattern = opcode_table()
        .encode(mnemonic)
        .map_err(|_| AssemblerFailure::UnknownMnemonic {
            line,
            mnemonic: mnemonic.to_string(),
        })?;
    let signature = operand_signature(pattern).map_err(|e| {
        AssemblerFailure::Internal(format!("opcode table entry {mnemonic}: {e}"))
    })?;
    Ok((pattern, signature))
}

/// The number of words `instruction` will occupy.  This is what the
/// first pass needs; operands are not examined.
pub(crate) fn instruction_word_count(
    line: LineNumber,
    instruction: &InstructionLine,
) -> Result<u32, AssemblerFailure> {
    if is_nop(&instruction.mnemonic) {
        return Ok(1);
    }
    let (_, signature) = lookup(line, &instruction.mnemonic)?;
    Ok(signature.word_count() as u32)
}

fn resolve_operand(
    line: LineNumber,
    kind: OperandKind,
    word: &str,
    labels: &LabelTable,
) -> Result<u32, AssemblerFailure> {
    let invalid = |msg: &str| AssemblerFailure::InvalidOperand {
        line,
        operand: word.to_string(),
        msg: msg.to_string(),
    };
    match (kind, classify_operand(word)) {
        (OperandKind::Register, Some(OperandToken::Register(n)))
            if (1..=u32::from(REGISTER_COUNT)).contains(&n) =>
        {
            Ok(n - 1)
        }
        (OperandKind::Register, _) => Err(invalid(&format!(
            "expected a register, r1 to r{REGISTER_COUNT}"
        ))),
        // Label operands are word addresses.
        (_, Some(OperandToken::Label(name))) => {
            labels.lookup(line, &LabelName::new(&name)).map(|v| v >> 2)
        }
        (_, Some(OperandToken::Integer(n))) => Ok(n),
        (OperandKind::FullWord, Some(OperandToken::Float(bits))) => Ok(bits),
        (_, Some(OperandToken::Float(_))) => Err(invalid(
            "a floating-point value needs a full-word operand (such as that of LOADWORDI)",
        )),
        (_, Some(OperandToken::Register(_))) => {
            Err(invalid("expected a number or a label, not a register"))
        }
        (_, None) => Err(invalid("expected a register, number or label")),
    }
}

/// Encode `instruction`.  Returns two words for the full-immediate
/// forms, otherwise one.
///
/// # Errors
///
/// `UnknownMnemonic`, `OperandCountMismatch`, `InvalidOperand`, or
/// `UndefinedLabel`.
pub(crate) fn encode_instruction(
    line: LineNumber,
    instruction: &InstructionLine,
    labels: &LabelTable,
) -> Result<Vec<u32>, AssemblerFailure> {
    let count_mismatch = |expected: usize| AssemblerFailure::OperandCountMismatch {
        line,
        mnemonic: instruction.mnemonic.clone(),
        expected,
        got: instruction.operands.len(),
    };
    if is_nop(&instruction.mnemonic) {
        return if instruction.operands.is_empty() {
            Ok(vec![NOP_ENCODING])
        } else {
            Err(count_mismatch(0))
        };
    }
    let (pattern, signature) = lookup(line, &instruction.mnemonic)?;
    if signature.len() != instruction.operands.len() {
        return Err(count_mismatch(signature.len()));
    }
    let mut word = pattern;
    let mut full_word: Option<u32> = None;
    for (position, (kind, operand)) in signature
        .kinds()
        .iter()
        .zip(instruction.operands.iter())
        .enumerate()
    {
        let value = resolve_operand(line, *kind, operand, labels)?;
        match kind {
            OperandKind::FullWord => {
                full_word = Some(value);
            }
            _ => {
                word |= kind.pack(position, value);
            }
        }
    }
    Ok(match full_word {
        None => vec![word],
        Some(value) => vec![
            word | (value & HALFWORD_MASK),
            word | HIGH_HALF_MARKER | (value >> 16),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(mnemonic: &str, operands: &[&str]) -> InstructionLine {
        InstructionLine {
            mnemonic: mnemonic.to_string(),
            operands: operands.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn encode(mnemonic: &str, operands: &[&str]) -> Result<Vec<u32>, AssemblerFailure> {
        encode_instruction(1, &inst(mnemonic, operands), &LabelTable::default())
    }

    #[test]
    fn three_registers() {
        assert_eq!(
            encode("ADD", &["r1", "r2", "R3"]).expect("valid"),
            vec![(0 << 22) | (1 << 19) | (2 << 16) | 1]
        );
    }

    #[test]
    fn condition_suffix() {
        assert_eq!(
            encode("addz", &["r8", "r8", "r8"]).expect("valid"),
            vec![0x2000_0000 | (7 << 22) | (7 << 19) | (7 << 16) | 1]
        );
    }

    #[test]
    fn loadwordi_emits_two_words() {
        let words = encode("LOADWORDI", &["r1", "42"]).expect("valid");
        let base = 0x0206_0000;
        assert_eq!(words, vec![base | 42, base | HIGH_HALF_MARKER]);
    }

    #[test]
    fn loadwordi_splits_halves() {
        let words = encode("LOADWORDI", &["r2", "12345678h"]).expect("valid");
        let base = 0x0206_0000 | (1 << 22);
        assert_eq!(
            words,
            vec![base | 0x5678, base | HIGH_HALF_MARKER | 0x1234]
        );
    }

    #[test]
    fn loadwordi_accepts_a_float() {
        let words = encode("LOADWORDI", &["r1", "1.5"]).expect("valid");
        let bits = 1.5_f32.to_bits();
        assert_eq!(words[0] & HALFWORD_MASK, bits & HALFWORD_MASK);
        assert_eq!(words[1] & HALFWORD_MASK, bits >> 16);
    }

    #[test]
    fn immediates_are_masked() {
        assert_eq!(
            encode("LOADBYTEI", &["r1", "1FFh"]).expect("valid"),
            vec![0x0202_0000 | 0xFF]
        );
        assert_eq!(
            encode("LOADHWORDI", &["r1", "-1"]).expect("valid"),
            vec![0x0204_0000 | 0xFFFF]
        );
        assert_eq!(
            encode("INT", &["101b"]).expect("valid"),
            vec![0x1FFF_FF00 | 5]
        );
    }

    #[test]
    fn nop_is_mov_r1_r1() {
        assert_eq!(encode("nop", &[]).expect("valid"), vec![0b10_0000]);
        assert_eq!(
            encode("MOV", &["r1", "r1"]).expect("valid"),
            encode("NOP", &[]).expect("valid")
        );
        assert!(matches!(
            encode("NOP", &["r1"]),
            Err(AssemblerFailure::OperandCountMismatch { expected: 0, .. })
        ));
    }

    #[test]
    fn operand_count_mismatch() {
        match encode("ADD", &["r1", "r2"]) {
            Err(AssemblerFailure::OperandCountMismatch {
                mnemonic,
                expected,
                got,
                ..
            }) => {
                assert_eq!((mnemonic.as_str(), expected, got), ("ADD", 3, 2));
            }
            other => panic!("expected an operand count mismatch, got {other:?}"),
        }
    }

    #[test]
    fn unknown_mnemonic() {
        assert!(matches!(
            encode("FROB", &[]),
            Err(AssemblerFailure::UnknownMnemonic { .. })
        ));
    }

    #[test]
    fn bad_registers() {
        for bad in ["r0", "r9", "x1", "5"] {
            assert!(
                matches!(
                    encode("PUSH", &[bad]),
                    Err(AssemblerFailure::InvalidOperand { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn label_operand_is_a_word_address() {
        let mut labels = LabelTable::default();
        labels
            .define(1, &LabelName::new("target"), 0x40)
            .expect("define");
        assert_eq!(
            encode_instruction(2, &inst("JMP", &["@Target"]), &labels).expect("valid"),
            vec![0x1000_0000 | 0x10]
        );
        assert!(matches!(
            encode_instruction(2, &inst("JMP", &["@elsewhere"]), &labels),
            Err(AssemblerFailure::UndefinedLabel { .. })
        ));
    }

    #[test]
    fn word_counts() {
        assert_eq!(instruction_word_count(1, &inst("LOADWORDI", &[])).ok(), Some(2));
        assert_eq!(instruction_word_count(1, &inst("LOADWORDIZ", &[])).ok(), Some(2));
        assert_eq!(instruction_word_count(1, &inst("NOP", &[])).ok(), Some(1));
        assert_eq!(instruction_word_count(1, &inst("ADD", &[])).ok(), Some(1));
    }
}
