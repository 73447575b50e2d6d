use base::prelude::{disassemble, UNPATCHED_JUMP_TARGET};

use super::super::image::jump_to;
use super::super::types::AssemblerFailure;
use super::{assemble, assemble_source, AssemblerOptions, ProgramImage};

fn assemble_ok(source: &str) -> ProgramImage {
    match assemble_source(source, &AssemblerOptions::default()) {
        Ok(image) => image,
        Err(e) => panic!("failed to assemble {source:?}: {e}"),
    }
}

fn words(source: &str) -> Vec<u32> {
    assemble_ok(source).words().collect()
}

fn symbolic(word: u32) -> String {
    disassemble(word)
        .map(|s| s.to_string())
        .unwrap_or_else(|e| panic!("{word:#010X} should disassemble: {e}"))
}

#[test]
fn test_empty_program_is_a_halt() {
    assert_eq!(words(""), vec![0]);
}

#[test]
fn test_halt_is_appended() {
    assert_eq!(
        words("ADD r1, r2, r3;"),
        vec![(1 << 19) | (2 << 16) | 1, 0]
    );
}

#[test]
fn test_assembly_is_deterministic() {
    let source = ".DATA; STRING s \"abc\"; .CODE; :top; JMP @top; LOADWORDI r1, @s;";
    let first = assemble_ok(source);
    let second = assemble_ok(source);
    assert_eq!(first, second);
}

#[test]
fn test_backward_loop() {
    let got = words(":loop; DEC r1; JNZ @loop;");
    assert_eq!(got.len(), 3);
    assert_eq!(symbolic(got[0]), "DEC r1");
    assert_eq!(symbolic(got[1]), "JNZ 00h");
}

#[test]
fn test_forward_reference() {
    let got = words("JMP @end; INC r1; :end; DEC r1;");
    // `end` is at byte 8, which is word 2.
    assert_eq!(got[0], jump_to(8));
    assert_eq!(symbolic(got[0]), "JMP 02h");
}

#[test]
fn test_origin_shifts_labels() {
    let options = AssemblerOptions { origin: 0x100 };
    let assembly = assemble("INC r1; :here; JMP @here;", &options).expect("valid");
    assert_eq!(assembly.labels.get("here"), Some(0x104));
    let got: Vec<u32> = assembly.image.words().collect();
    assert_eq!(got[1], jump_to(0x104));
}

#[test]
fn test_loadwordi_is_two_words() {
    let assembly =
        assemble("LOADWORDI r1, 42; :after;", &AssemblerOptions::default()).expect("valid");
    assert_eq!(assembly.labels.get("after"), Some(8));
    let got: Vec<u32> = assembly.image.words().collect();
    assert_eq!(got.len(), 3);
    assert_eq!(symbolic(got[0]), "LOADWORDI r1, 02Ah");
    assert_eq!(symbolic(got[1]), "LOADWORDI r1, 00h # high half");
}

#[test]
fn test_data_is_skipped_by_a_patched_jump() {
    let assembly = assemble(
        ".DATA; STRING greeting \"Hi\"; INT n 7; .CODE; :start; LOADWORDIMEM r1, @n;",
        &AssemblerOptions::default(),
    )
    .expect("valid");
    let labels = &assembly.labels;
    // Jump at 0, "Hi\0" padded to 4 bytes at 4, n at 8.
    assert_eq!(labels.get("greeting"), Some(4));
    assert_eq!(labels.get("n"), Some(8));
    assert_eq!(labels.get("start"), Some(12));
    let image = &assembly.image;
    assert_eq!(&image.bytes[4..8], b"Hi\0\0");
    let got: Vec<u32> = image.words().collect();
    assert_eq!(got[0], jump_to(12));
    assert_eq!(got[2], 7);
    assert_eq!(symbolic(got[3]), "LOADWORDIMEM r1, 02h");
    assert_eq!(got[4], 0);
    assert!(!got.contains(&(jump_to(0) | UNPATCHED_JUMP_TARGET)));
}

#[test]
fn test_string_padding() {
    let assembly = assemble(
        ".DATA; STRING four \"abcd\"; STRING three \"abc\"; .CODE; HALT;",
        &AssemblerOptions::default(),
    )
    .expect("valid");
    // Four characters need a second word for the terminator.
    assert_eq!(assembly.labels.get("four"), Some(4));
    assert_eq!(assembly.labels.get("three"), Some(12));
    assert_eq!(&assembly.image.bytes[4..16], b"abcd\0\0\0\0abc\0");
}

#[test]
fn test_program_ending_in_data_jumps_to_the_halt() {
    let got = words("INC r1; .DATA; INT x 5;");
    assert_eq!(got, vec![symbolic_word("INC r1"), jump_to(12), 5, 0]);
}

fn symbolic_word(text: &str) -> u32 {
    let image = assemble_ok(&format!("{text};"));
    let first = image.words().next().expect("at least one word");
    first
}

#[test]
fn test_func_section_is_skipped_too() {
    let assembly = assemble(
        ".FUNC; :double; ADD r1, r1, r1; RETURN; .CODE; :main; GOSUB;",
        &AssemblerOptions::default(),
    )
    .expect("valid");
    assert_eq!(assembly.labels.get("double"), Some(4));
    assert_eq!(assembly.labels.get("main"), Some(12));
    let got: Vec<u32> = assembly.image.words().collect();
    assert_eq!(got[0], jump_to(12));
    assert_eq!(symbolic(got[1]), "ADD r1, r1, r1");
}

#[test]
fn test_data_then_func_share_one_skip_jump() {
    let assembly = assemble(
        ".DATA; INT x; .FUNC; :f; RETURN; .CODE; :main; HALT;",
        &AssemblerOptions::default(),
    )
    .expect("valid");
    assert_eq!(assembly.labels.get("x"), Some(4));
    assert_eq!(assembly.labels.get("f"), Some(8));
    assert_eq!(assembly.labels.get("main"), Some(12));
    let got: Vec<u32> = assembly.image.words().collect();
    assert_eq!(got[0], jump_to(12));
}

#[test]
fn test_two_data_sections_get_two_jumps() {
    let got = words(".DATA; INT a 1; .CODE; INC r1; .DATA; INT b 2; .CODE; DEC r1;");
    assert_eq!(got[0], jump_to(8));
    assert_eq!(got[1], 1);
    assert_eq!(symbolic(got[2]), "INC r1");
    assert_eq!(got[3], jump_to(20));
    assert_eq!(got[4], 2);
    assert_eq!(symbolic(got[5]), "DEC r1");
}

#[test]
fn test_bytes_with_label_address() {
    let assembly = assemble(
        ".DATA; INT target 0; BYTES table 1, @target, 2; .CODE; HALT;",
        &AssemblerOptions { origin: 0x1000 },
    )
    .expect("valid");
    assert_eq!(assembly.labels.get("target"), Some(0x1004));
    // 1 + 4 + 1 bytes, padded to 8.
    assert_eq!(assembly.labels.get("table"), Some(0x1008));
    assert_eq!(
        &assembly.image.bytes[8..16],
        &[1, 0x04, 0x10, 0, 0, 2, 0, 0]
    );
}

#[test]
fn test_stack_is_reserved_before_the_program() {
    let assembly = assemble(".STACK 8; :start; HALT;", &AssemblerOptions::default()).expect("valid");
    assert_eq!(assembly.image.stack_words, 8);
    assert_eq!(assembly.labels.get("start"), Some(32));
    // No bytes are emitted for the stack itself.
    assert_eq!(assembly.image.bytes.len(), 8);
}

#[test]
fn test_rebinding_a_label_at_the_same_address() {
    let assembly = assemble(":a; :a; HALT;", &AssemblerOptions::default()).expect("valid");
    assert_eq!(assembly.labels.get("a"), Some(0));
}

#[test]
fn test_label_conflict() {
    match assemble_source(":a; HALT;\n:a;", &AssemblerOptions::default()) {
        Err(AssemblerFailure::LabelConflict {
            line, old, new, ..
        }) => {
            assert_eq!((line, old, new), (2, 0, 4));
        }
        other => panic!("expected a label conflict, got {other:?}"),
    }
}

#[test]
fn test_undefined_label() {
    match assemble_source("HALT;\nJMP @nowhere;", &AssemblerOptions::default()) {
        Err(AssemblerFailure::UndefinedLabel { line, name }) => {
            assert_eq!(line, 2);
            assert_eq!(name, "nowhere");
        }
        other => panic!("expected an undefined label, got {other:?}"),
    }
}

#[test]
fn test_unknown_mnemonic_reports_its_line() {
    match assemble_source("HALT;\n\nFROB r1;", &AssemblerOptions::default()) {
        Err(AssemblerFailure::UnknownMnemonic { line, mnemonic }) => {
            assert_eq!(line, 3);
            assert_eq!(mnemonic, "FROB");
        }
        other => panic!("expected an unknown mnemonic, got {other:?}"),
    }
}

#[test]
fn test_each_assembly_has_its_own_labels() {
    assert!(assemble_source(":x; HALT;", &AssemblerOptions::default()).is_ok());
    assert!(matches!(
        assemble_source("JMP @x;", &AssemblerOptions::default()),
        Err(AssemblerFailure::UndefinedLabel { .. })
    ));
}

#[test]
fn test_listing_shows_patched_jump_and_labels() {
    let assembly = assemble(
        ".DATA; INT n 3; .CODE; :go; INC r1;",
        &AssemblerOptions::default(),
    )
    .expect("valid");
    let listing = assembly.listing().to_string();
    assert!(listing.contains("JMP 02h"), "{listing}");
    assert!(listing.contains(":go"), "{listing}");
    assert!(listing.contains("Labels:\n00000008 go\n00000004 n\n"), "{listing}");
}
