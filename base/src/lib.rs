//! The `base` crate defines the instruction encoding which is shared
//! by the assembler and the disassembler.  The idea is that a tool
//! which needs to read or write instruction words depends on this
//! crate alone, without pulling in the assembler's parser or the
//! compiler front-end.

pub mod instruction;
pub mod opcodes;
pub mod prelude;

#[test]
fn test_halt_is_zero() {
    use prelude::*;
    assert_eq!(opcode_table().encode("halt"), Ok(0));
    assert_eq!(
        operand_signature(0).map(|sig| sig.to_string()),
        Ok(String::new())
    );
}
