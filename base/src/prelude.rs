//! The prelude exports the items which are needed to build, inspect
//! or print instruction words.  Providing this prelude is the main
//! purpose of the base crate.
pub use super::instruction::*;
pub use super::opcodes::*;
