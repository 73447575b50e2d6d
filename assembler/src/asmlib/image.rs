//! The program image and the buffer it is built in.
use tracing::{event, Level};

use base::prelude::{JumpCondition, OperandKind, UNPATCHED_JUMP_TARGET};

use super::ast::WORD_BYTES;

/// The output of the assembler.
///
/// The loader reserves `stack_words` words at `origin` and places
/// `bytes` immediately after them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    pub origin: u32,
    pub stack_words: u32,
    pub bytes: Vec<u8>,
}

impl ProgramImage {
    /// The address of `bytes[0]`.
    #[must_use]
    pub fn load_address(&self) -> u32 {
        self.origin
            .wrapping_add(self.stack_words.wrapping_mul(WORD_BYTES))
    }

    /// The image as little-endian words.  Images are always a whole
    /// number of words long.
    pub fn words(&self) -> impl Iterator<Item = u32> + '_ {
        self.bytes
            .chunks_exact(WORD_BYTES as usize)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
    }
}

pub(crate) fn jump_to(target_address: u32) -> u32 {
    JumpCondition::Always.bits() | OperandKind::Address.pack(0, target_address >> 2)
}

/// Accumulates the bytes of an image during the second pass.
#[derive(Debug)]
pub(crate) struct ImageBuilder {
    load_address: u32,
    bytes: Vec<u8>,
}

impl ImageBuilder {
    pub(crate) fn new(load_address: u32) -> ImageBuilder {
        ImageBuilder {
            load_address,
            bytes: Vec::new(),
        }
    }

    /// The address at which the next byte will be placed.
    pub(crate) fn pc(&self) -> u32 {
        self.load_address.wrapping_add(self.bytes.len() as u32)
    }

    pub(crate) fn push_word(&mut self, word: u32) {
        self.bytes.extend_from_slice(&word.to_le_bytes());
    }

    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub(crate) fn pad_to_word(&mut self) {
        while self.bytes.len() % WORD_BYTES as usize != 0 {
            self.bytes.push(0);
        }
    }

    fn overwrite_word(&mut self, offset: usize, word: u32) {
        self.bytes[offset..offset + WORD_BYTES as usize].copy_from_slice(&word.to_le_bytes());
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A jump which has been emitted with a placeholder target.  The only
/// way to get rid of one is to [`resolve`](PendingJump::resolve) it.
#[must_use = "a pending jump must be resolved or the program will jump to an unpatched target"]
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct PendingJump {
    offset: usize,
}

/// A jump whose target has been filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolvedJump {
    pub(crate) address: u32,
    pub(crate) target: u32,
}

impl PendingJump {
    /// Emit a jump to the unpatched target into `image`.
    pub(crate) fn reserve(image: &mut ImageBuilder) -> PendingJump {
        let offset = image.bytes.len();
        event!(
            Level::DEBUG,
            "reserving a skip jump at {:#X}",
            image.pc()
        );
        image.push_word(JumpCondition::Always.bits() | UNPATCHED_JUMP_TARGET);
        PendingJump { offset }
    }

    /// Overwrite the placeholder with a jump to `target`.
    pub(crate) fn resolve(self, image: &mut ImageBuilder, target: u32) -> ResolvedJump {
        image.overwrite_word(self.offset, jump_to(target));
        let resolved = ResolvedJump {
            address: image.load_address.wrapping_add(self.offset as u32),
            target,
        };
        event!(
            Level::DEBUG,
            "skip jump at {:#X} now goes to {:#X}",
            resolved.address,
            resolved.target
        );
        resolved
    }
}
