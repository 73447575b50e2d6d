use std::fmt::{self, Display, Formatter};

use base::prelude::disassemble;

use super::ast::WORD_BYTES;
use super::image::ProgramImage;
use super::symtab::{LabelName, LabelTable};
use super::types::LineNumber;

/// What pass 2 emitted, in order.  The bytes themselves are looked up
/// in the image when the listing is printed, so that patched jumps
/// show their final targets.
#[derive(Debug, Default)]
pub(crate) struct Listing {
    items: Vec<ListingItem>,
}

impl Listing {
    pub(crate) fn push(&mut self, item: ListingItem) {
        self.items.push(item);
    }

    pub(crate) fn with_image<'a>(
        &'a self,
        image: &'a ProgramImage,
        labels: &'a LabelTable,
    ) -> ListingWithImage<'a> {
        ListingWithImage {
            listing: self,
            image,
            labels,
        }
    }
}

#[derive(Debug)]
pub(crate) enum ListingItem {
    SkipJump {
        address: u32,
    },
    Label {
        line: LineNumber,
        address: u32,
        name: LabelName,
    },
    Data {
        line: LineNumber,
        address: u32,
        name: LabelName,
        len: u32,
    },
    Instruction {
        line: LineNumber,
        address: u32,
        len: u32,
    },
    Halt {
        address: u32,
    },
}

fn word_at(image: &ProgramImage, address: u32) -> Option<u32> {
    let offset = address.checked_sub(image.load_address())? as usize;
    let bytes = image.bytes.get(offset..offset + WORD_BYTES as usize)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn write_instruction_word(f: &mut Formatter<'_>, address: u32, word: u32) -> fmt::Result {
    let symbolic = match disassemble(word) {
        Ok(symbolic) => symbolic.to_string(),
        Err(_) => "??".to_string(),
    };
    write!(f, "{address:08X}  {word:08X}  {symbolic:<28}")
}

fn words_of(address: u32, len: u32) -> impl Iterator<Item = u32> {
    (0..len.div_ceil(WORD_BYTES)).map(move |i| address + i * WORD_BYTES)
}

pub(crate) struct ListingWithImage<'a> {
    listing: &'a Listing,
    image: &'a ProgramImage,
    labels: &'a LabelTable,
}

impl ListingWithImage<'_> {
    fn write_words(
        &self,
        f: &mut Formatter<'_>,
        address: u32,
        len: u32,
        first_comment: &str,
    ) -> fmt::Result {
        for (i, a) in words_of(address, len).enumerate() {
            if let Some(word) = word_at(self.image, a) {
                write_instruction_word(f, a, word)?;
                if i == 0 {
                    write!(f, "  {first_comment}")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl Display for ListingWithImage<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.image.stack_words > 0 {
            writeln!(
                f,
                "{:08X}  ({} words of stack)",
                self.image.origin, self.image.stack_words
            )?;
        }
        for item in &self.listing.items {
            match item {
                ListingItem::SkipJump { address } => {
                    self.write_words(f, *address, WORD_BYTES, "; skip data")?;
                }
                ListingItem::Label {
                    line,
                    address,
                    name,
                } => {
                    writeln!(f, "{address:08X}  :{name:<46}; line {line}")?;
                }
                ListingItem::Data {
                    line,
                    address,
                    name,
                    len,
                } => {
                    writeln!(f, "{address:08X}  {name}: {len} bytes of data, line {line}")?;
                    for a in words_of(*address, *len) {
                        if let Some(word) = word_at(self.image, a) {
                            writeln!(f, "{a:08X}  {word:08X}")?;
                        }
                    }
                }
                ListingItem::Instruction { line, address, len } => {
                    self.write_words(f, *address, *len, &format!("; line {line}"))?;
                }
                ListingItem::Halt { address } => {
                    self.write_words(f, *address, WORD_BYTES, "; end of program")?;
                }
            }
        }
        if !self.labels.is_empty() {
            writeln!(f, "\nLabels:")?;
            write!(f, "{}", self.labels)?;
        }
        Ok(())
    }
}

/// A plain disassembly of every word of an image, one per line.
/// Words which are not instructions are shown as `??`.
pub struct Disassembly<'a>(pub &'a ProgramImage);

impl Display for Disassembly<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let image = self.0;
        let start = image.load_address();
        for (i, word) in image.words().enumerate() {
            let address = start.wrapping_add((i as u32) * WORD_BYTES);
            write_instruction_word(f, address, word)?;
            writeln!(f)?;
        }
        Ok(())
    }
}
