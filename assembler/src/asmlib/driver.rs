//! The two passes of the assembler, and the file-level driver.
//!
//! Pass 1 works out where everything goes and binds every label.
//! Pass 2 emits the image.  The two passes make the same layout
//! decisions through [`skip_jump_action`] and the same size
//! calculations, and pass 2 checks that it puts every label where
//! pass 1 said it would be.
use std::ffi::OsStr;
use std::fs::OpenOptions;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use tracing::{event, span, Level};

use super::ast::{ByteItem, DataDeclaration, DataPayload, Section, Statement, StatementKind, WORD_BYTES};
use super::encode::{encode_instruction, instruction_word_count};
use super::image::{ImageBuilder, PendingJump, ProgramImage};
use super::lexer::split_lines;
use super::listing::{Listing, ListingItem};
use super::parser::parse_program;
use super::symtab::LabelTable;
use super::types::{AssemblerFailure, LineNumber};

mod output;
#[cfg(test)]
mod tests;

pub use output::{read_image, read_image_file, write_image};

/// Options which change the meaning of the program.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerOptions {
    /// Address of the first byte of the image (that is, of the stack,
    /// if there is one).
    pub origin: u32,
}

/// Options which affect only what the driver prints.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    /// Print a listing on standard output.
    pub list: bool,
}

/// Everything one run of the assembler produces.
#[derive(Debug)]
pub struct Assembly {
    pub image: ProgramImage,
    pub labels: LabelTable,
    listing: Listing,
}

impl Assembly {
    /// The listing, with the label table at the end.
    pub fn listing(&self) -> impl std::fmt::Display + '_ {
        self.listing.with_image(&self.image, &self.labels)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipJumpAction {
    None,
    Reserve,
    Resolve,
}

/// Data and subroutine bodies are stepped over by a jump which is
/// reserved at the start of the first such statement and resolved at
/// the next code statement.
fn skip_jump_action(section: Section, pending: bool) -> SkipJumpAction {
    match (section, pending) {
        (Section::Data | Section::Func, false) => SkipJumpAction::Reserve,
        (Section::Code, true) => SkipJumpAction::Resolve,
        _ => SkipJumpAction::None,
    }
}

fn stack_words(statements: &[Statement]) -> u32 {
    match statements.first() {
        Some(Statement {
            kind: StatementKind::Stack(n),
            ..
        }) => *n,
        _ => 0,
    }
}

fn load_address(
    statements: &[Statement],
    options: &AssemblerOptions,
) -> Result<u32, AssemblerFailure> {
    let words = stack_words(statements);
    words
        .checked_mul(WORD_BYTES)
        .and_then(|bytes| bytes.checked_add(options.origin))
        .ok_or_else(|| AssemblerFailure::StackSectionMisuse {
            line: statements.first().map_or(1, |s| s.line),
            msg: format!(
                "a stack of {words} words at {:#X} does not fit in the address space",
                options.origin
            ),
        })
}

fn advance(line: LineNumber, pc: u32, bytes: u32) -> Result<u32, AssemblerFailure> {
    pc.checked_add(bytes).ok_or_else(|| {
        AssemblerFailure::Internal(format!(
            "line {line}: program extends past the end of the address space"
        ))
    })
}

/// The result of pass 1.
#[derive(Debug)]
struct Layout {
    labels: LabelTable,
    /// The address just past the final HALT.
    end: u32,
}

fn assemble_pass1(statements: &[Statement], load_address: u32) -> Result<Layout, AssemblerFailure> {
    let span = span!(Level::DEBUG, "assembly pass 1");
    let _enter = span.enter();

    let mut labels = LabelTable::default();
    let mut section = Section::Code;
    let mut pending = false;
    let mut pc = load_address;
    for statement in statements {
        let line = statement.line;
        if let StatementKind::SectionHeader(s) = &statement.kind {
            section = *s;
            continue;
        }
        match skip_jump_action(section, pending) {
            SkipJumpAction::Reserve => {
                pc = advance(line, pc, WORD_BYTES)?;
                pending = true;
            }
            SkipJumpAction::Resolve => {
                pending = false;
            }
            SkipJumpAction::None => (),
        }
        match &statement.kind {
            StatementKind::SectionHeader(_) | StatementKind::Stack(_) => (),
            StatementKind::Label(name) => {
                labels.define(line, name, pc)?;
            }
            StatementKind::Data(DataDeclaration { name, payload }) => {
                labels.define(line, name, pc)?;
                pc = advance(line, pc, payload.size())?;
            }
            StatementKind::Instruction(instruction) => {
                let words = instruction_word_count(line, instruction)?;
                pc = advance(line, pc, words * WORD_BYTES)?;
            }
        }
    }
    // The terminating HALT.
    let end = advance(statements.last().map_or(1, |s| s.line), pc, WORD_BYTES)?;
    event!(
        Level::DEBUG,
        "pass 1 laid out {} bytes and found {} labels",
        end - load_address,
        labels.iter().count()
    );
    Ok(Layout { labels, end })
}

fn emit_data(
    line: LineNumber,
    payload: &DataPayload,
    labels: &LabelTable,
    image: &mut ImageBuilder,
) -> Result<(), AssemblerFailure> {
    match payload {
        DataPayload::String(text) => {
            image.push_bytes(text);
            image.push_bytes(&[0]);
            image.pad_to_word();
        }
        DataPayload::Int(n) => image.push_word(*n),
        DataPayload::Float(x) => image.push_word(x.to_bits()),
        DataPayload::Bytes(items) => {
            for item in items {
                match item {
                    ByteItem::Literal(b) => image.push_bytes(&[*b]),
                    ByteItem::LabelAddress(name) => {
                        image.push_bytes(&labels.lookup(line, name)?.to_le_bytes());
                    }
                }
            }
            image.pad_to_word();
        }
    }
    Ok(())
}

fn assemble_pass2(
    statements: &[Statement],
    load_address: u32,
    layout: &Layout,
) -> Result<(Vec<u8>, Listing), AssemblerFailure> {
    let span = span!(Level::DEBUG, "assembly pass 2");
    let _enter = span.enter();

    let labels = &layout.labels;
    let mut image = ImageBuilder::new(load_address);
    let mut listing = Listing::default();
    let mut section = Section::Code;
    let mut pending: Option<PendingJump> = None;
    for statement in statements {
        let line = statement.line;
        if let StatementKind::SectionHeader(s) = &statement.kind {
            event!(Level::TRACE, "line {line}: {s} at {:#X}", image.pc());
            section = *s;
            continue;
        }
        match skip_jump_action(section, pending.is_some()) {
            SkipJumpAction::Reserve => {
                listing.push(ListingItem::SkipJump {
                    address: image.pc(),
                });
                pending = Some(PendingJump::reserve(&mut image));
            }
            SkipJumpAction::Resolve => {
                if let Some(jump) = pending.take() {
                    let target = image.pc();
                    jump.resolve(&mut image, target);
                }
            }
            SkipJumpAction::None => (),
        }
        let address = image.pc();
        match &statement.kind {
            StatementKind::SectionHeader(_) | StatementKind::Stack(_) => (),
            StatementKind::Label(name) => {
                labels.confirm(line, name, address)?;
                listing.push(ListingItem::Label {
                    line,
                    address,
                    name: name.clone(),
                });
            }
            StatementKind::Data(DataDeclaration { name, payload }) => {
                labels.confirm(line, name, address)?;
                emit_data(line, payload, labels, &mut image)?;
                listing.push(ListingItem::Data {
                    line,
                    address,
                    name: name.clone(),
                    len: image.pc() - address,
                });
            }
            StatementKind::Instruction(instruction) => {
                for word in encode_instruction(line, instruction, labels)? {
                    image.push_word(word);
                }
                listing.push(ListingItem::Instruction {
                    line,
                    address,
                    len: image.pc() - address,
                });
            }
        }
    }
    let halt_address = image.pc();
    if let Some(jump) = pending.take() {
        // The program ends inside a data or subroutine section, so
        // execution resumes at the HALT.
        jump.resolve(&mut image, halt_address);
    }
    image.push_word(0);
    listing.push(ListingItem::Halt {
        address: halt_address,
    });
    if image.pc() != layout.end {
        return Err(AssemblerFailure::Internal(format!(
            "pass 1 expected the program to end at {:#X} but pass 2 ended at {:#X}",
            layout.end,
            image.pc()
        )));
    }
    Ok((image.into_bytes(), listing))
}

/// Assemble `source`, keeping the label table and the listing.
///
/// # Errors
///
/// Any error in the program; see [`AssemblerFailure`].
pub fn assemble(source: &str, options: &AssemblerOptions) -> Result<Assembly, AssemblerFailure> {
    let lines = split_lines(source)?;
    let statements = parse_program(&lines)?;
    let load_address = load_address(&statements, options)?;
    let layout = assemble_pass1(&statements, load_address)?;
    let (bytes, listing) = assemble_pass2(&statements, load_address, &layout)?;
    let image = ProgramImage {
        origin: options.origin,
        stack_words: stack_words(&statements),
        bytes,
    };
    event!(
        Level::DEBUG,
        "assembled {} bytes at {:#X}",
        image.bytes.len(),
        image.load_address()
    );
    Ok(Assembly {
        image,
        labels: layout.labels,
        listing,
    })
}

/// Assemble `source` into a program image.
///
/// # Errors
///
/// Any error in the program; see [`AssemblerFailure`].
pub fn assemble_source(
    source: &str,
    options: &AssemblerOptions,
) -> Result<ProgramImage, AssemblerFailure> {
    assemble(source, options).map(|assembly| assembly.image)
}

fn read_source_file(input_file_name: &OsStr) -> Result<String, AssemblerFailure> {
    let read_failed = |e| AssemblerFailure::IoErrorOnInput {
        filename: input_file_name.to_owned(),
        error: e,
    };
    let mut input_file = OpenOptions::new()
        .read(true)
        .open(input_file_name)
        .map_err(read_failed)?;
    let mut source = String::new();
    input_file
        .read_to_string(&mut source)
        .map_err(read_failed)?;
    Ok(source)
}

/// Assemble the program in `input_file_name` and write the image to
/// `output_file_name`.
///
/// # Errors
///
/// Failure to read the input or write the output, or any error in the
/// program.
pub fn assemble_file(
    input_file_name: &OsStr,
    output_file_name: &Path,
    options: &AssemblerOptions,
    output_options: OutputOptions,
) -> Result<(), AssemblerFailure> {
    let source = read_source_file(input_file_name)?;
    let assembly = assemble(&source, options)?;

    if output_options.list {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{}", assembly.listing())
            .map_err(|error| AssemblerFailure::IoErrorOnStdout { error })?;
    }

    let span = span!(Level::INFO, "write output", file=?output_file_name);
    let _enter = span.enter();
    let output_file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(output_file_name)
        .map_err(|error| AssemblerFailure::IoErrorOnOutput {
            filename: output_file_name.to_owned(),
            error,
        })?;
    let mut writer = BufWriter::new(output_file);
    write_image(&assembly.image, &mut writer, output_file_name)
}
