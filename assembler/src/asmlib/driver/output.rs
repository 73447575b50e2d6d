//! Reading and writing program image files.
//!
//! An image file is a 16-byte header followed by the payload:
//!
//! | offset | size | field                       |
//! |--------|------|-----------------------------|
//! | 0      | 4    | magic, `TBIM`               |
//! | 4      | 4    | stack size in words (LE)    |
//! | 8      | 4    | origin (LE)                 |
//! | 12     | 4    | payload length, bytes (LE)  |
//! | 16     | n    | payload                     |
use std::ffi::OsStr;
use std::fs::OpenOptions;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use tracing::{event, span, Level};

use super::super::image::ProgramImage;
use super::super::types::AssemblerFailure;

const MAGIC: &[u8; 4] = b"TBIM";
const HEADER_LEN: usize = 16;

/// Write `image` to `writer`.  `output_file_name` is used only in
/// error messages.
///
/// # Errors
///
/// Failure to write, or an image whose payload is too long to
/// describe in the header.
pub fn write_image<W: Write>(
    image: &ProgramImage,
    writer: &mut W,
    output_file_name: &Path,
) -> Result<(), AssemblerFailure> {
    let span = span!(Level::DEBUG, "write program image");
    let _enter = span.enter();

    let len = u32::try_from(image.bytes.len()).map_err(|_| {
        AssemblerFailure::Internal(format!(
            "image of {} bytes is too large for the image file format",
            image.bytes.len()
        ))
    })?;
    let mut inner = || -> Result<(), std::io::Error> {
        let mut header: Vec<u8> = Vec::with_capacity(HEADER_LEN);
        header.extend_from_slice(MAGIC);
        header.extend_from_slice(&image.stack_words.to_le_bytes());
        header.extend_from_slice(&image.origin.to_le_bytes());
        header.extend_from_slice(&len.to_le_bytes());
        writer.write_all(&header)?;
        writer.write_all(&image.bytes)?;
        writer.flush()
    };
    inner().map_err(|error| AssemblerFailure::IoErrorOnOutput {
        filename: output_file_name.to_owned(),
        error,
    })?;
    event!(Level::DEBUG, "wrote {} payload bytes", image.bytes.len());
    Ok(())
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Read an image from `reader`.  `input_file_name` is used only in
/// error messages.
///
/// # Errors
///
/// Failure to read, a missing magic number, or a truncated file.
pub fn read_image<R: Read>(
    reader: &mut R,
    input_file_name: &OsStr,
) -> Result<ProgramImage, AssemblerFailure> {
    let bad = |msg: String| AssemblerFailure::BadImage {
        filename: input_file_name.to_owned(),
        msg,
    };
    let mut content: Vec<u8> = Vec::new();
    reader
        .read_to_end(&mut content)
        .map_err(|error| AssemblerFailure::IoErrorOnInput {
            filename: input_file_name.to_owned(),
            error,
        })?;
    if content.len() < HEADER_LEN {
        return Err(bad(format!(
            "the file is only {} bytes long, too short for the {HEADER_LEN}-byte header",
            content.len()
        )));
    }
    let (header, payload) = content.split_at(HEADER_LEN);
    if &header[0..4] != MAGIC {
        return Err(bad("the file does not begin with TBIM".to_string()));
    }
    let stack_words = le_u32(&header[4..8]);
    let origin = le_u32(&header[8..12]);
    let len = le_u32(&header[12..16]) as usize;
    match payload.len() {
        n if n < len => Err(bad(format!(
            "the header promises {len} bytes of program but only {n} are present"
        ))),
        n if n > len => Err(bad(format!(
            "there are {} bytes of unexpected data after the program",
            n - len
        ))),
        _ => Ok(ProgramImage {
            origin,
            stack_words,
            bytes: payload.to_vec(),
        }),
    }
}

/// Read the image file `input_file_name`.
///
/// # Errors
///
/// See [`read_image`].
pub fn read_image_file(input_file_name: &OsStr) -> Result<ProgramImage, AssemblerFailure> {
    let span = span!(Level::DEBUG, "read program image", file=?input_file_name);
    let _enter = span.enter();
    let input_file = OpenOptions::new()
        .read(true)
        .open(input_file_name)
        .map_err(|error| AssemblerFailure::IoErrorOnInput {
            filename: input_file_name.to_owned(),
            error,
        })?;
    read_image(&mut BufReader::new(input_file), input_file_name)
}
