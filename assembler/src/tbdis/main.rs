#![deny(unsafe_code)]

use std::error::Error;
use std::ffi::OsString;
use std::fmt::{self, Display, Formatter};
use std::io::Write;

use clap::ArgAction::Set;
use clap::Parser;
use tracing::{span, Level};
use tracing_subscriber::prelude::*;

use assembler::{read_image_file, AssemblerFailure, Disassembly};

const ABOUT: &str = "Disassembler for program image files of the 32-bit register machine";

/// Disassembler for program image files
#[derive(Parser, Debug)]
#[clap(version, about=ABOUT, long_about = None)]
struct Cli {
    /// File from which the program image is read
    #[clap(action=Set)]
    input: OsString,
}

#[derive(Debug)]
enum Fail {
    BadInput(AssemblerFailure),
    WriteFailed(String),
    Generic(String),
}

impl Display for Fail {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Fail::BadInput(e) => e.fmt(f),
            Fail::Generic(message) | Fail::WriteFailed(message) => f.write_str(message),
        }
    }
}

impl Error for Fail {}

fn disassemble_file(input_file_name: &OsString) -> Result<(), Fail> {
    let image = read_image_file(input_file_name).map_err(Fail::BadInput)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut inner = || -> Result<(), std::io::Error> {
        writeln!(
            out,
            "** origin {:08X}, {} words of stack, {} bytes of program",
            image.origin,
            image.stack_words,
            image.bytes.len()
        )?;
        write!(out, "{}", Disassembly(&image))?;
        out.flush()
    };
    inner().map_err(|e| Fail::WriteFailed(format!("failed to write on stdout: {e}")))
}

fn disassemble() -> Result<(), Fail> {
    let cli = Cli::parse();
    // See
    // https://docs.rs/tracing-subscriber/latest/tracing_subscriber/fmt/index.html#filtering-events-with-environment-variables
    // for instructions on how to select which trace messages get
    // printed.
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    let filter_layer = match tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
    {
        Err(e) => {
            return Err(Fail::Generic(format!(
                "failed to initialise tracing filter (perhaps there is a problem with environment variables): {e}"
            )));
        }
        Ok(layer) => layer,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let span = span!(Level::ERROR, "disassemble", input=?cli.input);
    let _enter = span.enter();
    disassemble_file(&cli.input)
}

fn main() {
    match disassemble() {
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
        Ok(()) => {
            std::process::exit(0);
        }
    }
}
