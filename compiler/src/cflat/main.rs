use std::error::Error;
use std::ffi::OsString;
use std::fmt::{self, Display, Formatter};
use std::io::Write;

use clap::ArgAction::{Set, SetTrue};
use clap::Parser;
use tracing::{event, span, Level};
use tracing_subscriber::prelude::*;

use compiler::*;

/// Front end of the C-flat compiler; prints the syntax tree of a
/// source file.
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Cli {
    /// File from which C-flat source is read.
    #[clap(action=Set)]
    input: OsString,

    /// Print the tokenised statements instead of the syntax tree.
    #[clap(action = SetTrue, long)]
    tokens: bool,

    /// Accept the digraphs <: :> <% %> and %:
    #[clap(action = SetTrue, long)]
    digraphs: bool,

    /// Replace trigraphs such as ??= before compiling.
    #[clap(action = SetTrue, long)]
    trigraphs: bool,

    /// Accept keywords of full C which C-flat does not support.
    #[clap(action = SetTrue, long)]
    allow_incompatibles: bool,
}

#[derive(Debug)]
enum Fail {
    /// The program was read, but it does not compile.
    CompileFail(CompileError),
    /// We could not read the program.
    BadInput(String),
    WriteFailed(String),
    /// We were not able to correctly initialise the compiler.
    InitialisationFailure(String),
}

impl Display for Fail {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Fail::CompileFail(e) => e.fmt(f),
            Fail::BadInput(msg) | Fail::WriteFailed(msg) | Fail::InitialisationFailure(msg) => {
                f.write_str(msg.as_str())
            }
        }
    }
}

impl Error for Fail {}

fn compile_file(cli: &Cli) -> Result<(), Fail> {
    let options = CompilerOptions {
        use_digraphs: cli.digraphs,
        use_trigraphs: cli.trigraphs,
        error_incompatibles: !cli.allow_incompatibles,
    };
    let source = std::fs::read_to_string(&cli.input).map_err(|e| {
        Fail::BadInput(format!(
            "failed to read {}: {e}",
            cli.input.to_string_lossy()
        ))
    })?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let written = if cli.tokens {
        let lines = tokenise_program(&source, &options).map_err(Fail::CompileFail)?;
        let mut inner = || -> Result<(), std::io::Error> {
            for line in &lines {
                writeln!(out, "{line}")?;
            }
            out.flush()
        };
        inner()
    } else {
        let tree = parse_program(&source, &options).map_err(Fail::CompileFail)?;
        write!(out, "{tree}").and_then(|()| out.flush())
    };
    written.map_err(|e| Fail::WriteFailed(format!("failed to write on stdout: {e}")))
}

fn run_compiler() -> Result<(), Fail> {
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
            return Err(Fail::InitialisationFailure(format!(
                "failed to initialise tracing filter (perhaps there is a problem with environment variables): {e}"
            )));
        }
        Ok(layer) => layer,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let span = span!(Level::ERROR, "compile", input=?cli.input);
    let _enter = span.enter();
    let result = compile_file(&cli);
    if let Err(e) = &result {
        event!(Level::ERROR, "compilation failed: {:?}", e);
    }
    result
}

fn main() {
    // The tree builder recurses on nested expressions.
    unsafe { backtrace_on_stack_overflow::enable() };

    match run_compiler() {
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Ok(()) => {
            std::process::exit(0);
        }
    }
}
