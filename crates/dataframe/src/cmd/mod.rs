use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use dataframe_core::DEFAULT_MAX_DOCUMENT;

use crate::exit::{io_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod digest;
pub mod encode;
pub mod inspect;
pub mod select;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert JSON text into a binary document stream.
    Encode(EncodeArgs),
    /// Render a binary document stream as JSON.
    Decode(DecodeArgs),
    /// List every field of every document.
    Inspect(InspectArgs),
    /// Print the fingerprint of each document.
    Digest(DigestArgs),
    /// Select fields or frames by dotted path pattern.
    Select(SelectArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args),
        Command::Decode(args) => decode::run(args),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Digest(args) => digest::run(args, format),
        Command::Select(args) => select::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// JSON input file, or `-` for stdin.
    pub input: PathBuf,
    /// Write the document stream to FILE instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Document stream file, or `-` for stdin.
    pub input: PathBuf,
    /// Indent output; shorthand for a config with `"style": "pretty"`.
    #[arg(long)]
    pub pretty: bool,
    /// JSON writer config file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Reject documents larger than this many bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_DOCUMENT)]
    pub max_document_size: usize,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Document stream file, or `-` for stdin.
    pub input: PathBuf,
    /// Do not descend into nested frames.
    #[arg(long)]
    pub shallow: bool,
}

#[derive(Args, Debug)]
pub struct DigestArgs {
    /// Document stream file, or `-` for stdin.
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Document stream file, or `-` for stdin.
    pub input: PathBuf,
    /// Dotted path pattern, e.g. `a.*.c` or `**.id`.
    pub pattern: String,
    /// Select frames instead of fields.
    #[arg(long)]
    pub frames: bool,
    /// Record each selected frame's path in a field with this name.
    #[arg(long, value_name = "NAME", requires = "frames")]
    pub path_field: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Open `path` for streaming, treating `-` as stdin.
pub(crate) fn open_input(path: &Path) -> CliResult<Box<dyn Read>> {
    if is_stdin(path) {
        return Ok(Box::new(std::io::stdin().lock()));
    }
    let file = File::open(path)
        .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Read all of `path`, treating `-` as stdin.
pub(crate) fn read_input(path: &Path) -> CliResult<Vec<u8>> {
    let mut buf = Vec::new();
    open_input(path)?
        .read_to_end(&mut buf)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    Ok(buf)
}
