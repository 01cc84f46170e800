use std::fs;
use std::path::Path;

use dataframe_core::{DocumentReader, StreamConfig};
use dataframe_json::{Style, WriterConfig};

use crate::cmd::{open_input, DecodeArgs};
use crate::exit::{frame_error, io_error, json_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: DecodeArgs) -> CliResult<i32> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => WriterConfig::default(),
    };
    if args.pretty {
        config.style = Style::Pretty;
    }

    let stream = StreamConfig {
        max_document_size: args.max_document_size,
    };
    let reader = DocumentReader::with_config(open_input(&args.input)?, stream);

    let mut count = 0usize;
    for frame in reader {
        let frame = frame.map_err(|err| frame_error("decode failed", err))?;
        let json = dataframe_json::to_string(&frame, &config)
            .map_err(|err| json_error("render failed", err))?;
        println!("{json}");
        count += 1;
    }
    tracing::debug!(documents = count, "decoded");

    Ok(SUCCESS)
}

fn load_config(path: &Path) -> CliResult<WriterConfig> {
    let text = fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    serde_json::from_str(&text).map_err(|err| {
        CliError::new(USAGE, format!("invalid writer config {}: {err}", path.display()))
    })
}
