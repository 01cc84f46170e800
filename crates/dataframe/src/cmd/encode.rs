use std::fs::File;
use std::io::{BufWriter, Write};

use dataframe_core::DocumentWriter;

use crate::cmd::{read_input, EncodeArgs};
use crate::exit::{frame_error, io_error, json_error, CliError, CliResult, DATA_INVALID, SUCCESS};

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let raw = read_input(&args.input)?;
    let text = String::from_utf8(raw)
        .map_err(|err| CliError::new(DATA_INVALID, format!("input is not UTF-8: {err}")))?;
    let frames = dataframe_json::parse(&text).map_err(|err| json_error("parse failed", err))?;

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|err| {
                io_error(&format!("failed creating {}", path.display()), err)
            })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(std::io::stdout().lock()),
    };

    let mut writer = DocumentWriter::new(sink);
    for frame in &frames {
        writer
            .write_document(frame)
            .map_err(|err| frame_error("write failed", err))?;
    }
    tracing::info!(documents = frames.len(), "encoded");

    Ok(SUCCESS)
}
