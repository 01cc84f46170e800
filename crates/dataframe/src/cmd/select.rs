use dataframe_core::{read_documents, FieldSelector, Frame, FrameSelector};
use dataframe_json::{JsonFrame, JsonValue, WriterConfig};
use serde::Serialize;

use crate::cmd::{read_input, SelectArgs};
use crate::exit::{frame_error, json_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_json_line, print_table, value_preview, OutputFormat};

#[derive(Serialize)]
struct FieldMatch<'a> {
    document: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(rename = "type")]
    type_name: &'static str,
    value: JsonValue<'a>,
}

pub fn run(args: SelectArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = read_input(&args.input)?;
    let frames = read_documents(&wire).map_err(|err| frame_error("decode failed", err))?;

    let matched = if args.frames {
        let mut selector = FrameSelector::new(&args.pattern)
            .map_err(|err| frame_error("invalid pattern", err))?;
        if let Some(name) = &args.path_field {
            selector = selector.with_path_field(name.as_str());
        }
        select_frames(&selector, &frames, format)?
    } else {
        let selector = FieldSelector::new(&args.pattern)
            .map_err(|err| frame_error("invalid pattern", err))?;
        select_fields(&selector, &frames, format)?
    };

    tracing::debug!(pattern = %args.pattern, matched, "selection complete");
    Ok(if matched > 0 { SUCCESS } else { FAILURE })
}

fn select_fields(
    selector: &FieldSelector,
    frames: &[Frame],
    format: OutputFormat,
) -> CliResult<usize> {
    let mut rows = Vec::new();
    let mut matched = 0usize;

    for (index, frame) in frames.iter().enumerate() {
        let document = index + 1;
        for field in selector
            .select(frame)
            .map_err(|err| frame_error("select failed", err))?
        {
            matched += 1;
            match format {
                OutputFormat::Json => {
                    let value = field
                        .value()
                        .map_err(|err| frame_error("decode failed", err))?;
                    print_json_line(&FieldMatch {
                        document,
                        name: field.name(),
                        type_name: field.type_name(),
                        value: JsonValue(value),
                    })?;
                }
                OutputFormat::Table => rows.push(vec![
                    document.to_string(),
                    field.name().unwrap_or_default().to_string(),
                    field.type_name().to_string(),
                    value_preview(field),
                ]),
                OutputFormat::Pretty => println!(
                    "{document} {}={}",
                    field.name().unwrap_or_default(),
                    value_preview(field)
                ),
            }
        }
    }

    if matches!(format, OutputFormat::Table) {
        print_table(&["DOC", "NAME", "TYPE", "VALUE"], rows);
    }
    Ok(matched)
}

fn select_frames(
    selector: &FrameSelector,
    frames: &[Frame],
    format: OutputFormat,
) -> CliResult<usize> {
    let mut rows = Vec::new();
    let mut matched = 0usize;

    for (index, frame) in frames.iter().enumerate() {
        let document = index + 1;
        for hit in selector
            .select(frame)
            .map_err(|err| frame_error("select failed", err))?
        {
            matched += 1;
            match format {
                OutputFormat::Json => print_json_line(&JsonFrame(&hit))?,
                OutputFormat::Table => rows.push(vec![document.to_string(), hit.to_string()]),
                OutputFormat::Pretty => {
                    let json = dataframe_json::to_string(&hit, &WriterConfig::PRETTY)
                        .map_err(|err| json_error("render failed", err))?;
                    println!("{json}");
                }
            }
        }
    }

    if matches!(format, OutputFormat::Table) {
        print_table(&["DOC", "FRAME"], rows);
    }
    Ok(matched)
}
