use dataframe_core::{escape_segment, DocumentReader, Field, Frame, Placeholder};
use dataframe_json::JsonValue;
use serde::Serialize;

use crate::cmd::{open_input, InspectArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_json_line, print_table, value_preview, OutputFormat};

#[derive(Serialize)]
struct FieldRow<'a> {
    document: usize,
    path: String,
    #[serde(rename = "type")]
    type_name: &'static str,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<JsonValue<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> FieldRow<'a> {
    /// Nested frames are listed row by row, so only leaves carry values. A
    /// value that fails to decode is reported in `error` instead.
    fn new(document: usize, path: String, field: &'a Field) -> Self {
        let (value, error) = match field.value() {
            Ok(_) if field.is_frame() => (None, None),
            Ok(value) => (Some(JsonValue(value)), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Self {
            document,
            path,
            type_name: field.type_name(),
            size: field.raw().len(),
            value,
            error,
        }
    }
}

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let reader = DocumentReader::new(open_input(&args.input)?);
    let mut rows = Vec::new();

    for (index, frame) in reader.enumerate() {
        let frame = frame.map_err(|err| frame_error("decode failed", err))?;
        let mut fields = Vec::new();
        collect(&frame, "", !args.shallow, &mut fields);

        for (path, field) in fields {
            let document = index + 1;
            match format {
                OutputFormat::Json => print_json_line(&FieldRow::new(document, path, field))?,
                OutputFormat::Table => rows.push(vec![
                    document.to_string(),
                    path,
                    field.type_name().to_string(),
                    field.raw().len().to_string(),
                    preview(field),
                ]),
                OutputFormat::Pretty => println!(
                    "{document} {path} {}({}) {}",
                    field.type_name(),
                    field.raw().len(),
                    preview(field)
                ),
            }
        }
    }

    if matches!(format, OutputFormat::Table) {
        print_table(&["DOC", "PATH", "TYPE", "SIZE", "VALUE"], rows);
    }
    Ok(SUCCESS)
}

fn preview(field: &Field) -> String {
    match field.value() {
        Ok(_) if field.is_frame() => String::new(),
        _ => value_preview(field),
    }
}

/// Depth-first listing of `frame` with dotted paths; unnamed fields use `[N]`.
/// A nested frame that fails to decode is listed but not descended into; its
/// row reports the error.
fn collect<'f>(frame: &'f Frame, prefix: &str, deep: bool, out: &mut Vec<(String, &'f Field)>) {
    let placeholder = Placeholder::index();
    for (index, field) in frame.iter().enumerate() {
        let segment = match field.name() {
            Some(name) => escape_segment(name).into_owned(),
            None => placeholder.render(index),
        };
        let path = if prefix.is_empty() {
            segment
        } else {
            format!("{prefix}.{segment}")
        };
        out.push((path.clone(), field));

        if deep {
            if let Ok(child) = field.value() {
                if let Some(child) = child.as_frame() {
                    collect(child, &path, deep, out);
                }
            }
        }
    }
}
