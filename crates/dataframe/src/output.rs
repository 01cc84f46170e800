use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use dataframe_core::{Field, Value};
use serde::Serialize;

use crate::exit::{CliError, CliResult, DATA_INVALID};

/// Longest value preview shown in table and pretty output.
const PREVIEW_CHARS: usize = 60;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Print one JSON value per line.
///
/// Rendering only fails when a field value cannot be decoded, so the error
/// is reported as invalid data.
pub fn print_json_line<T: Serialize>(value: &T) -> CliResult<()> {
    let line = serde_json::to_string(value)
        .map_err(|err| CliError::new(DATA_INVALID, format!("render failed: {err}")))?;
    println!("{line}");
    Ok(())
}

pub fn print_table(header: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}

/// Short single-line rendering of a field's value.
pub fn value_preview(field: &Field) -> String {
    let text = match field.value() {
        Ok(Value::String(s)) => format!("{s:?}"),
        Ok(value) => value.to_string(),
        Err(_) => return format!("<invalid {} bytes>", field.raw().len()),
    };
    truncate(&text, PREVIEW_CHARS)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
