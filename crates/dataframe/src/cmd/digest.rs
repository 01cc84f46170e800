use dataframe_core::read_documents;
use serde::Serialize;

use crate::cmd::{read_input, DigestArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_json_line, print_table, OutputFormat};

#[derive(Serialize)]
struct DigestRow {
    document: usize,
    fields: usize,
    size: usize,
    digest: String,
}

pub fn run(args: DigestArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = read_input(&args.input)?;
    let frames = read_documents(&wire).map_err(|err| frame_error("decode failed", err))?;

    let rows: Vec<DigestRow> = frames
        .iter()
        .enumerate()
        .map(|(index, frame)| DigestRow {
            document: index + 1,
            fields: frame.len(),
            size: frame.bytes().len(),
            digest: frame.digest_hex(),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            for row in &rows {
                print_json_line(row)?;
            }
        }
        OutputFormat::Table => print_table(
            &["DOC", "FIELDS", "SIZE", "SHA-1"],
            rows.into_iter()
                .map(|row| {
                    vec![
                        row.document.to_string(),
                        row.fields.to_string(),
                        row.size.to_string(),
                        row.digest,
                    ]
                })
                .collect(),
        ),
        OutputFormat::Pretty => {
            for row in rows {
                println!("{}  document {}", row.digest, row.document);
            }
        }
    }

    Ok(SUCCESS)
}
