//! JSON text front-end for frames.
//!
//! Parse JSON text into frames and render frames back as JSON. Objects map to
//! frames with named fields, arrays to frames of unnamed fields. Rendering
//! goes through the frame's indexed field access, so duplicate names survive
//! as repeated object members.
//!
//! This crate is optional: the binary format never depends on it.

pub mod config;
pub mod error;
pub mod reader;
pub mod writer;

pub use config::{Style, WriterConfig};
pub use error::{JsonError, ParseError, Result};
pub use reader::parse;
pub use writer::{to_string, to_writer, JsonFrame, JsonValue};
