use std::io::Write;

use dataframe_core::{Frame, Value};
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::config::WriterConfig;
use crate::error::{JsonError, Result};

/// Serializes a frame as JSON.
///
/// A non-empty frame whose fields are all unnamed renders as an array; any
/// other frame renders as an object, with repeated names emitted as repeated
/// members and unnamed fields under the empty key.
#[derive(Debug, Clone, Copy)]
pub struct JsonFrame<'a>(pub &'a Frame);

/// Serializes a single value as JSON. Byte arrays render as lowercase hex.
#[derive(Debug, Clone, Copy)]
pub struct JsonValue<'a>(pub &'a Value);

impl Serialize for JsonFrame<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let frame = self.0;
        let as_array = !frame.is_empty() && frame.iter().all(|field| field.name().is_none());

        if as_array {
            let mut seq = serializer.serialize_seq(Some(frame.len()))?;
            for index in 0..frame.len() {
                let value = frame.value_at(index).map_err(S::Error::custom)?;
                if let Some(value) = value {
                    seq.serialize_element(&JsonValue(value))?;
                }
            }
            return seq.end();
        }

        let mut map = serializer.serialize_map(Some(frame.len()))?;
        for index in 0..frame.len() {
            let Some(field) = frame.field_at(index) else {
                continue;
            };
            let value = field.value().map_err(S::Error::custom)?;
            map.serialize_entry(field.name().unwrap_or_default(), &JsonValue(value))?;
        }
        map.end()
    }
}

impl Serialize for JsonValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::S8(n) => serializer.serialize_i8(*n),
            Value::U8(n) => serializer.serialize_u8(*n),
            Value::S16(n) => serializer.serialize_i16(*n),
            Value::U16(n) => serializer.serialize_u16(*n),
            Value::S32(n) => serializer.serialize_i32(*n),
            Value::U32(n) => serializer.serialize_u32(*n),
            Value::S64(n) => serializer.serialize_i64(*n),
            Value::F32(n) => serializer.serialize_f32(*n),
            Value::F64(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(bytes) => serializer.serialize_str(&hex::encode(bytes)),
            Value::Frame(frame) => JsonFrame(frame).serialize(serializer),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&JsonValue(item))?;
                }
                seq.end()
            }
        }
    }
}

/// Render `frame` as JSON text.
pub fn to_string(frame: &Frame, config: &WriterConfig) -> Result<String> {
    let rendered = if config.is_pretty() {
        serde_json::to_string_pretty(&JsonFrame(frame))
    } else {
        serde_json::to_string(&JsonFrame(frame))
    };
    rendered.map_err(JsonError::Render)
}

/// Render `frame` as JSON into `writer`.
pub fn to_writer<W: Write>(writer: W, frame: &Frame, config: &WriterConfig) -> Result<()> {
    let rendered = if config.is_pretty() {
        serde_json::to_writer_pretty(writer, &JsonFrame(frame))
    } else {
        serde_json::to_writer(writer, &JsonFrame(frame))
    };
    rendered.map_err(JsonError::Render)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse;

    fn sample() -> Frame {
        let mut inner = Frame::new();
        inner.add("rate", 0.5f64).unwrap();

        let mut frame = Frame::new();
        frame.add("name", "incident").unwrap();
        frame.add("count", 3i32).unwrap();
        frame.add("active", true).unwrap();
        frame.add("details", inner).unwrap();
        frame
    }

    #[test]
    fn minimal_has_no_whitespace() {
        let json = to_string(&sample(), &WriterConfig::MINIMAL).unwrap();
        assert_eq!(
            json,
            r#"{"name":"incident","count":3,"active":true,"details":{"rate":0.5}}"#
        );
        assert!(!json.contains(char::is_whitespace));
    }

    #[test]
    fn pretty_is_indented() {
        let json = to_string(&sample(), &WriterConfig::PRETTY).unwrap();
        assert!(json.starts_with("{\n  \"name\": \"incident\",\n"));
        assert!(json.contains("\n  \"details\": {\n    \"rate\": 0.5\n  }\n"));
    }

    #[test]
    fn empty_typed_array_renders_brackets() {
        let frame = Frame::with_field("uriList", Vec::<String>::new()).unwrap();
        let json = to_string(&frame, &WriterConfig::MINIMAL).unwrap();
        assert!(json.find(":[]").is_some_and(|pos| pos > 0));
    }

    #[test]
    fn unnamed_fields_render_as_array() {
        let mut frame = Frame::new();
        frame.add(None, 5i32).unwrap();
        frame.add(None, "x").unwrap();
        assert_eq!(to_string(&frame, &WriterConfig::MINIMAL).unwrap(), r#"[5,"x"]"#);
        assert_eq!(to_string(&Frame::new(), &WriterConfig::MINIMAL).unwrap(), "{}");
    }

    #[test]
    fn duplicate_names_are_repeated() {
        let mut frame = Frame::new();
        frame.add("a", 1i32).unwrap();
        frame.add("a", 2i32).unwrap();
        assert_eq!(
            to_string(&frame, &WriterConfig::MINIMAL).unwrap(),
            r#"{"a":1,"a":2}"#
        );
    }

    #[test]
    fn bytes_render_as_hex() {
        let frame = Frame::with_field("blob", vec![0xDEu8, 0xAD, 0x01]).unwrap();
        assert_eq!(
            to_string(&frame, &WriterConfig::MINIMAL).unwrap(),
            r#"{"blob":"dead01"}"#
        );
    }

    #[test]
    fn null_and_mixed_unnamed() {
        let mut frame = Frame::new();
        frame.add("n", Value::Null).unwrap();
        frame.add(None, 7u8).unwrap();
        assert_eq!(
            to_string(&frame, &WriterConfig::MINIMAL).unwrap(),
            r#"{"n":null,"":7}"#
        );
    }

    #[test]
    fn parse_then_render_is_stable() {
        let text = r#"{"one":1,"list":[1,2,{"deep":"yes"}],"flag":false}"#;
        let frames = parse(text).unwrap();
        assert_eq!(to_string(&frames[0], &WriterConfig::MINIMAL).unwrap(), text);
    }

    #[test]
    fn to_writer_matches_to_string() {
        let mut out = Vec::new();
        to_writer(&mut out, &sample(), &WriterConfig::PRETTY).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            to_string(&sample(), &WriterConfig::PRETTY).unwrap()
        );
    }
}
