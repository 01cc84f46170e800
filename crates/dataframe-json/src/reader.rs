use dataframe_core::{Frame, TypeRegistry, Value};
use serde_json::{Map, Number};

use crate::error::{JsonError, ParseError, Result};

/// Parse JSON text into frames, one per top-level document.
///
/// Documents may be concatenated with or without whitespace between them:
/// `{}{}{}` yields three empty frames and empty input yields none. A
/// top-level scalar becomes a frame holding one unnamed field.
///
/// Input must be standard JSON. Lenient forms some other readers accept,
/// such as a trailing comma (`[5,]`) or an empty element (`[5,,2]`), fail
/// with [`JsonError::Parse`]. Nesting is capped by `serde_json` at 128
/// levels, which stays within [`MAX_DEPTH`](dataframe_core::MAX_DEPTH).
pub fn parse(text: &str) -> Result<Vec<Frame>> {
    let mut frames = Vec::new();
    let stream = serde_json::Deserializer::from_str(text).into_iter::<serde_json::Value>();
    for document in stream {
        let document = document.map_err(|err| JsonError::Parse(ParseError::new(&err, text)))?;
        let frame = match &document {
            serde_json::Value::Object(members) => object_frame(members)?,
            serde_json::Value::Array(items) => array_frame(items)?,
            scalar => {
                let mut frame = Frame::new();
                frame.add(None, convert(scalar)?)?;
                frame
            }
        };
        frames.push(frame);
    }
    tracing::debug!(documents = frames.len(), bytes = text.len(), "parsed JSON text");
    Ok(frames)
}

fn object_frame(members: &Map<String, serde_json::Value>) -> Result<Frame> {
    let mut frame = Frame::new();
    for (name, value) in members {
        frame.add(name.as_str(), convert(value)?)?;
    }
    Ok(frame)
}

fn array_frame(items: &[serde_json::Value]) -> Result<Frame> {
    let mut frame = Frame::new();
    for item in items {
        frame.add(None, convert(item)?)?;
    }
    Ok(frame)
}

fn convert(value: &serde_json::Value) -> Result<Value> {
    Ok(match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => number(n),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::Frame(array_frame(items)?),
        serde_json::Value::Object(members) => Value::Frame(object_frame(members)?),
    })
}

// Integers take the narrowest registered codec; anything outside i64 is a double.
fn number(n: &Number) -> Value {
    match n.as_i64() {
        Some(i) => TypeRegistry::global().integer_value(i),
        None => n.as_f64().map_or(Value::Null, Value::F64),
    }
}
