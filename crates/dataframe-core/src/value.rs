use std::fmt;

use crate::frame::Frame;

/// A decoded field value.
///
/// Every variant maps to exactly one registered codec (see [`crate::codec`]).
/// Equality on the `Frame` variant compares wire bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    S8(i8),
    U8(u8),
    S16(i16),
    U16(u16),
    S32(i32),
    U32(u32),
    S64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Frame(Frame),
    /// Homogeneous array; all elements must share one codec.
    Array(Vec<Value>),
}

impl Value {
    /// Human-readable name of this value's runtime shape, used in errors.
    pub fn shape(&self) -> String {
        match self {
            Value::Array(items) => match items.first() {
                None => "array".to_string(),
                Some(first) => {
                    let elem = first.shape();
                    if items.iter().all(|item| item.shape() == elem) {
                        format!("array<{elem}>")
                    } else {
                        "array<mixed>".to_string()
                    }
                }
            },
            other => other.scalar_shape().to_string(),
        }
    }

    fn scalar_shape(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::S8(_) => "i8",
            Value::U8(_) => "u8",
            Value::S16(_) => "i16",
            Value::U16(_) => "u16",
            Value::S32(_) => "i32",
            Value::U32(_) => "u32",
            Value::S64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Frame(_) => "frame",
            Value::Array(_) => "array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The nested frame, if this is a frame value.
    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            Value::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Widen any integer variant to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::S8(v) => Some(i64::from(v)),
            Value::U8(v) => Some(i64::from(v)),
            Value::S16(v) => Some(i64::from(v)),
            Value::U16(v) => Some(i64::from(v)),
            Value::S32(v) => Some(i64::from(v)),
            Value::U32(v) => Some(i64::from(v)),
            Value::S64(v) => Some(v),
            _ => None,
        }
    }

    /// Widen any numeric variant to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(f64::from(v)),
            Value::F64(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::S8(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::S16(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::S32(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::S64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Bytes(v) => f.write_str(&hex::encode(v)),
            Value::Frame(frame) => write!(f, "{frame}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => S8,
    u8 => U8,
    i16 => S16,
    u16 => U16,
    i32 => S32,
    u32 => U32,
    i64 => S64,
    f32 => F32,
    f64 => F64,
    String => String,
    Vec<u8> => Bytes,
    Frame => Frame,
    Vec<Value> => Array,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::Array(v.into_iter().map(Value::String).collect())
    }
}
