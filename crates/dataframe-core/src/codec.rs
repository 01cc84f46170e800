//! Type codes, codecs and the process-wide type registry.
//!
//! Every [`Value`] variant is handled by exactly one built-in codec. A codec
//! knows its 1-byte wire code, a short tag, its fixed width (0 for
//! variable-length values) and how to encode/decode value bytes.

use std::collections::HashMap;
use std::sync::LazyLock;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{DataFrameError, Result};
use crate::frame::Frame;
use crate::value::Value;
use crate::wire::{self, WireCursor};

/// Wire type codes of the built-in codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeCode {
    Frame = 0,
    Null = 1,
    Bytes = 2,
    String = 3,
    S8 = 4,
    U8 = 5,
    S16 = 6,
    U16 = 7,
    S32 = 8,
    U32 = 9,
    S64 = 10,
    F32 = 11,
    F64 = 12,
    Bool = 13,
    Array = 14,
}

impl TypeCode {
    /// All built-in codes in registration order.
    pub const ALL: [TypeCode; 15] = [
        TypeCode::Frame,
        TypeCode::Null,
        TypeCode::Bytes,
        TypeCode::String,
        TypeCode::S8,
        TypeCode::U8,
        TypeCode::S16,
        TypeCode::U16,
        TypeCode::S32,
        TypeCode::U32,
        TypeCode::S64,
        TypeCode::F32,
        TypeCode::F64,
        TypeCode::Bool,
        TypeCode::Array,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for TypeCode {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        TypeCode::ALL
            .into_iter()
            .find(|code| code.as_u8() == value)
            .ok_or(value)
    }
}

/// Encoding strategy for one value kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    code: TypeCode,
    tag: &'static str,
    width: usize,
    numeric: bool,
}

impl Codec {
    /// The built-in codec for a type code.
    pub const fn builtin(code: TypeCode) -> Self {
        let (tag, width, numeric) = match code {
            TypeCode::Frame => ("FRM", 0, false),
            TypeCode::Null => ("UDEF", 0, false),
            TypeCode::Bytes => ("BYTES", 0, false),
            TypeCode::String => ("STR", 0, false),
            TypeCode::S8 => ("S8", 1, true),
            TypeCode::U8 => ("U8", 1, true),
            TypeCode::S16 => ("S16", 2, true),
            TypeCode::U16 => ("U16", 2, true),
            TypeCode::S32 => ("S32", 4, true),
            TypeCode::U32 => ("U32", 4, true),
            TypeCode::S64 => ("S64", 8, true),
            TypeCode::F32 => ("FLT", 4, true),
            TypeCode::F64 => ("DBL", 8, true),
            TypeCode::Bool => ("BOL", 1, false),
            TypeCode::Array => ("ARRAY", 0, false),
        };
        Self {
            code,
            tag,
            width,
            numeric,
        }
    }

    pub fn code(&self) -> TypeCode {
        self.code
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Fixed value width in bytes; 0 means variable length.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_fixed(&self) -> bool {
        self.width > 0
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric
    }

    /// Whether this codec can represent `value`.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self.code, value) {
            (TypeCode::Frame, Value::Frame(_))
            | (TypeCode::Null, Value::Null)
            | (TypeCode::Bytes, Value::Bytes(_))
            | (TypeCode::String, Value::String(_))
            | (TypeCode::S8, Value::S8(_))
            | (TypeCode::U8, Value::U8(_))
            | (TypeCode::S16, Value::S16(_))
            | (TypeCode::U16, Value::U16(_))
            | (TypeCode::S32, Value::S32(_))
            | (TypeCode::U32, Value::U32(_))
            | (TypeCode::S64, Value::S64(_))
            | (TypeCode::F32, Value::F32(_))
            | (TypeCode::F64, Value::F64(_))
            | (TypeCode::Bool, Value::Bool(_)) => true,
            (TypeCode::Array, Value::Array(items)) => array_element_codec(items).is_some(),
            _ => false,
        }
    }

    /// Whether `n` lies in this codec's integer range. Always false for
    /// non-integer codecs.
    pub fn accepts_integer(&self, n: i64) -> bool {
        match self.code {
            TypeCode::S8 => i8::try_from(n).is_ok(),
            TypeCode::U8 => u8::try_from(n).is_ok(),
            TypeCode::S16 => i16::try_from(n).is_ok(),
            TypeCode::U16 => u16::try_from(n).is_ok(),
            TypeCode::S32 => i32::try_from(n).is_ok(),
            TypeCode::U32 => u32::try_from(n).is_ok(),
            TypeCode::S64 => true,
            _ => false,
        }
    }

    /// Narrow `n` into this codec's value variant, if it fits.
    pub fn integer_value(&self, n: i64) -> Option<Value> {
        match self.code {
            TypeCode::S8 => i8::try_from(n).ok().map(Value::S8),
            TypeCode::U8 => u8::try_from(n).ok().map(Value::U8),
            TypeCode::S16 => i16::try_from(n).ok().map(Value::S16),
            TypeCode::U16 => u16::try_from(n).ok().map(Value::U16),
            TypeCode::S32 => i32::try_from(n).ok().map(Value::S32),
            TypeCode::U32 => u32::try_from(n).ok().map(Value::U32),
            TypeCode::S64 => Some(Value::S64(n)),
            _ => None,
        }
    }

    /// Encode `value` into its value bytes (no record framing).
    pub fn encode(&self, value: &Value) -> Result<Bytes> {
        if !self.accepts(value) {
            return Err(DataFrameError::InvalidType {
                shape: value.shape(),
            });
        }
        let mut dst = BytesMut::with_capacity(self.width);
        self.encode_into(value, &mut dst)?;
        if dst.len() > u32::MAX as usize {
            return Err(DataFrameError::MalformedValue {
                tag: self.tag,
                reason: format!("{} bytes exceeds the 4-byte length prefix", dst.len()),
            });
        }
        Ok(dst.freeze())
    }

    fn encode_into(&self, value: &Value, dst: &mut BytesMut) -> Result<()> {
        match value {
            Value::Null => {}
            Value::Bool(v) => dst.put_u8(u8::from(*v)),
            Value::S8(v) => dst.put_i8(*v),
            Value::U8(v) => dst.put_u8(*v),
            Value::S16(v) => dst.put_i16(*v),
            Value::U16(v) => dst.put_u16(*v),
            Value::S32(v) => dst.put_i32(*v),
            Value::U32(v) => dst.put_u32(*v),
            Value::S64(v) => dst.put_i64(*v),
            Value::F32(v) => dst.put_f32(*v),
            Value::F64(v) => dst.put_f64(*v),
            Value::String(v) => dst.put_slice(v.as_bytes()),
            Value::Bytes(v) => dst.put_slice(v),
            Value::Frame(frame) => dst.put_slice(&frame.bytes()),
            Value::Array(items) => encode_array(items, dst)?,
        }
        Ok(())
    }

    /// Decode value bytes produced by [`Codec::encode`].
    ///
    /// Frames and arrays nesting deeper than
    /// [`MAX_DEPTH`](crate::wire::MAX_DEPTH) fail with `NestingTooDeep`.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        wire::check_depth(self.code, bytes, 0)?;
        self.decode_shared(&Bytes::copy_from_slice(bytes))
    }

    /// Decode bytes already checked for depth. Nested frames keep slices of
    /// `bytes`.
    pub(crate) fn decode_shared(&self, bytes: &Bytes) -> Result<Value> {
        if self.is_fixed() && bytes.len() != self.width {
            return Err(self.malformed(format!(
                "expected {} bytes, found {}",
                self.width,
                bytes.len()
            )));
        }

        let mut buf: &[u8] = bytes;
        let value = match self.code {
            TypeCode::Frame => Value::Frame(Frame::read_shallow(bytes.clone())?),
            TypeCode::Null => {
                if !bytes.is_empty() {
                    return Err(self.malformed(format!("expected no bytes, found {}", bytes.len())));
                }
                Value::Null
            }
            TypeCode::Bytes => Value::Bytes(bytes.to_vec()),
            TypeCode::String => Value::String(
                String::from_utf8(bytes.to_vec()).map_err(|err| self.malformed(err.to_string()))?,
            ),
            TypeCode::S8 => Value::S8(buf.get_i8()),
            TypeCode::U8 => Value::U8(buf.get_u8()),
            TypeCode::S16 => Value::S16(buf.get_i16()),
            TypeCode::U16 => Value::U16(buf.get_u16()),
            TypeCode::S32 => Value::S32(buf.get_i32()),
            TypeCode::U32 => Value::U32(buf.get_u32()),
            TypeCode::S64 => Value::S64(buf.get_i64()),
            TypeCode::F32 => Value::F32(buf.get_f32()),
            TypeCode::F64 => Value::F64(buf.get_f64()),
            TypeCode::Bool => match bytes[0] {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => return Err(self.malformed(format!("invalid boolean byte 0x{other:02x}"))),
            },
            TypeCode::Array => self.decode_array(bytes)?,
        };
        Ok(value)
    }

    fn decode_array(&self, bytes: &Bytes) -> Result<Value> {
        let mut cursor = WireCursor::new(bytes);
        let truncated = || self.malformed("truncated array".to_string());

        let code = cursor.read_u8().ok_or_else(truncated)?;
        let elem = TypeCode::try_from(code)
            .map(Codec::builtin)
            .map_err(|code| self.malformed(format!("unknown element type code 0x{code:02x}")))?;
        let count = cursor.read_u32().ok_or_else(truncated)? as usize;

        // never trust the count for preallocation beyond what the buffer can hold
        let mut items = Vec::with_capacity(count.min(cursor.remaining()));
        for _ in 0..count {
            let len = if elem.is_fixed() {
                elem.width
            } else {
                cursor.read_u32().ok_or_else(truncated)? as usize
            };
            let raw = cursor.take(len).ok_or_else(truncated)?;
            items.push(elem.decode_shared(&bytes.slice_ref(raw))?);
        }
        if !cursor.is_empty() {
            return Err(self.malformed(format!("{} trailing bytes", cursor.remaining())));
        }
        Ok(Value::Array(items))
    }

    fn malformed(&self, reason: String) -> DataFrameError {
        DataFrameError::MalformedValue {
            tag: self.tag,
            reason,
        }
    }
}

/// Array layout: element code (1), count (4 BE), then each element's value
/// bytes, length-prefixed (4 BE) when the element codec is variable-length.
fn encode_array(items: &[Value], dst: &mut BytesMut) -> Result<()> {
    let elem = array_element_codec(items).ok_or_else(|| DataFrameError::InvalidType {
        shape: Value::Array(items.to_vec()).shape(),
    })?;
    let count = u32::try_from(items.len()).map_err(|_| DataFrameError::MalformedValue {
        tag: "ARRAY",
        reason: format!("{} elements exceeds the 4-byte count", items.len()),
    })?;

    dst.put_u8(elem.code.as_u8());
    dst.put_u32(count);
    for item in items {
        let bytes = elem.encode(item)?;
        if !elem.is_fixed() {
            dst.put_u32(bytes.len() as u32);
        }
        dst.put_slice(&bytes);
    }
    Ok(())
}

fn array_element_codec(items: &[Value]) -> Option<Codec> {
    let Some(first) = items.first() else {
        return Some(Codec::builtin(TypeCode::Null));
    };
    let codec = TypeRegistry::global().by_value_shape(first)?;
    items
        .iter()
        .all(|item| codec.accepts(item))
        .then_some(*codec)
}

static GLOBAL: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::builtin);

/// Ordered table of codecs, looked up by tag, wire code or value shape.
///
/// The process-wide registry returned by [`TypeRegistry::global`] is built
/// once and never modified afterwards.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    codecs: Vec<Codec>,
    by_tag: HashMap<&'static str, usize>,
    by_code: HashMap<u8, usize>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in codec in registration order.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for code in TypeCode::ALL {
            let index = registry.codecs.len();
            let codec = Codec::builtin(code);
            registry.by_tag.insert(codec.tag, index);
            registry.by_code.insert(code.as_u8(), index);
            registry.codecs.push(codec);
        }
        registry
    }

    /// The shared built-in registry.
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL
    }

    /// Register a codec under `tag`. Tags and type codes must be unique.
    pub fn register(&mut self, tag: &'static str, codec: Codec) -> Result<()> {
        if self.by_tag.contains_key(tag) {
            return Err(DataFrameError::DuplicateCodec(tag.to_string()));
        }
        if self.by_code.contains_key(&codec.code.as_u8()) {
            return Err(DataFrameError::DuplicateCodec(format!(
                "type code {}",
                codec.code.as_u8()
            )));
        }
        let index = self.codecs.len();
        self.by_tag.insert(tag, index);
        self.by_code.insert(codec.code.as_u8(), index);
        self.codecs.push(Codec { tag, ..codec });
        Ok(())
    }

    pub fn by_tag(&self, tag: &str) -> Option<&Codec> {
        self.by_tag.get(tag).map(|&index| &self.codecs[index])
    }

    pub fn by_code(&self, code: u8) -> Option<&Codec> {
        self.by_code.get(&code).map(|&index| &self.codecs[index])
    }

    /// First registered codec that accepts `value`.
    pub fn by_value_shape(&self, value: &Value) -> Option<&Codec> {
        self.codecs.iter().find(|codec| codec.accepts(value))
    }

    /// First registered integer codec whose range contains `n`.
    pub fn narrowest_integer(&self, n: i64) -> Option<&Codec> {
        self.codecs.iter().find(|codec| codec.accepts_integer(n))
    }

    /// `n` as a value of the narrowest integer codec, falling back to `S64`.
    pub fn integer_value(&self, n: i64) -> Value {
        self.narrowest_integer(n)
            .and_then(|codec| codec.integer_value(n))
            .unwrap_or(Value::S64(n))
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Codec> {
        self.codecs.iter()
    }
}
