use std::cell::OnceCell;

use bytes::{Bytes, BytesMut};

use crate::codec::{Codec, TypeCode, TypeRegistry};
use crate::error::{DataFrameError, Result};
use crate::value::Value;
use crate::wire::{self, WireCursor};

/// A named or unnamed, typed value held in its wire encoding.
///
/// The encoded bytes are the source of truth. The decoded [`Value`] is
/// produced on first access and cached until the bytes are rewritten.
#[derive(Debug)]
pub struct Field {
    name: Option<String>,
    codec: Codec,
    raw: Bytes,
    cached: OnceCell<Value>,
}

impl Field {
    /// Encode `value` into a new field.
    ///
    /// The codec is resolved from the value's shape. Names longer than 255
    /// bytes are rejected.
    pub fn new<'a>(name: impl Into<Option<&'a str>>, value: impl Into<Value>) -> Result<Self> {
        let name = name.into();
        wire::check_name(name)?;
        let (codec, raw) = encode_value(&value.into())?;
        Ok(Self {
            name: name.map(str::to_string),
            codec,
            raw,
            cached: OnceCell::new(),
        })
    }

    /// Parse exactly one field record from `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let source = Bytes::copy_from_slice(bytes);
        let mut cursor = WireCursor::new(&source);
        let field = Self::read(&mut cursor, 1, &source)?;
        if !cursor.is_empty() {
            return Err(DataFrameError::MalformedValue {
                tag: field.codec.tag(),
                reason: format!("{} trailing bytes after record", cursor.remaining()),
            });
        }
        wire::check_depth(field.codec.code(), &field.raw, 1)?;
        Ok(field)
    }

    /// Read the next record from `cursor` without decoding its value.
    ///
    /// `cursor` must be reading `source`; the value keeps a slice of it.
    pub(crate) fn read(
        cursor: &mut WireCursor<'_>,
        ordinal: usize,
        source: &Bytes,
    ) -> Result<Self> {
        let record = wire::read_record(cursor, ordinal)?;
        Ok(Self {
            name: record.name,
            codec: record.codec,
            raw: source.slice_ref(record.value),
            cached: OnceCell::new(),
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn type_code(&self) -> TypeCode {
        self.codec.code()
    }

    /// Short tag of the field's codec, e.g. `"STR"`.
    pub fn type_name(&self) -> &'static str {
        self.codec.tag()
    }

    /// Encoded value bytes, without record framing.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn is_frame(&self) -> bool {
        self.codec.code() == TypeCode::Frame
    }

    pub fn is_null(&self) -> bool {
        self.codec.code() == TypeCode::Null
    }

    pub fn is_numeric(&self) -> bool {
        self.codec.is_numeric()
    }

    /// The decoded value, decoding on first access.
    pub fn value(&self) -> Result<&Value> {
        if let Some(value) = self.cached.get() {
            return Ok(value);
        }
        let decoded = self.codec.decode_shared(&self.raw)?;
        Ok(self.cached.get_or_init(|| decoded))
    }

    /// Strict decode: fails with `TypeMismatch` unless the field's codec is
    /// `expected`.
    pub fn value_as(&self, expected: TypeCode) -> Result<&Value> {
        if self.codec.code() != expected {
            return Err(DataFrameError::TypeMismatch {
                expected: Codec::builtin(expected).tag(),
                actual: self.codec.tag(),
            });
        }
        self.value()
    }

    /// Re-encode the field with a new value, keeping its name.
    ///
    /// On error the field is left unchanged.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<()> {
        let (codec, raw) = encode_value(&value.into())?;
        self.codec = codec;
        self.raw = raw;
        self.cached = OnceCell::new();
        Ok(())
    }

    /// The complete wire record: type, name and value framing.
    pub fn bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.wire_size());
        self.write_to(&mut dst);
        dst.freeze()
    }

    pub(crate) fn write_to(&self, dst: &mut BytesMut) {
        wire::write_record(self.name(), &self.codec, &self.raw, dst);
    }

    /// Size of [`Field::bytes`] without building it.
    pub fn wire_size(&self) -> usize {
        let prefix = if self.codec.is_fixed() {
            0
        } else {
            wire::LENGTH_PREFIX_SIZE
        };
        2 + self.name.as_ref().map_or(0, String::len) + prefix + self.raw.len()
    }
}

impl Clone for Field {
    /// The immutable raw bytes are shared; a decoded nested frame is cloned
    /// rather than shared.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            codec: self.codec,
            raw: self.raw.clone(),
            cached: self.cached.clone(),
        }
    }
}

fn encode_value(value: &Value) -> Result<(Codec, Bytes)> {
    let codec = *TypeRegistry::global()
        .by_value_shape(value)
        .ok_or_else(|| DataFrameError::InvalidType {
            shape: value.shape(),
        })?;
    let raw = codec.encode(value)?;
    wire::check_depth(codec.code(), &raw, 1)?;
    Ok((codec, raw))
}
