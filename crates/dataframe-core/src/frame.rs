use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::codec::{TypeCode, TypeRegistry};
use crate::digest::Digest;
use crate::error::Result;
use crate::field::Field;
use crate::value::Value;
use crate::wire::{self, WireCursor};

/// An ordered, hierarchical multimap of fields.
///
/// Duplicate names are allowed. Name lookups return the first match.
/// Values are stored in wire format, so a frame added as a field value is
/// captured as it was at the time of the call; later changes to the source
/// frame are not reflected in the parent.
///
/// Frames are not `Sync`; concurrent mutation needs external locking.
#[derive(Debug, Default)]
pub struct Frame {
    fields: Vec<Field>,
    modified: bool,
}

impl Frame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a frame from its wire bytes.
    ///
    /// Reads field records until the buffer is exhausted. One malformed
    /// record fails the whole parse. Values are not decoded until accessed.
    /// Input nesting deeper than [`MAX_DEPTH`](crate::wire::MAX_DEPTH) fails
    /// with `NestingTooDeep`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_shared(Bytes::copy_from_slice(data))
    }

    /// Like [`Frame::from_bytes`], but field values keep slices of `data`
    /// instead of copying it.
    pub fn from_shared(data: Bytes) -> Result<Self> {
        wire::check_depth(TypeCode::Frame, &data, 0)?;
        Self::read_shallow(data)
    }

    /// Parse one level of records from bytes already checked for depth.
    pub(crate) fn read_shallow(data: Bytes) -> Result<Self> {
        let mut cursor = WireCursor::new(&data);
        let mut fields = Vec::new();
        while !cursor.is_empty() {
            let ordinal = fields.len() + 1;
            fields.push(Field::read(&mut cursor, ordinal, &data)?);
        }
        Ok(Self {
            fields,
            modified: false,
        })
    }

    /// Create a frame holding a single named field.
    pub fn with_field(name: &str, value: impl Into<Value>) -> Result<Self> {
        let mut frame = Self::new();
        frame.add(name, value)?;
        frame.modified = false;
        Ok(frame)
    }

    /// Append a field, returning its index.
    ///
    /// Encoding errors are annotated with the 1-based ordinal the field would
    /// have had.
    pub fn add<'a>(
        &mut self,
        name: impl Into<Option<&'a str>>,
        value: impl Into<Value>,
    ) -> Result<usize> {
        let ordinal = self.fields.len() + 1;
        let field = Field::new(name, value).map_err(|err| err.at_field(ordinal))?;
        Ok(self.add_field(field))
    }

    /// Append an already constructed field, returning its index.
    pub fn add_field(&mut self, field: Field) -> usize {
        self.modified = true;
        self.fields.push(field);
        self.fields.len() - 1
    }

    /// Overwrite the first field named `name`, or append one if absent.
    ///
    /// `None` removes the first matching field instead. Returns the index
    /// written or removed, or `None` when removing a name that is absent.
    pub fn put<V: Into<Value>>(&mut self, name: &str, value: Option<V>) -> Result<Option<usize>> {
        let position = self.position(name);
        match (position, value) {
            (Some(index), Some(value)) => {
                self.fields[index]
                    .set_value(value)
                    .map_err(|err| err.at_field(index + 1))?;
                self.modified = true;
                Ok(Some(index))
            }
            (Some(index), None) => {
                self.fields.remove(index);
                self.modified = true;
                Ok(Some(index))
            }
            (None, Some(value)) => self.add(name, value).map(Some),
            (None, None) => Ok(None),
        }
    }

    /// Remove the first field named `name`, then append a new one.
    ///
    /// The removal happens first: if `value` cannot be encoded the field is
    /// gone and nothing replaces it.
    pub fn replace(&mut self, name: &str, value: impl Into<Value>) -> Result<usize> {
        self.remove(name);
        self.add(name, value)
    }

    /// Remove every field named `name`, then append a single new one.
    ///
    /// As with [`Frame::replace`], an invalid value leaves the name removed.
    pub fn replace_all(&mut self, name: &str, value: impl Into<Value>) -> Result<usize> {
        self.remove_all(name);
        self.add(name, value)
    }

    /// Remove and return the first field named `name`.
    pub fn remove(&mut self, name: &str) -> Option<Field> {
        let index = self.position(name)?;
        self.modified = true;
        Some(self.fields.remove(index))
    }

    /// Remove every field named `name`, returning how many were removed.
    pub fn remove_all(&mut self, name: &str) -> usize {
        let before = self.fields.len();
        self.fields.retain(|field| field.name() != Some(name));
        let removed = before - self.fields.len();
        if removed > 0 {
            self.modified = true;
        }
        removed
    }

    /// Remove and return the field at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<Field> {
        if index >= self.fields.len() {
            return None;
        }
        self.modified = true;
        Some(self.fields.remove(index))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|field| field.name() == Some(name))
    }

    /// First field named `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name() == Some(name))
    }

    /// Field at `index`, or `None` when out of range.
    pub fn field_at(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Decoded value of the first field named `name`.
    pub fn value(&self, name: &str) -> Result<Option<&Value>> {
        self.field(name).map(Field::value).transpose()
    }

    /// Decoded value of the field at `index`.
    pub fn value_at(&self, index: usize) -> Result<Option<&Value>> {
        self.field_at(index).map(Field::value).transpose()
    }

    /// Decoded nested frame of the first field named `name`.
    pub fn frame(&self, name: &str) -> Result<Option<&Frame>> {
        Ok(self.value(name)?.and_then(Value::as_frame))
    }

    /// String rendering of the first field named `name`.
    ///
    /// `None` when the field is absent or holds a null value.
    pub fn get_as_string(&self, name: &str) -> Result<Option<String>> {
        Ok(self.value(name)?.filter(|v| !v.is_null()).map(Value::to_string))
    }

    /// String rendering of the field at `index`.
    pub fn get_as_string_at(&self, index: usize) -> Result<Option<String>> {
        Ok(self
            .value_at(index)?
            .filter(|v| !v.is_null())
            .map(Value::to_string))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Borrowing iterator over the fields in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Wire format: every field record concatenated in order.
    pub fn bytes(&self) -> Bytes {
        let size = self.fields.iter().map(Field::wire_size).sum();
        let mut dst = BytesMut::with_capacity(size);
        for field in &self.fields {
            field.write_to(&mut dst);
        }
        dst.freeze()
    }

    /// Wire record of the first field named `name`.
    pub fn field_bytes(&self, name: &str) -> Option<Bytes> {
        self.field(name).map(Field::bytes)
    }

    /// SHA-1 over the full wire bytes.
    ///
    /// Serializes the whole tree on every call and is never cached; use it
    /// for coarse equality checks only.
    pub fn digest(&self) -> Digest {
        Digest::of(&self.bytes())
    }

    /// [`Frame::digest`] as lowercase hex.
    pub fn digest_hex(&self) -> String {
        self.digest().to_hex()
    }

    /// Whether fields were added, changed or removed since creation, parse
    /// or clone.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Remove every field.
    pub fn clear(&mut self) {
        if !self.fields.is_empty() {
            self.modified = true;
        }
        self.fields.clear();
    }

    /// Number of codecs in the global type registry.
    pub fn type_count(&self) -> usize {
        TypeRegistry::global().len()
    }
}

impl Clone for Frame {
    /// Deep copy; nested frames are cloned and the modified flag is reset.
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            modified: false,
        }
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.bytes() == other.bytes()
    }
}

impl<'a> IntoIterator for &'a Frame {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if let Some(name) = field.name() {
                write!(f, "{name}=")?;
            }
            match field.value() {
                Ok(Value::String(s)) => write!(f, "{s:?}")?,
                Ok(value) => write!(f, "{value}")?,
                Err(_) => write!(f, "<{} {} bytes>", field.type_name(), field.raw().len())?,
            }
        }
        f.write_str("}")
    }
}
