//! Field records and the document stream layout.
//!
//! Every field is written as a self-contained record:
//!
//! ```text
//! ┌───────────┬───────────┬─────────────┬──────────────┬─────────────────┐
//! │ Type (1B) │ Name len  │ Name        │ Value len    │ Value           │
//! │ code      │ (1B)      │ (0-255B)    │ (4B BE, var  │ (codec bytes)   │
//! │           │ 0=unnamed │ UTF-8       │  codecs only)│                 │
//! └───────────┴───────────┴─────────────┴──────────────┴─────────────────┘
//! ```
//!
//! A frame is the concatenation of its field records with no header of its
//! own. A document stream is a sequence of unnamed `FRM` records, one per
//! top-level frame, so documents can be read back-to-back until the input is
//! exhausted.
//!
//! Frames and arrays may nest at most [`MAX_DEPTH`] levels below the frame
//! being parsed. The limit is checked once when bytes enter the crate, so
//! decoding and walking an accepted tree never recurses deeper than that.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::{Codec, TypeCode, TypeRegistry};
use crate::error::{DataFrameError, Result};
use crate::frame::Frame;

/// Maximum field name length in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Size of the explicit value length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default maximum document size: 16 MiB.
pub const DEFAULT_MAX_DOCUMENT: usize = 16 * 1024 * 1024;

/// Maximum nesting of frames and arrays below a top-level frame.
///
/// Matches the recursion limit `serde_json` applies to JSON text, so any
/// document the JSON front-end accepts also fits here.
pub const MAX_DEPTH: usize = 128;

/// Bounds-checked reader over a byte slice.
#[derive(Debug)]
pub(crate) struct WireCursor<'a> {
    buf: &'a [u8],
}

impl<'a> WireCursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub(crate) fn read_u8(&mut self) -> Option<u8> {
        (self.buf.remaining() >= 1).then(|| self.buf.get_u8())
    }

    pub(crate) fn read_u32(&mut self) -> Option<u32> {
        (self.buf.remaining() >= 4).then(|| self.buf.get_u32())
    }

    pub(crate) fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        if self.buf.len() < len {
            return None;
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Some(head)
    }
}

/// A record split into its parts, value bytes still encoded.
#[derive(Debug)]
pub(crate) struct RawRecord<'a> {
    pub(crate) codec: Codec,
    pub(crate) name: Option<String>,
    pub(crate) value: &'a [u8],
}

/// Read one record; `ordinal` is the 1-based position used in errors.
pub(crate) fn read_record<'a>(
    cursor: &mut WireCursor<'a>,
    ordinal: usize,
) -> Result<RawRecord<'a>> {
    let underflow = || DataFrameError::DataUnderflow { ordinal };

    let code = cursor.read_u8().ok_or_else(underflow)?;
    let codec = *TypeRegistry::global()
        .by_code(code)
        .ok_or(DataFrameError::UnknownTypeCode { code, ordinal })?;

    let name_len = cursor.read_u8().ok_or_else(underflow)? as usize;
    let name = if name_len == 0 {
        None
    } else {
        let raw = cursor.take(name_len).ok_or_else(underflow)?;
        let name = std::str::from_utf8(raw).map_err(|err| {
            DataFrameError::MalformedValue {
                tag: "field name",
                reason: err.to_string(),
            }
            .at_field(ordinal)
        })?;
        Some(name.to_string())
    };

    let value_len = if codec.is_fixed() {
        codec.width()
    } else {
        cursor.read_u32().ok_or_else(underflow)? as usize
    };
    let value = cursor.take(value_len).ok_or_else(underflow)?;

    Ok(RawRecord { codec, name, value })
}

/// Append a record for already-encoded value bytes.
pub(crate) fn write_record(name: Option<&str>, codec: &Codec, value: &[u8], dst: &mut BytesMut) {
    let name = name.unwrap_or_default();
    debug_assert!(name.len() <= MAX_NAME_LEN);
    debug_assert!(!codec.is_fixed() || value.len() == codec.width());

    dst.reserve(2 + name.len() + LENGTH_PREFIX_SIZE + value.len());
    dst.put_u8(codec.code().as_u8());
    dst.put_u8(name.len() as u8);
    dst.put_slice(name.as_bytes());
    if !codec.is_fixed() {
        dst.put_u32(value.len() as u32);
    }
    dst.put_slice(value);
}

/// Reject `value` if its frames and arrays nest past [`MAX_DEPTH`].
///
/// `level` is the depth `value` itself sits at: 0 for a frame being parsed
/// on its own, 1 for a field value inside one. The walk keeps its own stack
/// and stops descending at malformed records, which are reported when the
/// value is decoded.
pub(crate) fn check_depth(code: TypeCode, value: &[u8], level: usize) -> Result<()> {
    let mut pending = vec![(code, value, level)];
    while let Some((code, bytes, level)) = pending.pop() {
        if level > MAX_DEPTH {
            return Err(DataFrameError::NestingTooDeep { max: MAX_DEPTH });
        }
        let mut cursor = WireCursor::new(bytes);
        match code {
            TypeCode::Frame => {
                while !cursor.is_empty() {
                    let Ok(record) = read_record(&mut cursor, 0) else {
                        break;
                    };
                    if nests(record.codec.code()) {
                        pending.push((record.codec.code(), record.value, level + 1));
                    }
                }
            }
            TypeCode::Array => {
                let Some(Ok(elem)) = cursor.read_u8().map(TypeCode::try_from) else {
                    continue;
                };
                let Some(count) = cursor.read_u32().filter(|_| nests(elem)) else {
                    continue;
                };
                // container elements are variable-length, so always prefixed
                for _ in 0..count {
                    let Some(raw) = cursor
                        .read_u32()
                        .and_then(|len| cursor.take(len as usize))
                    else {
                        break;
                    };
                    pending.push((elem, raw, level + 1));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn nests(code: TypeCode) -> bool {
    matches!(code, TypeCode::Frame | TypeCode::Array)
}

/// Check a field name against the single-byte length prefix.
pub(crate) fn check_name(name: Option<&str>) -> Result<()> {
    match name {
        Some(name) if name.len() > MAX_NAME_LEN => {
            Err(DataFrameError::NameTooLong { len: name.len() })
        }
        _ => Ok(()),
    }
}

/// Configuration for document streams.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Maximum encoded document size in bytes. Default: 16 MiB.
    pub max_document_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_document_size: DEFAULT_MAX_DOCUMENT,
        }
    }
}

/// Append `frame` to `dst` as one document (an unnamed `FRM` record).
pub fn encode_document(frame: &Frame, dst: &mut BytesMut) -> Result<()> {
    let body = frame.bytes();
    if body.len() > u32::MAX as usize {
        return Err(DataFrameError::DocumentTooLarge {
            size: body.len(),
            max: u32::MAX as usize,
        });
    }
    write_record(None, &Codec::builtin(TypeCode::Frame), &body, dst);
    Ok(())
}

/// Decode one document from the front of `src`.
///
/// Returns `Ok(None)` if the buffer doesn't hold a complete document yet.
/// On success, consumes the document bytes from the buffer.
pub fn decode_document(src: &mut BytesMut, max_document: usize) -> Result<Option<Frame>> {
    if src.len() < 2 {
        return Ok(None);
    }

    let code = src[0];
    match TypeCode::try_from(code) {
        Ok(TypeCode::Frame) => {}
        Ok(other) => {
            return Err(DataFrameError::NotADocument {
                tag: Codec::builtin(other).tag(),
            })
        }
        Err(code) => return Err(DataFrameError::UnknownTypeCode { code, ordinal: 1 }),
    }

    let name_len = src[1] as usize;
    let header = 2 + name_len + LENGTH_PREFIX_SIZE;
    if src.len() < header {
        return Ok(None);
    }

    let mut len_bytes = &src[2 + name_len..header];
    let body_len = len_bytes.get_u32() as usize;
    if body_len > max_document {
        return Err(DataFrameError::DocumentTooLarge {
            size: body_len,
            max: max_document,
        });
    }
    if src.len() < header + body_len {
        return Ok(None);
    }

    src.advance(header);
    let body = src.split_to(body_len).freeze();
    Frame::from_shared(body).map(Some)
}

/// Parse every document in `buf`.
///
/// All-or-nothing: a truncated or malformed document fails the whole call.
pub fn read_documents(buf: &[u8]) -> Result<Vec<Frame>> {
    let buf = Bytes::copy_from_slice(buf);
    let mut cursor = WireCursor::new(&buf);
    let mut documents = Vec::new();
    while !cursor.is_empty() {
        let ordinal = documents.len() + 1;
        let record = read_record(&mut cursor, ordinal)?;
        if record.codec.code() != TypeCode::Frame {
            return Err(DataFrameError::NotADocument {
                tag: record.codec.tag(),
            });
        }
        documents.push(Frame::from_shared(buf.slice_ref(record.value))?);
    }
    tracing::trace!(count = documents.len(), "read documents");
    Ok(documents)
}

/// Concatenate `frames` as a document stream.
pub fn write_documents<'a>(frames: impl IntoIterator<Item = &'a Frame>) -> Result<BytesMut> {
    let mut dst = BytesMut::new();
    for frame in frames {
        encode_document(frame, &mut dst)?;
    }
    Ok(dst)
}

/// Frame bytes for `{a:{a:...{c:5}}}` with `levels` nested `a` frames,
/// built without recursion.
#[cfg(test)]
pub(crate) fn nested_frame_bytes(levels: usize) -> Vec<u8> {
    let mut inner = BytesMut::new();
    write_record(Some("c"), &Codec::builtin(TypeCode::S8), &[5], &mut inner);

    let header = 2 + 1 + LENGTH_PREFIX_SIZE;
    let mut wire = Vec::with_capacity(levels * header + inner.len());
    for level in (1..=levels).rev() {
        let body_len = (level - 1) * header + inner.len();
        wire.extend_from_slice(&[TypeCode::Frame.as_u8(), 1, b'a']);
        wire.extend_from_slice(&(body_len as u32).to_be_bytes());
    }
    wire.extend_from_slice(&inner);
    wire
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn fixed_record_has_no_length_prefix() {
        let mut dst = BytesMut::new();
        write_record(Some("n"), &Codec::builtin(TypeCode::S16), &[0x01, 0x02], &mut dst);
        assert_eq!(dst.as_ref(), &[TypeCode::S16.as_u8(), 1, b'n', 0x01, 0x02]);
    }

    #[test]
    fn variable_record_has_length_prefix() {
        let mut dst = BytesMut::new();
        write_record(None, &Codec::builtin(TypeCode::String), b"hi", &mut dst);
        assert_eq!(
            dst.as_ref(),
            &[TypeCode::String.as_u8(), 0, 0, 0, 0, 2, b'h', b'i']
        );
    }

    #[test]
    fn read_record_reports_underflow_ordinal() {
        let mut dst = BytesMut::new();
        write_record(Some("abc"), &Codec::builtin(TypeCode::String), b"xyz", &mut dst);
        let truncated = &dst[..dst.len() - 1];

        let mut cursor = WireCursor::new(truncated);
        let err = read_record(&mut cursor, 4).unwrap_err();
        assert!(matches!(err, DataFrameError::DataUnderflow { ordinal: 4 }));
        assert_eq!(err.kind(), ErrorKind::DataUnderflow);
    }

    #[test]
    fn read_record_rejects_unknown_code() {
        let mut cursor = WireCursor::new(&[0xEE, 0]);
        let err = read_record(&mut cursor, 1).unwrap_err();
        assert!(matches!(
            err,
            DataFrameError::UnknownTypeCode {
                code: 0xEE,
                ordinal: 1
            }
        ));
    }

    #[test]
    fn three_empty_documents() {
        let empty = Frame::new();
        let wire = write_documents([&empty, &empty, &empty]).unwrap();
        assert_eq!(wire.len(), 3 * (2 + LENGTH_PREFIX_SIZE));

        let docs = read_documents(&wire).unwrap();
        assert_eq!(docs.len(), 3);
        assert!(docs.iter().all(Frame::is_empty));
    }

    #[test]
    fn decode_document_waits_for_complete_input() {
        let frame = Frame::with_field("k", "value").unwrap();
        let mut wire = BytesMut::new();
        encode_document(&frame, &mut wire).unwrap();
        let full = wire.clone();

        wire.truncate(full.len() - 1);
        assert!(decode_document(&mut wire, DEFAULT_MAX_DOCUMENT)
            .unwrap()
            .is_none());

        let mut wire = full;
        let decoded = decode_document(&mut wire, DEFAULT_MAX_DOCUMENT)
            .unwrap()
            .unwrap();
        assert_eq!(decoded, frame);
        assert!(wire.is_empty());
    }

    #[test]
    fn decode_document_enforces_max_size() {
        let frame = Frame::with_field("k", vec![0u8; 64]).unwrap();
        let mut wire = BytesMut::new();
        encode_document(&frame, &mut wire).unwrap();

        let err = decode_document(&mut wire, 16).unwrap_err();
        assert!(matches!(err, DataFrameError::DocumentTooLarge { max: 16, .. }));
    }

    #[test]
    fn non_frame_record_is_not_a_document() {
        let mut wire = BytesMut::new();
        write_record(None, &Codec::builtin(TypeCode::Bool), &[1], &mut wire);

        let err = read_documents(&wire).unwrap_err();
        assert!(matches!(err, DataFrameError::NotADocument { tag: "BOL" }));
        let err = decode_document(&mut wire, DEFAULT_MAX_DOCUMENT).unwrap_err();
        assert!(matches!(err, DataFrameError::NotADocument { tag: "BOL" }));
    }

    #[test]
    fn truncated_stream_fails_whole_read() {
        let frame = Frame::with_field("a", 1i32).unwrap();
        let wire = write_documents([&frame, &frame]).unwrap();
        let err = read_documents(&wire[..wire.len() - 2]).unwrap_err();
        assert!(matches!(err, DataFrameError::DataUnderflow { ordinal: 2 }));
    }

    #[test]
    fn deep_document_is_rejected() {
        let body = nested_frame_bytes(20_000);
        let mut wire = BytesMut::new();
        write_record(None, &Codec::builtin(TypeCode::Frame), &body, &mut wire);

        let err = read_documents(&wire).unwrap_err();
        assert!(matches!(err, DataFrameError::NestingTooDeep { max: MAX_DEPTH }));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = decode_document(&mut wire, DEFAULT_MAX_DOCUMENT).unwrap_err();
        assert!(matches!(err, DataFrameError::NestingTooDeep { .. }));
    }

    #[test]
    fn depth_limit_counts_arrays() {
        let mut inner = BytesMut::new();
        write_record(Some("c"), &Codec::builtin(TypeCode::S8), &[5], &mut inner);
        // ARRAY of one FRM element: code, count, length-prefixed element
        let mut array = vec![TypeCode::Frame.as_u8(), 0, 0, 0, 1];
        array.extend_from_slice(&(inner.len() as u32).to_be_bytes());
        array.extend_from_slice(&inner);

        assert!(check_depth(TypeCode::Array, &array, MAX_DEPTH - 1).is_ok());
        assert!(check_depth(TypeCode::Array, &array, MAX_DEPTH).is_err());
    }

    #[test]
    fn decoded_documents_share_the_input_buffer() {
        let frame = Frame::with_field("blob", vec![9u8; 32]).unwrap();
        let mut wire = BytesMut::new();
        encode_document(&frame, &mut wire).unwrap();
        let range = wire.as_ptr_range();

        let decoded = decode_document(&mut wire, DEFAULT_MAX_DOCUMENT)
            .unwrap()
            .unwrap();
        let raw = decoded.field("blob").unwrap().raw();
        assert!(range.contains(&raw.as_ptr()));
    }
}
