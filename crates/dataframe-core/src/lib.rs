//! Self-describing hierarchical binary frames.
//!
//! A [`Frame`] is an ordered multimap of [`Field`]s. Each field carries a
//! one-byte type code, an optional name of up to 255 bytes, and its encoded
//! value. Values decode lazily on first access and are cached, so re-encoding
//! an unmodified frame reproduces its input byte for byte.
//!
//! - [`codec`]: the type table and the registry mapping codes to codecs
//! - [`wire`]: record layout and document streams
//! - [`selector`]: path pattern matching over nested frames
//!
//! All multi-byte integers on the wire are big-endian.

pub mod codec;
pub mod digest;
pub mod error;
pub mod field;
pub mod frame;
pub mod reader;
pub mod selector;
pub mod value;
pub mod wire;
pub mod writer;

pub use codec::{Codec, TypeCode, TypeRegistry};
pub use digest::{Digest, DIGEST_LEN};
pub use error::{DataFrameError, ErrorKind, Result};
pub use field::Field;
pub use frame::Frame;
pub use reader::DocumentReader;
pub use selector::{escape_segment, FieldSelector, FrameSelector, Placeholder, SegmentFilter};
pub use value::Value;
pub use wire::{
    decode_document, encode_document, read_documents, write_documents, StreamConfig,
    DEFAULT_MAX_DOCUMENT, LENGTH_PREFIX_SIZE, MAX_DEPTH, MAX_NAME_LEN,
};
pub use writer::DocumentWriter;
