/// Errors that can occur while building, encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum DataFrameError {
    /// A field name does not fit the single-byte length prefix.
    #[error("field name too long ({len} bytes, max 255)")]
    NameTooLong { len: usize },

    /// No registered codec accepts the value.
    #[error("unsupported value type: {shape}")]
    InvalidType { shape: String },

    /// A field could not be constructed; `ordinal` is 1-based.
    #[error("invalid field #{ordinal}: {source}")]
    InvalidField {
        ordinal: usize,
        #[source]
        source: Box<DataFrameError>,
    },

    /// The buffer ended before the record for field `ordinal` was complete.
    #[error("data underflow reading field #{ordinal}")]
    DataUnderflow { ordinal: usize },

    /// A record carries a type code with no registered codec.
    #[error("unknown type code 0x{code:02x} in field #{ordinal}")]
    UnknownTypeCode { code: u8, ordinal: usize },

    /// Value bytes do not form a valid value for their codec.
    #[error("malformed {tag} value: {reason}")]
    MalformedValue { tag: &'static str, reason: String },

    /// Strict decoding found a different codec than the caller expected.
    #[error("type mismatch (expected {expected}, found {actual})")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A selector pattern could not be compiled.
    #[error("invalid selector pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A codec with the same tag or type code is already registered.
    #[error("codec already registered: {0}")]
    DuplicateCodec(String),

    /// A document exceeds the configured maximum size.
    #[error("document too large ({size} bytes, max {max})")]
    DocumentTooLarge { size: usize, max: usize },

    /// Frames or arrays nest deeper than the decoder accepts.
    #[error("nesting deeper than {max} levels")]
    NestingTooDeep { max: usize },

    /// A stream record where a document was expected is not a nested frame.
    #[error("expected a frame document, found {tag} record")]
    NotADocument { tag: &'static str },

    /// An I/O error occurred while reading or writing documents.
    #[error("document I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete document was received.
    #[error("stream closed (incomplete document)")]
    StreamClosed,
}

/// Coarse classification of [`DataFrameError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    DataUnderflow,
    TypeMismatch,
    Io,
}

impl DataFrameError {
    /// Classify this error.
    ///
    /// Ordinal annotations are transparent: an `InvalidField` wrapping an
    /// underflow is still a `DataUnderflow`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidField { source, .. } => source.kind(),
            Self::DataUnderflow { .. } => ErrorKind::DataUnderflow,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::Io(_) | Self::StreamClosed => ErrorKind::Io,
            Self::NameTooLong { .. }
            | Self::InvalidType { .. }
            | Self::UnknownTypeCode { .. }
            | Self::MalformedValue { .. }
            | Self::InvalidPattern { .. }
            | Self::DuplicateCodec(_)
            | Self::DocumentTooLarge { .. }
            | Self::NestingTooDeep { .. }
            | Self::NotADocument { .. } => ErrorKind::InvalidArgument,
        }
    }

    pub(crate) fn at_field(self, ordinal: usize) -> Self {
        match self {
            // already positioned
            Self::DataUnderflow { .. }
            | Self::UnknownTypeCode { .. }
            | Self::InvalidField { .. } => self,
            other => Self::InvalidField {
                ordinal,
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, DataFrameError>;
