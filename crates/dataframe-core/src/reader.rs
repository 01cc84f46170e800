use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::error::{DataFrameError, Result};
use crate::frame::Frame;
use crate::wire::{decode_document, StreamConfig};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete documents from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
pub struct DocumentReader<T> {
    inner: T,
    buf: BytesMut,
    config: StreamConfig,
    done: bool,
}

impl<T: Read> DocumentReader<T> {
    /// Create a new document reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, StreamConfig::default())
    }

    /// Create a new document reader with explicit configuration.
    pub fn with_config(inner: T, config: StreamConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            done: false,
        }
    }

    /// Read the next complete document (blocking).
    ///
    /// Returns `Ok(None)` at end of stream on a document boundary and
    /// `Err(DataFrameError::StreamClosed)` when the stream ends mid-document.
    pub fn read_document(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = decode_document(&mut self.buf, self.config.max_document_size)? {
                tracing::trace!(fields = frame.len(), "read document");
                return Ok(Some(frame));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(DataFrameError::Io(err)),
            };

            if read == 0 {
                return if self.buf.is_empty() {
                    Ok(None)
                } else {
                    Err(DataFrameError::StreamClosed)
                };
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum document size for subsequent decoding.
    pub fn set_max_document_size(&mut self, max_document_size: usize) {
        self.config.max_document_size = max_document_size;
    }

    /// Current reader configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}

impl<T: Read> Iterator for DocumentReader<T> {
    type Item = Result<Frame>;

    /// Yields documents until end of stream; stops after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_document() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::TypeCode;
    use crate::value::Value;
    use crate::wire::{encode_document, write_documents};

    fn sample(n: i32) -> Frame {
        let mut frame = Frame::new();
        frame.add("n", n).unwrap();
        frame.add("label", format!("doc-{n}")).unwrap();
        frame
    }

    #[test]
    fn read_single_document() {
        let mut wire = BytesMut::new();
        encode_document(&sample(1), &mut wire).unwrap();

        let mut reader = DocumentReader::new(Cursor::new(wire.to_vec()));
        let frame = reader.read_document().unwrap().unwrap();

        assert_eq!(frame, sample(1));
        assert!(reader.read_document().unwrap().is_none());
    }

    #[test]
    fn read_multiple_documents() {
        let docs = [sample(1), sample(2), sample(3)];
        let wire = write_documents(&docs).unwrap();

        let reader = DocumentReader::new(Cursor::new(wire.to_vec()));
        let frames: Vec<Frame> = reader.collect::<Result<_>>().unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].value("n").unwrap(), Some(&Value::S32(3)));
    }

    #[test]
    fn read_document_with_large_payload() {
        let frame = Frame::with_field("blob", vec![0xAB; 64 * 1024]).unwrap();
        let mut wire = BytesMut::new();
        encode_document(&frame, &mut wire).unwrap();

        let mut reader = DocumentReader::new(Cursor::new(wire.to_vec()));
        let decoded = reader.read_document().unwrap().unwrap();

        assert_eq!(decoded.field("blob").unwrap().raw().len(), 64 * 1024);
    }

    #[test]
    fn partial_read_handling() {
        let mut wire = BytesMut::new();
        encode_document(&sample(4), &mut wire).unwrap();

        let byte_reader = ByteByByteReader {
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut reader = DocumentReader::new(byte_reader);

        let frame = reader.read_document().unwrap().unwrap();
        assert_eq!(frame, sample(4));
    }

    #[test]
    fn empty_stream_ends_cleanly() {
        let mut reader = DocumentReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(reader.read_document().unwrap().is_none());
    }

    #[test]
    fn stream_closed_mid_document() {
        let mut partial = BytesMut::new();
        partial.put_u8(TypeCode::Frame.as_u8());
        partial.put_u8(0);
        partial.put_u32(16);
        partial.put_slice(b"only-part");

        let mut reader = DocumentReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_document().unwrap_err();
        assert!(matches!(err, DataFrameError::StreamClosed));
    }

    #[test]
    fn oversized_document_in_stream() {
        let mut wire = BytesMut::new();
        wire.put_u8(TypeCode::Frame.as_u8());
        wire.put_u8(0);
        wire.put_u32(1024);

        let cfg = StreamConfig {
            max_document_size: 16,
        };
        let mut reader = DocumentReader::with_config(Cursor::new(wire.to_vec()), cfg);
        let err = reader.read_document().unwrap_err();
        assert!(matches!(err, DataFrameError::DocumentTooLarge { .. }));
    }

    #[test]
    fn iterator_stops_after_error() {
        let mut wire = write_documents([&sample(1)]).unwrap();
        wire.put_u8(0xEE);
        wire.put_u8(0);

        let mut reader = DocumentReader::new(Cursor::new(wire.to_vec()));
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(
            reader.next(),
            Some(Err(DataFrameError::UnknownTypeCode { code: 0xEE, .. }))
        ));
        assert!(reader.next().is_none());
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            if buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[cfg(unix)]
    #[test]
    fn roundtrip_over_pipe() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::DocumentWriter::new(left);
        let mut reader = DocumentReader::new(right);

        writer.write_document(&sample(9)).unwrap();
        let frame = reader.read_document().unwrap().unwrap();

        assert_eq!(frame, sample(9));
    }

    #[test]
    fn interrupted_read_retries() {
        let mut wire = BytesMut::new();
        encode_document(&sample(8), &mut wire).unwrap();

        let reader = InterruptedThenData {
            state: 0,
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut framed = DocumentReader::new(reader);
        let frame = framed.read_document().unwrap().unwrap();

        assert_eq!(frame, sample(8));
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }
}
