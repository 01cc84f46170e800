use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::error::{DataFrameError, Result};
use crate::frame::Frame;
use crate::wire::{encode_document, StreamConfig, LENGTH_PREFIX_SIZE};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete documents to any `Write` stream.
pub struct DocumentWriter<T> {
    inner: T,
    buf: BytesMut,
    config: StreamConfig,
}

impl<T: Write> DocumentWriter<T> {
    /// Create a new document writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, StreamConfig::default())
    }

    /// Create a new document writer with explicit configuration.
    pub fn with_config(inner: T, config: StreamConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and write one document (blocking), then flush.
    pub fn write_document(&mut self, frame: &Frame) -> Result<()> {
        self.buf.clear();
        encode_document(frame, &mut self.buf)?;

        let body_len = self.buf.len() - 2 - LENGTH_PREFIX_SIZE;
        if body_len > self.config.max_document_size {
            return Err(DataFrameError::DocumentTooLarge {
                size: body_len,
                max: self.config.max_document_size,
            });
        }

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(DataFrameError::StreamClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(DataFrameError::Io(err)),
            }
        }
        tracing::trace!(bytes = self.buf.len(), "wrote document");

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(DataFrameError::Io(err)),
            }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum document size for subsequent writes.
    pub fn set_max_document_size(&mut self, max_document_size: usize) {
        self.config.max_document_size = max_document_size;
    }

    /// Current writer configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}
