use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{decode_frame, skip_byte, Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::message::Message;

const INITIAL_BUFFER_CAPACITY: usize = 1024;
const READ_CHUNK_SIZE: usize = 256;

/// Reads complete modem frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
/// With [`FrameConfig::resync`] enabled, garbage and unknown codes are skipped
/// one byte at a time until the stream lines up with a frame again.
pub struct MessageReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    skipped: usize,
}

impl<T: Read> MessageReader<T> {
    /// Create a new reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            skipped: 0,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            match decode_frame(&mut self.buf) {
                Ok(Some(frame)) => return Ok(frame),
                Ok(None) => {}
                Err(err) if self.config.resync && err.is_desync() => {
                    tracing::warn!(error = %err, "resynchronizing modem stream");
                    skip_byte(&mut self.buf);
                    self.skipped = self.skipped.saturating_add(1);
                    continue;
                }
                Err(err) => return Err(err),
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read frames until one carries an INSTEON message.
    ///
    /// Modem-only frames are logged and skipped.
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            let frame = self.read_frame()?;
            match frame.message() {
                Ok(message) => return Ok(message),
                Err(FrameError::NotAMessage(code)) => {
                    tracing::debug!(code, name = frame.shape.name, "skipping modem frame");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Bytes discarded while resynchronizing.
    pub fn skipped_bytes(&self) -> usize {
        self.skipped
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

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Read> Iterator for MessageReader<T> {
    type Item = Result<Frame>;

    /// Yields frames until the stream closes cleanly.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_frame() {
            Err(FrameError::ConnectionClosed) => None,
            other => Some(other),
        }
    }
}
