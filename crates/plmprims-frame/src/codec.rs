use bytes::{Buf, Bytes, BytesMut};

use crate::code::{classify, FrameShape, START_BYTE};
use crate::error::{FrameError, Result};
use crate::message::Message;

/// Smallest buffer that identifies a frame: start byte + protocol code.
pub const HEADER_SIZE: usize = 2;

/// One complete modem frame, start byte included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Shape resolved from the protocol code table.
    pub shape: FrameShape,
    /// Raw frame bytes.
    pub bytes: Bytes,
}

impl Frame {
    pub fn code(&self) -> u8 {
        self.shape.code
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        self.bytes.len()
    }

    /// Parse the frame into an INSTEON message.
    ///
    /// Modem-only frames (IM info, ALL-Link records, ...) fail with
    /// [`FrameError::NotAMessage`].
    pub fn message(&self) -> Result<Message> {
        Message::parse(&self.bytes)
    }
}

/// Encode a message into the wire format.
pub fn encode_message(message: &Message, dst: &mut BytesMut) {
    message.encode(dst);
}

/// Decode one frame from a buffer of bytes received from the modem.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet,
/// including the case where a send echo is too short to tell standard from
/// extended. On success, consumes the frame bytes from the buffer.
///
/// Errors leave the buffer untouched; callers resynchronize by dropping one
/// byte (see [`FrameError::is_desync`]).
pub fn decode_frame(src: &mut BytesMut) -> Result<Option<Frame>> {
    let Some(&start) = src.first() else {
        return Ok(None);
    };
    if start != START_BYTE {
        return Err(FrameError::MissingStartByte(start));
    }
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let code = src[1];
    let shape = classify(code, &src[..]).ok_or(FrameError::UnknownCode(code))?;
    let total = shape.inbound_size();
    if shape.is_provisional() || src.len() < total {
        return Ok(None);
    }

    let bytes = src.split_to(total).freeze();
    tracing::trace!(code, size = total, name = shape.name, "decoded frame");
    Ok(Some(Frame { shape, bytes }))
}

/// Drop a single byte from the front of an unsynchronized buffer.
pub fn skip_byte(src: &mut BytesMut) -> Option<u8> {
    if src.is_empty() {
        return None;
    }
    let byte = src[0];
    src.advance(1);
    Some(byte)
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Discard bytes until the next valid frame instead of failing on
    /// unsynchronized input. Default: true.
    pub resync: bool,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            resync: true,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

/// `tokio_util` codec over the same framing rules.
#[cfg(feature = "async")]
#[derive(Debug, Clone, Default)]
pub struct PlmCodec {
    config: FrameConfig,
}

#[cfg(feature = "async")]
impl PlmCodec {
    pub fn new(config: FrameConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "async")]
impl tokio_util::codec::Decoder for PlmCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        loop {
            match decode_frame(src) {
                Err(err) if self.config.resync && err.is_desync() => {
                    tracing::warn!(error = %err, "resynchronizing modem stream");
                    skip_byte(src);
                }
                other => return other,
            }
        }
    }
}

#[cfg(feature = "async")]
impl tokio_util::codec::Encoder<Message> for PlmCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        encode_message(&item, dst);
        Ok(())
    }
}
