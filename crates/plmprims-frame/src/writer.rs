use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_message, FrameConfig};
use crate::error::{FrameError, Result};
use crate::message::Message;

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Writes complete messages to any `Write` stream.
pub struct MessageWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> MessageWriter<T> {
    /// Create a new writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and write one message (blocking).
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        self.buf.clear();
        encode_message(message, &mut self.buf);
        tracing::debug!(message = %message, size = self.buf.len(), "writing message");

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
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

    /// Current writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::message::{Address, UserData};
    use crate::reader::MessageReader;

    const DEVICE: Address = Address::new(0x1A, 0x2B, 0x3C);

    #[test]
    fn writes_standard_send() {
        let mut writer = MessageWriter::new(Vec::new());
        writer
            .write_message(&Message::standard_send(DEVICE, 0x6A, 0x20))
            .unwrap();

        assert_eq!(
            writer.into_inner(),
            vec![0x02, 0x62, 0x1A, 0x2B, 0x3C, 0x00, 0x6A, 0x20]
        );
    }

    #[test]
    fn writes_extended_send_with_checksum() {
        let mut writer = MessageWriter::new(Vec::new());
        let msg = Message::extended_send(DEVICE, 0x6B, 0x04, UserData::new());
        writer.write_message(&msg).unwrap();

        let wire = writer.into_inner();
        assert_eq!(wire.len(), 22);
        assert_eq!(wire[5], 0x10);
        // 0x6B + 0x04 = 0x6F -> two's complement 0x91
        assert_eq!(wire[21], 0x91);
    }

    #[test]
    fn echo_roundtrip_through_reader() {
        let mut writer = MessageWriter::new(Vec::new());
        let msg = Message::extended_send(DEVICE, 0x6C, 145, UserData::new());
        writer.write_message(&msg).unwrap();
        let mut wire = writer.into_inner();
        wire.push(0x06);

        let mut reader = MessageReader::new(Cursor::new(wire));
        let echoed = reader.read_message().unwrap();
        assert_eq!(echoed.cmd2, 145);
        assert_eq!(echoed.user_data, msg.user_data);
    }

    #[test]
    fn zero_write_reports_closed() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut writer = MessageWriter::new(Closed);
        let err = writer
            .write_message(&Message::standard_send(DEVICE, 0x6A, 0x00))
            .unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_pipe() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = MessageWriter::new(left);
        let mut reader = MessageReader::new(right);

        let msg = Message::standard_send(DEVICE, 0x6B, 0x02);
        writer.write_message(&msg).unwrap();
        writer.get_mut().write_all(&[0x06]).unwrap();

        let echoed = reader.read_message().unwrap();
        assert_eq!(echoed.command(), (0x6B, 0x02));
    }
}
