/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The buffer does not start with the modem start-of-text byte.
    #[error("missing start byte (expected 0x02, found {0:#04x})")]
    MissingStartByte(u8),

    /// The byte following the start byte is not a known protocol code.
    #[error("unknown protocol code {0:#04x}")]
    UnknownCode(u8),

    /// The frame is a modem frame, not an INSTEON message.
    #[error("frame with code {0:#04x} does not carry an INSTEON message")]
    NotAMessage(u8),

    /// The frame is shorter than its protocol code requires.
    #[error("truncated frame for code {code:#04x} ({actual} bytes, expected {expected})")]
    Truncated {
        code: u8,
        expected: usize,
        actual: usize,
    },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// True for errors caused by an unsynchronized byte stream.
    ///
    /// Readers recover from these by discarding one byte and retrying.
    pub fn is_desync(&self) -> bool {
        matches!(self, Self::MissingStartByte(_) | Self::UnknownCode(_))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
