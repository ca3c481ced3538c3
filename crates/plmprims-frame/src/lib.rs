//! Protocol code registry, message model and framing for INSTEON power-line
//! modems.
//!
//! Every frame exchanged with the modem is laid out as:
//! - A start byte (`0x02`)
//! - A one-byte protocol code that determines the frame length
//! - A code-specific body; INSTEON messages carry an address, flags, a
//!   command pair and, for extended messages, fourteen user data bytes
//!
//! The send code (`0x62`) is ambiguous on the wire: its flags byte decides
//! whether a standard or an extended message follows.

pub mod code;
pub mod codec;
pub mod error;
pub mod message;
pub mod reader;
pub mod writer;

pub use code::{classify, code_name, FrameShape, ProtocolCode, ProtocolCodes, PROTOCOL_CODES};
#[cfg(feature = "async")]
pub use codec::PlmCodec;
pub use codec::{decode_frame, encode_message, skip_byte, Frame, FrameConfig, HEADER_SIZE};
pub use error::{FrameError, Result};
pub use message::{
    AckStatus, Address, AddressParseError, Message, MessageFlags, MessageType, UserData,
    USER_DATA_LEN,
};
pub use reader::MessageReader;
pub use writer::MessageWriter;
