//! Typed INSTEON messages.
//!
//! Wire layouts (offsets include the start byte and protocol code):
//!
//! ```text
//! 0x50  02 50 <from:3> <to:3> <flags> <cmd1> <cmd2>                    11 bytes
//! 0x51  02 51 <from:3> <to:3> <flags> <cmd1> <cmd2> <d1..d14>          25 bytes
//! 0x62  02 62 <to:3> <flags> <cmd1> <cmd2> [<d1..d14>] [<ack>]     8/9, 22/23 bytes
//! ```

use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, BytesMut};

use crate::code::{
    EXTENDED_MESSAGE_RECEIVED, EXTENDED_SEND_SIZE, SEND_MESSAGE, STANDARD_MESSAGE_RECEIVED,
    STANDARD_SEND_SIZE, START_BYTE,
};
use crate::error::{FrameError, Result};

/// Number of user data slots carried by an extended message.
pub const USER_DATA_LEN: usize = 14;

const STANDARD_RECEIVED_SIZE: usize = 11;
const EXTENDED_RECEIVED_SIZE: usize = 25;

/// Modem acknowledgement byte.
const ACK: u8 = 0x06;
/// Modem negative acknowledgement byte.
const NAK: u8 = 0x15;

/// Three-byte INSTEON device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address(pub [u8; 3]);

impl Address {
    pub const fn new(high: u8, middle: u8, low: u8) -> Self {
        Self([high, middle, low])
    }

    pub fn bytes(&self) -> [u8; 3] {
        self.0
    }

    /// Lowercase hex without separators, e.g. `1a2b3c`.
    pub fn hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }

    fn from_slice(bytes: &[u8]) -> Self {
        Self([bytes[0], bytes[1], bytes[2]])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}.{:02X}.{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

/// Error returned when an address string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid INSTEON address: {0:?}")]
pub struct AddressParseError(pub String);

impl FromStr for Address {
    type Err = AddressParseError;

    /// Accepts `1a2b3c`, `1A.2B.3C` and `1a:2b:3c`.
    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        let digits: String = input
            .chars()
            .filter(|c| !matches!(c, '.' | ':' | '-'))
            .collect();
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressParseError(input.to_string()));
        }

        let mut bytes = [0u8; 3];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
                .map_err(|_| AddressParseError(input.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

/// Message type carried in the upper three bits of the flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Direct,
    DirectAck,
    AllLinkCleanup,
    AllLinkCleanupAck,
    Broadcast,
    DirectNak,
    AllLinkBroadcast,
    AllLinkCleanupNak,
}

impl MessageType {
    pub fn bits(self) -> u8 {
        match self {
            Self::Direct => 0,
            Self::DirectAck => 1,
            Self::AllLinkCleanup => 2,
            Self::AllLinkCleanupAck => 3,
            Self::Broadcast => 4,
            Self::DirectNak => 5,
            Self::AllLinkBroadcast => 6,
            Self::AllLinkCleanupNak => 7,
        }
    }

    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Self::Direct,
            1 => Self::DirectAck,
            2 => Self::AllLinkCleanup,
            3 => Self::AllLinkCleanupAck,
            4 => Self::Broadcast,
            5 => Self::DirectNak,
            6 => Self::AllLinkBroadcast,
            _ => Self::AllLinkCleanupNak,
        }
    }

    pub fn is_ack(self) -> bool {
        matches!(self, Self::DirectAck | Self::AllLinkCleanupAck)
    }

    pub fn is_nak(self) -> bool {
        matches!(self, Self::DirectNak | Self::AllLinkCleanupNak)
    }
}

/// Decoded message flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageFlags {
    pub message_type: MessageType,
    pub extended: bool,
    pub hops_left: u8,
    pub max_hops: u8,
}

impl MessageFlags {
    pub fn new(message_type: MessageType, extended: bool) -> Self {
        Self {
            message_type,
            extended,
            hops_left: 0,
            max_hops: 0,
        }
    }

    pub fn with_hops(mut self, hops_left: u8, max_hops: u8) -> Self {
        self.hops_left = hops_left & 0x03;
        self.max_hops = max_hops & 0x03;
        self
    }

    pub fn to_byte(self) -> u8 {
        (self.message_type.bits() << 5)
            | (u8::from(self.extended) << 4)
            | (self.hops_left << 2)
            | self.max_hops
    }
}

impl From<u8> for MessageFlags {
    fn from(byte: u8) -> Self {
        Self {
            message_type: MessageType::from_bits(byte >> 5),
            extended: byte & 0x10 != 0,
            hops_left: (byte >> 2) & 0x03,
            max_hops: byte & 0x03,
        }
    }
}

impl From<MessageFlags> for u8 {
    fn from(flags: MessageFlags) -> Self {
        flags.to_byte()
    }
}

/// The fourteen payload bytes of an extended message, `d1` to `d14`.
///
/// `d14` holds the checksum on messages built with [`UserData::with_checksum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UserData([u8; USER_DATA_LEN]);

impl UserData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: [u8; USER_DATA_LEN]) -> Self {
        Self(bytes)
    }

    /// Slot `d<slot>`, 1-based. Out-of-range slots read as `None`.
    pub fn get(&self, slot: usize) -> Option<u8> {
        slot.checked_sub(1).and_then(|i| self.0.get(i)).copied()
    }

    /// Set slot `d<slot>`, 1-based. Out-of-range slots are ignored.
    pub fn set(&mut self, slot: usize, value: u8) {
        if let Some(byte) = slot.checked_sub(1).and_then(|i| self.0.get_mut(i)) {
            *byte = value;
        }
    }

    pub fn as_bytes(&self) -> &[u8; USER_DATA_LEN] {
        &self.0
    }

    /// Two's complement of `cmd1 + cmd2 + d1..d13`.
    pub fn checksum(&self, cmd1: u8, cmd2: u8) -> u8 {
        let sum = self.0[..USER_DATA_LEN - 1]
            .iter()
            .fold(cmd1.wrapping_add(cmd2), |acc, b| acc.wrapping_add(*b));
        (!sum).wrapping_add(1)
    }

    /// Copy of this payload with `d14` set to the checksum for the command pair.
    pub fn with_checksum(mut self, cmd1: u8, cmd2: u8) -> Self {
        self.0[USER_DATA_LEN - 1] = self.checksum(cmd1, cmd2);
        self
    }
}

/// Modem acknowledgement appended to an echoed send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AckStatus {
    Ack,
    Nak,
    Other(u8),
}

impl From<u8> for AckStatus {
    fn from(byte: u8) -> Self {
        match byte {
            ACK => Self::Ack,
            NAK => Self::Nak,
            other => Self::Other(other),
        }
    }
}

impl From<AckStatus> for u8 {
    fn from(status: AckStatus) -> Self {
        match status {
            AckStatus::Ack => ACK,
            AckStatus::Nak => NAK,
            AckStatus::Other(byte) => byte,
        }
    }
}

/// A decoded INSTEON message.
///
/// `address` is the originating device for received messages and the target
/// device for sends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    pub code: u8,
    pub address: Address,
    /// Destination of a received message (the modem or a group).
    pub target: Option<Address>,
    pub flags: MessageFlags,
    pub cmd1: u8,
    pub cmd2: u8,
    /// Present only on extended messages.
    pub user_data: Option<UserData>,
    /// Present only on sends echoed back by the modem.
    pub ack: Option<AckStatus>,
}

impl Message {
    /// Standard direct message to `address`.
    pub fn standard_send(address: Address, cmd1: u8, cmd2: u8) -> Self {
        Self {
            code: SEND_MESSAGE,
            address,
            target: None,
            flags: MessageFlags::new(MessageType::Direct, false),
            cmd1,
            cmd2,
            user_data: None,
            ack: None,
        }
    }

    /// Extended direct message to `address`; `d14` is replaced by the checksum.
    pub fn extended_send(address: Address, cmd1: u8, cmd2: u8, user_data: UserData) -> Self {
        Self {
            code: SEND_MESSAGE,
            address,
            target: None,
            flags: MessageFlags::new(MessageType::Direct, true),
            cmd1,
            cmd2,
            user_data: Some(user_data.with_checksum(cmd1, cmd2)),
            ack: None,
        }
    }

    pub fn standard_received(
        address: Address,
        target: Address,
        flags: MessageFlags,
        cmd1: u8,
        cmd2: u8,
    ) -> Self {
        Self {
            code: STANDARD_MESSAGE_RECEIVED,
            address,
            target: Some(target),
            flags,
            cmd1,
            cmd2,
            user_data: None,
            ack: None,
        }
    }

    pub fn extended_received(
        address: Address,
        target: Address,
        flags: MessageFlags,
        cmd1: u8,
        cmd2: u8,
        user_data: UserData,
    ) -> Self {
        Self {
            code: EXTENDED_MESSAGE_RECEIVED,
            address,
            target: Some(target),
            flags: MessageFlags {
                extended: true,
                ..flags
            },
            cmd1,
            cmd2,
            user_data: Some(user_data),
            ack: None,
        }
    }

    /// Parse a complete frame, start byte included.
    pub fn parse(frame: &[u8]) -> Result<Self> {
        let (start, code) = match frame {
            [start, code, ..] => (*start, *code),
            _ => {
                return Err(FrameError::Truncated {
                    code: 0,
                    expected: 2,
                    actual: frame.len(),
                })
            }
        };
        if start != START_BYTE {
            return Err(FrameError::MissingStartByte(start));
        }

        match code {
            STANDARD_MESSAGE_RECEIVED => {
                require_len(code, frame, STANDARD_RECEIVED_SIZE)?;
                Ok(Self::standard_received(
                    Address::from_slice(&frame[2..5]),
                    Address::from_slice(&frame[5..8]),
                    MessageFlags::from(frame[8]),
                    frame[9],
                    frame[10],
                ))
            }
            EXTENDED_MESSAGE_RECEIVED => {
                require_len(code, frame, EXTENDED_RECEIVED_SIZE)?;
                Ok(Self {
                    code,
                    address: Address::from_slice(&frame[2..5]),
                    target: Some(Address::from_slice(&frame[5..8])),
                    flags: MessageFlags::from(frame[8]),
                    cmd1: frame[9],
                    cmd2: frame[10],
                    user_data: Some(user_data_from(&frame[11..25])),
                    ack: None,
                })
            }
            SEND_MESSAGE => parse_send(frame),
            other => Err(FrameError::NotAMessage(other)),
        }
    }

    pub fn is_extended(&self) -> bool {
        self.user_data.is_some()
    }

    pub fn command(&self) -> (u8, u8) {
        (self.cmd1, self.cmd2)
    }

    /// Checksum byte (`d14`) of an extended message.
    pub fn checksum(&self) -> Option<u8> {
        self.user_data.and_then(|data| data.get(USER_DATA_LEN))
    }

    /// Slot `d<slot>` of the user data, if this is an extended message.
    pub fn user_data_slot(&self, slot: usize) -> Option<u8> {
        self.user_data.and_then(|data| data.get(slot))
    }

    /// Number of bytes [`Message::encode`] writes.
    pub fn wire_size(&self) -> usize {
        let base = match self.code {
            SEND_MESSAGE if self.is_extended() => EXTENDED_SEND_SIZE,
            SEND_MESSAGE => STANDARD_SEND_SIZE,
            EXTENDED_MESSAGE_RECEIVED => EXTENDED_RECEIVED_SIZE,
            _ => STANDARD_RECEIVED_SIZE,
        };
        base + usize::from(self.ack.is_some())
    }

    /// Write the wire representation of this message.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(self.wire_size());
        dst.put_u8(START_BYTE);
        dst.put_u8(self.code);
        dst.put_slice(&self.address.0);
        if self.code != SEND_MESSAGE {
            dst.put_slice(&self.target.unwrap_or_default().0);
        }
        dst.put_u8(self.flags.to_byte());
        dst.put_u8(self.cmd1);
        dst.put_u8(self.cmd2);
        if let Some(data) = &self.user_data {
            dst.put_slice(data.as_bytes());
        }
        if let Some(ack) = self.ack {
            dst.put_u8(ack.into());
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#04x} {} {:?} cmd={:#04x}/{:#04x}",
            self.code, self.address, self.flags.message_type, self.cmd1, self.cmd2
        )?;
        if let Some(data) = &self.user_data {
            write!(f, " data=")?;
            for byte in data.as_bytes() {
                write!(f, "{byte:02x}")?;
            }
        }
        if let Some(ack) = self.ack {
            write!(f, " {ack:?}")?;
        }
        Ok(())
    }
}

fn parse_send(frame: &[u8]) -> Result<Message> {
    require_len(SEND_MESSAGE, frame, STANDARD_SEND_SIZE)?;
    let flags_byte = frame[5];
    let size = if flags_byte == 0x00 {
        STANDARD_SEND_SIZE
    } else {
        EXTENDED_SEND_SIZE
    };
    require_len(SEND_MESSAGE, frame, size)?;

    Ok(Message {
        code: SEND_MESSAGE,
        address: Address::from_slice(&frame[2..5]),
        target: None,
        flags: MessageFlags::from(flags_byte),
        cmd1: frame[6],
        cmd2: frame[7],
        user_data: (size == EXTENDED_SEND_SIZE).then(|| user_data_from(&frame[8..22])),
        ack: frame.get(size).copied().map(AckStatus::from),
    })
}

fn require_len(code: u8, frame: &[u8], expected: usize) -> Result<()> {
    if frame.len() < expected {
        return Err(FrameError::Truncated {
            code,
            expected,
            actual: frame.len(),
        });
    }
    Ok(())
}

fn user_data_from(bytes: &[u8]) -> UserData {
    let mut data = [0u8; USER_DATA_LEN];
    data.copy_from_slice(&bytes[..USER_DATA_LEN]);
    UserData(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE: Address = Address::new(0x1A, 0x2B, 0x3C);
    const MODEM: Address = Address::new(0x44, 0x55, 0x66);

    #[test]
    fn parses_standard_received() {
        let frame = [
            0x02, 0x50, 0x1A, 0x2B, 0x3C, 0x44, 0x55, 0x66, 0x2B, 0x6E, 0x91,
        ];
        let msg = Message::parse(&frame).unwrap();

        assert_eq!(msg.code, STANDARD_MESSAGE_RECEIVED);
        assert_eq!(msg.address, DEVICE);
        assert_eq!(msg.target, Some(MODEM));
        assert_eq!(msg.flags.message_type, MessageType::DirectAck);
        assert!(!msg.flags.extended);
        assert_eq!(msg.flags.hops_left, 2);
        assert_eq!(msg.flags.max_hops, 3);
        assert_eq!(msg.command(), (0x6E, 0x91));
        assert!(!msg.is_extended());
        assert_eq!(msg.checksum(), None);
    }

    #[test]
    fn parses_extended_received() {
        let mut frame = vec![0x02, 0x51, 0x1A, 0x2B, 0x3C, 0x44, 0x55, 0x66, 0x1B, 0x2E, 0x02];
        frame.extend(1u8..=14);
        let msg = Message::parse(&frame).unwrap();

        assert!(msg.is_extended());
        assert!(msg.flags.extended);
        assert_eq!(msg.user_data_slot(1), Some(1));
        assert_eq!(msg.user_data_slot(14), Some(14));
        assert_eq!(msg.user_data_slot(15), None);
        assert_eq!(msg.checksum(), Some(14));
    }

    #[test]
    fn parses_echoed_standard_send_with_ack() {
        let frame = [0x02, 0x62, 0x1A, 0x2B, 0x3C, 0x00, 0x6A, 0x20, 0x06];
        let msg = Message::parse(&frame).unwrap();

        assert_eq!(msg.code, SEND_MESSAGE);
        assert_eq!(msg.address, DEVICE);
        assert!(msg.target.is_none());
        assert!(!msg.is_extended());
        assert_eq!(msg.ack, Some(AckStatus::Ack));
    }

    #[test]
    fn parses_echoed_extended_send_with_nak() {
        let sent = Message::extended_send(DEVICE, 0x6B, 0x04, UserData::new());
        let mut wire = BytesMut::new();
        sent.encode(&mut wire);
        wire.put_u8(0x15);

        let msg = Message::parse(&wire).unwrap();
        assert!(msg.is_extended());
        assert_eq!(msg.ack, Some(AckStatus::Nak));
        assert_eq!(msg.user_data, sent.user_data);
    }

    #[test]
    fn encoded_sends_have_documented_sizes() {
        let mut wire = BytesMut::new();
        Message::standard_send(DEVICE, 0x6A, 0x00).encode(&mut wire);
        assert_eq!(wire.len(), 8);
        assert_eq!(wire[5], 0x00);

        wire.clear();
        Message::extended_send(DEVICE, 0x6C, 145, UserData::new()).encode(&mut wire);
        assert_eq!(wire.len(), 22);
        assert_eq!(wire[5], 0x10);
        assert_eq!(wire[7], 145);
    }

    #[test]
    fn extended_send_checksum_covers_command_and_data() {
        let mut data = UserData::new();
        data.set(1, 0x01);
        let msg = Message::extended_send(DEVICE, 0x2E, 0x00, data);

        // 0x2E + 0x00 + 0x01 = 0x2F -> two's complement 0xD1
        assert_eq!(msg.checksum(), Some(0xD1));
    }

    #[test]
    fn truncated_frame_is_rejected() {
        let err = Message::parse(&[0x02, 0x50, 0x1A, 0x2B]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                code: 0x50,
                expected: 11,
                actual: 4
            }
        ));
    }

    #[test]
    fn modem_frames_are_not_messages() {
        let err = Message::parse(&[0x02, 0x73, 0x00, 0x00, 0x00, 0x06]).unwrap_err();
        assert!(matches!(err, FrameError::NotAMessage(0x73)));
    }

    #[test]
    fn flags_byte_conversion() {
        let flags = MessageFlags::new(MessageType::AllLinkBroadcast, true).with_hops(1, 3);
        assert_eq!(flags.to_byte(), 0b1101_0111);
        assert_eq!(MessageFlags::from(0b1101_0111), flags);
        assert!(MessageType::DirectAck.is_ack());
        assert!(MessageType::DirectNak.is_nak());
    }

    #[test]
    fn address_parse_and_display() {
        assert_eq!("1a2b3c".parse::<Address>().unwrap(), DEVICE);
        assert_eq!("1A.2B.3C".parse::<Address>().unwrap(), DEVICE);
        assert_eq!(DEVICE.to_string(), "1A.2B.3C");
        assert_eq!(DEVICE.hex(), "1a2b3c");
        assert!("1a2b".parse::<Address>().is_err());
        assert!("zz2b3c".parse::<Address>().is_err());
    }

    #[test]
    fn user_data_slots_are_one_based() {
        let mut data = UserData::new();
        data.set(0, 0xAA);
        data.set(15, 0xAA);
        data.set(6, 0x21);

        assert_eq!(data.get(0), None);
        assert_eq!(data.get(6), Some(0x21));
        assert!(data.as_bytes().iter().filter(|b| **b == 0xAA).count() == 0);
    }
}
