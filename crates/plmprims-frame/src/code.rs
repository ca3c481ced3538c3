//! Protocol code registry.
//!
//! Every modem frame starts with `0x02` followed by a one-byte protocol code.
//! The code alone determines the frame length, except for
//! [`SEND_MESSAGE`], which is shared by standard and extended sends. For that
//! code the flags byte at offset 5 has to be inspected before the frame length
//! is known.

/// Start-of-text byte that prefixes every modem frame.
pub const START_BYTE: u8 = 0x02;

pub const STANDARD_MESSAGE_RECEIVED: u8 = 0x50;
pub const EXTENDED_MESSAGE_RECEIVED: u8 = 0x51;
pub const X10_MESSAGE_RECEIVED: u8 = 0x52;
pub const ALL_LINKING_COMPLETED: u8 = 0x53;
pub const BUTTON_EVENT_REPORT: u8 = 0x54;
pub const USER_RESET_DETECTED: u8 = 0x55;
pub const ALL_LINK_CLEANUP_FAILURE_REPORT: u8 = 0x56;
pub const ALL_LINK_RECORD_RESPONSE: u8 = 0x57;
pub const ALL_LINK_CLEANUP_STATUS_REPORT: u8 = 0x58;
pub const GET_IM_INFO: u8 = 0x60;
pub const SEND_ALL_LINK_COMMAND: u8 = 0x61;
/// Outbound INSTEON message; standard or extended depending on its flags.
pub const SEND_MESSAGE: u8 = 0x62;
pub const GET_FIRST_ALL_LINK_RECORD: u8 = 0x69;
pub const GET_NEXT_ALL_LINK_RECORD: u8 = 0x6a;
pub const GET_IM_CONFIGURATION: u8 = 0x73;

/// Offset of the flags byte inside a [`SEND_MESSAGE`] frame.
pub const SEND_FLAGS_OFFSET: usize = 5;

const FRAGMENTED_NAME: &str = "INSTEON Fragmented Message";
const STANDARD_SEND_NAME: &str = "INSTEON Standard Message";
const EXTENDED_SEND_NAME: &str = "INSTEON Extended Message";

/// Standard send: start + code + address (3) + flags + cmd1 + cmd2.
pub const STANDARD_SEND_SIZE: usize = 8;
/// Extended send: a standard send followed by 14 user data bytes.
pub const EXTENDED_SEND_SIZE: usize = 22;

/// Static registry entry for a protocol code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolCode {
    pub code: u8,
    pub name: &'static str,
    /// Frame size in bytes, including the start byte.
    pub size: usize,
    /// Size of the modem's reply to a host command with this code, if any.
    pub response_size: Option<usize>,
}

const fn entry(
    code: u8,
    name: &'static str,
    size: usize,
    response_size: Option<usize>,
) -> ProtocolCode {
    ProtocolCode {
        code,
        name,
        size,
        response_size,
    }
}

/// Known protocol codes, in wire-document order.
pub const PROTOCOL_CODES: &[ProtocolCode] = &[
    entry(
        STANDARD_MESSAGE_RECEIVED,
        "INSTEON Standard Message Received",
        11,
        None,
    ),
    entry(
        EXTENDED_MESSAGE_RECEIVED,
        "INSTEON Extended Message Received",
        25,
        None,
    ),
    entry(X10_MESSAGE_RECEIVED, "X10 Message Received", 4, None),
    entry(ALL_LINKING_COMPLETED, "ALL-Linking Completed", 10, None),
    entry(BUTTON_EVENT_REPORT, "Button Event Report", 3, None),
    entry(USER_RESET_DETECTED, "User Reset Detected", 2, None),
    entry(
        ALL_LINK_CLEANUP_FAILURE_REPORT,
        "ALL-Link Cleanup Failure Report",
        2,
        None,
    ),
    entry(ALL_LINK_RECORD_RESPONSE, "ALL-Link Record Response", 10, None),
    entry(
        ALL_LINK_CLEANUP_STATUS_REPORT,
        "ALL-Link Cleanup Status Report",
        3,
        None,
    ),
    entry(GET_IM_INFO, "Get IM Info", 2, Some(9)),
    entry(SEND_ALL_LINK_COMMAND, "Send ALL-Link Command", 5, Some(6)),
    entry(
        SEND_MESSAGE,
        FRAGMENTED_NAME,
        STANDARD_SEND_SIZE,
        Some(STANDARD_SEND_SIZE + 1),
    ),
    entry(GET_FIRST_ALL_LINK_RECORD, "Get First ALL-Link Record", 2, None),
    entry(GET_NEXT_ALL_LINK_RECORD, "Get Next ALL-Link Record", 2, None),
    entry(GET_IM_CONFIGURATION, "Get IM Configuration", 2, Some(6)),
];

/// Frame sizing resolved for one lookup.
///
/// A fresh value is produced on every call to [`classify`]; the registry
/// itself never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameShape {
    pub code: u8,
    pub name: &'static str,
    pub size: usize,
    pub response_size: Option<usize>,
}

impl FrameShape {
    /// Size of this frame as it arrives from the modem.
    ///
    /// Host commands are echoed back with a trailing ACK/NAK byte, so the
    /// response size wins whenever the code has one.
    pub fn inbound_size(&self) -> usize {
        self.response_size.unwrap_or(self.size)
    }

    /// True when more bytes are needed before the shape is final.
    pub fn is_provisional(&self) -> bool {
        self.name == FRAGMENTED_NAME
    }

    /// True for the extended flavor of an outbound INSTEON message.
    pub fn is_extended_send(&self) -> bool {
        self.code == SEND_MESSAGE && self.size == EXTENDED_SEND_SIZE
    }
}

impl From<&ProtocolCode> for FrameShape {
    fn from(entry: &ProtocolCode) -> Self {
        Self {
            code: entry.code,
            name: entry.name,
            size: entry.size,
            response_size: entry.response_size,
        }
    }
}

/// Resolve the frame shape for `code` given the bytes buffered so far.
///
/// `buffered` is the frame as received, starting with the start byte. It is
/// only consulted for [`SEND_MESSAGE`]: with fewer than six bytes the generic
/// (provisional) shape is returned and the caller must look up again once more
/// bytes arrive.
pub fn classify(code: u8, buffered: &[u8]) -> Option<FrameShape> {
    let entry = PROTOCOL_CODES.iter().find(|entry| entry.code == code)?;
    let shape = FrameShape::from(entry);
    if code != SEND_MESSAGE {
        return Some(shape);
    }

    let Some(&flags) = buffered.get(SEND_FLAGS_OFFSET) else {
        return Some(shape);
    };

    if flags == 0x00 {
        Some(FrameShape {
            name: STANDARD_SEND_NAME,
            ..shape
        })
    } else {
        Some(FrameShape {
            name: EXTENDED_SEND_NAME,
            size: EXTENDED_SEND_SIZE,
            response_size: Some(EXTENDED_SEND_SIZE + 1),
            ..shape
        })
    }
}

/// The protocol code table as a registry value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolCodes;

impl ProtocolCodes {
    /// Look up a code; see [`classify`].
    pub fn lookup(&self, code: u8, buffered: &[u8]) -> Option<FrameShape> {
        classify(code, buffered)
    }

    /// Iterate over the static table entries.
    pub fn iter(&self) -> impl Iterator<Item = &'static ProtocolCode> {
        PROTOCOL_CODES.iter()
    }

    pub fn len(&self) -> usize {
        PROTOCOL_CODES.len()
    }

    pub fn is_empty(&self) -> bool {
        PROTOCOL_CODES.is_empty()
    }
}

/// Returns the registry name for a code, or `"UNKNOWN"`.
pub fn code_name(code: u8) -> &'static str {
    PROTOCOL_CODES
        .iter()
        .find(|entry| entry.code == code)
        .map(|entry| entry.name)
        .unwrap_or("UNKNOWN")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_codes_ignore_buffer_contents() {
        let expected = [
            (STANDARD_MESSAGE_RECEIVED, 11, None),
            (EXTENDED_MESSAGE_RECEIVED, 25, None),
            (GET_IM_INFO, 2, Some(9)),
            (SEND_ALL_LINK_COMMAND, 5, Some(6)),
            (GET_FIRST_ALL_LINK_RECORD, 2, None),
            (GET_NEXT_ALL_LINK_RECORD, 2, None),
            (GET_IM_CONFIGURATION, 2, Some(6)),
        ];
        let noisy = [0xFFu8; 32];

        for (code, size, rsize) in expected {
            for buffered in [&[][..], &noisy[..3], &noisy[..]] {
                let shape = classify(code, buffered).unwrap();
                assert_eq!(shape.size, size, "code {code:#04x}");
                assert_eq!(shape.response_size, rsize, "code {code:#04x}");
            }
        }
    }

    #[test]
    fn send_with_zero_flags_is_standard() {
        let buffered = [START_BYTE, SEND_MESSAGE, 0x1A, 0x2B, 0x3C, 0x00];
        let shape = classify(SEND_MESSAGE, &buffered).unwrap();

        assert_eq!(shape.size, 8);
        assert_eq!(shape.response_size, Some(9));
        assert!(shape.name.contains("Standard"));
        assert!(!shape.is_provisional());
        assert!(!shape.is_extended_send());
    }

    #[test]
    fn send_with_nonzero_flags_is_extended() {
        for flags in [0x01u8, 0x10, 0x1F, 0xFF] {
            let buffered = [
                START_BYTE,
                SEND_MESSAGE,
                0x1A,
                0x2B,
                0x3C,
                flags,
                0x2E,
                0x00,
            ];
            let shape = classify(SEND_MESSAGE, &buffered).unwrap();

            assert_eq!(shape.size, 22);
            assert_eq!(shape.response_size, Some(23));
            assert!(shape.name.contains("Extended"));
            assert!(shape.is_extended_send());
        }
    }

    #[test]
    fn short_send_buffer_is_provisional() {
        for len in 0..6 {
            let buffered = [START_BYTE, SEND_MESSAGE, 0x1A, 0x2B, 0x3C][..len].to_vec();
            let shape = classify(SEND_MESSAGE, &buffered).unwrap();

            assert_eq!(shape.size, 8);
            assert_eq!(shape.response_size, Some(9));
            assert!(shape.is_provisional());
        }
    }

    #[test]
    fn lookups_do_not_leak_between_calls() {
        let extended = [START_BYTE, SEND_MESSAGE, 0, 0, 0, 0x10];
        let standard = [START_BYTE, SEND_MESSAGE, 0, 0, 0, 0x00];

        assert_eq!(classify(SEND_MESSAGE, &extended).unwrap().size, 22);
        assert_eq!(classify(SEND_MESSAGE, &[]).unwrap().size, 8);
        assert_eq!(classify(SEND_MESSAGE, &standard).unwrap().size, 8);
        assert_eq!(
            PROTOCOL_CODES
                .iter()
                .find(|e| e.code == SEND_MESSAGE)
                .unwrap()
                .size,
            8
        );
    }

    #[test]
    fn unknown_code_is_not_found() {
        assert!(classify(0x00, &[]).is_none());
        assert!(classify(0x15, &[START_BYTE, 0x15]).is_none());
        assert_eq!(code_name(0x99), "UNKNOWN");
    }

    #[test]
    fn registry_lists_every_code() {
        let codes = ProtocolCodes;
        assert_eq!(codes.len(), 15);
        assert!(!codes.is_empty());
        assert_eq!(codes.iter().next().unwrap().code, STANDARD_MESSAGE_RECEIVED);
        assert_eq!(code_name(GET_IM_CONFIGURATION), "Get IM Configuration");
    }
}
