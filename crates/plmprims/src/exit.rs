use std::fmt;
use std::io;

use plmprims_frame::FrameError;
use plmprims_state::StateError;

// Process exit codes. 64 and 124 follow sysexits(3) and timeout(1).
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => USAGE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        FrameError::MissingStartByte(_)
        | FrameError::UnknownCode(_)
        | FrameError::NotAMessage(_)
        | FrameError::Truncated { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}

pub fn state_error(context: &str, err: StateError) -> CliError {
    match err {
        StateError::Frame(err) => frame_error(context, err),
        StateError::UnsupportedIntent { .. } | StateError::SetPointOutOfRange(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        StateError::SinkClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_frame_errors() {
        assert_eq!(frame_error("x", FrameError::UnknownCode(0x99)).code, DATA_INVALID);
        assert_eq!(frame_error("x", FrameError::ConnectionClosed).code, TRANSPORT_ERROR);
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(frame_error("x", FrameError::Io(denied)).code, PERMISSION_DENIED);
    }

    #[test]
    fn maps_state_errors() {
        let err = state_error("set failed", StateError::SetPointOutOfRange(300.0));
        assert_eq!(err.code, USAGE);
        assert!(err.message.starts_with("set failed: "));
        assert_eq!(state_error("x", StateError::SinkClosed).code, FAILURE);
    }
}
