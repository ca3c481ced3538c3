use crate::mode::ThermostatMode;

/// Errors that can occur in state operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The intent is outside the state's command table.
    #[error("{state} does not accept {intent}")]
    UnsupportedIntent {
        state: &'static str,
        intent: ThermostatMode,
    },

    /// Set points are carried in half degrees in a single byte.
    #[error("set point {0} outside 0..=127.5")]
    SetPointOutOfRange(f64),

    /// The outbound side dropped its receiver.
    #[error("outbound sink closed")]
    SinkClosed,

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] plmprims_frame::FrameError),
}

pub type Result<T> = std::result::Result<T, StateError>;
