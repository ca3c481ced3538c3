//! INSTEON power-line modem protocol core.
//!
//! plmprims turns the modem's byte stream into typed messages, routes them to
//! device states through message templates, and frames control intents back
//! into outbound messages.
//!
//! # Crate Structure
//!
//! - [`frame`]: Protocol code table, message model, framing reader/writer
//! - [`dispatch`]: Message templates and ordered callback registries
//! - [`state`]: Device states, the thermostat family and the 2441V flavor

/// Re-export frame types.
pub mod frame {
    pub use plmprims_frame::*;
}

/// Re-export dispatch types.
pub mod dispatch {
    pub use plmprims_dispatch::*;
}

/// Re-export state types.
pub mod state {
    pub use plmprims_state::*;
}
