//! Device model capabilities.
//!
//! A state variant fixes the value domain and the command set; a flavor
//! supplies the templates a particular device model answers to and the
//! arithmetic of its vendor extended status block.

use plmprims_dispatch::CallbackRegistry;
use plmprims_frame::{Address, Message};

use crate::state::Handler;

/// Model-specific templates and extended-status decoding for values of `V`.
pub trait Flavor<V> {
    /// Register the standing templates for the device at `address`.
    ///
    /// Called once, when the state is built.
    fn register_messages(&self, address: Address, callbacks: &mut CallbackRegistry<Handler>);

    /// Decode a frame matched by a [`Handler::ExtendedStatus`] template.
    fn decode_extended_status(&self, message: &Message) -> Option<V>;
}
