//! Device states for INSTEON power-line modems.
//!
//! A [`State`] owns one observable value of a device, the templates that
//! feed it and the subscribers that watch it. Inbound messages are offered
//! to every state with [`State::receive`]; commands go out through a
//! [`MessageSink`] and their acknowledgements are correlated on a later
//! receive through a device-wide [`ReplyQueue`].
//!
//! The thermostat family lives in [`thermostat`]; model-specific templates
//! and decoding are supplied by a [`Flavor`], with the Venstar 2441V in
//! [`th2441v`].

pub mod command;
pub mod error;
pub mod flavor;
pub mod mode;
pub mod reply;
pub mod state;
pub mod th2441v;
pub mod thermostat;

pub use error::{Result, StateError};
pub use flavor::Flavor;
pub use mode::{ModeParseError, ThermostatMode};
pub use reply::{Reply, ReplyOwner, ReplyQueue};
pub use state::{Controllable, Handler, MessageSink, State, StateCore, Subscriber, DEFAULT_GROUP};
pub use thermostat::{
    CoolSetPoint, FanMode, HeatSetPoint, Humidity, SystemMode, Temperature, Thermostat,
    ThermostatValue, MAX_SET_POINT,
};
