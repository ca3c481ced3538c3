//! Venstar 2441V thermostat.
//!
//! The 2441V reports unsolicited standard status messages (`0x6E`..`0x72`)
//! and answers an extended get (`0x2E`) with a vendor status block. The
//! mode and set point block is shared by four states, each decoding its own
//! slice of it.

use plmprims_dispatch::{CallbackRegistry, FlagsTemplate, Template, UserDataTemplate};
use plmprims_frame::{Address, Message, MessageType};

use crate::command::*;
use crate::flavor::Flavor;
use crate::mode::ThermostatMode;
use crate::state::Handler;
use crate::thermostat::from_half_units;

/// `d1` of every extended status block.
const EXTENDED_STATUS_D1: u8 = 0x01;

fn status(address: Address, cmd1: u8, flags: FlagsTemplate) -> Template {
    Template::standard_received()
        .address(address)
        .cmd1(cmd1)
        .flags(flags)
}

fn control_ack(address: Address, cmd2: u8) -> Template {
    Template::standard_received()
        .address(address)
        .command(CONTROL, Some(cmd2))
        .flags(FlagsTemplate::of_type(MessageType::DirectAck))
}

fn extended_status(address: Address, cmd2: u8) -> Template {
    Template::extended_received()
        .address(address)
        .command(EXTENDED_GET_SET, Some(cmd2))
        .user_data(UserDataTemplate::new().slot(1, EXTENDED_STATUS_D1))
}

fn direct() -> FlagsTemplate {
    FlagsTemplate::of_type(MessageType::Direct)
}

fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Temperature: `0x6E` status and the extended temperature block.
#[derive(Debug, Clone, Copy, Default)]
pub struct Temperature2441V;

impl Flavor<f64> for Temperature2441V {
    fn register_messages(&self, address: Address, callbacks: &mut CallbackRegistry<Handler>) {
        callbacks.register(status(address, TEMPERATURE_STATUS, direct()), Handler::Status);
        callbacks.register(
            extended_status(address, EXTENDED_TEMPERATURE),
            Handler::ExtendedStatus,
        );
    }

    /// `d9:d10` is a signed big-endian count of tenths of a degree Celsius.
    /// The result is rounded to a tenth of a degree Fahrenheit.
    fn decode_extended_status(&self, message: &Message) -> Option<f64> {
        let high = message.user_data_slot(9)?;
        let low = message.user_data_slot(10)?;
        let celsius = f64::from(i16::from_be_bytes([high, low])) * 0.1;
        Some((celsius_to_fahrenheit(celsius) * 10.0).round() / 10.0)
    }
}

/// Humidity: `0x6F` status only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Humidity2441V;

impl Flavor<u8> for Humidity2441V {
    fn register_messages(&self, address: Address, callbacks: &mut CallbackRegistry<Handler>) {
        callbacks.register(status(address, HUMIDITY_STATUS, direct()), Handler::Status);
    }

    fn decode_extended_status(&self, _message: &Message) -> Option<u8> {
        None
    }
}

/// System mode: high nibble of `d6`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMode2441V;

impl Flavor<ThermostatMode> for SystemMode2441V {
    fn register_messages(&self, address: Address, callbacks: &mut CallbackRegistry<Handler>) {
        callbacks.register(status(address, MODE_STATUS, direct()), Handler::Status);
        for cmd2 in [
            CONTROL_ON_HEAT,
            CONTROL_ON_COOL,
            CONTROL_ON_AUTO,
            CONTROL_ON_AUTO_ALT,
            CONTROL_OFF_ALL,
        ] {
            callbacks.register(control_ack(address, cmd2), Handler::Ack);
        }
        callbacks.register(
            extended_status(address, EXTENDED_THERMOSTAT),
            Handler::ExtendedStatus,
        );
    }

    fn decode_extended_status(&self, message: &Message) -> Option<ThermostatMode> {
        match message.user_data_slot(6)? >> 4 {
            0 => Some(ThermostatMode::Off),
            1 => Some(ThermostatMode::Auto),
            2 => Some(ThermostatMode::Heat),
            3 => Some(ThermostatMode::Cool),
            _ => None,
        }
    }
}

/// Fan mode: low nibble of `d6`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FanMode2441V;

impl Flavor<ThermostatMode> for FanMode2441V {
    fn register_messages(&self, address: Address, callbacks: &mut CallbackRegistry<Handler>) {
        callbacks.register(status(address, MODE_STATUS, direct()), Handler::Status);
        for cmd2 in [CONTROL_ON_FAN, CONTROL_OFF_FAN, CONTROL_OFF_ALL] {
            callbacks.register(control_ack(address, cmd2), Handler::Ack);
        }
        callbacks.register(
            extended_status(address, EXTENDED_THERMOSTAT),
            Handler::ExtendedStatus,
        );
    }

    fn decode_extended_status(&self, message: &Message) -> Option<ThermostatMode> {
        match message.user_data_slot(6)? & 0x0F {
            0 => Some(ThermostatMode::FanAuto),
            1 => Some(ThermostatMode::FanAlwaysOn),
            _ => None,
        }
    }
}

/// Cool set point: `0x71` status and `d7` of the extended block.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoolSetPoint2441V;

impl Flavor<f64> for CoolSetPoint2441V {
    fn register_messages(&self, address: Address, callbacks: &mut CallbackRegistry<Handler>) {
        callbacks.register(
            status(
                address,
                COOL_SET_POINT_STATUS,
                FlagsTemplate::new(Some(MessageType::Direct), Some(false)),
            ),
            Handler::Status,
        );
        callbacks.register(
            extended_status(address, EXTENDED_THERMOSTAT),
            Handler::ExtendedStatus,
        );
    }

    fn decode_extended_status(&self, message: &Message) -> Option<f64> {
        message.user_data_slot(7).map(from_half_units)
    }
}

/// Heat set point: `0x72` status and `d12` of the extended block.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeatSetPoint2441V;

impl Flavor<f64> for HeatSetPoint2441V {
    fn register_messages(&self, address: Address, callbacks: &mut CallbackRegistry<Handler>) {
        callbacks.register(
            status(
                address,
                HEAT_SET_POINT_STATUS,
                FlagsTemplate::new(Some(MessageType::Direct), Some(false)),
            ),
            Handler::Status,
        );
        callbacks.register(
            extended_status(address, EXTENDED_THERMOSTAT)
                .flags(FlagsTemplate::new(Some(MessageType::Direct), Some(true))),
            Handler::ExtendedStatus,
        );
    }

    fn decode_extended_status(&self, message: &Message) -> Option<f64> {
        message.user_data_slot(12).map(from_half_units)
    }
}
