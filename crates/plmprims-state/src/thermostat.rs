//! Thermostat state family.
//!
//! Six states share one device address. The variants fix the value domain,
//! the refresh request and the control commands; a [`Flavor`] supplies the
//! templates and the extended-status arithmetic of the device model.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use plmprims_frame::{Address, Message, UserData};

use crate::command::*;
use crate::error::{Result, StateError};
use crate::flavor::Flavor;
use crate::mode::ThermostatMode;
use crate::reply::{Reply, ReplyQueue};
use crate::state::{Controllable, Handler, MessageSink, State, StateCore};
use crate::th2441v;

/// Highest set point a single half-degree byte can carry.
pub const MAX_SET_POINT: f64 = 127.5;

/// Value carried in half-degree units.
pub fn from_half_units(byte: u8) -> f64 {
    f64::from(byte) / 2.0
}

/// Encode a set point as `round(value * 2)`.
pub fn to_half_units(value: f64) -> Result<u8> {
    if !(0.0..=MAX_SET_POINT).contains(&value) {
        return Err(StateError::SetPointOutOfRange(value));
    }
    Ok((value * 2.0).round() as u8)
}

/// System mode reported by a control acknowledgement.
pub fn system_mode_from_ack(cmd2: u8) -> Option<ThermostatMode> {
    match cmd2 {
        CONTROL_ON_HEAT => Some(ThermostatMode::Heat),
        CONTROL_ON_COOL => Some(ThermostatMode::Cool),
        CONTROL_ON_AUTO | CONTROL_ON_AUTO_ALT => Some(ThermostatMode::Auto),
        CONTROL_OFF_ALL => Some(ThermostatMode::Off),
        _ => None,
    }
}

/// Fan mode reported by a control acknowledgement.
pub fn fan_mode_from_ack(cmd2: u8) -> Option<ThermostatMode> {
    match cmd2 {
        CONTROL_ON_FAN => Some(ThermostatMode::FanAlwaysOn),
        CONTROL_OFF_FAN => Some(ThermostatMode::FanAuto),
        CONTROL_OFF_ALL => Some(ThermostatMode::Off),
        _ => None,
    }
}

fn build_core<V>(
    address: Address,
    name: &str,
    sink: Box<dyn MessageSink>,
    flavor: &dyn Flavor<V>,
) -> StateCore<V> {
    let mut core = StateCore::new(address, name, sink);
    flavor.register_messages(address, core.callbacks_mut());
    tracing::debug!(%address, state = name, templates = core.callbacks().len(), "state registered");
    core
}

fn extended_control(address: Address, cmd1: u8, cmd2: u8) -> Message {
    Message::extended_send(address, cmd1, cmd2, UserData::new())
}

/// Ambient temperature in degrees Fahrenheit.
pub struct Temperature {
    core: StateCore<f64>,
    flavor: Box<dyn Flavor<f64>>,
}

impl Temperature {
    pub const NAME: &'static str = "temperature";

    pub fn new(address: Address, sink: Box<dyn MessageSink>, flavor: Box<dyn Flavor<f64>>) -> Self {
        let core = build_core(address, Self::NAME, sink, flavor.as_ref());
        Self { core, flavor }
    }
}

impl State for Temperature {
    type Value = f64;

    fn core(&self) -> &StateCore<f64> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore<f64> {
        &mut self.core
    }

    fn decode(&self, handler: Handler, message: &Message) -> Option<f64> {
        match handler {
            Handler::Status => Some(from_half_units(message.cmd2)),
            Handler::ExtendedStatus => self.flavor.decode_extended_status(message),
            Handler::Ack => None,
        }
    }

    fn refresh(&mut self) -> Result<()> {
        let request =
            Message::standard_send(self.core.address(), GET_ZONE_INFORMATION, ZONE_TEMPERATURE);
        self.core.send(request, Handler::Status)
    }
}

/// Relative humidity in percent.
pub struct Humidity {
    core: StateCore<u8>,
    flavor: Box<dyn Flavor<u8>>,
}

impl Humidity {
    pub const NAME: &'static str = "humidity";

    pub fn new(address: Address, sink: Box<dyn MessageSink>, flavor: Box<dyn Flavor<u8>>) -> Self {
        let core = build_core(address, Self::NAME, sink, flavor.as_ref());
        Self { core, flavor }
    }
}

impl State for Humidity {
    type Value = u8;

    fn core(&self) -> &StateCore<u8> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore<u8> {
        &mut self.core
    }

    fn decode(&self, handler: Handler, message: &Message) -> Option<u8> {
        match handler {
            Handler::Status => Some(message.cmd2),
            Handler::ExtendedStatus => self.flavor.decode_extended_status(message),
            Handler::Ack => None,
        }
    }

    fn refresh(&mut self) -> Result<()> {
        let request =
            Message::standard_send(self.core.address(), GET_ZONE_INFORMATION, ZONE_SET_POINTS);
        self.core.send(request, Handler::Status)
    }
}

/// Heating/cooling system mode.
pub struct SystemMode {
    core: StateCore<ThermostatMode>,
    flavor: Box<dyn Flavor<ThermostatMode>>,
}

impl SystemMode {
    pub const NAME: &'static str = "systemMode";

    pub fn new(
        address: Address,
        sink: Box<dyn MessageSink>,
        flavor: Box<dyn Flavor<ThermostatMode>>,
    ) -> Self {
        let core = build_core(address, Self::NAME, sink, flavor.as_ref());
        Self { core, flavor }
    }

    /// Control byte for `mode`, if this state accepts it.
    pub fn command_for(mode: ThermostatMode) -> Option<u8> {
        match mode {
            ThermostatMode::Off => Some(CONTROL_OFF_ALL),
            ThermostatMode::Heat => Some(CONTROL_ON_HEAT),
            ThermostatMode::Cool => Some(CONTROL_ON_COOL),
            ThermostatMode::Auto => Some(CONTROL_ON_AUTO),
            ThermostatMode::FanAuto | ThermostatMode::FanAlwaysOn => None,
        }
    }
}

impl State for SystemMode {
    type Value = ThermostatMode;

    fn core(&self) -> &StateCore<ThermostatMode> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore<ThermostatMode> {
        &mut self.core
    }

    fn decode(&self, handler: Handler, message: &Message) -> Option<ThermostatMode> {
        match handler {
            Handler::Status => ThermostatMode::try_from(message.cmd2).ok(),
            Handler::Ack => system_mode_from_ack(message.cmd2),
            Handler::ExtendedStatus => self.flavor.decode_extended_status(message),
        }
    }

    fn refresh(&mut self) -> Result<()> {
        let request = Message::standard_send(self.core.address(), CONTROL, CONTROL_GET_MODE);
        self.core.send(request, Handler::Status)
    }
}

impl Controllable for SystemMode {
    type Intent = ThermostatMode;

    fn set(&mut self, intent: ThermostatMode) -> Result<()> {
        let cmd2 = Self::command_for(intent).ok_or(StateError::UnsupportedIntent {
            state: Self::NAME,
            intent,
        })?;
        let command = extended_control(self.core.address(), CONTROL, cmd2);
        self.core.send_command(command, Handler::Ack)
    }
}

/// Fan mode.
pub struct FanMode {
    core: StateCore<ThermostatMode>,
    flavor: Box<dyn Flavor<ThermostatMode>>,
}

impl FanMode {
    pub const NAME: &'static str = "fanMode";

    pub fn new(
        address: Address,
        sink: Box<dyn MessageSink>,
        flavor: Box<dyn Flavor<ThermostatMode>>,
    ) -> Self {
        let core = build_core(address, Self::NAME, sink, flavor.as_ref());
        Self { core, flavor }
    }

    pub fn command_for(mode: ThermostatMode) -> Option<u8> {
        match mode {
            ThermostatMode::FanAuto => Some(CONTROL_OFF_FAN),
            ThermostatMode::FanAlwaysOn => Some(CONTROL_ON_FAN),
            _ => None,
        }
    }
}

impl State for FanMode {
    type Value = ThermostatMode;

    fn core(&self) -> &StateCore<ThermostatMode> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore<ThermostatMode> {
        &mut self.core
    }

    fn decode(&self, handler: Handler, message: &Message) -> Option<ThermostatMode> {
        match handler {
            Handler::Status => ThermostatMode::try_from(message.cmd2).ok(),
            Handler::Ack => fan_mode_from_ack(message.cmd2),
            Handler::ExtendedStatus => self.flavor.decode_extended_status(message),
        }
    }

    fn refresh(&mut self) -> Result<()> {
        let request = Message::standard_send(self.core.address(), CONTROL, CONTROL_GET_MODE);
        self.core.send(request, Handler::Status)
    }
}

impl Controllable for FanMode {
    type Intent = ThermostatMode;

    fn set(&mut self, intent: ThermostatMode) -> Result<()> {
        let cmd2 = Self::command_for(intent).ok_or(StateError::UnsupportedIntent {
            state: Self::NAME,
            intent,
        })?;
        let command = extended_control(self.core.address(), CONTROL, cmd2);
        self.core.send_command(command, Handler::Ack)
    }
}

/// Cooling set point in degrees Fahrenheit.
pub struct CoolSetPoint {
    core: StateCore<f64>,
    flavor: Box<dyn Flavor<f64>>,
}

impl CoolSetPoint {
    pub const NAME: &'static str = "coolSetPoint";

    pub fn new(address: Address, sink: Box<dyn MessageSink>, flavor: Box<dyn Flavor<f64>>) -> Self {
        let core = build_core(address, Self::NAME, sink, flavor.as_ref());
        Self { core, flavor }
    }
}

impl State for CoolSetPoint {
    type Value = f64;

    fn core(&self) -> &StateCore<f64> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore<f64> {
        &mut self.core
    }

    fn decode(&self, handler: Handler, message: &Message) -> Option<f64> {
        match handler {
            Handler::Status | Handler::Ack => Some(from_half_units(message.cmd2)),
            Handler::ExtendedStatus => self.flavor.decode_extended_status(message),
        }
    }

    fn refresh(&mut self) -> Result<()> {
        let request =
            Message::standard_send(self.core.address(), GET_ZONE_INFORMATION, ZONE_SET_POINTS);
        self.core.send(request, Handler::Status)
    }
}

impl Controllable for CoolSetPoint {
    type Intent = f64;

    fn set(&mut self, intent: f64) -> Result<()> {
        let cmd2 = to_half_units(intent)?;
        let command = extended_control(self.core.address(), SET_COOL_SET_POINT, cmd2);
        self.core.send_command(command, Handler::Ack)
    }
}

/// Heating set point in degrees Fahrenheit.
pub struct HeatSetPoint {
    core: StateCore<f64>,
    flavor: Box<dyn Flavor<f64>>,
}

impl HeatSetPoint {
    pub const NAME: &'static str = "heatSetPoint";

    pub fn new(address: Address, sink: Box<dyn MessageSink>, flavor: Box<dyn Flavor<f64>>) -> Self {
        let core = build_core(address, Self::NAME, sink, flavor.as_ref());
        Self { core, flavor }
    }
}

impl State for HeatSetPoint {
    type Value = f64;

    fn core(&self) -> &StateCore<f64> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore<f64> {
        &mut self.core
    }

    fn decode(&self, handler: Handler, message: &Message) -> Option<f64> {
        match handler {
            Handler::Status | Handler::Ack => Some(from_half_units(message.cmd2)),
            Handler::ExtendedStatus => self.flavor.decode_extended_status(message),
        }
    }

    fn refresh(&mut self) -> Result<()> {
        let request =
            Message::standard_send(self.core.address(), GET_ZONE_INFORMATION, ZONE_SET_POINTS);
        self.core.send(request, Handler::Status)
    }
}

impl Controllable for HeatSetPoint {
    type Intent = f64;

    fn set(&mut self, intent: f64) -> Result<()> {
        let cmd2 = to_half_units(intent)?;
        let command = extended_control(self.core.address(), SET_HEAT_SET_POINT, cmd2);
        self.core.send_command(command, Handler::Ack)
    }
}

/// A value reported by any state of a [`Thermostat`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThermostatValue {
    Temperature(f64),
    Humidity(u8),
    Mode(ThermostatMode),
    SetPoint(f64),
}

impl fmt::Display for ThermostatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature(value) | Self::SetPoint(value) => write!(f, "{value:.1}"),
            Self::Humidity(value) => write!(f, "{value}"),
            Self::Mode(mode) => write!(f, "{mode}"),
        }
    }
}

/// Offer `message` to `state`, with the reply claimed for the device when
/// it belongs to this state.
fn offer<S: State>(state: &mut S, message: &Message, reply: Option<Reply>) -> usize {
    let owner = state.core().owner();
    let reply = reply
        .filter(|reply| reply.owner == owner)
        .map(|reply| reply.handler);
    state.apply(message, reply)
}

/// All states of one thermostat.
///
/// The states share one [`ReplyQueue`]: the device answers requests in the
/// order they were sent, and each answer resolves a single request.
pub struct Thermostat {
    address: Address,
    replies: ReplyQueue,
    pub temperature: Temperature,
    pub humidity: Humidity,
    pub system_mode: SystemMode,
    pub fan_mode: FanMode,
    pub cool_set_point: CoolSetPoint,
    pub heat_set_point: HeatSetPoint,
}

impl Thermostat {
    /// Venstar 2441V thermostat. Each state gets its own clone of `sink`.
    pub fn th2441v<S>(address: Address, sink: S) -> Self
    where
        S: MessageSink + Clone + 'static,
    {
        let mut thermostat = Self {
            address,
            replies: ReplyQueue::new(),
            temperature: Temperature::new(
                address,
                Box::new(sink.clone()),
                Box::new(th2441v::Temperature2441V),
            ),
            humidity: Humidity::new(
                address,
                Box::new(sink.clone()),
                Box::new(th2441v::Humidity2441V),
            ),
            system_mode: SystemMode::new(
                address,
                Box::new(sink.clone()),
                Box::new(th2441v::SystemMode2441V),
            ),
            fan_mode: FanMode::new(
                address,
                Box::new(sink.clone()),
                Box::new(th2441v::FanMode2441V),
            ),
            cool_set_point: CoolSetPoint::new(
                address,
                Box::new(sink.clone()),
                Box::new(th2441v::CoolSetPoint2441V),
            ),
            heat_set_point: HeatSetPoint::new(
                address,
                Box::new(sink),
                Box::new(th2441v::HeatSetPoint2441V),
            ),
        };
        thermostat.share_replies();
        thermostat
    }

    fn share_replies(&mut self) {
        let replies = &self.replies;
        self.temperature.core_mut().share_replies(replies);
        self.humidity.core_mut().share_replies(replies);
        self.system_mode.core_mut().share_replies(replies);
        self.fan_mode.core_mut().share_replies(replies);
        self.cool_set_point.core_mut().share_replies(replies);
        self.heat_set_point.core_mut().share_replies(replies);
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Requests of any state still waiting for their reply.
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    /// Forward `message` to every state. Returns the number of notifications.
    ///
    /// A frame answering a pending request is decoded as that reply by the
    /// requesting state only; the other states see it through their standing
    /// templates.
    pub fn receive(&mut self, message: &Message) -> usize {
        if message.address != self.address {
            return 0;
        }
        let reply = self.replies.claim(message);
        offer(&mut self.temperature, message, reply)
            + offer(&mut self.humidity, message, reply)
            + offer(&mut self.system_mode, message, reply)
            + offer(&mut self.fan_mode, message, reply)
            + offer(&mut self.cool_set_point, message, reply)
            + offer(&mut self.heat_set_point, message, reply)
    }

    /// Send the status request of every state.
    pub fn refresh(&mut self) -> Result<()> {
        self.temperature.refresh()?;
        self.humidity.refresh()?;
        self.system_mode.refresh()?;
        self.fan_mode.refresh()?;
        self.cool_set_point.refresh()?;
        self.heat_set_point.refresh()
    }

    /// Subscribe one callback to all six states.
    pub fn subscribe_all<F>(&mut self, subscriber: F)
    where
        F: FnMut(&Address, &str, ThermostatValue) + 'static,
    {
        let shared = Rc::new(RefCell::new(subscriber));

        let s = Rc::clone(&shared);
        self.temperature.subscribe(move |address, name, value: &f64| {
            (&mut *s.borrow_mut())(address, name, ThermostatValue::Temperature(*value))
        });
        let s = Rc::clone(&shared);
        self.humidity.subscribe(move |address, name, value: &u8| {
            (&mut *s.borrow_mut())(address, name, ThermostatValue::Humidity(*value))
        });
        let s = Rc::clone(&shared);
        self.system_mode
            .subscribe(move |address, name, value: &ThermostatMode| {
                (&mut *s.borrow_mut())(address, name, ThermostatValue::Mode(*value))
            });
        let s = Rc::clone(&shared);
        self.fan_mode.subscribe(move |address, name, value: &ThermostatMode| {
            (&mut *s.borrow_mut())(address, name, ThermostatValue::Mode(*value))
        });
        let s = Rc::clone(&shared);
        self.cool_set_point.subscribe(move |address, name, value: &f64| {
            (&mut *s.borrow_mut())(address, name, ThermostatValue::SetPoint(*value))
        });
        self.heat_set_point.subscribe(move |address, name, value: &f64| {
            (&mut *shared.borrow_mut())(address, name, ThermostatValue::SetPoint(*value))
        });
    }
}
