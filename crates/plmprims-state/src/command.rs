//! Thermostat command bytes.

/// Extended get/set; the reply carries the vendor status block.
pub const EXTENDED_GET_SET: u8 = 0x2E;
/// cmd2 of the extended temperature report.
pub const EXTENDED_TEMPERATURE: u8 = 0x00;
/// cmd2 of the extended mode and set point report.
pub const EXTENDED_THERMOSTAT: u8 = 0x02;

pub const GET_ZONE_INFORMATION: u8 = 0x6A;
/// cmd2 of a zone information request for the temperature.
pub const ZONE_TEMPERATURE: u8 = 0x00;
/// cmd2 of a zone information request for humidity and set points.
pub const ZONE_SET_POINTS: u8 = 0x20;

pub const CONTROL: u8 = 0x6B;
pub const CONTROL_GET_MODE: u8 = 0x02;
pub const CONTROL_ON_HEAT: u8 = 0x04;
pub const CONTROL_ON_COOL: u8 = 0x05;
pub const CONTROL_ON_AUTO: u8 = 0x06;
pub const CONTROL_ON_FAN: u8 = 0x07;
pub const CONTROL_OFF_FAN: u8 = 0x08;
pub const CONTROL_OFF_ALL: u8 = 0x09;
/// Auto acknowledgement sent by some firmware revisions.
pub const CONTROL_ON_AUTO_ALT: u8 = 0x0A;

pub const SET_COOL_SET_POINT: u8 = 0x6C;
pub const SET_HEAT_SET_POINT: u8 = 0x6D;

pub const TEMPERATURE_STATUS: u8 = 0x6E;
pub const HUMIDITY_STATUS: u8 = 0x6F;
pub const MODE_STATUS: u8 = 0x70;
pub const COOL_SET_POINT_STATUS: u8 = 0x71;
pub const HEAT_SET_POINT_STATUS: u8 = 0x72;
