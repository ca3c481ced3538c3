use std::fmt;
use std::str::FromStr;

/// Thermostat system and fan modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThermostatMode {
    Off,
    Heat,
    Cool,
    Auto,
    FanAuto,
    FanAlwaysOn,
}

impl ThermostatMode {
    pub const ALL: [ThermostatMode; 6] = [
        Self::Off,
        Self::Heat,
        Self::Cool,
        Self::Auto,
        Self::FanAuto,
        Self::FanAlwaysOn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heat => "heat",
            Self::Cool => "cool",
            Self::Auto => "auto",
            Self::FanAuto => "fan-auto",
            Self::FanAlwaysOn => "fan-always-on",
        }
    }
}

impl From<ThermostatMode> for u8 {
    fn from(mode: ThermostatMode) -> Self {
        match mode {
            ThermostatMode::Off => 0x00,
            ThermostatMode::Heat => 0x01,
            ThermostatMode::Cool => 0x02,
            ThermostatMode::Auto => 0x03,
            ThermostatMode::FanAuto => 0x04,
            ThermostatMode::FanAlwaysOn => 0x08,
        }
    }
}

impl TryFrom<u8> for ThermostatMode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x00 => Ok(Self::Off),
            0x01 => Ok(Self::Heat),
            0x02 => Ok(Self::Cool),
            0x03 => Ok(Self::Auto),
            0x04 => Ok(Self::FanAuto),
            0x08 => Ok(Self::FanAlwaysOn),
            other => Err(other),
        }
    }
}

impl fmt::Display for ThermostatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown thermostat mode: {0:?}")]
pub struct ModeParseError(pub String);

impl FromStr for ThermostatMode {
    type Err = ModeParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_lowercase().replace('_', "-").as_str() {
            "off" => Ok(Self::Off),
            "heat" => Ok(Self::Heat),
            "cool" => Ok(Self::Cool),
            "auto" => Ok(Self::Auto),
            "fan-auto" => Ok(Self::FanAuto),
            "fan-always-on" | "fan-on" => Ok(Self::FanAlwaysOn),
            _ => Err(ModeParseError(input.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_values() {
        for mode in ThermostatMode::ALL {
            assert_eq!(ThermostatMode::try_from(u8::from(mode)), Ok(mode));
        }
        assert_eq!(u8::from(ThermostatMode::FanAlwaysOn), 0x08);
        assert_eq!(ThermostatMode::try_from(0x05), Err(0x05));
    }

    #[test]
    fn parse_names() {
        assert_eq!("HEAT".parse::<ThermostatMode>(), Ok(ThermostatMode::Heat));
        assert_eq!("fan_auto".parse::<ThermostatMode>(), Ok(ThermostatMode::FanAuto));
        assert_eq!("fan-on".parse::<ThermostatMode>(), Ok(ThermostatMode::FanAlwaysOn));
        assert!("boost".parse::<ThermostatMode>().is_err());
        assert_eq!(ThermostatMode::FanAlwaysOn.to_string(), "fan-always-on");
    }
}
