use std::sync::mpsc;

use plmprims_frame::{Address, MessageWriter};
use plmprims_state::{Controllable, State, Thermostat, ThermostatMode};

use crate::cmd::{EncodeArgs, ThermostatCommand};
use crate::exit::{frame_error, state_error, CliError, CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let address: Address = args
        .address
        .parse()
        .map_err(|err| CliError::usage(format!("{err}")))?;

    let (tx, rx) = mpsc::channel();
    let mut thermostat = Thermostat::th2441v(address, tx);
    let value = args.value.as_deref();

    let sent = match args.command {
        ThermostatCommand::Mode => thermostat.system_mode.set(parse_mode(value)?),
        ThermostatCommand::Fan => thermostat.fan_mode.set(parse_mode(value)?),
        ThermostatCommand::Cool => thermostat.cool_set_point.set(parse_set_point(value)?),
        ThermostatCommand::Heat => thermostat.heat_set_point.set(parse_set_point(value)?),
        ThermostatCommand::RefreshTemperature => thermostat.temperature.refresh(),
        ThermostatCommand::RefreshSetPoints => thermostat.cool_set_point.refresh(),
        ThermostatCommand::RefreshMode => thermostat.system_mode.refresh(),
    };
    sent.map_err(|err| state_error("encode failed", err))?;

    for message in rx.try_iter() {
        let mut writer = MessageWriter::new(Vec::new());
        writer
            .write_message(&message)
            .map_err(|err| frame_error("encode failed", err))?;
        print_encoded(&message, &writer.into_inner(), format);
    }

    Ok(SUCCESS)
}

fn parse_mode(value: Option<&str>) -> CliResult<ThermostatMode> {
    let value = value.ok_or_else(|| CliError::usage("a mode is required"))?;
    value
        .parse()
        .map_err(|err| CliError::usage(format!("{err}")))
}

fn parse_set_point(value: Option<&str>) -> CliResult<f64> {
    let value = value.ok_or_else(|| CliError::usage("a set point is required"))?;
    value
        .parse()
        .map_err(|_| CliError::usage(format!("invalid set point: {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::USAGE;

    #[test]
    fn parses_values() {
        assert_eq!(parse_mode(Some("cool")).unwrap(), ThermostatMode::Cool);
        assert_eq!(parse_set_point(Some("72.5")).unwrap(), 72.5);
        assert_eq!(parse_mode(None).unwrap_err().code, USAGE);
        assert_eq!(parse_set_point(Some("warm")).unwrap_err().code, USAGE);
    }
}
