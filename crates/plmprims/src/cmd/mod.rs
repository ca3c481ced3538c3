use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod codes;
pub mod decode;
pub mod encode;
pub mod monitor;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the modem protocol codes.
    Codes(CodesArgs),
    /// Frame and parse hex-encoded modem bytes.
    Decode(DecodeArgs),
    /// Compose a thermostat command and print its wire bytes.
    Encode(EncodeArgs),
    /// Feed a capture or device file to a thermostat and print state updates.
    Monitor(MonitorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Codes(args) => codes::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Default)]
pub struct CodesArgs {}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex byte streams (e.g. 0250aabbcc445566206e91). Separators are ignored.
    #[arg(required = true, value_name = "HEX")]
    pub hex: Vec<String>,
    /// Fail on unsynchronized input instead of skipping bytes.
    #[arg(long)]
    pub strict: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThermostatCommand {
    /// Set the system mode (off, heat, cool, auto).
    Mode,
    /// Set the fan mode (fan-auto, fan-always-on).
    Fan,
    /// Set the cool set point in degrees Fahrenheit.
    Cool,
    /// Set the heat set point in degrees Fahrenheit.
    Heat,
    /// Request the temperature.
    RefreshTemperature,
    /// Request humidity and set points.
    RefreshSetPoints,
    /// Request system and fan mode.
    RefreshMode,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Device address (e.g. 1A.2B.3C).
    pub address: String,
    /// Command to compose.
    #[arg(value_enum)]
    pub command: ThermostatCommand,
    /// Mode name or set point, for commands that take one.
    pub value: Option<String>,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Thermostat address (e.g. 1A.2B.3C).
    pub address: String,
    /// Capture file or modem device to read.
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: PathBuf,
    /// Write status requests to the input before reading (device files only).
    #[arg(long)]
    pub refresh: bool,
    /// Print every decoded frame, not only state updates.
    #[arg(long)]
    pub frames: bool,
    /// Exit after N state updates.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
