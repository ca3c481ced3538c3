use std::io::Cursor;

use plmprims_frame::{FrameConfig, MessageReader};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut bytes = Vec::new();
    for input in &args.hex {
        bytes.extend(parse_hex(input)?);
    }

    let config = FrameConfig {
        resync: !args.strict,
        ..FrameConfig::default()
    };
    let mut reader = MessageReader::with_config(Cursor::new(bytes), config);

    let mut decoded = 0usize;
    for frame in reader.by_ref() {
        let frame = frame.map_err(|err| frame_error("decode failed", err))?;
        print_frame(&frame, format);
        decoded += 1;
    }

    tracing::debug!(decoded, skipped = reader.skipped_bytes(), "decode finished");
    if decoded == 0 {
        return Err(CliError::new(DATA_INVALID, "no complete frame in input"));
    }
    Ok(SUCCESS)
}

/// Accepts `0x` prefixes and `' '`, `:`, `-`, `_` separators.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | ':' | '-' | '_'))
        .collect();
    hex::decode(&digits)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex {input:?}: {err}")))
}
