use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use plmprims_frame::{AckStatus, Frame, Message, ProtocolCode};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct CodeOutput {
    code: String,
    name: &'static str,
    size: usize,
    response_size: Option<usize>,
}

#[derive(Serialize)]
struct MessageOutput {
    address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    flags: String,
    message_type: String,
    extended: bool,
    hops_left: u8,
    max_hops: u8,
    cmd1: String,
    cmd2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ack: Option<&'static str>,
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    code: String,
    name: &'a str,
    size: usize,
    bytes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<MessageOutput>,
}

#[derive(Serialize)]
struct EncodedOutput {
    address: String,
    cmd1: String,
    cmd2: String,
    extended: bool,
    size: usize,
    bytes: String,
}

#[derive(Serialize)]
struct UpdateOutput<'a> {
    address: String,
    state: &'a str,
    value: String,
    timestamp: String,
}

pub fn print_codes<'a>(codes: impl Iterator<Item = &'a ProtocolCode>, format: OutputFormat) {
    let rows: Vec<CodeOutput> = codes
        .map(|code| CodeOutput {
            code: byte_hex(code.code),
            name: code.name,
            size: code.size,
            response_size: code.response_size,
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = new_table(vec!["CODE", "NAME", "SIZE", "RESPONSE"]);
            for row in &rows {
                table.add_row(vec![
                    row.code.clone(),
                    row.name.to_string(),
                    row.size.to_string(),
                    optional(row.response_size),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in &rows {
                println!(
                    "{} {} size={} response={}",
                    row.code,
                    row.name,
                    row.size,
                    optional(row.response_size)
                );
            }
        }
    }
}

pub fn print_frame(frame: &Frame, format: OutputFormat) {
    let message = frame.message().ok();
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                code: byte_hex(frame.code()),
                name: frame.shape.name,
                size: frame.wire_size(),
                bytes: hex::encode(&frame.bytes),
                message: message.as_ref().map(message_output),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["CODE", "NAME", "FROM", "TYPE", "CMD", "USER DATA"]);
            let (from, message_type, command, user_data) = match &message {
                Some(msg) => (
                    msg.address.to_string(),
                    format!("{:?}", msg.flags.message_type),
                    format!("{:02x} {:02x}", msg.cmd1, msg.cmd2),
                    user_data_hex(msg).unwrap_or_default(),
                ),
                None => Default::default(),
            };
            table.add_row(vec![
                byte_hex(frame.code()),
                frame.shape.name.to_string(),
                from,
                message_type,
                command,
                user_data,
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match &message {
            Some(msg) => println!("{} {msg}", byte_hex(frame.code())),
            None => println!(
                "{} {} bytes={}",
                byte_hex(frame.code()),
                frame.shape.name,
                hex::encode(&frame.bytes)
            ),
        },
        OutputFormat::Raw => print_raw(&frame.bytes),
    }
}

pub fn print_encoded(message: &Message, bytes: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&EncodedOutput {
            address: message.address.to_string(),
            cmd1: byte_hex(message.cmd1),
            cmd2: byte_hex(message.cmd2),
            extended: message.is_extended(),
            size: bytes.len(),
            bytes: hex::encode(bytes),
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["TO", "CMD", "EXTENDED", "BYTES"]);
            table.add_row(vec![
                message.address.to_string(),
                format!("{:02x} {:02x}", message.cmd1, message.cmd2),
                message.is_extended().to_string(),
                hex::encode(bytes),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{message} bytes={}", hex::encode(bytes)),
        OutputFormat::Raw => print_raw(bytes),
    }
}

pub fn print_update(address: &str, state: &str, value: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&UpdateOutput {
            address: address.to_string(),
            state,
            value: value.to_string(),
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table | OutputFormat::Pretty | OutputFormat::Raw => {
            println!("{address} {state}={value}");
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn message_output(message: &Message) -> MessageOutput {
    MessageOutput {
        address: message.address.to_string(),
        target: message.target.map(|target| target.to_string()),
        flags: byte_hex(message.flags.to_byte()),
        message_type: format!("{:?}", message.flags.message_type),
        extended: message.flags.extended,
        hops_left: message.flags.hops_left,
        max_hops: message.flags.max_hops,
        cmd1: byte_hex(message.cmd1),
        cmd2: byte_hex(message.cmd2),
        user_data: user_data_hex(message),
        ack: message.ack.map(ack_name),
    }
}

fn user_data_hex(message: &Message) -> Option<String> {
    message.user_data.map(|data| hex::encode(data.as_bytes()))
}

fn ack_name(ack: AckStatus) -> &'static str {
    match ack {
        AckStatus::Ack => "ack",
        AckStatus::Nak => "nak",
        AckStatus::Other(_) => "other",
    }
}

fn byte_hex(byte: u8) -> String {
    format!("0x{byte:02x}")
}

fn optional(value: Option<usize>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
