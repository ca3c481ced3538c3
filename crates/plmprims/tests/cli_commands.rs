#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::process::{Command, Output};

const DEVICE: [u8; 3] = [0x1A, 0x2B, 0x3C];
const MODEM: [u8; 3] = [0x44, 0x55, 0x66];

fn plmprims(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_plmprims"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("plmprims should run")
}

fn standard_received(flags: u8, cmd1: u8, cmd2: u8) -> Vec<u8> {
    let mut frame = vec![0x02, 0x50];
    frame.extend(DEVICE);
    frame.extend(MODEM);
    frame.extend([flags, cmd1, cmd2]);
    frame
}

fn extended_received(cmd1: u8, cmd2: u8, slots: &[(usize, u8)]) -> Vec<u8> {
    let mut data = [0u8; 14];
    for (slot, value) in slots {
        data[slot - 1] = *value;
    }
    let mut frame = vec![0x02, 0x51];
    frame.extend(DEVICE);
    frame.extend(MODEM);
    frame.extend([0x1B, cmd1, cmd2]);
    frame.extend(data);
    frame
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[test]
fn codes_lists_the_protocol_table() {
    let output = plmprims(&["--format", "json", "codes"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("INSTEON Standard Message Received"));
    assert!(stdout.contains("\"code\":\"0x62\""));
    assert!(stdout.contains("\"response_size\":6"));
}

#[test]
fn decode_prints_parsed_message() {
    let frame = standard_received(0x20, 0x6E, 0x91);
    let output = plmprims(&["--format", "json", "decode", &to_hex(&frame)]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"address\":\"1A.2B.3C\""));
    assert!(stdout.contains("\"message_type\":\"DirectAck\""));
    assert!(stdout.contains("\"cmd1\":\"0x6e\""));
    assert!(stdout.contains("\"size\":11"));
}

#[test]
fn decode_resyncs_unless_strict() {
    let mut wire = vec![0xFF, 0x15];
    wire.extend(standard_received(0x00, 0x6F, 0x2A));
    let hex = to_hex(&wire);

    let output = plmprims(&["--format", "json", "decode", &hex]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 1);

    let output = plmprims(&["--format", "json", "decode", "--strict", &hex]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn decode_rejects_invalid_hex() {
    let output = plmprims(&["decode", "02zz"]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn encode_cool_set_point() {
    let output = plmprims(&["--format", "json", "encode", "1A.2B.3C", "cool", "72.5"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"cmd1\":\"0x6c\""));
    assert!(stdout.contains("\"cmd2\":\"0x91\""));
    assert!(stdout.contains("\"size\":22"));
    assert!(stdout.contains("\"bytes\":\"02621a2b3c106c91"));
}

#[test]
fn encode_refresh_is_a_standard_send() {
    let output = plmprims(&["--format", "json", "encode", "1a2b3c", "refresh-mode"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"bytes\":\"02621a2b3c006b02\""));
}

#[test]
fn encode_rejects_bad_intents() {
    let output = plmprims(&["encode", "1A.2B.3C", "heat", "200"]);
    assert_eq!(output.status.code(), Some(64));

    let output = plmprims(&["encode", "1A.2B.3C", "mode", "fan-auto"]);
    assert_eq!(output.status.code(), Some(64));

    let output = plmprims(&["encode", "not-an-address", "refresh-mode"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn monitor_reports_state_updates_from_capture() {
    let mut capture = tempfile::NamedTempFile::new().expect("temp file should be creatable");
    capture
        .write_all(&standard_received(0x0B, 0x6E, 0x91))
        .expect("capture should be writable");
    // IM configuration reply: not a device message.
    capture
        .write_all(&[0x02, 0x73, 0x00, 0x00, 0x00, 0x06])
        .expect("capture should be writable");
    capture
        .write_all(&extended_received(
            0x2E,
            0x02,
            &[(1, 0x01), (6, 0x31), (7, 0x96), (12, 0x88)],
        ))
        .expect("capture should be writable");
    capture.flush().expect("capture should flush");

    let path = capture.path().to_string_lossy().to_string();
    let output = plmprims(&["--format", "pretty", "monitor", "1A.2B.3C", "--input", &path]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "1A.2B.3C temperature=72.5",
            "1A.2B.3C systemMode=cool",
            "1A.2B.3C fanMode=fan-always-on",
            "1A.2B.3C coolSetPoint=75.0",
            "1A.2B.3C heatSetPoint=68.0",
        ]
    );
}

#[test]
fn monitor_stops_after_count() {
    let mut capture = tempfile::NamedTempFile::new().expect("temp file should be creatable");
    for cmd2 in [0x8C, 0x8E, 0x90] {
        capture
            .write_all(&standard_received(0x0B, 0x6E, cmd2))
            .expect("capture should be writable");
    }
    capture.flush().expect("capture should flush");

    let path = capture.path().to_string_lossy().to_string();
    let output = plmprims(&[
        "--format", "json", "monitor", "1A.2B.3C", "--input", &path, "--count", "2",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 2);
    assert!(stdout.contains("\"state\":\"temperature\""));
    assert!(stdout.contains("\"value\":\"71.0\""));
}

#[test]
fn monitor_missing_input_is_usage_error() {
    let output = plmprims(&["monitor", "1A.2B.3C", "--input", "/nonexistent/plm.bin"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_prints_name() {
    let output = plmprims(&["version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("plmprims "));
}

#[test]
fn version_extended_lists_only_recorded_provenance() {
    let output = plmprims(&["version", "--extended"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: plmprims"));
    assert!(stdout.lines().any(|line| line.starts_with("target: ")));
    assert!(!stdout.contains("unknown"));
}
