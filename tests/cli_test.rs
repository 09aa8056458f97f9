//! End-to-end tests for the stream2buckets binary
//!
//! Each test runs the built binary in a scratch directory with a clean
//! environment, so no stray config file or STREAM2BUCKETS_* variable leaks in.

use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const BIN: &str = env!("CARGO_BIN_EXE_stream2buckets");

fn command(dir: &Path) -> Command {
    let mut cmd = Command::new(BIN);
    cmd.current_dir(dir)
        .env_clear()
        .env("STREAM2BUCKETS_MODE", "local")
        .env("STREAM2BUCKETS_JOB_START_MILLIS", "1709300000000");
    cmd
}

fn run_with_stdin(mut cmd: Command, input: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn binary");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait for binary")
}

fn stdout_lines(output: &Output) -> Vec<Value> {
    String::from_utf8(output.stdout.clone())
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = command(dir.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let help = String::from_utf8(output.stdout).unwrap();
    for sub in ["assign", "datagen", "bucket", "config"] {
        assert!(help.contains(sub), "missing {sub} in help");
    }
}

#[test]
fn assign_reads_stdin_with_default_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = command(dir.path());
    cmd.arg("assign");
    let output = run_with_stdin(
        cmd,
        "{\"event_time\":\"2024-03-01 13:45:00\",\"ticker\":\"AAPL\",\"price\":12.5}\n",
    );
    assert!(output.status.success(), "{:?}", output);

    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(
        lines[0]["bucket"],
        "app-kda-kafka-to-s3/job_start=1709300000000/ts=2024-03-01-13"
    );
    assert_eq!(lines[0]["record"]["ticker"], "AAPL");
}

#[test]
fn assign_reads_input_file_with_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("orders.jsonl");
    std::fs::write(
        &input,
        concat!(
            r#"{"product_id":1,"order_number":7,"quantity":2,"price":9.99,"buyer":"bob","order_time":"2024-03-01 09:15:00"}"#,
            "\n",
            r#"{"product_id":2,"order_number":8,"quantity":1,"price":0.25,"buyer":"erin","order_time":"2024-03-01 09:20:00"}"#,
            "\n",
        ),
    )
    .unwrap();

    let output = command(dir.path())
        .args(["assign", "--record-kind", "order", "--prefix", "orders/"])
        .args(["--partition-format", "yyyy/MM/dd/HH", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);

    // The cheap order falls under the default price threshold
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["bucket"], "orders/ts=2024/03/01/09");
}

#[test]
fn assign_fails_or_skips_malformed_records() {
    let input = concat!(
        r#"{"event_time":"yesterday","ticker":"AAPL","price":12.5}"#,
        "\n",
        r#"{"event_time":"2024-03-01T00:00","ticker":"TBV","price":3.0}"#,
        "\n",
    );

    let dir = tempfile::tempdir().unwrap();
    let mut cmd = command(dir.path());
    cmd.args(["assign", "--prefix", ""]);
    let failed = run_with_stdin(cmd, input);
    assert!(!failed.status.success());
    assert!(String::from_utf8_lossy(&failed.stderr).contains("E002"));

    let mut cmd = command(dir.path());
    cmd.args(["assign", "--prefix", "", "--on-error", "skip"]);
    let skipped = run_with_stdin(cmd, input);
    assert!(skipped.status.success(), "{:?}", skipped);
    let lines = stdout_lines(&skipped);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["bucket"], "ts=2024-03-01-00");
}

#[test]
fn invalid_partition_format_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = command(dir.path());
    cmd.args(["assign", "--partition-format", "yyyy-MM-dd VV"]);
    let output = run_with_stdin(cmd, "");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("E001"));
}

#[test]
fn bucket_encode_decode_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let encoded = command(dir.path())
        .args(["bucket", "encode", "app/ts=2024-03-01-13"])
        .output()
        .unwrap();
    assert!(encoded.status.success());
    let hex = String::from_utf8(encoded.stdout).unwrap();
    assert!(hex.starts_with("00000001"));

    let decoded = command(dir.path())
        .args(["bucket", "decode", hex.trim()])
        .output()
        .unwrap();
    assert!(decoded.status.success());
    assert_eq!(
        String::from_utf8(decoded.stdout).unwrap().trim_end(),
        "app/ts=2024-03-01-13"
    );
}

#[test]
fn datagen_output_feeds_assign() {
    let dir = tempfile::tempdir().unwrap();
    let generated = command(dir.path())
        .args(["datagen", "--count", "5", "--seed", "3"])
        .output()
        .unwrap();
    assert!(generated.status.success());
    let records = String::from_utf8(generated.stdout).unwrap();
    assert_eq!(records.lines().count(), 5);

    let mut cmd = command(dir.path());
    cmd.args(["assign", "--prefix", "", "--on-error", "skip"]);
    let output = run_with_stdin(cmd, &records);
    assert!(output.status.success(), "{:?}", output);
    for line in stdout_lines(&output) {
        assert!(line["bucket"].as_str().unwrap().starts_with("ts="));
    }
}

#[test]
fn config_reads_file_and_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stream2buckets.toml");
    std::fs::write(
        &path,
        "[sink]\noutput_path = \"/tmp/out\"\npartition_format = \"yyyy-MM-dd\"\n[filter]\nmin_price = 5.0\n",
    )
    .unwrap();

    let output = command(dir.path())
        .env("STREAM2BUCKETS_STREAM_NAME", "ticks")
        .arg("--config")
        .arg(&path)
        .arg("config")
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);

    let rendered: toml::Value = toml::from_str(&String::from_utf8(output.stdout).unwrap()).unwrap();
    assert_eq!(rendered["sink"]["partition_format"].as_str(), Some("yyyy-MM-dd"));
    assert_eq!(rendered["filter"]["min_price"].as_float(), Some(5.0));
    assert_eq!(rendered["source"]["stream_name"].as_str(), Some("ticks"));
}
