mod common;

use assert_cmd::{Command, cargo_bin};
use common::{STATIC_QRIS, clean_env};
use predicates::prelude::*;
use qris_relay::domain::checksum;
use serde_json::Value;

fn cli() -> Command {
    let mut cmd = Command::new(cargo_bin!());
    clean_env(&mut cmd);
    cmd
}

#[test]
fn test_dynamic_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let output = cli()
        .args(["dynamic", "--payload", STATIC_QRIS])
        .args(["--base-amount", "10000", "--unique-code", "338"])
        .output()?;

    assert!(output.status.success());
    let result: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(result["total"], 10338);
    assert_eq!(result["base_amount"], 10000);
    assert_eq!(result["unique_code"], 338);

    let payload = result["payload"].as_str().unwrap();
    assert!(payload.contains("5303360540810338.00"));
    assert!(checksum::verify(payload));

    Ok(())
}

#[test]
fn test_dynamic_reads_static_payload_from_env() {
    cli()
        .env("QRIS_STATIC", STATIC_QRIS)
        .args(["dynamic", "--amount", "5000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("54075000.00"))
        .stdout(predicate::str::contains("base_amount").not());
}

#[test]
fn test_dynamic_renders_qr_png_on_request() {
    cli()
        .args(["dynamic", "--payload", STATIC_QRIS, "--amount", "5000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("qr_png_data_url").not());

    cli()
        .args(["dynamic", "--payload", STATIC_QRIS, "--amount", "5000", "--qr"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "\"qr_png_data_url\": \"data:image/png;base64,iVBORw0KGgo",
        ));
}

#[test]
fn test_dynamic_rejects_ambiguous_amount() {
    cli()
        .args(["dynamic", "--payload", STATIC_QRIS])
        .args(["--amount", "5000", "--base-amount", "5000", "--unique-code", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not both"));
}

#[test]
fn test_dynamic_rejects_unique_code_out_of_range() {
    cli()
        .args(["dynamic", "--payload", STATIC_QRIS])
        .args(["--base-amount", "5000", "--unique-code", "1000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unique_code"));
}

#[test]
fn test_dynamic_requires_payload() {
    cli()
        .args(["dynamic", "--amount", "5000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("static payload"));
}

#[test]
fn test_ingest_from_stdin() -> Result<(), Box<dyn std::error::Error>> {
    let output = cli()
        .args(["ingest", "--token", "merchant-1", "--content-type", "application/json"])
        .args(["--header", "X-Forwarded-For: 203.0.113.7"])
        .args(["--header", "Authorization: Bearer hunter2"])
        .write_stdin(r#"{"amount": 15000, "order_id": "A-1"}"#)
        .output()?;

    assert!(output.status.success());
    let event: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(event["token"], "merchant-1");
    assert_eq!(event["amount"], 15000);
    assert_eq!(event["source_ip"], "203.0.113.7");
    assert_eq!(event["body"]["order_id"], "A-1");
    assert!(event["headers"].get("authorization").is_none());
    assert_eq!(event["event_id"].as_str().unwrap().len(), 64);

    Ok(())
}

#[test]
fn test_ingest_from_file() {
    cli()
        .args(["ingest", "--token", "merchant-1", "tests/fixtures/webhook.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"amount\": 25338"))
        .stdout(predicate::str::contains("INV-2025-0042"));
}

#[test]
fn test_ingest_respects_allow_list() {
    cli()
        .args(["ingest", "--token", "merchant-1", "--ip", "198.51.100.4"])
        .args(["--allowed-ips", "10.0.0.1, 10.0.0.2"])
        .write_stdin("{}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("198.51.100.4"));
}

#[test]
fn test_events_unknown_token_is_empty() {
    cli()
        .args(["events", "--token", "nobody", "--summary"])
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}
