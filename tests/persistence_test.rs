#![cfg(feature = "storage-rocksdb")]

mod common;

use assert_cmd::{Command, cargo_bin};
use common::clean_env;
use serde_json::Value;
use tempfile::tempdir;

fn run(args: &[&str], db_path: &std::path::Path, stdin: Option<&str>) -> Value {
    let mut cmd = Command::new(cargo_bin!("qris-relay"));
    clean_env(&mut cmd).args(args).arg("--db-path").arg(db_path);

    if let Some(body) = stdin {
        cmd.write_stdin(body);
    }
    let output = cmd.output().expect("Failed to execute command");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_rocksdb_events_survive_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. Two separate processes ingest one webhook each
    run(
        &["ingest", "--token", "tok", "--content-type", "application/json"],
        &db_path,
        Some(r#"{"amount": 1000, "order_id": "A"}"#),
    );
    run(
        &["ingest", "--token", "tok", "--content-type", "application/json"],
        &db_path,
        Some(r#"{"amount": 2000, "order_id": "B"}"#),
    );

    // 2. A third process reads both back, newest first
    let events = run(&["events", "--token", "tok", "--summary"], &db_path, None);
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["order_id"], "B");
    assert_eq!(events[1]["amount"], 1000);
}

#[test]
fn test_rocksdb_respects_max_keep_across_runs() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    for n in 1..=4 {
        let body = format!(r#"{{"amount": {}}}"#, n * 1000);
        run(
            &["ingest", "--token", "tok", "--max-keep", "3"],
            &db_path,
            Some(&body),
        );
    }

    let events = run(&["events", "--token", "tok"], &db_path, None);
    let amounts: Vec<u64> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["amount"].as_u64().unwrap())
        .collect();
    assert_eq!(amounts, vec![4000, 3000, 2000]);
}
