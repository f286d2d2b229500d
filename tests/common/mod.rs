#![allow(dead_code)]

use assert_cmd::Command;
use chrono::{DateTime, TimeZone, Utc};
use qris_relay::domain::event::Event;
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// A static DANA merchant QRIS string.
pub const STATIC_QRIS: &str = "00020101021126570011ID.DANA.WWW011893600915302259148102090225914810303UMI51440014ID.CO.QRIS.WWW0215ID10211049592540303UMI5204899953033605802ID5910Warung Ari6011Kab. Bekasi61051711063044A4B";

/// Environment variables the binary reads; cleared so the host cannot leak in.
const CLI_ENV: [&str; 9] = [
    "QRIS_STATIC",
    "REDIS_URL",
    "EVENTS_DB_PATH",
    "EVENTS_MAX_KEEP",
    "EVENTS_TTL_SECS",
    "EVENTS_KEY_PREFIX",
    "EVENTS_FALLBACK_LOG",
    "ALLOWED_IPS",
    "RUST_LOG",
];

pub fn clean_env(cmd: &mut Command) -> &mut Command {
    for var in CLI_ENV {
        cmd.env_remove(var);
    }
    cmd
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

pub fn event(token: &str, n: u64, body: Value) -> Event {
    Event {
        token: token.to_string(),
        event_id: format!("evt-{}", n),
        received_at: start(),
        method: "POST".to_string(),
        source_ip: Some("127.0.0.1".to_string()),
        amount: Some(n),
        body,
        query: BTreeMap::new(),
        headers: BTreeMap::new(),
    }
}

pub fn paid(token: &str, n: u64) -> Event {
    event(token, n, json!({"order_id": format!("INV-{}", n), "status": "PAID"}))
}
