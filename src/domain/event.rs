use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Width of the time bucket mixed into event ids. Identical payloads received
/// within the same bucket share an id.
pub const ID_BUCKET_SECS: i64 = 10;

const ORDER_FIELDS: [&str; 4] = ["order_id", "orderId", "order", "reference"];
const STATUS_FIELDS: [&str; 2] = ["status", "transaction_status"];

/// One inbound webhook call, as recorded in the event store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub token: String,
    pub event_id: String,
    pub received_at: DateTime<Utc>,
    pub method: String,
    pub source_ip: Option<String>,
    /// Amount found in the payload, in whole currency units.
    pub amount: Option<u64>,
    pub body: Value,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Derives the id of a payload received at `received_at`.
pub fn event_id(raw: &str, received_at: DateTime<Utc>) -> String {
    let bucket = received_at.timestamp().div_euclid(ID_BUCKET_SECS);
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hasher.update(b"|");
    hasher.update(bucket.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Compact view of an [`Event`] for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_id: String,
    pub received_at: DateTime<Utc>,
    pub amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub source_ip: Option<String>,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.event_id.clone(),
            received_at: event.received_at,
            amount: event.amount,
            order_id: first_scalar(&event.body, &ORDER_FIELDS),
            status: first_scalar(&event.body, &STATUS_FIELDS),
            source_ip: event.source_ip.clone(),
        }
    }
}

fn first_scalar(body: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match body.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
