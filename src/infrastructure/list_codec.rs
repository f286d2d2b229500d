//! Encoding of events stored as list items in a remote store.
//!
//! Items are written as exactly one JSON serialization of an [`Event`] and
//! decoded exactly once. Anything else is a data-quality error that callers
//! log and skip.

use crate::domain::event::Event;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ItemDecodeError {
    /// The item is a JSON string wrapping another serialization.
    #[error("item is encoded more than once")]
    NestedEncoding,
    #[error("item is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),
    #[error("item is not an event: {0}")]
    NotAnEvent(serde_json::Error),
}

impl ItemDecodeError {
    pub fn kind(&self) -> &'static str {
        match self {
            ItemDecodeError::NestedEncoding => "nested-encoding",
            ItemDecodeError::InvalidJson(_) => "invalid-json",
            ItemDecodeError::NotAnEvent(_) => "not-an-event",
        }
    }
}

pub fn encode_item(event: &Event) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

pub fn decode_item(raw: &str) -> Result<Event, ItemDecodeError> {
    let value: Value = serde_json::from_str(raw).map_err(ItemDecodeError::InvalidJson)?;
    if value.is_string() {
        return Err(ItemDecodeError::NestedEncoding);
    }
    serde_json::from_value(value).map_err(ItemDecodeError::NotAnEvent)
}

/// Decodes a batch, skipping and logging items that fail.
pub fn decode_items(key: &str, items: Vec<String>) -> Vec<Event> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| match decode_item(&raw) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    index,
                    kind = e.kind(),
                    error = %e,
                    "Skipping undecodable event item"
                );
                None
            }
        })
        .collect()
}
