//! Webhook request as handed over by the HTTP shell, and body decoding.

use crate::error::{QrisError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Upper bound on accepted webhook bodies.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Raw material of an inbound webhook call.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    /// Opaque bearer token partitioning the event store.
    pub token: String,
    pub method: String,
    /// Lower-cased header names.
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    /// Address of the directly connected peer.
    pub peer_addr: Option<String>,
    pub body: Vec<u8>,
}

impl WebhookRequest {
    pub fn new(
        token: impl Into<String>,
        method: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            token: token.into(),
            method: method.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_peer_addr(mut self, addr: impl Into<String>) -> Self {
        self.peer_addr = Some(addr.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// The first `X-Forwarded-For` hop, else the peer address.
    pub fn source_ip(&self) -> Option<String> {
        self.header("x-forwarded-for")
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .or_else(|| self.peer_addr.clone())
    }

    /// The body as text, rejecting oversized payloads.
    pub fn raw_text(&self) -> Result<String> {
        if self.body.len() > MAX_BODY_BYTES {
            return Err(QrisError::BodyTooLarge {
                size: self.body.len(),
                limit: MAX_BODY_BYTES,
            });
        }
        Ok(String::from_utf8_lossy(&self.body).into_owned())
    }
}

/// Decodes a body by media type. Never fails: unreadable bodies become `{}`.
pub fn decode_body(method: &str, content_type: Option<&str>, raw: &str) -> Value {
    if method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD") {
        return empty_object();
    }

    let media_type = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match media_type.as_str() {
        "application/json" if raw.trim().is_empty() => empty_object(),
        "application/x-www-form-urlencoded" => {
            let map: Map<String, Value> = url::form_urlencoded::parse(raw.as_bytes())
                .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
                .collect();
            Value::Object(map)
        }
        "text/plain" => {
            let mut map = Map::new();
            map.insert("text".to_string(), Value::String(raw.to_string()));
            Value::Object(map)
        }
        _ => serde_json::from_str(raw).unwrap_or_else(|_| empty_object()),
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Comma-separated list of addresses allowed to deliver webhooks.
/// An empty list allows everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpAllowList {
    entries: Vec<String>,
}

impl IpAllowList {
    pub fn parse(list: &str) -> Self {
        Self {
            entries: list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn allows(&self, ip: Option<&str>) -> bool {
        if self.entries.is_empty() {
            return true;
        }
        ip.is_some_and(|ip| self.entries.iter().any(|entry| entry == ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_json() {
        let body = decode_body("POST", Some("application/json; charset=utf-8"), r#"{"amount": 5}"#);
        assert_eq!(body, json!({"amount": 5}));
    }

    #[test]
    fn test_decode_invalid_or_empty_json() {
        assert_eq!(decode_body("POST", Some("application/json"), ""), json!({}));
        assert_eq!(decode_body("POST", Some("application/json"), "{oops"), json!({}));
    }

    #[test]
    fn test_decode_form() {
        let body = decode_body(
            "POST",
            Some("application/x-www-form-urlencoded"),
            "amount=10.000&message=Rp+10.000+masuk&note=a%26b",
        );
        assert_eq!(
            body,
            json!({"amount": "10.000", "message": "Rp 10.000 masuk", "note": "a&b"})
        );
    }

    #[test]
    fn test_decode_text() {
        let body = decode_body("POST", Some("TEXT/PLAIN"), "Rp 5.000 diterima");
        assert_eq!(body, json!({"text": "Rp 5.000 diterima"}));
    }

    #[test]
    fn test_decode_unknown_type_tries_json() {
        assert_eq!(decode_body("PUT", None, r#"[1,2]"#), json!([1, 2]));
        assert_eq!(decode_body("PUT", Some("application/xml"), "<a/>"), json!({}));
    }

    #[test]
    fn test_get_has_no_body() {
        assert_eq!(decode_body("GET", Some("application/json"), r#"{"a":1}"#), json!({}));
    }

    #[test]
    fn test_source_ip_prefers_forwarded_for() {
        let request = WebhookRequest::new("t", "POST", Vec::new())
            .with_peer_addr("127.0.0.1")
            .with_header("X-Forwarded-For", " 203.0.113.9 , 10.0.0.1");
        assert_eq!(request.source_ip().as_deref(), Some("203.0.113.9"));

        let request = WebhookRequest::new("t", "POST", Vec::new()).with_peer_addr("127.0.0.1");
        assert_eq!(request.source_ip().as_deref(), Some("127.0.0.1"));

        let request =
            WebhookRequest::new("t", "POST", Vec::new()).with_header("x-forwarded-for", "");
        assert_eq!(request.source_ip(), None);
    }

    #[test]
    fn test_body_size_limit() {
        let request = WebhookRequest::new("t", "POST", vec![b'a'; MAX_BODY_BYTES + 1]);
        assert!(matches!(
            request.raw_text(),
            Err(QrisError::BodyTooLarge { .. })
        ));

        let request = WebhookRequest::new("t", "POST", b"ok".to_vec());
        assert_eq!(request.raw_text().unwrap(), "ok");
    }

    #[test]
    fn test_ip_allow_list() {
        let open = IpAllowList::parse(" , ");
        assert!(open.is_empty());
        assert!(open.allows(None));

        let list = IpAllowList::parse("1.2.3.4, 5.6.7.8");
        assert!(list.allows(Some("5.6.7.8")));
        assert!(!list.allows(Some("9.9.9.9")));
        assert!(!list.allows(None));
    }
}
