use crate::domain::event::Event;
use crate::domain::ports::{EventBackend, Retention};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Bucket {
    events: VecDeque<Event>,
    expires_at: DateTime<Utc>,
}

/// A thread-safe in-process event backend.
///
/// Uses `Arc<RwLock<HashMap<String, Bucket>>>` so clones share the same
/// buckets. Contents are lost on restart. Expired buckets are dropped on the
/// next write, and read as empty until then.
#[derive(Default, Clone)]
pub struct InMemoryEventBackend {
    buckets: Arc<RwLock<HashMap<String, Bucket>>>,
}

impl InMemoryEventBackend {
    /// Creates a new, empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buckets currently held, expired or not.
    pub async fn bucket_count(&self) -> usize {
        self.buckets.read().await.len()
    }
}

#[async_trait]
impl EventBackend for InMemoryEventBackend {
    async fn push(&self, key: &str, event: &Event, retention: Retention) -> Result<()> {
        let mut buckets = self.buckets.write().await;
        buckets.retain(|_, bucket| bucket.expires_at > retention.now);

        let bucket = buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            events: VecDeque::new(),
            expires_at: retention.expires_at(),
        });
        bucket.events.push_front(event.clone());
        bucket.events.truncate(retention.max_keep);
        bucket.expires_at = retention.expires_at();
        Ok(())
    }

    async fn range(&self, key: &str, limit: usize, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let buckets = self.buckets.read().await;
        Ok(match buckets.get(key) {
            Some(bucket) if bucket.expires_at > now => {
                bucket.events.iter().take(limit).cloned().collect()
            }
            _ => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn event(n: u64, at: DateTime<Utc>) -> Event {
        Event {
            token: "tok".to_string(),
            event_id: format!("evt-{}", n),
            received_at: at,
            method: "POST".to_string(),
            source_ip: None,
            amount: Some(n),
            body: json!({}),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
        }
    }

    fn retention(now: DateTime<Utc>) -> Retention {
        Retention {
            max_keep: 3,
            ttl: TimeDelta::seconds(60),
            now,
        }
    }

    #[tokio::test]
    async fn test_push_and_range_newest_first() {
        let backend = InMemoryEventBackend::new();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        for n in 1..=5 {
            backend.push("k", &event(n, now), retention(now)).await.unwrap();
        }

        let events = backend.range("k", 10, now).await.unwrap();
        let amounts: Vec<Option<u64>> = events.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![Some(5), Some(4), Some(3)]);

        let limited = backend.range("k", 1, now).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].event_id, "evt-5");
    }

    #[tokio::test]
    async fn test_unknown_key_is_empty() {
        let backend = InMemoryEventBackend::new();
        let now = Utc::now();
        assert!(backend.range("missing", 10, now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_bucket_reads_empty_and_is_purged_on_write() {
        let backend = InMemoryEventBackend::new();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        backend.push("old", &event(1, now), retention(now)).await.unwrap();

        let later = now + TimeDelta::seconds(61);
        assert!(backend.range("old", 10, later).await.unwrap().is_empty());
        assert_eq!(backend.bucket_count().await, 1);

        backend.push("new", &event(2, later), retention(later)).await.unwrap();
        assert_eq!(backend.bucket_count().await, 1);
        assert!(backend.range("old", 10, later).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_refreshes_expiry() {
        let backend = InMemoryEventBackend::new();
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let t1 = t0 + TimeDelta::seconds(50);
        let t2 = t0 + TimeDelta::seconds(100);

        backend.push("k", &event(1, t0), retention(t0)).await.unwrap();
        backend.push("k", &event(2, t1), retention(t1)).await.unwrap();

        let events = backend.range("k", 10, t2).await.unwrap();
        assert_eq!(events.len(), 2);
    }
}
