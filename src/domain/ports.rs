use super::event::Event;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

/// Bounds applied to a token's bucket on every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    pub max_keep: usize,
    pub ttl: TimeDelta,
    /// Time of the write, from the store's clock.
    pub now: DateTime<Utc>,
}

impl Retention {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.now + self.ttl
    }
}

/// Storage backing the per-token event buckets.
///
/// `push` prepends, trims to `max_keep` and refreshes the expiry; the steps
/// need not be atomic. `range` returns up to `limit` events newest-first and
/// treats an expired bucket as empty.
#[async_trait]
pub trait EventBackend: Send + Sync {
    async fn push(&self, key: &str, event: &Event, retention: Retention) -> Result<()>;
    async fn range(&self, key: &str, limit: usize, now: DateTime<Utc>) -> Result<Vec<Event>>;
}

pub type EventBackendBox = Box<dyn EventBackend>;

/// Secondary destination for events the backend rejected.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn record(&self, event: &Event) -> Result<()>;
}

pub type EventSinkBox = Box<dyn EventSink>;

/// Source of the current time, injected so expiry can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
