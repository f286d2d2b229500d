use crate::domain::event::{Event, EventSummary};
use crate::domain::ports::{Clock, EventBackendBox, EventSinkBox, Retention};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;

/// Bounds of every token's bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Events kept per token; older ones are dropped on write.
    pub max_keep: usize,
    /// How long a bucket lives after its last write.
    pub ttl: TimeDelta,
    /// Prefix of backend keys, `<prefix><token>`.
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_keep: 50,
            ttl: TimeDelta::seconds(86_400),
            key_prefix: "qris:events:".to_string(),
        }
    }
}

/// What happened to an appended event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Stored,
    /// The backend failed; the event went to the fallback sink instead.
    Fallback,
    /// The backend failed and there was no sink (or it failed too).
    Dropped,
}

/// Recent webhook events per token, bounded by count and age.
///
/// Backend failures never reach the caller: writes are logged and diverted to
/// the optional fallback sink, reads come back empty.
pub struct EventStore {
    backend: EventBackendBox,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
    fallback: Option<EventSinkBox>,
}

impl EventStore {
    pub fn new(backend: EventBackendBox, clock: Arc<dyn Clock>, config: StoreConfig) -> Self {
        let config = StoreConfig {
            max_keep: config.max_keep.max(1),
            ..config
        };
        Self {
            backend,
            clock,
            config,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, sink: EventSinkBox) -> Self {
        self.fallback = Some(sink);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn key(&self, token: &str) -> String {
        format!("{}{}", self.config.key_prefix, token)
    }

    /// Prepends `event` to its token's bucket, trims it and refreshes its expiry.
    pub async fn append(&self, event: &Event) -> AppendOutcome {
        let retention = Retention {
            max_keep: self.config.max_keep,
            ttl: self.config.ttl,
            now: self.clock.now(),
        };

        let err = match self.backend.push(&self.key(&event.token), event, retention).await {
            Ok(()) => return AppendOutcome::Stored,
            Err(e) => e,
        };
        tracing::warn!(
            error = %err,
            event_id = %event.event_id,
            "Failed to append event to store"
        );

        let Some(sink) = &self.fallback else {
            return AppendOutcome::Dropped;
        };
        match sink.record(event).await {
            Ok(()) => AppendOutcome::Fallback,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    event_id = %event.event_id,
                    "Failed to write event to fallback log"
                );
                AppendOutcome::Dropped
            }
        }
    }

    /// Up to `limit` most recent events of `token`, newest first.
    pub async fn recent(&self, token: &str, limit: usize) -> Vec<Event> {
        let limit = limit.min(self.config.max_keep);
        if limit == 0 {
            return Vec::new();
        }
        match self
            .backend
            .range(&self.key(token), limit, self.clock.now())
            .await
        {
            Ok(mut events) => {
                events.truncate(limit);
                events
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read events from store");
                Vec::new()
            }
        }
    }

    /// Like [`EventStore::recent`], projected to [`EventSummary`].
    pub async fn summary(&self, token: &str, limit: usize) -> Vec<EventSummary> {
        self.recent(token, limit)
            .await
            .iter()
            .map(EventSummary::from)
            .collect()
    }
}
