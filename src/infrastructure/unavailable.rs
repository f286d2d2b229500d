use crate::domain::event::Event;
use crate::domain::ports::{EventBackend, Retention};
use crate::error::{QrisError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Stands in for a backend that could not be reached at startup.
///
/// Every call fails with [`QrisError::StoreUnavailable`], so the event store
/// degrades the same way it does when a live backend goes away: writes go to
/// the fallback log, reads come back empty.
#[derive(Debug, Clone)]
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> QrisError {
        QrisError::StoreUnavailable(self.reason.clone())
    }
}

#[async_trait]
impl EventBackend for UnavailableBackend {
    async fn push(&self, _key: &str, _event: &Event, _retention: Retention) -> Result<()> {
        Err(self.error())
    }

    async fn range(&self, _key: &str, _limit: usize, _now: DateTime<Utc>) -> Result<Vec<Event>> {
        Err(self.error())
    }
}
