use crate::domain::event::Event;
use crate::domain::ports::{EventBackend, Retention};
use crate::error::{QrisError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding one serialized bucket per key.
pub const CF_BUCKETS: &str = "buckets";

#[derive(Debug, Serialize, Deserialize)]
struct StoredBucket {
    expires_at: DateTime<Utc>,
    events: Vec<Event>,
}

/// A persistent event backend using RocksDB.
///
/// Each key holds its whole bucket, newest event first, together with its
/// expiry. Writes are read-modify-write and not serialized against each
/// other, so concurrent appends to one key may lose an event.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBEventBackend {
    db: Arc<DB>,
}

impl RocksDBEventBackend {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_buckets = ColumnFamilyDescriptor::new(CF_BUCKETS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_buckets])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn load(&self, key: &str) -> Result<Option<StoredBucket>> {
        let cf = self.buckets_cf()?;
        match self.db.get_cf(cf, key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn buckets_cf(&self) -> Result<&ColumnFamily> {
        self.db.cf_handle(CF_BUCKETS).ok_or_else(|| {
            QrisError::InternalError(Box::new(std::io::Error::other(
                "Buckets column family not found",
            )))
        })
    }
}

#[async_trait]
impl EventBackend for RocksDBEventBackend {
    async fn push(&self, key: &str, event: &Event, retention: Retention) -> Result<()> {
        let mut events = match self.load(key)? {
            Some(bucket) if bucket.expires_at > retention.now => bucket.events,
            _ => Vec::new(),
        };
        events.insert(0, event.clone());
        events.truncate(retention.max_keep);

        let bucket = StoredBucket {
            expires_at: retention.expires_at(),
            events,
        };
        let value = serde_json::to_vec(&bucket)?;
        let cf = self.buckets_cf()?;
        self.db.put_cf(cf, key.as_bytes(), value)?;
        Ok(())
    }

    async fn range(&self, key: &str, limit: usize, now: DateTime<Utc>) -> Result<Vec<Event>> {
        match self.load(key)? {
            Some(bucket) if bucket.expires_at > now => {
                Ok(bucket.events.into_iter().take(limit).collect())
            }
            _ => Ok(Vec::new()),
        }
    }
}
