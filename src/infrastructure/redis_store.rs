//! Redis-backed event buckets.
//!
//! Each token maps to one Redis list holding JSON-encoded events, newest at
//! the head. A write issues `LPUSH`, `LTRIM` and `EXPIRE` in one pipeline;
//! the pipeline is not transactional, so a failure part-way can leave a list
//! over-length or with a stale TTL until the next write. Expiry is left to
//! Redis, so the injected clock is not consulted here.

use super::list_codec::{decode_items, encode_item};
use crate::domain::event::Event;
use crate::domain::ports::{EventBackend, Retention};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, RedisError};
use std::fmt;
use std::time::Duration;

/// Bound on connecting and on each command, so an unreachable server fails
/// fast instead of stalling the caller.
const IO_TIMEOUT: Duration = Duration::from_secs(2);
const CONNECT_RETRIES: usize = 1;

/// Remote list store reached over a managed Redis connection.
#[derive(Clone)]
pub struct RedisEventBackend {
    connection: ConnectionManager,
}

impl fmt::Debug for RedisEventBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisEventBackend").finish_non_exhaustive()
    }
}

impl RedisEventBackend {
    /// Connects to Redis.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., "redis://127.0.0.1/")
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the connection fails.
    pub async fn connect(url: &str) -> std::result::Result<Self, RedisError> {
        let client = Client::open(url)?;
        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(IO_TIMEOUT)
            .set_response_timeout(IO_TIMEOUT)
            .set_number_of_retries(CONNECT_RETRIES);
        let connection = ConnectionManager::new_with_config(client, config).await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl EventBackend for RedisEventBackend {
    async fn push(&self, key: &str, event: &Event, retention: Retention) -> Result<()> {
        let item = encode_item(event)?;
        let stop = retention.max_keep.saturating_sub(1) as isize;
        let ttl_secs = retention.ttl.num_seconds().max(1);

        let mut conn = self.connection.clone();
        let _: () = redis::pipe()
            .lpush(key, item)
            .ignore()
            .ltrim(key, 0, stop)
            .ignore()
            .expire(key, ttl_secs)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn range(&self, key: &str, limit: usize, _now: DateTime<Utc>) -> Result<Vec<Event>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.connection.clone();
        let items: Vec<String> = conn.lrange(key, 0, limit as isize - 1).await?;
        Ok(decode_items(key, items))
    }
}
