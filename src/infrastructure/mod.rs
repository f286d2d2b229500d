//! Infrastructure adapters: event backends, clocks and the fallback log.

pub mod clock;
pub mod fallback_log;
pub mod in_memory;
pub mod list_codec;
#[cfg(feature = "storage-redis")]
pub mod redis_store;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod unavailable;
