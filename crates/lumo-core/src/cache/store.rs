use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Backing key-value store for the response cache.
///
/// TTL expiry is the store's responsibility: an entry older than its TTL
/// must read back as absent. Implementations cover in-process maps as well
/// as external stores reached over the network.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the value stored under `key`, if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key` with the given time-to-live.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    /// Remove every entry unconditionally.
    async fn clear(&self) -> Result<(), StoreError>;
}
