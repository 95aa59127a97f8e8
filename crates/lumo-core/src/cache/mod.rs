//! Content-addressed response caching with best-effort fault tolerance.
//!
//! [`ResponseCache`] wraps a [`CacheStore`] with key derivation and a
//! fail-open policy: store or (de)serialization errors degrade to cache
//! misses and are never surfaced to callers. Caching here is purely a
//! performance optimization.
mod store;
pub use store::{CacheStore, StoreError};

mod memory;
pub use memory::MemoryStore;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::warn;

use lumo_model::CACHE_KEY_VERSION;

use crate::metrics::{CacheOutcome, MetricsHandle, noop_metrics};

/// Response cache over a pluggable backing store.
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    metrics: MetricsHandle,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            metrics: noop_metrics(),
        }
    }

    /// Attach a metrics backend for lookup outcome counters.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// SHA-256 of raw bytes as a 64-char lowercase hex string.
    ///
    /// Identical byte content always yields the identical digest; this is
    /// the content address used for all cache keys.
    pub fn hash_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    /// Digest for an ordered collection: SHA-256 over the concatenation of
    /// the per-item digests.
    ///
    /// Order-sensitive by policy: the same items uploaded in a different
    /// order address a different cache entry.
    pub fn combined_hash(hashes: &[String]) -> String {
        Self::hash_bytes(hashes.concat().as_bytes())
    }

    /// Key for a single-image result: `{version}:img:{sha256}`.
    pub fn image_key(&self, sha: &str) -> String {
        format!("{CACHE_KEY_VERSION}:img:{sha}")
    }

    /// Key for a collective result: `{version}:collection:{sha256}`.
    pub fn collection_key(&self, sha: &str) -> String {
        format!("{CACHE_KEY_VERSION}:collection:{sha}")
    }

    /// Fetch and deserialize a cached value.
    ///
    /// Fail-open: store errors and malformed payloads are logged at warn
    /// and read as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "unable to retrieve cache key");
                self.metrics.record_cache_lookup(CacheOutcome::Unavailable);
                return None;
            }
        };
        let Some(raw) = raw else {
            self.metrics.record_cache_lookup(CacheOutcome::Miss);
            return None;
        };
        match serde_json::from_str(&raw) {
            Ok(value) => {
                self.metrics.record_cache_lookup(CacheOutcome::Hit);
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                self.metrics.record_cache_lookup(CacheOutcome::Miss);
                None
            }
        }
    }

    /// Serialize and store a value under `key` with the configured TTL.
    ///
    /// Fail-open: any failure is logged at warn and swallowed.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "unable to serialize cache value");
                return;
            }
        };
        if let Err(e) = self.store.set(key, raw, self.ttl).await {
            warn!(key, error = %e, "unable to store cache key");
        }
    }

    /// Drop every cached entry.
    ///
    /// Unlike reads and writes this propagates store errors: an operator
    /// asking for a reset must learn when it did not happen.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.clear().await
    }
}
