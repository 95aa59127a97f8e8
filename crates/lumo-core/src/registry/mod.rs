//! Bounded, lazily-populated registry of resident model runtimes.
//!
//! Holds at most `capacity` runtimes, loads on demand via a
//! [`RuntimeFactory`], and evicts from the least-recently-used end when
//! over capacity. The only shared mutable state in the service lives here,
//! behind a single lock held just long enough for LRU bookkeeping.
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use lumo_model::ModelKey;

use crate::error::CoreError;
use crate::metrics::{MetricsHandle, noop_metrics};
use crate::runtime::{RuntimeFactory, RuntimeHandle};

/// Thread-safe LRU cache of loaded runtimes.
///
/// Recency order is kept in a small vector (most-recently-used at the
/// back); with a closed set of at most four keys a vector beats a linked
/// structure. Handles are reference-counted: eviction removes the
/// registry's strong reference and releases device resources, but a handle
/// borrowed by an in-flight request stays valid until its last user drops
/// it.
pub struct ModelRegistry {
    factory: Arc<dyn RuntimeFactory>,
    resident: Mutex<Vec<(ModelKey, Arc<RuntimeHandle>)>>,
    capacity: usize,
    metrics: MetricsHandle,
}

impl ModelRegistry {
    /// Create a registry over `factory` keeping at most `capacity`
    /// runtimes resident. A capacity of zero is clamped to one.
    pub fn new(factory: Arc<dyn RuntimeFactory>, capacity: usize) -> Self {
        Self {
            factory,
            resident: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
            metrics: noop_metrics(),
        }
    }

    /// Attach a metrics backend for hit/miss/eviction counters.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Maximum number of resident runtimes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Currently resident keys, least-recently-used first.
    pub async fn resident_keys(&self) -> Vec<ModelKey> {
        self.resident.lock().await.iter().map(|(k, _)| *k).collect()
    }

    /// Resolve a runtime for `key`, loading it if not resident.
    ///
    /// A hit refreshes the LRU position and returns the existing handle;
    /// lookup and reorder happen in one critical section. On a miss the
    /// (slow) factory load runs outside the lock so unrelated lookups are
    /// not blocked; insertion and any consequent eviction are then
    /// serialized under the same lock. If two tasks race a load for the
    /// same key, the loser's handle is released and the resident one wins.
    ///
    /// Postcondition: resident count <= capacity.
    pub async fn acquire(&self, key: ModelKey) -> Result<Arc<RuntimeHandle>, CoreError> {
        {
            let mut resident = self.resident.lock().await;
            if let Some(handle) = Self::touch(&mut resident, key) {
                self.metrics.record_registry_hit(key.as_str());
                debug!(model = %key, "registry hit");
                return Ok(handle);
            }
        }

        self.metrics.record_registry_miss(key.as_str());
        info!(model = %key, "loading model runtime");
        let started = Instant::now();
        let handle = Arc::new(self.factory.load(key).await?);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.metrics.record_load_duration(key.as_str(), elapsed_ms);
        info!(model = %key, device = handle.device(), elapsed_ms, "model runtime loaded");

        let mut resident = self.resident.lock().await;
        if let Some(existing) = Self::touch(&mut resident, key) {
            // Lost a racing load; keep the resident handle and let the
            // duplicate release its device resources.
            debug!(model = %key, "discarding duplicate runtime from racing load");
            handle.release();
            return Ok(existing);
        }

        resident.push((key, Arc::clone(&handle)));
        while resident.len() > self.capacity {
            let (evicted_key, evicted) = resident.remove(0);
            self.metrics.record_registry_eviction(evicted_key.as_str());
            warn!(model = %evicted_key, "evicting least-recently-used model runtime");
            // Best-effort device teardown; the handle itself stays alive
            // for any in-flight borrower.
            evicted.release();
        }

        Ok(handle)
    }

    /// Hit path: move `key` to the most-recently-used position and return
    /// its handle.
    fn touch(
        resident: &mut Vec<(ModelKey, Arc<RuntimeHandle>)>,
        key: ModelKey,
    ) -> Option<Arc<RuntimeHandle>> {
        let idx = resident.iter().position(|(k, _)| *k == key)?;
        let entry = resident.remove(idx);
        let handle = Arc::clone(&entry.1);
        resident.push(entry);
        Some(handle)
    }
}
