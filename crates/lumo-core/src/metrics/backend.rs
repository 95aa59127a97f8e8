use std::sync::Arc;

/// Response-cache lookup outcome for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Entry found before TTL expiry.
    Hit,
    /// Entry absent or expired.
    Miss,
    /// Backing store unreachable; treated as a miss by the caller.
    Unavailable,
}

impl CacheOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
            CacheOutcome::Unavailable => "unavailable",
        }
    }
}

/// Backend metrics collection interface.
///
/// All label values are bounded: `model` is one of the four recognized
/// keys, `operation` is "caption" / "collective" / "flag".
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record a registry lookup that found a resident runtime.
    fn record_registry_hit(&self, model: &str);

    /// Record a registry lookup that triggered a load.
    fn record_registry_miss(&self, model: &str);

    /// Record an eviction of a resident runtime.
    fn record_registry_eviction(&self, model: &str);

    /// Record how long a factory load took.
    fn record_load_duration(&self, model: &str, duration_ms: u64);

    /// Record a response-cache lookup outcome.
    fn record_cache_lookup(&self, outcome: CacheOutcome);

    /// Record a completed inference call and its duration.
    fn record_inference(&self, model: &str, operation: &str, duration_ms: u64);
}

/// Shared handle to a metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
