use crate::metrics::backend::{CacheOutcome, MetricsBackend};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_registry_hit(&self, _: &str) {}

    #[inline(always)]
    fn record_registry_miss(&self, _: &str) {}

    #[inline(always)]
    fn record_registry_eviction(&self, _: &str) {}

    #[inline(always)]
    fn record_load_duration(&self, _: &str, _: u64) {}

    #[inline(always)]
    fn record_cache_lookup(&self, _: CacheOutcome) {}

    #[inline(always)]
    fn record_inference(&self, _: &str, _: &str, _: u64) {}
}
