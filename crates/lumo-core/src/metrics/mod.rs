//! Metrics collection abstraction for the captioning core.
//!
//! Backends (prometheus, statsd, etc) implement [`MetricsBackend`] and are
//! injected into the registry, cache and dispatcher at construction time.
mod backend;
pub use backend::{CacheOutcome, MetricsBackend, MetricsHandle};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
