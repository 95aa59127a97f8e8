pub mod cache;
pub mod dispatch;
pub mod error;
pub mod flag;
pub mod metrics;
pub mod registry;
pub mod runtime;
pub mod tag;

pub use cache::{CacheStore, MemoryStore, ResponseCache, StoreError};
pub use dispatch::Dispatcher;
pub use error::CoreError;
pub use flag::extract_flag;
pub use metrics::{CacheOutcome, MetricsBackend, MetricsHandle, NoOpMetrics, noop_metrics};
pub use registry::ModelRegistry;
pub use runtime::{Capabilities, ModelRuntime, RuntimeError, RuntimeFactory, RuntimeHandle};
pub use tag::{NoopTagger, TagExtractor, TaggerHandle};
