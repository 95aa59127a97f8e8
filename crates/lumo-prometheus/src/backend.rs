use std::sync::Arc;

use prometheus::{CounterVec, HistogramVec, Opts, Registry, proto::MetricFamily};

use lumo_core::{CacheOutcome, MetricsBackend};

/// Prometheus metrics backend for the captioning service.
///
/// Implements [`MetricsBackend`] and exposes prometheus metrics that can be
/// scraped via HTTP endpoint.
///
/// ## Metrics
/// - `lumo_registry_lookups_total{model, outcome}` - Counter of registry lookups
/// - `lumo_registry_evictions_total{model}` - Counter of LRU evictions
/// - `lumo_model_load_seconds{model}` - Histogram of factory load time
/// - `lumo_cache_lookups_total{outcome}` - Counter of response-cache lookups
/// - `lumo_inference_seconds{model, operation}` - Histogram of inference time
///
/// ## Label cardinality
/// All labels are bounded (low cardinality):
/// - `model`: "blip", "blip2", "gemma", "intern_vlm"
/// - `outcome`: "hit", "miss", "unavailable"
/// - `operation`: "caption", "collective", "flag"
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry_lookups: CounterVec,
    registry_evictions: CounterVec,
    model_load: HistogramVec,
    cache_lookups: CounterVec,
    inference: HistogramVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Create a new prometheus metrics backend with custom registry.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let registry_lookups = CounterVec::new(
            Opts::new(
                "lumo_registry_lookups_total",
                "Total number of model registry lookups",
            ),
            &["model", "outcome"],
        )?;
        registry.register(Box::new(registry_lookups.clone()))?;

        let registry_evictions = CounterVec::new(
            Opts::new(
                "lumo_registry_evictions_total",
                "Total number of model runtime evictions",
            ),
            &["model"],
        )?;
        registry.register(Box::new(registry_evictions.clone()))?;

        let model_load = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "lumo_model_load_seconds",
                "Model runtime load duration in seconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
            &["model"],
        )?;
        registry.register(Box::new(model_load.clone()))?;

        let cache_lookups = CounterVec::new(
            Opts::new(
                "lumo_cache_lookups_total",
                "Total number of response-cache lookups",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(cache_lookups.clone()))?;

        let inference = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "lumo_inference_seconds",
                "Inference call duration in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]),
            &["model", "operation"],
        )?;
        registry.register(Box::new(inference.clone()))?;

        Ok(Self {
            registry_lookups,
            registry_evictions,
            model_load,
            cache_lookups,
            inference,
            registry,
        })
    }

    /// Create a new prometheus metrics backend with default registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metrics for exposition.
    ///
    /// Use this to implement a `/metrics` HTTP endpoint.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Get reference to underlying prometheus registry.
    ///
    /// Useful for registering custom metrics alongside service metrics.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_registry_hit(&self, model: &str) {
        self.registry_lookups.with_label_values(&[model, "hit"]).inc();
    }

    fn record_registry_miss(&self, model: &str) {
        self.registry_lookups
            .with_label_values(&[model, "miss"])
            .inc();
    }

    fn record_registry_eviction(&self, model: &str) {
        self.registry_evictions.with_label_values(&[model]).inc();
    }

    fn record_load_duration(&self, model: &str, duration_ms: u64) {
        self.model_load
            .with_label_values(&[model])
            .observe(duration_ms as f64 / 1000.0);
    }

    fn record_cache_lookup(&self, outcome: CacheOutcome) {
        self.cache_lookups
            .with_label_values(&[outcome.as_label()])
            .inc();
    }

    fn record_inference(&self, model: &str, operation: &str, duration_ms: u64) {
        self.inference
            .with_label_values(&[model, operation])
            .observe(duration_ms as f64 / 1000.0);
    }
}
