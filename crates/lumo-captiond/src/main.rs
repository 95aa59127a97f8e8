mod runtime;
mod settings;
mod tagger;

use std::sync::Arc;

use axum::{Router, routing::get};
use prometheus::TextEncoder;
use tracing::info;

use lumo_api::{DispatcherAdapter, HttpApi};
use lumo_core::{
    Dispatcher, MemoryStore, MetricsHandle, ModelRegistry, ResponseCache, TaggerHandle,
};
use lumo_observe::{LoggerConfig, init_logger};
use lumo_prometheus::PrometheusMetrics;

use crate::runtime::DevRuntimeFactory;
use crate::settings::Settings;
use crate::tagger::KeywordTagger;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // 1) settings
    let settings = Settings::from_env()?;

    // 2) logger
    let cfg = LoggerConfig {
        level: settings.log_level.clone(),
        format: settings.log_format,
        ..Default::default()
    };
    init_logger(&cfg)?;
    info!(bind = %settings.bind, capacity = settings.model_capacity, "starting captiond");

    // 3) metrics
    let prometheus = PrometheusMetrics::new()?;
    let metrics: MetricsHandle = Arc::new(prometheus.clone());

    // 4) cache
    let store = Arc::new(MemoryStore::new());
    let cache = ResponseCache::new(store, settings.cache_ttl).with_metrics(metrics.clone());

    // 5) registry
    let registry = Arc::new(
        ModelRegistry::new(Arc::new(DevRuntimeFactory), settings.model_capacity)
            .with_metrics(metrics.clone()),
    );

    // 6) dispatcher
    let tagger: TaggerHandle = Arc::new(KeywordTagger);
    let dispatcher = Arc::new(Dispatcher::new(registry, cache, tagger).with_metrics(metrics));

    // 7) http api
    let adapter = Arc::new(DispatcherAdapter::new(dispatcher));
    let mut api = HttpApi::new(adapter).with_debug(settings.debug);
    if let Some(key) = &settings.api_key {
        api = api.with_admin_key(key.clone());
    }
    let router = api.router().merge(metrics_router(prometheus));

    // 8) serve
    let listener = tokio::net::TcpListener::bind(settings.bind).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("captiond stopped");
    Ok(())
}

/// Exposition endpoint for the prometheus scraper.
fn metrics_router(metrics: PrometheusMetrics) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let families = metrics.gather();
            async move {
                TextEncoder::new()
                    .encode_to_string(&families)
                    .unwrap_or_default()
            }
        }),
    )
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
