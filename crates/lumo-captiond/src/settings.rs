use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

use lumo_observe::{LoggerFormat, LoggerLevel};

/// Daemon configuration sourced from the environment.
///
/// Every knob has a production-safe default; the service starts with no
/// environment at all.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Listen address for the HTTP server.
    pub bind: SocketAddr,
    /// Maximum number of model runtimes kept resident.
    pub model_capacity: usize,
    /// TTL for cached responses.
    pub cache_ttl: Duration,
    /// Expected `X-API-Key` for admin routes.
    pub api_key: Option<String>,
    /// Disables the admin guard; never enable in production.
    pub debug: bool,
    /// Log level filter expression.
    pub log_level: LoggerLevel,
    /// Log output format.
    pub log_format: LoggerFormat,
}

impl Settings {
    /// Read settings from process environment variables (`LUMO_*`).
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an explicit lookup function.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind = lookup("LUMO_BIND")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse::<SocketAddr>()
            .context("LUMO_BIND must be a socket address")?;

        let model_capacity = lookup("LUMO_MODEL_CAPACITY")
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("LUMO_MODEL_CAPACITY must be an integer")?
            .unwrap_or(1);

        let cache_ttl_secs = lookup("LUMO_CACHE_TTL_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("LUMO_CACHE_TTL_SECS must be an integer")?
            .unwrap_or(24 * 3600);

        let api_key = lookup("LUMO_API_KEY").filter(|v| !v.is_empty());

        let debug = lookup("LUMO_DEBUG")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let log_level = lookup("LUMO_LOG_LEVEL")
            .map(|v| LoggerLevel::new(v))
            .transpose()
            .context("LUMO_LOG_LEVEL must be a valid filter expression")?
            .unwrap_or_default();

        let log_format = lookup("LUMO_LOG_FORMAT")
            .map(|v| v.parse::<LoggerFormat>())
            .transpose()
            .context("LUMO_LOG_FORMAT must be text or json")?
            .unwrap_or_default();

        Ok(Self {
            bind,
            model_capacity,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            api_key,
            debug,
            log_level,
            log_format,
        })
    }
}
