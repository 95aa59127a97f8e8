use std::fmt;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};
use tracing_subscriber::{fmt as fmt_layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LoggerConfig, LoggerFormat};
use crate::error::{LoggerError, LoggerResult};

/// Install the process-wide `tracing` subscriber.
///
/// Call once at daemon startup, before the first log statement. A second
/// call returns [`LoggerError::AlreadyInitialized`].
///
/// # Examples
/// ```rust
/// use lumo_observe::{LoggerConfig, init_logger};
///
/// init_logger(&LoggerConfig::default()).expect("logger init");
/// tracing::info!("captiond starting");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    let filter = cfg.level.to_env_filter();
    match cfg.format {
        LoggerFormat::Text => {
            let layer = fmt_layer::layer()
                .with_ansi(cfg.should_use_color())
                .with_target(cfg.with_targets)
                .with_timer(UtcTimestamp);
            install(tracing_subscriber::registry().with(filter).with(layer))
        }
        LoggerFormat::Json => {
            let layer = fmt_layer::layer()
                .json()
                .with_ansi(false)
                .with_target(cfg.with_targets)
                .with_timer(UtcTimestamp);
            install(tracing_subscriber::registry().with(filter).with(layer))
        }
    }
}

fn install<S>(subscriber: S) -> LoggerResult<()>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}

/// Stamps every line with RFC3339 UTC, independent of host timezone.
#[derive(Debug, Clone, Copy)]
struct UtcTimestamp;

impl FormatTime for UtcTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        match OffsetDateTime::now_utc().format(&Rfc3339) {
            Ok(ts) => write!(w, "{ts} "),
            Err(_) => write!(w, "<invalid-time> "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_now_formats_as_rfc3339() {
        let ts = OffsetDateTime::now_utc().format(&Rfc3339).unwrap();
        assert!(ts.contains('T'));
        assert!(ts.ends_with('Z') || ts.contains('+'));
    }

    #[test]
    fn json_config_builds_a_filter() {
        let cfg = LoggerConfig {
            format: LoggerFormat::Json,
            level: "lumo_core=debug,info".parse().unwrap(),
            ..Default::default()
        };
        let _ = cfg.level.to_env_filter();
    }
}
