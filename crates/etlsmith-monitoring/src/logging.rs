//! Structured logging using tracing.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::MonitoringConfig;

/// Filter from `RUST_LOG` when set, else from the configured directives
pub fn build_filter(config: &MonitoringConfig) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("Invalid log filter '{}'", config.log_filter))
}

/// Initialize structured logging.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_logging(config: &MonitoringConfig) -> anyhow::Result<()> {
    let env_filter = build_filter(config)?;

    // JSON logs for aggregation
    let json_layer = config.json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
    });
    // Compact logs for terminals; stdout stays free for flow output
    let text_layer = (!config.json).then(|| {
        fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .context("Failed to set global default subscriber")?;

    info!(
        service_name = %config.service_name,
        log_format = if config.json { "json" } else { "text" },
        "Logging initialized"
    );

    Ok(())
}

/// Trait to add log context to results
pub trait LogExt<T, E> {
    /// Log error with additional context before returning
    fn log_err(self, message: &str) -> Result<T, E>;

    /// Log success with additional context before returning
    fn log_ok(self, message: &str) -> Result<T, E>;
}

impl<T, E: std::fmt::Display> LogExt<T, E> for Result<T, E> {
    fn log_err(self, message: &str) -> Result<T, E> {
        if let Err(ref e) = self {
            tracing::error!("{}: {}", message, e);
        }
        self
    }

    fn log_ok(self, message: &str) -> Result<T, E> {
        if self.is_ok() {
            tracing::info!("{}", message);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected() {
        // Only meaningful when RUST_LOG does not override the configured filter
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = MonitoringConfig {
            log_filter: "info,etlsmith=loud".to_string(),
            ..Default::default()
        };
        assert!(build_filter(&config).is_err());
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(build_filter(&MonitoringConfig::default()).is_ok());
    }

    #[test]
    fn test_log_ext_passes_results_through() {
        let ok: Result<u8, String> = Ok(1);
        assert_eq!(ok.log_ok("done").log_err("failed"), Ok(1));

        let err: Result<u8, String> = Err("boom".to_string());
        assert_eq!(err.log_err("failed"), Err("boom".to_string()));
    }
}
