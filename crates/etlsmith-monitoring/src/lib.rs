//! Logging setup for etlsmith binaries.

use serde::{Deserialize, Serialize};

pub mod logging;

pub use logging::{build_filter, init_logging, LogExt};

fn default_service_name() -> String {
    "etlsmith".to_string()
}

fn default_log_filter() -> String {
    "info,etlsmith=debug".to_string()
}

/// Configuration for initializing logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to the startup event
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Log level filter (e.g., "info,etlsmith=debug"); `RUST_LOG` takes precedence
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_filter: default_log_filter(),
            json: false,
        }
    }
}
