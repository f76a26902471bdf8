//! Configuration for the etlsmith CLI
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the working directory.

use etlsmith_core::CoreError;
use etlsmith_monitoring::MonitoringConfig;
use etlsmith_nifi::{Credentials, NifiClientConfig};
use etlsmith_planner::LlmConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::{info, warn};

/// Application configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the NiFi REST API
    #[serde(default = "default_nifi_url")]
    pub nifi_url: String,

    #[serde(default)]
    pub nifi_username: Option<String>,

    #[serde(default)]
    pub nifi_password: Option<String>,

    /// Pre-issued bearer token; takes precedence over username/password
    #[serde(default)]
    pub nifi_token: Option<String>,

    /// Accept self-signed certificates
    #[serde(default)]
    pub nifi_insecure_tls: bool,

    #[serde(default = "default_timeout_secs")]
    pub nifi_timeout_secs: u64,

    /// NAR version used for catalog bundles
    #[serde(default = "default_bundle_version")]
    pub nifi_bundle_version: String,

    #[serde(default = "default_llm_base_url")]
    pub llm_base_url: String,

    #[serde(default)]
    pub llm_api_key: Option<String>,

    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    #[serde(default = "default_llm_temperature")]
    pub llm_temperature: f32,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub log_json: bool,
}

fn default_nifi_url() -> String {
    "http://localhost:8080/nifi-api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_bundle_version() -> String {
    "1.25.0".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_temperature() -> f32 {
    0.1
}

fn default_log_filter() -> String {
    "info,etlsmith=debug".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nifi_url: default_nifi_url(),
            nifi_username: None,
            nifi_password: None,
            nifi_token: None,
            nifi_insecure_tls: false,
            nifi_timeout_secs: default_timeout_secs(),
            nifi_bundle_version: default_bundle_version(),
            llm_base_url: default_llm_base_url(),
            llm_api_key: None,
            llm_model: default_llm_model(),
            llm_temperature: default_llm_temperature(),
            log_filter: default_log_filter(),
            log_json: false,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |secret: &Option<String>| secret.as_ref().map(|_| "***");
        f.debug_struct("AppConfig")
            .field("nifi_url", &self.nifi_url)
            .field("nifi_username", &self.nifi_username)
            .field("nifi_password", &redacted(&self.nifi_password))
            .field("nifi_token", &redacted(&self.nifi_token))
            .field("nifi_insecure_tls", &self.nifi_insecure_tls)
            .field("nifi_timeout_secs", &self.nifi_timeout_secs)
            .field("nifi_bundle_version", &self.nifi_bundle_version)
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_api_key", &redacted(&self.llm_api_key))
            .field("llm_model", &self.llm_model)
            .field("llm_temperature", &self.llm_temperature)
            .field("log_filter", &self.log_filter)
            .field("log_json", &self.log_json)
            .finish()
    }
}

fn parse_or_warn<T: FromStr>(name: &str, raw: &str, current: T) -> T {
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!("Invalid {} value: {}", name, raw);
            current
        }
    }
}

fn parse_flag(name: &str, raw: &str, current: bool) -> bool {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            warn!("Invalid {} value: {}", name, raw);
            current
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl AppConfig {
    /// Load configuration from the environment, reading `.env` first if present
    pub fn load() -> Result<Self, CoreError> {
        if dotenv::dotenv().is_ok() {
            info!("Loaded environment from .env");
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        // Start with defaults
        let mut config = Self::default();

        if let Some(url) = lookup("NIFI_URL") {
            config.nifi_url = url;
        }
        config.nifi_username = lookup("NIFI_USERNAME").and_then(non_empty);
        config.nifi_password = lookup("NIFI_PASSWORD").and_then(non_empty);
        config.nifi_token = lookup("NIFI_TOKEN").and_then(non_empty);
        if let Some(raw) = lookup("NIFI_INSECURE_TLS") {
            config.nifi_insecure_tls = parse_flag("NIFI_INSECURE_TLS", &raw, config.nifi_insecure_tls);
        }
        if let Some(raw) = lookup("NIFI_TIMEOUT_SECS") {
            config.nifi_timeout_secs = parse_or_warn("NIFI_TIMEOUT_SECS", &raw, config.nifi_timeout_secs);
        }
        if let Some(version) = lookup("NIFI_BUNDLE_VERSION").and_then(non_empty) {
            config.nifi_bundle_version = version;
        }

        if let Some(url) = lookup("LLM_BASE_URL").and_then(non_empty) {
            config.llm_base_url = url;
        }
        config.llm_api_key = lookup("LLM_API_KEY").and_then(non_empty);
        if let Some(model) = lookup("LLM_MODEL").and_then(non_empty) {
            config.llm_model = model;
        }
        if let Some(raw) = lookup("LLM_TEMPERATURE") {
            config.llm_temperature = parse_or_warn("LLM_TEMPERATURE", &raw, config.llm_temperature);
        }

        if let Some(filter) = lookup("LOG_FILTER").and_then(non_empty) {
            config.log_filter = filter;
        }
        if let Some(raw) = lookup("LOG_JSON") {
            config.log_json = parse_flag("LOG_JSON", &raw, config.log_json);
        }

        // Validate required fields
        if config.nifi_url.trim().is_empty() {
            return Err(CoreError::ConfigurationError("NIFI_URL must not be empty".to_string()));
        }
        if !config.nifi_url.starts_with("http://") && !config.nifi_url.starts_with("https://") {
            return Err(CoreError::ConfigurationError(format!(
                "NIFI_URL must be an http(s) URL, got '{}'",
                config.nifi_url
            )));
        }
        if config.nifi_timeout_secs == 0 {
            return Err(CoreError::ConfigurationError(
                "NIFI_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        // Add warnings for missing optional fields
        if config.nifi_username.is_some() != config.nifi_password.is_some() && config.nifi_token.is_none() {
            warn!("Only one of NIFI_USERNAME and NIFI_PASSWORD is set - connecting without credentials");
        }
        if config.llm_api_key.is_none() {
            warn!("No LLM_API_KEY provided - only --plan-file is usable");
        }

        Ok(config)
    }

    pub fn nifi_client_config(&self) -> NifiClientConfig {
        let credentials = match (&self.nifi_token, &self.nifi_username, &self.nifi_password) {
            (Some(token), _, _) => Credentials::Token(token.clone()),
            (None, Some(username), Some(password)) => Credentials::Password {
                username: username.clone(),
                password: password.clone(),
            },
            _ => Credentials::None,
        };
        NifiClientConfig {
            base_url: self.nifi_url.clone(),
            timeout_secs: self.nifi_timeout_secs,
            accept_invalid_certs: self.nifi_insecure_tls,
            credentials,
        }
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            base_url: self.llm_base_url.clone(),
            api_key: self.llm_api_key.clone(),
            model: self.llm_model.clone(),
            temperature: self.llm_temperature,
            ..Default::default()
        }
    }

    pub fn monitoring_config(&self) -> MonitoringConfig {
        MonitoringConfig {
            service_name: "etlsmith".to_string(),
            log_filter: self.log_filter.clone(),
            json: self.log_json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, CoreError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = load(&[]).unwrap();
        assert_eq!(config.nifi_url, "http://localhost:8080/nifi-api");
        assert_eq!(config.nifi_timeout_secs, 30);
        assert_eq!(config.nifi_bundle_version, "1.25.0");
        assert_eq!(config.llm_model, "gpt-4o-mini");
        assert_eq!(config.log_filter, "info,etlsmith=debug");
        assert!(!config.log_json);
        assert!(matches!(config.nifi_client_config().credentials, Credentials::None));
    }

    #[test]
    fn test_environment_overrides() {
        let config = load(&[
            ("NIFI_URL", "https://nifi.internal:8443/nifi-api"),
            ("NIFI_INSECURE_TLS", "yes"),
            ("NIFI_TIMEOUT_SECS", "90"),
            ("LLM_TEMPERATURE", "0.4"),
            ("LOG_JSON", "1"),
        ])
        .unwrap();

        let nifi = config.nifi_client_config();
        assert_eq!(nifi.base_url, "https://nifi.internal:8443/nifi-api");
        assert!(nifi.accept_invalid_certs);
        assert_eq!(nifi.timeout_secs, 90);
        assert_eq!(config.llm_config().temperature, 0.4);
        assert!(config.monitoring_config().json);
    }

    #[test]
    fn test_invalid_numbers_keep_defaults() {
        let config = load(&[("NIFI_TIMEOUT_SECS", "soon"), ("LLM_TEMPERATURE", "warm")]).unwrap();
        assert_eq!(config.nifi_timeout_secs, 30);
        assert_eq!(config.llm_temperature, 0.1);
    }

    #[test]
    fn test_token_takes_precedence_over_password() {
        let config = load(&[
            ("NIFI_USERNAME", "admin"),
            ("NIFI_PASSWORD", "secret"),
            ("NIFI_TOKEN", "eyJ"),
        ])
        .unwrap();
        assert!(matches!(config.nifi_client_config().credentials, Credentials::Token(t) if t == "eyJ"));

        let config = load(&[("NIFI_USERNAME", "admin"), ("NIFI_PASSWORD", "secret")]).unwrap();
        assert!(matches!(
            config.nifi_client_config().credentials,
            Credentials::Password { .. }
        ));
    }

    #[test]
    fn test_blank_secrets_are_unset() {
        let config = load(&[("LLM_API_KEY", "  "), ("NIFI_TOKEN", "")]).unwrap();
        assert!(config.llm_api_key.is_none());
        assert!(config.nifi_token.is_none());
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(matches!(
            load(&[("NIFI_URL", "localhost:8080")]),
            Err(CoreError::ConfigurationError(_))
        ));
        assert!(load(&[("NIFI_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[("LLM_API_KEY", "sk-live"), ("NIFI_PASSWORD", "hunter2")]).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-live"));
        assert!(!rendered.contains("hunter2"));
    }
}
