use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the broadcaster.
///
/// Every section is optional in the file; missing values fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub transport: TransportSettings,
    pub throttle: ThrottleSettings,
    pub logging: LoggingSettings,
}

/// Where snapshots are delivered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// The webhook that receives one POST per account per cycle.
    pub endpoint_url: String,
    /// Upper bound on a single delivery attempt, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            endpoint_url: "http://localhost:8080/webhook".to_string(),
            request_timeout_ms: 5_000,
        }
    }
}

/// Coalescing of change notifications.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThrottleSettings {
    /// Time between the first notification of a burst and the cycle that serves it.
    pub delay_ms: u64,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self { delay_ms: 250 }
    }
}

impl ThrottleSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, e.g. `"info"` or `"info,broadcaster=debug"`.
    pub filter: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: None,
        }
    }
}

impl Settings {
    /// Checks the values that deserialization alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.transport.endpoint_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "transport.endpoint_url must be an http(s) URL, got '{}'",
                self.transport.endpoint_url
            )));
        }
        if self.transport.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "transport.request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::ValidationError("logging.filter must not be empty".to_string()));
        }
        Ok(())
    }
}
