//! Configuration and constants for the telemetry client.

use super::error::ConfigError;
use log::warn;
use serde::Deserialize;
use std::time::Duration;

/// Default deadline for a single event delivery
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Environment tag used when the host does not provide one
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Platform tag stamped on every event
pub const PLATFORM: &str = "browser";

/// Content type declared on every delivery request
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Client configuration as supplied by the host.
///
/// Keys are camelCase so the same object a page would pass to `init`
/// deserializes directly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Ingest endpoint; any access key is embedded in the URL itself
    pub dsn: Option<String>,

    /// Environment tag attached to captured events
    pub environment: String,

    /// Release identifier attached to captured events
    pub release: Option<String>,

    /// Master switch for handlers and vitals
    pub enabled: bool,

    /// Whether performance signals are mapped into events
    pub track_vitals: bool,

    /// Probability in [0, 1] that a captured error/message is kept
    pub traces_sample_rate: f64,

    /// Delivery deadline in milliseconds
    pub timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: DEFAULT_ENVIRONMENT.to_string(),
            release: None,
            enabled: true,
            track_vitals: true,
            traces_sample_rate: 1.0,
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Configuration that passed validation; the DSN is guaranteed present.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidConfig {
    pub dsn: String,
    pub environment: String,
    pub release: Option<String>,
    pub enabled: bool,
    pub track_vitals: bool,
    pub traces_sample_rate: f64,
    pub timeout: Duration,
}

impl Config {
    /// Create a config for the given endpoint with every other option defaulted
    pub fn with_dsn(dsn: impl Into<String>) -> Self {
        Self {
            dsn: Some(dsn.into()),
            ..Default::default()
        }
    }

    /// Parse a config from a JSON object
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Validate and normalize the configuration
    ///
    /// **Public** - consumed by `DevPulseClient::init`
    ///
    /// # Errors
    /// * `ConfigError::MissingDsn` - DSN absent or blank
    /// * `ConfigError::InvalidDsn` - DSN is not an http(s) URL
    /// * `ConfigError::InvalidSampleRate` - sample rate is not a number
    ///
    /// Out-of-range sample rates are clamped into [0, 1] with a warning.
    pub fn validate(&self) -> Result<ValidConfig, ConfigError> {
        let dsn = match self.dsn.as_deref().map(str::trim) {
            Some(dsn) if !dsn.is_empty() => dsn.to_string(),
            _ => return Err(ConfigError::MissingDsn),
        };

        if !dsn.starts_with("http://") && !dsn.starts_with("https://") {
            return Err(ConfigError::InvalidDsn(dsn));
        }

        if self.traces_sample_rate.is_nan() {
            return Err(ConfigError::InvalidSampleRate(self.traces_sample_rate));
        }

        let traces_sample_rate = self.traces_sample_rate.clamp(0.0, 1.0);
        if traces_sample_rate != self.traces_sample_rate {
            warn!(
                "[DevPulse] tracesSampleRate {} out of range, using {}",
                self.traces_sample_rate, traces_sample_rate
            );
        }

        Ok(ValidConfig {
            dsn,
            environment: self.environment.clone(),
            release: self.release.clone(),
            enabled: self.enabled,
            track_vitals: self.track_vitals,
            traces_sample_rate,
            timeout: Duration::from_millis(self.timeout_ms),
        })
    }
}
