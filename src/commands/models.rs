use crate::payload::context::PageSnapshot;
use crate::payload::schema::{Dimensions, Level, UserIdentity};
use crate::utils::config::{Config, DEFAULT_ENVIRONMENT, DEFAULT_TIMEOUT};
use std::path::PathBuf;

/// What a capture command should report
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    Message {
        message: String,
        level: Level,
    },
    Error {
        error_type: String,
        message: String,
        stack_file: Option<PathBuf>,
    },
    Performance {
        name: String,
        value: f64,
        unitless: bool,
    },
}

/// Arguments shared by the capture commands
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct CaptureArgs {
    /// Ingest endpoint URL
    pub dsn: String,

    /// Environment tag
    pub environment: String,

    /// Release identifier (optional)
    pub release: Option<String>,

    /// Keep probability for errors and messages
    pub sample_rate: f64,

    /// Delivery deadline in milliseconds
    pub timeout_ms: u64,

    /// Page URL reported in the event context
    pub url: String,

    /// Current user id (optional)
    pub user_id: Option<String>,

    /// Event to send
    pub event: CaptureEvent,
}

impl Default for CaptureArgs {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            release: None,
            sample_rate: 1.0,
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            url: "cli://devpulse".to_string(),
            user_id: None,
            event: CaptureEvent::Message {
                message: String::new(),
                level: Level::Info,
            },
        }
    }
}

impl CaptureArgs {
    /// Client configuration for these arguments
    pub fn to_config(&self) -> Config {
        Config {
            dsn: Some(self.dsn.clone()),
            environment: self.environment.clone(),
            release: self.release.clone(),
            enabled: true,
            track_vitals: true,
            traces_sample_rate: self.sample_rate,
            timeout_ms: self.timeout_ms,
        }
    }

    /// Context reported for events sent from the command line
    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            url: self.url.clone(),
            user_agent: concat!("devpulse-cli/", env!("CARGO_PKG_VERSION")).to_string(),
            language: std::env::var("LANG").unwrap_or_default(),
            viewport: Dimensions::default(),
            screen: Dimensions::default(),
        }
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.user_id.as_ref().map(|id| UserIdentity {
            id: Some(id.clone()),
            ..Default::default()
        })
    }
}
