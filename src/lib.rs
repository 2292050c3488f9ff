//! DevPulse
//!
//! Client-side telemetry agent: observes errors, messages and
//! performance signals, normalizes each into a structured event and
//! delivers it to an ingest endpoint without ever failing the host.
//!
//! The pipeline has three pieces:
//! - [`parser`] turns raw stack text into structured frames
//! - [`payload`] builds the event envelope with ambient context
//! - [`transport`] hands events off with a hard deadline
//!
//! [`client::DevPulseClient`] ties them together behind configuration.
//!
//! ## Getting Started
//!
//! ```ignore
//! let client = DevPulseClient::init(
//!     &Config::with_dsn("https://ingest.example.com/api/KEY"),
//!     Arc::new(StaticContextProvider::default()),
//!     Arc::new(ReqwestFetch::new()?),
//! );
//! client.capture_message("deploy finished", Level::Info);
//! ```

pub mod client;
pub mod commands;
pub mod parser;
pub mod payload;
pub mod transport;
pub mod utils;

pub use client::{DevPulseClient, UncaughtError};
pub use payload::{Event, Level, Thrown, UserIdentity};
pub use transport::Transport;
pub use utils::Config;
