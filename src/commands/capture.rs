//! Capture command implementation.
//!
//! The capture commands:
//! 1. Validate arguments
//! 2. Initialize a client against the given DSN
//! 3. Build and hand off one event
//! 4. Wait (bounded) for the delivery to settle

use super::models::{CaptureArgs, CaptureEvent};
use crate::client::DevPulseClient;
use crate::payload::builder::{PerformanceOptions, Thrown};
use crate::payload::context::StaticContextProvider;
use crate::payload::schema::MetricUnit;
use crate::transport::ReqwestFetch;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde_json::Map;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Extra time allowed past the delivery deadline before giving up on flush
const FLUSH_GRACE: Duration = Duration::from_millis(250);

/// Execute a capture command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Capture command arguments
///
/// # Errors
/// * Invalid arguments
/// * Unreadable stack file
/// * HTTP client construction failure
///
/// Delivery failures are not errors: the event is best-effort.
pub async fn execute_capture(args: CaptureArgs) -> Result<()> {
    let start_time = Instant::now();
    validate_args(&args)?;

    info!("Sending event to: {}", args.dsn);

    let fetch = ReqwestFetch::new().context("Failed to create HTTP client")?;
    let context = StaticContextProvider::new(args.snapshot());
    let client = DevPulseClient::init(&args.to_config(), Arc::new(context), Arc::new(fetch));

    if !client.is_active() {
        anyhow::bail!("Client could not be initialized from the given options");
    }

    if let Some(user) = args.user() {
        client.set_user(user);
    }

    match &args.event {
        CaptureEvent::Message { message, level } => {
            client.capture_message(message, *level);
        }
        CaptureEvent::Error {
            error_type,
            message,
            stack_file,
        } => {
            let error = load_error(error_type, message, stack_file.as_deref())?;
            client.capture(&error, Map::new());
        }
        CaptureEvent::Performance {
            name,
            value,
            unitless,
        } => {
            // Direct send: performance events are not sampled
            let unit = if *unitless {
                MetricUnit::Unitless
            } else {
                MetricUnit::Milliseconds
            };
            let event = client.builder().build_from_performance(
                name,
                *value,
                PerformanceOptions { unit, user: None },
            );
            if let Some(transport) = client.transport() {
                transport.send(&event);
            }
        }
    }

    let budget = Duration::from_millis(args.timeout_ms) + FLUSH_GRACE;
    if !client.flush(budget).await {
        warn!("Delivery still pending after {}ms", budget.as_millis());
    }

    info!("Capture completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Build the thrown value, reading the stack from a file if given
///
/// **Private** - internal helper for execute_capture
fn load_error(
    error_type: &str,
    message: &str,
    stack_file: Option<&std::path::Path>,
) -> Result<Thrown> {
    let stack = match stack_file {
        Some(path) => {
            debug!("Reading stack trace from: {}", path.display());
            Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read stack file {}", path.display()))?,
            )
        }
        None => None,
    };

    Ok(Thrown::Error {
        name: Some(error_type.to_string()),
        message: Some(message.to_string()),
        stack,
    })
}

/// Validate capture arguments
///
/// **Public** - can be called before execute_capture for early validation
///
/// # Returns
/// Ok if arguments are valid, Err with message if not
pub fn validate_args(args: &CaptureArgs) -> Result<()> {
    if args.dsn.is_empty() {
        anyhow::bail!("DSN cannot be empty");
    }

    if !args.dsn.starts_with("http://") && !args.dsn.starts_with("https://") {
        anyhow::bail!("DSN must start with http:// or https://");
    }

    if !(0.0..=1.0).contains(&args.sample_rate) {
        anyhow::bail!("sample rate must be between 0 and 1");
    }

    if args.timeout_ms == 0 {
        anyhow::bail!("timeout must be greater than 0");
    }

    match &args.event {
        CaptureEvent::Message { message, .. } if message.is_empty() => {
            anyhow::bail!("message cannot be empty");
        }
        CaptureEvent::Error { error_type, .. } if error_type.is_empty() => {
            anyhow::bail!("error type cannot be empty");
        }
        CaptureEvent::Performance { name, .. } if name.is_empty() => {
            anyhow::bail!("metric name cannot be empty");
        }
        CaptureEvent::Performance { value, .. } if !value.is_finite() => {
            anyhow::bail!("metric value must be a finite number");
        }
        _ => {}
    }

    Ok(())
}
