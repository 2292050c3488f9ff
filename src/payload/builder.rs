//! Payload builder.
//!
//! Assembles the uniform event envelope from heterogeneous inputs: thrown
//! errors, free-text messages and performance measurements. Builders never
//! fail; malformed input degrades through the defaulting rules below.

use super::context::{ContextProvider, Session};
use super::schema::{
    Event, EventKind, ExceptionInfo, Level, MetricUnit, PerformanceBlock, UserIdentity,
};
use crate::parser::parse_stack;
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use std::fmt;
use std::sync::Arc;

/// Name used when a thrown value carries none
const DEFAULT_ERROR_NAME: &str = "Error";

/// A thrown value as observed by the host
#[derive(Debug, Clone, PartialEq)]
pub enum Thrown {
    /// Error-shaped value; any field may be missing
    Error {
        name: Option<String>,
        message: Option<String>,
        stack: Option<String>,
    },
    /// Anything else that was thrown or rejected (string, number, ...)
    Value(serde_json::Value),
}

impl Thrown {
    /// Plain `Error` with a message and no stack
    pub fn error(message: impl Into<String>) -> Self {
        Thrown::Error {
            name: Some(DEFAULT_ERROR_NAME.to_string()),
            message: Some(message.into()),
            stack: None,
        }
    }

    /// Error-shaped value with a stack trace
    pub fn with_stack(
        name: impl Into<String>,
        message: impl Into<String>,
        stack: impl Into<String>,
    ) -> Self {
        Thrown::Error {
            name: Some(name.into()),
            message: Some(message.into()),
            stack: Some(stack.into()),
        }
    }

    /// Wrap a Rust error; the name is the error's short type name
    pub fn from_std_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        Thrown::Error {
            name: Some(short_type_name(std::any::type_name::<E>())),
            message: Some(error.to_string()),
            stack: None,
        }
    }

    /// Interpret an arbitrary JSON value
    ///
    /// Objects are read field by field (`name`, `message`, `stack`); other
    /// values are kept as-is.
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => {
                let field = |key: &str| map.get(key).and_then(|v| v.as_str()).map(str::to_string);
                Thrown::Error {
                    name: field("name"),
                    message: field("message"),
                    stack: field("stack"),
                }
            }
            other => Thrown::Value(other),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Thrown::Error { .. })
    }

    /// Coerce into an error, using the string form as the message
    pub fn into_error(self) -> Self {
        match self {
            error @ Thrown::Error { .. } => error,
            value => Thrown::error(value.to_string()),
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            Thrown::Error { name, .. } => name.as_deref(),
            Thrown::Value(_) => None,
        }
    }

    fn message(&self) -> Option<&str> {
        match self {
            Thrown::Error { message, .. } => message.as_deref(),
            Thrown::Value(_) => None,
        }
    }

    fn stack(&self) -> Option<&str> {
        match self {
            Thrown::Error { stack, .. } => stack.as_deref(),
            Thrown::Value(_) => None,
        }
    }
}

/// String conversion of a thrown value
impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thrown::Error { name, message, .. } => {
                let name = name.as_deref().unwrap_or(DEFAULT_ERROR_NAME);
                match message.as_deref() {
                    Some(message) if !message.is_empty() => write!(f, "{}: {}", name, message),
                    _ => f.write_str(name),
                }
            }
            Thrown::Value(serde_json::Value::String(text)) => f.write_str(text),
            Thrown::Value(value) => write!(f, "{}", value),
        }
    }
}

/// `my_crate::io::ReadError` -> `ReadError`
fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Per-call overrides for error and message events
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// User to attach instead of the session's current user
    pub user: Option<UserIdentity>,
}

/// Per-call options for performance events
#[derive(Debug, Clone, Default)]
pub struct PerformanceOptions {
    /// Defaults to milliseconds
    pub unit: MetricUnit,
    pub user: Option<UserIdentity>,
}

impl PerformanceOptions {
    pub fn unitless() -> Self {
        Self {
            unit: MetricUnit::Unitless,
            user: None,
        }
    }
}

/// Builds events with ambient context injected
pub struct PayloadBuilder {
    context: Arc<dyn ContextProvider>,
    session: Arc<Session>,
    clock: fn() -> DateTime<Utc>,
}

impl PayloadBuilder {
    pub fn new(context: Arc<dyn ContextProvider>, session: Arc<Session>) -> Self {
        Self {
            context,
            session,
            clock: Utc::now,
        }
    }

    /// Replace the timestamp source
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Build an error event from a thrown value
    ///
    /// **Public** - entry point for exceptions and rejections
    ///
    /// # Arguments
    /// * `error` - Thrown value; missing name becomes `"Error"`, missing
    ///   message becomes the value's string form
    /// * `options` - Optional user override
    pub fn build_from_error(&self, error: &Thrown, options: BuildOptions) -> Event {
        let exception = ExceptionInfo {
            exception_type: error.name().unwrap_or(DEFAULT_ERROR_NAME).to_string(),
            message: error
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string()),
            stacktrace: parse_stack(error.stack()),
        };

        debug!(
            "Built error event: {} ({} frames)",
            exception.exception_type,
            exception.stacktrace.len()
        );

        self.envelope(Level::Error, EventKind::Error(exception), options.user)
    }

    /// Build a message event; `level` defaults to info
    pub fn build_from_message(
        &self,
        message: &str,
        level: impl Into<Option<Level>>,
        options: BuildOptions,
    ) -> Event {
        let level = level.into().unwrap_or_default();
        self.envelope(level, EventKind::Message(message.to_string()), options.user)
    }

    /// Build a performance event
    ///
    /// **Public** - entry point for web vitals and timings
    ///
    /// # Arguments
    /// * `name` - Metric name (e.g. `LCP`, `CLS`)
    /// * `value` - Raw measurement
    /// * `options` - Unit (default ms) and optional user override
    ///
    /// # Returns
    /// Info-level event whose message reads `Performance: <name> = <value><unit>`
    pub fn build_from_performance(
        &self,
        name: &str,
        value: f64,
        options: PerformanceOptions,
    ) -> Event {
        let unit = options.unit;
        let display_value = display_value(value, unit);
        let message = format!(
            "Performance: {} = {}{}",
            name,
            format_metric(display_value),
            unit.as_str()
        );

        let kind = EventKind::Performance {
            message,
            performance: PerformanceBlock {
                name: name.to_string(),
                value: display_value,
                unit,
            },
        };

        self.envelope(Level::Info, kind, options.user)
    }

    /// Common envelope; context and timestamp captured now
    ///
    /// **Private** - shared by the three builders
    fn envelope(&self, level: Level, kind: EventKind, user: Option<UserIdentity>) -> Event {
        let snapshot = self.context.snapshot();
        Event {
            level,
            timestamp: (self.clock)().to_rfc3339_opts(SecondsFormat::Millis, true),
            context: snapshot.to_context(),
            request: snapshot.to_request(),
            user: user.or_else(|| self.session.current_user()),
            kind,
            extra: serde_json::Map::new(),
            session: None,
        }
    }
}

/// Unit-dependent rounding
///
/// Timings round to whole milliseconds; unitless scores keep 4 decimals.
pub fn display_value(value: f64, unit: MetricUnit) -> f64 {
    let rounded = match unit {
        MetricUnit::Milliseconds => value.round(),
        MetricUnit::Unitless => round_decimals_4(value),
    };
    // -0 prints as "-0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Round the exact binary value to 4 decimals, ties away from zero
///
/// Scaling by 10^4 first would round twice: 0.00035 is stored just below
/// the midpoint and must come out as 0.0003.
fn round_decimals_4(value: f64) -> f64 {
    const SCALE: f64 = 10_000.0;

    if !value.is_finite() {
        return value;
    }

    // A tie means 2 * |value| * 10^4 is exactly an odd integer. The fused
    // multiply-add yields the exact rounding error of the product.
    let magnitude = value.abs();
    let doubled = magnitude * 2.0 * SCALE;
    let exact = magnitude.mul_add(2.0 * SCALE, -doubled) == 0.0;
    if exact && doubled.fract() == 0.0 && doubled % 2.0 == 1.0 {
        return ((doubled + 1.0) / 2.0 / SCALE).copysign(value);
    }

    // Rust prints the exact decimal expansion, so away from ties this is
    // correctly rounded
    format!("{:.4}", magnitude)
        .parse::<f64>()
        .map_or(value, |rounded| rounded.copysign(value))
}

/// Number formatting for the summary message
fn format_metric(value: f64) -> String {
    match value {
        v if v == f64::INFINITY => "Infinity".to_string(),
        v if v == f64::NEG_INFINITY => "-Infinity".to_string(),
        v => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::context::{PageSnapshot, StaticContextProvider};
    use pretty_assertions::assert_eq;

    fn fixed_clock() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00.250Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn builder() -> PayloadBuilder {
        let snapshot = PageSnapshot {
            url: "https://app.example.com/checkout".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            language: "en-US".to_string(),
            ..Default::default()
        };
        PayloadBuilder::new(
            Arc::new(StaticContextProvider::new(snapshot)),
            Arc::new(Session::new()),
        )
        .with_clock(fixed_clock)
    }

    #[test]
    fn test_display_value_ms() {
        assert_eq!(display_value(1234.56, MetricUnit::Milliseconds), 1235.0);
        assert_eq!(display_value(2.5, MetricUnit::Milliseconds), 3.0);
        assert_eq!(display_value(-0.4, MetricUnit::Milliseconds), 0.0);
    }

    #[test]
    fn test_display_value_unitless() {
        assert_eq!(display_value(0.1234, MetricUnit::Unitless), 0.1234);
        assert_eq!(display_value(0.123456, MetricUnit::Unitless), 0.1235);
        assert_eq!(display_value(0.5, MetricUnit::Unitless), 0.5);
    }

    #[test]
    fn test_display_value_unitless_rounds_stored_value() {
        // Stored just below the midpoint
        assert_eq!(display_value(0.00035, MetricUnit::Unitless), 0.0003);
        assert_eq!(display_value(0.00095, MetricUnit::Unitless), 0.0009);
        assert_eq!(display_value(2.00005, MetricUnit::Unitless), 2.0);
        // Exact midpoint goes up
        assert_eq!(display_value(0.03125, MetricUnit::Unitless), 0.0313);
        assert_eq!(display_value(-0.03125, MetricUnit::Unitless), -0.0313);
        assert_eq!(display_value(-0.00001, MetricUnit::Unitless), 0.0);
    }

    #[test]
    fn test_performance_message_uses_stored_value_rounding() {
        let builder = builder();
        let event = builder.build_from_performance("CLS", 0.00035, PerformanceOptions::unitless());
        assert_eq!(event.message(), Some("Performance: CLS = 0.0003"));
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(1235.0), "1235");
        assert_eq!(format_metric(0.1234), "0.1234");
        assert_eq!(format_metric(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_thrown_display() {
        assert_eq!(Thrown::error("boom").to_string(), "Error: boom");
        assert_eq!(
            Thrown::Value(serde_json::json!("plain text")).to_string(),
            "plain text"
        );
        assert_eq!(Thrown::Value(serde_json::json!(42)).to_string(), "42");
        assert_eq!(
            Thrown::Error {
                name: Some("TypeError".to_string()),
                message: None,
                stack: None
            }
            .to_string(),
            "TypeError"
        );
    }

    #[test]
    fn test_from_std_error_uses_type_name() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let thrown = Thrown::from_std_error(&io);
        let event = builder().build_from_error(&thrown, BuildOptions::default());
        let exception = event.exception().unwrap();
        assert_eq!(exception.exception_type, "Error");
        assert_eq!(exception.message, "disk full");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("std::io::error::Error"), "Error");
        assert_eq!(short_type_name("serde_json::Error"), "Error");
        assert_eq!(short_type_name("app::Failure<alloc::string::String>"), "Failure");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_from_value_object_reads_fields() {
        let thrown = Thrown::from_value(serde_json::json!({"message": "oops", "stack": null}));
        assert_eq!(
            thrown,
            Thrown::Error {
                name: None,
                message: Some("oops".to_string()),
                stack: None
            }
        );
    }

    #[test]
    fn test_into_error_converts_values() {
        let converted = Thrown::Value(serde_json::json!("nope")).into_error();
        assert_eq!(converted, Thrown::error("nope"));
        assert!(converted.is_error());
    }

    #[test]
    fn test_value_message_uses_string_form() {
        let event =
            builder().build_from_error(&Thrown::Value(serde_json::json!(404)), BuildOptions::default());
        let exception = event.exception().unwrap();
        assert_eq!(exception.exception_type, "Error");
        assert_eq!(exception.message, "404");
        assert!(exception.stacktrace.is_empty());
    }

    #[test]
    fn test_timestamp_format() {
        let event = builder().build_from_message("hi", None, BuildOptions::default());
        assert_eq!(event.timestamp, "2024-05-01T12:00:00.250Z");
    }

    #[test]
    fn test_user_override_wins_over_session() {
        let session = Arc::new(Session::new());
        session.set_user(UserIdentity {
            id: Some("session-user".to_string()),
            ..Default::default()
        });
        let builder = PayloadBuilder::new(Arc::new(StaticContextProvider::default()), session);

        let event = builder.build_from_message("hi", None, BuildOptions::default());
        assert_eq!(event.user.unwrap().id.as_deref(), Some("session-user"));

        let event = builder.build_from_message(
            "hi",
            None,
            BuildOptions {
                user: Some(UserIdentity {
                    id: Some("override".to_string()),
                    ..Default::default()
                }),
            },
        );
        assert_eq!(event.user.unwrap().id.as_deref(), Some("override"));
    }
}
