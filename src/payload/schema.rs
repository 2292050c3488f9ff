//! Event envelope definitions.
//!
//! This module defines the structure of the JSON documents we POST to the
//! ingest endpoint. The three event variants are kept mutually exclusive by
//! `EventKind`; the flat wire shape is produced at serialization time.

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};

use crate::utils::config::PLATFORM;

/// Severity attached to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
    Info,
}

impl Default for Level {
    fn default() -> Self {
        Level::Info
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Level::Error),
            "warning" | "warn" => Ok(Level::Warning),
            "info" => Ok(Level::Info),
            other => Err(format!("unknown level: {}", other)),
        }
    }
}

/// One parsed line of a stack trace
///
/// Either a located frame (file known, function possibly unknown) or the
/// raw trimmed line when no pattern matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StackFrame {
    Located {
        function: Option<String>,
        file: String,
        line: Option<u32>,
        column: Option<u32>,
    },
    Raw {
        raw: String,
    },
}

impl StackFrame {
    /// File of a located frame
    pub fn file(&self) -> Option<&str> {
        match self {
            StackFrame::Located { file, .. } => Some(file),
            StackFrame::Raw { .. } => None,
        }
    }

    /// Raw text of an unparsed frame
    pub fn raw(&self) -> Option<&str> {
        match self {
            StackFrame::Located { .. } => None,
            StackFrame::Raw { raw } => Some(raw),
        }
    }

    /// True when the frame carries a non-empty file or raw line
    pub fn has_content(&self) -> bool {
        match self {
            StackFrame::Located { file, .. } => !file.is_empty(),
            StackFrame::Raw { raw } => !raw.is_empty(),
        }
    }
}

/// Exception block of an error event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    #[serde(rename = "type")]
    pub exception_type: String,
    pub message: String,
    pub stacktrace: Vec<StackFrame>,
}

/// Unit of a performance measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    /// Timing metric, rounded to whole milliseconds
    #[serde(rename = "ms")]
    Milliseconds,
    /// Unitless score, rounded to 4 decimals
    #[serde(rename = "")]
    Unitless,
}

impl Default for MetricUnit {
    fn default() -> Self {
        MetricUnit::Milliseconds
    }
}

impl MetricUnit {
    /// Suffix used in the human-readable summary
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricUnit::Milliseconds => "ms",
            MetricUnit::Unitless => "",
        }
    }
}

/// Performance block nested under `context.performance`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceBlock {
    pub name: String,
    #[serde(serialize_with = "serialize_metric")]
    pub value: f64,
    pub unit: MetricUnit,
}

/// Integral metric values go out as JSON integers (`1235`, not `1235.0`)
fn serialize_metric<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Width and height pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Ambient snapshot captured when an event is built
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub url: String,
    pub user_agent: String,
    pub language: String,
    pub viewport: Dimensions,
    pub screen: Dimensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceBlock>,
}

/// Request block of an event
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestInfo {
    pub url: String,
}

/// Identity of the current user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserIdentity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Session fields the coordinator stamps on captured events.
///
/// These win over any colliding key in `extra`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionFields {
    pub environment: String,
    pub release: Option<String>,
}

/// Variant-specific content of an event
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Error(ExceptionInfo),
    Message(String),
    Performance {
        message: String,
        performance: PerformanceBlock,
    },
}

/// Normalized event handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub level: Level,
    pub timestamp: String,
    pub context: Context,
    pub request: RequestInfo,
    pub user: Option<UserIdentity>,
    pub kind: EventKind,
    /// Caller-supplied top-level fields
    pub extra: serde_json::Map<String, serde_json::Value>,
    /// Present only on events that went through the coordinator's capture path
    pub session: Option<SessionFields>,
}

impl Event {
    /// Platform tag, constant for every event
    pub fn platform(&self) -> &'static str {
        PLATFORM
    }

    /// Exception block, if this is an error event
    pub fn exception(&self) -> Option<&ExceptionInfo> {
        match &self.kind {
            EventKind::Error(exception) => Some(exception),
            _ => None,
        }
    }

    /// Message text for message and performance events
    pub fn message(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Error(_) => None,
            EventKind::Message(message) => Some(message),
            EventKind::Performance { message, .. } => Some(message),
        }
    }

    /// Performance block, if this is a performance event
    pub fn performance(&self) -> Option<&PerformanceBlock> {
        match &self.kind {
            EventKind::Performance { performance, .. } => Some(performance),
            _ => None,
        }
    }

    /// Attach caller-supplied top-level fields
    pub fn with_extra(mut self, extra: serde_json::Map<String, serde_json::Value>) -> Self {
        self.extra.extend(extra);
        self
    }

    /// Stamp user, environment and release
    pub fn with_session(mut self, user: Option<UserIdentity>, session: SessionFields) -> Self {
        self.user = user;
        self.session = Some(session);
        self
    }

    /// Render the flat wire document
    ///
    /// Order of precedence: built fields, then `extra`, then the session
    /// fields (`user`, `environment`, `release`).
    pub fn to_wire(&self) -> Result<serde_json::Value, serde_json::Error> {
        let mut context = self.context.clone();
        let (exception, message) = match &self.kind {
            EventKind::Error(exception) => (Some(exception), None),
            EventKind::Message(message) => (None, Some(message.as_str())),
            EventKind::Performance {
                message,
                performance,
            } => {
                context.performance = Some(performance.clone());
                (None, Some(message.as_str()))
            }
        };

        let base = WireEvent {
            level: self.level,
            exception,
            message,
            context: &context,
            request: &self.request,
            user: self.user.as_ref(),
            platform: PLATFORM,
            timestamp: &self.timestamp,
        };

        let mut document = match serde_json::to_value(base)? {
            serde_json::Value::Object(map) => map,
            _ => return Err(serde_json::Error::custom("event did not serialize to an object")),
        };

        for (key, value) in &self.extra {
            document.insert(key.clone(), value.clone());
        }

        if let Some(session) = &self.session {
            document.insert("user".to_string(), serde_json::to_value(&self.user)?);
            document.insert(
                "environment".to_string(),
                serde_json::Value::String(session.environment.clone()),
            );
            document.insert("release".to_string(), serde_json::to_value(&session.release)?);
        }

        Ok(serde_json::Value::Object(document))
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

/// Borrowed flat view of an event before extras are merged
#[derive(Serialize)]
struct WireEvent<'a> {
    level: Level,
    #[serde(skip_serializing_if = "Option::is_none")]
    exception: Option<&'a ExceptionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    context: &'a Context,
    request: &'a RequestInfo,
    user: Option<&'a UserIdentity>,
    platform: &'static str,
    timestamp: &'a str,
}
