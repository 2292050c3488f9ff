//! Telemetry client.
//!
//! Wires configuration, the payload builder and the transport together and
//! exposes the operations host hooks call into. Nothing here ever returns
//! an error to the host; a misconfigured client simply does nothing.

use super::sampling::{RandomSampler, Sampler};
use super::vitals::{
    FirstInput, LargestContentfulPaint, LayoutShift, Metric, NavigationTiming, VitalsTracker,
};
use crate::payload::builder::{BuildOptions, PayloadBuilder, PerformanceOptions, Thrown};
use crate::payload::context::{ContextProvider, Session};
use crate::payload::schema::{Level, SessionFields, UserIdentity};
use crate::transport::{HttpFetch, Transport};
use crate::utils::config::{Config, ValidConfig};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// An uncaught exception as reported by the host
#[derive(Debug, Clone, Default)]
pub struct UncaughtError {
    /// The thrown value, when the host exposes it
    pub error: Option<Thrown>,
    /// Host-provided message, used when `error` is missing
    pub message: String,
    pub filename: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

/// Coordinator for one telemetry session
pub struct DevPulseClient {
    config: Option<ValidConfig>,
    transport: Option<Transport>,
    builder: PayloadBuilder,
    session: Arc<Session>,
    vitals: VitalsTracker,
    sampler: Box<dyn Sampler>,
}

impl DevPulseClient {
    /// Create a client from host configuration
    ///
    /// **Public** - main entry point for hosts
    ///
    /// # Arguments
    /// * `config` - Host configuration; a missing DSN disables the client
    /// * `context` - Source of page context for every event
    /// * `fetch` - HTTP capability used by the transport
    ///
    /// # Returns
    /// Always a client. Invalid configuration logs one warning and yields a
    /// client whose operations are no-ops.
    pub fn init(
        config: &Config,
        context: Arc<dyn ContextProvider>,
        fetch: Arc<dyn HttpFetch>,
    ) -> Self {
        let session = Arc::new(Session::new());
        let builder = PayloadBuilder::new(context, Arc::clone(&session));

        let (config, transport) = match config.validate() {
            Ok(valid) => {
                let transport = Transport::with_timeout(valid.dsn.clone(), fetch, valid.timeout);
                debug!(
                    "[DevPulse] initialized (environment: {}, enabled: {}, vitals: {})",
                    valid.environment, valid.enabled, valid.track_vitals
                );
                (Some(valid), Some(transport))
            }
            Err(e) => {
                warn!("[DevPulse] {}", e);
                (None, None)
            }
        };

        Self {
            config,
            transport,
            builder,
            session,
            vitals: VitalsTracker::new(),
            sampler: Box::new(RandomSampler),
        }
    }

    /// Replace the sampling strategy
    pub fn with_sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.sampler = Box::new(sampler);
        self
    }

    /// Replace the timestamp source used by the builder
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.builder = self.builder.with_clock(clock);
        self
    }

    /// Whether captures are forwarded at all
    pub fn is_active(&self) -> bool {
        self.transport.is_some() && self.config.as_ref().is_some_and(|c| c.enabled)
    }

    fn tracks_vitals(&self) -> bool {
        self.is_active() && self.config.as_ref().is_some_and(|c| c.track_vitals)
    }

    pub fn config(&self) -> Option<&ValidConfig> {
        self.config.as_ref()
    }

    pub fn transport(&self) -> Option<&Transport> {
        self.transport.as_ref()
    }

    pub fn builder(&self) -> &PayloadBuilder {
        &self.builder
    }

    // ── Public API ───────────────────────────────────────────────────────

    /// Report an error
    ///
    /// `extra` is merged at the top level of the event; `user`,
    /// `environment` and `release` always win over colliding keys.
    pub fn capture(&self, error: &Thrown, extra: Map<String, Value>) {
        let (Some(transport), Some(config)) = (self.active_transport(), self.config.as_ref())
        else {
            return;
        };
        if !self.sampled(config) {
            return;
        }

        let event = self
            .builder
            .build_from_error(error, BuildOptions::default())
            .with_extra(extra)
            .with_session(self.session.current_user(), session_fields(config));
        transport.send(&event);
    }

    /// Report a free-text message; `level` defaults to info
    pub fn capture_message(&self, message: &str, level: impl Into<Option<Level>>) {
        let (Some(transport), Some(config)) = (self.active_transport(), self.config.as_ref())
        else {
            return;
        };
        if !self.sampled(config) {
            return;
        }

        let event = self
            .builder
            .build_from_message(message, level, BuildOptions::default())
            .with_session(self.session.current_user(), session_fields(config));
        transport.send(&event);
    }

    pub fn set_user(&self, user: UserIdentity) {
        self.session.set_user(user);
    }

    pub fn clear_user(&self) {
        self.session.clear_user();
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.session.current_user()
    }

    /// Wait for in-flight deliveries, bounded by `timeout`
    pub async fn flush(&self, timeout: Duration) -> bool {
        match &self.transport {
            Some(transport) => transport.flush(timeout).await,
            None => true,
        }
    }

    // ── Error sources ────────────────────────────────────────────────────

    /// Uncaught exception hook
    pub fn handle_uncaught_error(&self, uncaught: UncaughtError) {
        if !self.is_active() {
            return;
        }
        let error = uncaught
            .error
            .unwrap_or_else(|| Thrown::error(uncaught.message));

        self.capture(
            &error,
            extra_context(json!({
                "filename": uncaught.filename,
                "line": uncaught.line,
                "column": uncaught.column,
            })),
        );
    }

    /// Unhandled rejection hook; non-error reasons become errors
    pub fn handle_unhandled_rejection(&self, reason: Thrown) {
        if !self.is_active() {
            return;
        }
        self.capture(
            &reason.into_error(),
            extra_context(json!({ "type": "unhandledrejection" })),
        );
    }

    // ── Web vitals ───────────────────────────────────────────────────────

    pub fn record_largest_contentful_paint(&self, entries: &[LargestContentfulPaint]) {
        if let Some(metric) = self.vitals.largest_contentful_paint(entries) {
            self.send_metric(metric);
        }
    }

    pub fn record_first_input(&self, entries: &[FirstInput]) {
        if let Some(metric) = self.vitals.first_input(entries) {
            self.send_metric(metric);
        }
    }

    pub fn record_layout_shift(&self, entries: &[LayoutShift]) {
        if self.tracks_vitals() {
            self.vitals.layout_shift(entries);
        }
    }

    /// Page hidden or unloading: report accumulated CLS
    pub fn page_hidden(&self) {
        if let Some(metric) = self.vitals.page_hidden() {
            self.send_metric(metric);
        }
    }

    /// Page finished loading: report TTFB and total load time
    pub fn page_loaded(&self, navigation: Option<&NavigationTiming>) {
        for metric in self.vitals.page_loaded(navigation) {
            self.send_metric(metric);
        }
    }

    /// Performance events skip sampling and session fields
    ///
    /// **Private** - shared by the vitals hooks
    fn send_metric(&self, metric: Metric) {
        if !self.tracks_vitals() {
            return;
        }
        let Some(transport) = &self.transport else {
            return;
        };

        let event = self.builder.build_from_performance(
            metric.name,
            metric.value,
            PerformanceOptions {
                unit: metric.unit,
                user: None,
            },
        );
        transport.send(&event);
    }

    fn active_transport(&self) -> Option<&Transport> {
        if self.is_active() {
            self.transport.as_ref()
        } else {
            None
        }
    }

    fn sampled(&self, config: &ValidConfig) -> bool {
        let keep = self.sampler.keep(config.traces_sample_rate);
        if !keep {
            debug!("Event dropped by sampling (rate {})", config.traces_sample_rate);
        }
        keep
    }
}

fn session_fields(config: &ValidConfig) -> SessionFields {
    SessionFields {
        environment: config.environment.clone(),
        release: config.release.clone(),
    }
}

/// `{"context": <value>}` as top-level extra fields
fn extra_context(context: Value) -> Map<String, Value> {
    let mut extra = Map::new();
    extra.insert("context".to_string(), context);
    extra
}
