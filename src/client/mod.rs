//! Telemetry client: the coordinator host hooks call into.
//!
//! This module handles:
//! - Configuration-driven enable/disable and sampling
//! - Routing uncaught errors and unhandled rejections into error events
//! - Mapping performance entries into web-vitals events

pub mod coordinator;
pub mod sampling;
pub mod vitals;

// Re-export main types
pub use coordinator::{DevPulseClient, UncaughtError};
pub use sampling::{RandomSampler, Sampler};
pub use vitals::{
    FirstInput, LargestContentfulPaint, LayoutShift, Metric, NavigationTiming, VitalsTracker,
};
