//! Event payload construction.
//!
//! This module handles:
//! - The event envelope and its wire shape
//! - Ambient context and current-user collaborators
//! - Building error, message and performance events

pub mod builder;
pub mod context;
pub mod schema;

// Re-export main types
pub use builder::{BuildOptions, PayloadBuilder, PerformanceOptions, Thrown};
pub use context::{ContextProvider, PageSnapshot, Session, StaticContextProvider};
pub use schema::{
    Context, Dimensions, Event, EventKind, ExceptionInfo, Level, MetricUnit, PerformanceBlock,
    RequestInfo, SessionFields, StackFrame, UserIdentity,
};
