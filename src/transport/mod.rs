//! Event delivery to the ingest endpoint.
//!
//! This module handles:
//! - Describing delivery requests (JSON body, no credentials, keepalive)
//! - Performing them through an injectable fetch capability
//! - Fire-and-forget sends bounded by a deadline

pub mod client;
pub mod fetch;

// Re-export main types
pub use client::{Delivery, Transport};
pub use fetch::{HttpFetch, PostRequest, ReqwestFetch};
