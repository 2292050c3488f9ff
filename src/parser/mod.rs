//! Stack trace parsing.
//!
//! This module handles:
//! - Splitting raw `stack` text into lines
//! - Matching named and anonymous frame patterns
//! - Falling back to raw frames for anything else

pub mod stack_trace;

// Re-export main entry point
pub use stack_trace::parse_stack;
