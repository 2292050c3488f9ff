//! Parse command implementation.
//!
//! Reads a stack trace from a file (or stdin) and renders the parsed
//! frames as pretty JSON.

use crate::parser::parse_stack;
use anyhow::{Context, Result};
use log::debug;
use std::io::Read;
use std::path::Path;

/// Parse a stack trace and return the frames as JSON
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `input` - Path to a file holding the trace; stdin when `None`
pub fn execute_parse(input: Option<&Path>) -> Result<String> {
    let stack = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stack trace from stdin")?;
            buffer
        }
    };

    render_frames(&stack)
}

/// Parse trace text into pretty-printed frames
///
/// **Public** - useful for tests and embedding
pub fn render_frames(stack: &str) -> Result<String> {
    let frames = parse_stack(Some(stack));
    debug!("Rendering {} frames", frames.len());
    serde_json::to_string_pretty(&frames).context("Failed to serialize frames")
}
