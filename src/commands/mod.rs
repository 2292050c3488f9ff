//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod capture;
pub mod models;
pub mod parse;
pub mod utils;

// Re-export main command functions
pub use capture::{execute_capture, validate_args};
pub use models::{CaptureArgs, CaptureEvent};
pub use parse::{execute_parse, render_frames};
pub use utils::display_schema;
