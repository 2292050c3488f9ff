//! DevPulse CLI
//!
//! Sends telemetry events to an ingest endpoint from the command line and
//! inspects how stack traces are parsed.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use devpulse::commands::{
    display_schema, execute_capture, execute_parse, CaptureArgs, CaptureEvent,
};
use devpulse::Level;

/// DevPulse - client-side telemetry agent
#[derive(Parser, Debug)]
#[command(name = "devpulse")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Ingest endpoint URL (access key embedded)
    #[arg(long, env = "DEVPULSE_DSN", global = true, default_value = "")]
    dsn: String,

    /// Environment tag
    #[arg(long, env = "DEVPULSE_ENV", global = true, default_value = "production")]
    environment: String,

    /// Release identifier
    #[arg(long, env = "DEVPULSE_RELEASE", global = true)]
    release: Option<String>,

    /// Keep probability for errors and messages
    #[arg(long, env = "DEVPULSE_SAMPLE_RATE", global = true, default_value = "1.0")]
    sample_rate: f64,

    /// Delivery deadline in milliseconds
    #[arg(long, env = "DEVPULSE_TIMEOUT_MS", global = true, default_value = "5000")]
    timeout_ms: u64,

    /// Page URL reported in the event context
    #[arg(long, global = true, default_value = "cli://devpulse")]
    url: String,

    /// Current user id
    #[arg(long, global = true)]
    user_id: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a stack trace and print the frames as JSON
    Parse {
        /// File holding the trace (stdin if omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Send a message event
    CaptureMessage {
        /// Message text
        #[arg(short, long)]
        message: String,

        /// Severity: error, warning or info
        #[arg(short, long, default_value = "info")]
        level: Level,
    },

    /// Send an error event
    CaptureError {
        /// Error message
        #[arg(short, long)]
        message: String,

        /// Error type name
        #[arg(short = 't', long = "type", default_value = "Error")]
        error_type: String,

        /// File holding the stack trace
        #[arg(long)]
        stack_file: Option<PathBuf>,
    },

    /// Send a performance event
    Perf {
        /// Metric name (e.g. LCP, CLS)
        #[arg(short, long)]
        name: String,

        /// Measured value
        #[arg(long, allow_negative_numbers = true)]
        value: f64,

        /// Report as a unitless score instead of milliseconds
        #[arg(long)]
        unitless: bool,
    },

    /// Display event schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let event = match cli.command {
        Commands::Parse { file } => {
            println!("{}", execute_parse(file.as_deref())?);
            return Ok(());
        }
        Commands::Schema { show } => {
            display_schema(show);
            return Ok(());
        }
        Commands::CaptureMessage { message, level } => CaptureEvent::Message { message, level },
        Commands::CaptureError {
            message,
            error_type,
            stack_file,
        } => CaptureEvent::Error {
            error_type,
            message,
            stack_file,
        },
        Commands::Perf {
            name,
            value,
            unitless,
        } => CaptureEvent::Performance {
            name,
            value,
            unitless,
        },
    };

    let args = CaptureArgs {
        dsn: cli.dsn,
        environment: cli.environment,
        release: cli.release,
        sample_rate: cli.sample_rate,
        timeout_ms: cli.timeout_ms,
        url: cli.url,
        user_id: cli.user_id,
        event,
    };

    execute_capture(args).await
}
