//! Logging configuration using tracing
//!
//! Provides structured logging to stderr with support for the RUST_LOG environment
//! variable, plus the leveled `Logger` seam that the rate limit core reports through.

use std::fmt::Write as _;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Sets up structured logging with:
/// - Filtering via RUST_LOG environment variable (defaults to "warn" for quiet output)
/// - Formatted output to stderr
///
/// # Example RUST_LOG values
/// - `RUST_LOG=info` - Show info and above
/// - `RUST_LOG=gastown=debug` - Debug level for the gastown crate
///
/// # Errors
/// Returns an error if the subscriber has already been initialized
pub fn init() -> crate::Result<()> {
    // An unset RUST_LOG quietly defaults to "warn"; a malformed one is reported
    // before falling back so typos in the override are not invisible.
    let env_filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) => EnvFilter::try_new(&value).unwrap_or_else(|e| {
            eprintln!("Ignoring invalid RUST_LOG={:?}: {}", value, e);
            EnvFilter::new("warn")
        }),
        Err(_) => EnvFilter::new("warn"),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| crate::GasTownError::Other(format!("Failed to initialize tracing: {}", e)))?;

    Ok(())
}

/// Initialize logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init();
}

/// Leveled logger for the rate limit core.
///
/// The handler and swapper report outcomes through this trait so supervisors can
/// redirect them (to mail, to a dashboard feed) without touching the core. Fields
/// are alternating key/value pairs rendered as `key=value`.
pub trait Logger: Send + Sync {
    /// Log an informational message with structured fields
    fn info(&self, msg: &str, fields: &[(&str, String)]);

    /// Log a warning with structured fields
    fn warn(&self, msg: &str, fields: &[(&str, String)]);

    /// Log an error with structured fields
    fn error(&self, msg: &str, fields: &[(&str, String)]);
}

/// Default `Logger` that forwards to the `tracing` macros.
///
/// Under the subscriber installed by [`init`], output lands on stderr as
/// `<msg> key=value key=value`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, msg: &str, fields: &[(&str, String)]) {
        tracing::info!("{}{}", msg, format_fields(fields));
    }

    fn warn(&self, msg: &str, fields: &[(&str, String)]) {
        tracing::warn!("{}{}", msg, format_fields(fields));
    }

    fn error(&self, msg: &str, fields: &[(&str, String)]) {
        tracing::error!("{}{}", msg, format_fields(fields));
    }
}

/// Render fields as ` key=value key=value`, empty string for no fields
fn format_fields(fields: &[(&str, String)]) -> String {
    let mut out = String::new();
    for (key, value) in fields {
        let _ = write!(out, " {}={}", key, value);
    }
    out
}
