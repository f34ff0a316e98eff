//! Diagnostic logging
//!
//! All diagnostics go to stderr so report output on stdout stays clean.

use crate::types::ErpError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Level used when neither `--log-level` nor `RUST_LOG` is set
pub const DEFAULT_LEVEL: &str = "warn";

/// Build the log filter
///
/// An explicit directive wins over `RUST_LOG`, which wins over
/// [`DEFAULT_LEVEL`].
///
/// # Errors
///
/// Returns `Validation` if the directive cannot be parsed.
pub fn build_filter(directive: Option<&str>) -> Result<EnvFilter, ErpError> {
    match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|e| ErpError::validation("log-level", e.to_string())),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))),
    }
}

/// Install the global subscriber writing compact lines to stderr
///
/// # Errors
///
/// Returns an error if the directive is invalid or a global subscriber is
/// already installed.
pub fn init_logging(directive: Option<&str>) -> Result<(), ErpError> {
    let filter = build_filter(directive)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| ErpError::internal(format!("Failed to initialise logging: {}", e)))
}
