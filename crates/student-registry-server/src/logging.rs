// crates/student-registry-server/src/logging.rs
// ============================================================================
// Module: Logging
// Description: Global tracing subscriber setup.
// Purpose: Emit human-readable or JSON logs filtered by level.
// Dependencies: tracing, tracing-subscriber, student-registry-config
// ============================================================================

//! ## Overview
//! `RUST_LOG` takes precedence over the configured level when it is set and
//! parses. Installing a subscriber twice is reported as an error.

use student_registry_config::LoggingConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::error::ServerError;

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns [`ServerError::Init`] when the level is invalid or a subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ServerError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.level.trim())
            .map_err(|err| ServerError::Init(format!("invalid log level: {err}")))?,
    };
    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry.with(fmt::layer().json().with_target(true).with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    result.map_err(|err| ServerError::Init(format!("logging init failed: {err}")))
}
