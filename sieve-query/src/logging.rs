//! Logging setup for sieve.
//!
//! Scopes log through `tracing`. Compiled predicates are logged at debug level.
//! Dropped typed values, fields missing from the record shape, and bad
//! alternate URIs are logged at warn level.
//!
//! # Environment Variables
//!
//! - `SIEVE_DEBUG=true` or `SIEVE_DEBUG=1` - Enable debug logging
//! - `SIEVE_LOG_LEVEL=debug|info|warn|error|trace` - Set specific log level
//! - `SIEVE_LOG_FORMAT=json|pretty|compact` - Set output format (default: json)
//!
//! ```rust,no_run
//! use sieve_query::logging;
//!
//! // Call once at startup; later calls are no-ops.
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `SIEVE_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("SIEVE_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Get the configured log level from `SIEVE_LOG_LEVEL`.
///
/// Defaults to "debug" if `SIEVE_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };

    match env::var("SIEVE_LOG_LEVEL") {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// Get the configured log format from `SIEVE_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    env::var("SIEVE_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Initialize the sieve logging system.
///
/// Does nothing unless `SIEVE_DEBUG` or `SIEVE_LOG_LEVEL` is set. Without the
/// `tracing-subscriber` feature the application is expected to install its own
/// subscriber.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("SIEVE_LOG_LEVEL").is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let directives = format!(
                "sieve={},sieve_query={},sieve_axum={}",
                level, level, level
            );
            let filter =
                EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"));

            match get_log_format() {
                "json" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json())
                        .init();
                }
                "compact" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().compact())
                        .init();
                }
                _ => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().pretty())
                        .init();
                }
            }

            tracing::info!(level = level, format = get_log_format(), "sieve logging initialized");
        }
    });
}

/// Debug log that only fires when `SIEVE_DEBUG` is enabled at runtime.
#[macro_export]
macro_rules! sieve_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            $crate::tracing::debug!($($arg)*);
        }
    };
}
