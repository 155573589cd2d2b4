//! Logging bootstrap.
//!
//! The engine logs through `tracing` macros with structured fields. Output is
//! silent unless one of these is set:
//!
//! - `SCHEMAGUARD_DEBUG=true|1|yes` - debug level
//! - `SCHEMAGUARD_LOG_LEVEL=trace|debug|info|warn|error` - explicit level
//! - `SCHEMAGUARD_LOG_FORMAT=json|pretty|compact` - output format (default: compact)
//!
//! ```rust,no_run
//! use schemaguard_core::logging;
//!
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "SCHEMAGUARD_DEBUG";
const LEVEL_VAR: &str = "SCHEMAGUARD_LOG_LEVEL";
const FORMAT_VAR: &str = "SCHEMAGUARD_LOG_FORMAT";

/// Whether `SCHEMAGUARD_DEBUG` asks for debug logging.
#[inline]
pub fn is_debug_enabled() -> bool {
    debug_flag(env::var(DEBUG_VAR).ok().as_deref())
}

/// The level from `SCHEMAGUARD_LOG_LEVEL`, else debug or warn.
pub fn get_log_level() -> &'static str {
    resolve_level(env::var(LEVEL_VAR).ok().as_deref(), is_debug_enabled())
}

/// The format from `SCHEMAGUARD_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    resolve_format(env::var(FORMAT_VAR).ok().as_deref())
}

fn debug_flag(value: Option<&str>) -> bool {
    value
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

fn resolve_level(level: Option<&str>, debug: bool) -> &'static str {
    match level.map(str::to_lowercase).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ if debug => "debug",
        _ => "warn",
    }
}

fn resolve_format(format: Option<&str>) -> &'static str {
    match format.map(str::to_lowercase).as_deref() {
        Some("json") => "json",
        Some("pretty") => "pretty",
        _ => "compact",
    }
}

/// Install the subscriber if the environment asks for logging.
///
/// Later calls are no-ops.
pub fn init() {
    if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
        return;
    }
    init_with_level(get_log_level());
}

/// Install the subscriber at `level`, ignoring the level variables.
///
/// Later calls are no-ops.
pub fn init_with_level(level: &str) {
    let level = resolve_level(Some(level), false);
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(format!(
                "schemaguard={},schemaguard_core={},schemaguard_cli={}",
                level, level, level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            let writer = std::io::stderr;
            match get_log_format() {
                "json" => registry.with(fmt::layer().json().with_writer(writer)).init(),
                "pretty" => registry.with(fmt::layer().pretty().with_writer(writer)).init(),
                _ => registry.with(fmt::layer().compact().with_writer(writer)).init(),
            }

            tracing::debug!(level = level, format = get_log_format(), "Logging initialized");
        }

        #[cfg(not(feature = "tracing-subscriber"))]
        let _ = level;
    });
}
