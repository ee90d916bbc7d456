//! Logging bootstrap for the `fm` binary.
//!
//! The library only emits through the `log` facade; this module attaches a
//! stderr backend. Initialization is idempotent and never panics.

use std::sync::OnceLock;

use flexi_logger::{Logger, LoggerHandle, WriteMode};
use log::debug;

/// Environment variable holding the log level
pub const LOG_ENV: &str = "FOREMAN_LOG";
pub const DEFAULT_LEVEL: &str = "warn";

static LOGGER: OnceLock<(String, LoggerHandle)> = OnceLock::new();

/// Lower-case and check a level name
pub fn normalize_level(level: &str) -> Result<String, String> {
    let level = level.trim().to_ascii_lowercase();
    match level.as_str() {
        "off" | "error" | "warn" | "info" | "debug" | "trace" => Ok(level),
        _ => Err(format!(
            "unsupported log level `{}` (use off, error, warn, info, debug or trace)",
            level
        )),
    }
}

/// Start logging to stderr at `level` (default: warn).
///
/// Calling again with the same level is a no-op; a different level is
/// rejected.
pub fn init_logging(level: Option<&str>) -> Result<(), String> {
    let level = normalize_level(level.unwrap_or(DEFAULT_LEVEL))?;

    if let Some((active, _)) = LOGGER.get() {
        if *active == level {
            return Ok(());
        }
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            active, level
        ));
    }

    let handle = Logger::try_with_str(&level)
        .map_err(|err| format!("invalid log level `{}`: {}", level, err))?
        .log_to_stderr()
        .format_for_stderr(flexi_logger::default_format)
        .write_mode(WriteMode::Direct)
        .start()
        .map_err(|err| format!("failed to start logger: {}", err))?;

    // a racing initializer keeps its own handle; ours is dropped
    let _ = LOGGER.set((level.clone(), handle));
    debug!("logging started at level {}", level);
    Ok(())
}
