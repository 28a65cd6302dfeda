//! Process-wide logging bootstrap.
//!
//! # Invariants
//! - The logger starts at most once per process; later calls with the same level are no-ops.
//! - Initialization never panics.

use crate::error::AppError;
use flexi_logger::{Logger, LoggerHandle};
use log::info;
use once_cell::sync::OnceCell;

pub const LOG_ENV_VAR: &str = "TASKER_LOG";
const DEFAULT_LOG_LEVEL: &str = "warn";

static LOGGER: OnceCell<(&'static str, LoggerHandle)> = OnceCell::new();

pub fn default_log_level() -> &'static str {
    DEFAULT_LOG_LEVEL
}

/// Picks the level: environment value first, then config, then the default.
pub fn resolve_log_level(env_value: Option<&str>, config_level: Option<&str>) -> String {
    env_value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or(config_level.map(str::trim).filter(|value| !value.is_empty()))
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .to_lowercase()
}

/// Starts stderr logging at `level`.
///
/// # Errors
/// - `invalid_input` for an unknown level, or when already started with another level.
/// - `io_error` when the logger backend cannot start.
pub fn init_logging(level: &str) -> Result<(), AppError> {
    let normalized = normalize_level(level)?;

    let (active, _) = LOGGER.get_or_try_init(|| -> Result<_, AppError> {
        let handle = Logger::try_with_str(normalized)
            .map_err(|err| AppError::invalid_input(format!("invalid log level `{normalized}`: {err}")))?
            .log_to_stderr()
            .format(flexi_logger::default_format)
            .start()
            .map_err(|err| AppError::io(format!("failed to start logger: {err}")))?;
        info!(
            "event=logging_init level={} version={}",
            normalized,
            env!("CARGO_PKG_VERSION")
        );
        Ok((normalized, handle))
    })?;

    if *active != normalized {
        return Err(AppError::invalid_input(format!(
            "logging already initialized with level `{active}`; refusing to switch to `{normalized}`"
        )));
    }
    Ok(())
}

fn normalize_level(level: &str) -> Result<&'static str, AppError> {
    match level.trim().to_lowercase().as_str() {
        "off" => Ok("off"),
        "error" => Ok("error"),
        "warn" | "warning" => Ok("warn"),
        "info" => Ok("info"),
        "debug" => Ok("debug"),
        "trace" => Ok("trace"),
        other => Err(AppError::invalid_input(format!("unsupported log level `{other}`"))),
    }
}
