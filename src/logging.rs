//! Tracing subscriber setup.
//!
//! Every run logs to stdout and, unless disabled, to a fresh file named
//! `com_monitor_YYYYmmdd_HHMMSS.log` so separate sessions never share a log.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::AppError;
use chrono::Local;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Log file name for a session started at `now`.
pub fn log_file_name(now: chrono::DateTime<Local>) -> String {
    format!("com_monitor_{}.log", now.format("%Y%m%d_%H%M%S"))
}

/// Filter from `RUST_LOG` if set, else `level_override`, else the configured level.
fn build_filter(config: &LoggingConfig, level_override: Option<&str>) -> Result<EnvFilter, AppError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level = level_override.unwrap_or(&config.level);
    EnvFilter::try_new(level).map_err(|e| AppError::Logging(format!("invalid level '{level}': {e}")))
}

fn create_log_file(directory: &Path) -> Result<(File, PathBuf), AppError> {
    std::fs::create_dir_all(directory)?;
    let path = directory.join(log_file_name(Local::now()));
    let file = File::create(&path)?;
    Ok((file, path))
}

/// Install the global subscriber.
///
/// Returns the path of the session log file when one was created.
pub fn init_logging(
    config: &LoggingConfig,
    level_override: Option<&str>,
) -> Result<Option<PathBuf>, AppError> {
    let filter = build_filter(config, level_override)?;

    let stdout_layer = match config.format {
        LogFormat::Pretty => fmt::layer().pretty().with_target(false).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    let (file_layer, log_path) = if config.to_file {
        let directory = config.directory.clone().unwrap_or_else(|| PathBuf::from("."));
        let (file, path) = create_log_file(&directory)?;
        let layer = fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
            .boxed();
        (Some(layer), Some(path))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(log_path)
}
