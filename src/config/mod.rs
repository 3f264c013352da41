//! Configuration module for com_monitor.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `COM_MONITOR_CONFIG` environment variable (explicit path)
//! 2. `./com_monitor.toml` (current directory)
//! 3. `~/.config/com_monitor/com_monitor.toml` (XDG on Linux, the matching
//!    platform directory elsewhere)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Scalar values can be overridden via `COM_MONITOR_<SECTION>_<KEY>`:
//! - `COM_MONITOR_SERIAL_READ_TIMEOUT_MS=500`
//! - `COM_MONITOR_DIAGNOSTICS_STRESS_DURATION_SECS=30`
//! - `COM_MONITOR_CLASSIFIER_GRANULARITY=coarse`
//!
//! # Example
//!
//! ```rust,no_run
//! use com_monitor::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let settings = loader.config().engine_settings()?;
//! println!("stress runs for {:?}", settings.stress_duration);
//! # Ok::<(), com_monitor::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{
    ClassifierConfig, Config, DiagnosticsConfig, LogFormat, LoggingConfig, SerialConfig,
};
