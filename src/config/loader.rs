//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, LogFormat};
use crate::diagnostics::Granularity;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "COM_MONITOR";

/// Config file name
const CONFIG_FILE_NAME: &str = "com_monitor.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "COM_MONITOR_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// 1. `COM_MONITOR_CONFIG` environment variable (explicit path)
    /// 2. `./com_monitor.toml`
    /// 3. the platform config directory (`~/.config/com_monitor/` and friends)
    /// 4. built-in defaults
    ///
    /// Environment overrides are applied on top, then the result is validated.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path, which must exist.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file, no overrides).
    pub fn with_defaults() -> Self {
        Self {
            config_path: None,
            config: Config::default(),
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to the file it was loaded from.
    pub fn save(&self) -> ConfigResult<()> {
        let path = self.config_path.as_ref().ok_or(ConfigError::NoPath)?;
        save_to_file(&self.config, path)
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Per-user config directory for this tool.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "com_monitor").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Per-user config file path, whether or not it exists yet.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Read `COM_MONITOR_<suffix>` and parse it, if set.
fn env_value<T: FromStr>(suffix: &str, what: &str) -> ConfigResult<Option<T>> {
    let var = format!("{ENV_PREFIX}_{suffix}");
    match std::env::var(&var) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env(var, format!("invalid {what}: {val:?}"))),
        Err(_) => Ok(None),
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Variables follow the pattern `COM_MONITOR_<SECTION>_<KEY>`, e.g.
/// `COM_MONITOR_SERIAL_READ_TIMEOUT_MS=500` or
/// `COM_MONITOR_DIAGNOSTICS_STRESS_DURATION_SECS=30`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some(val) = env_value("SERIAL_BAUD_RATE", "baud rate")? {
        config.serial.baud_rate = val;
    }
    if let Some(val) = env_value("SERIAL_READ_TIMEOUT_MS", "timeout")? {
        config.serial.read_timeout_ms = val;
    }

    if let Some(val) = env_value("DIAGNOSTICS_STRESS_DURATION_SECS", "duration")? {
        config.diagnostics.stress_duration_secs = val;
    }
    if let Some(val) = env_value::<String>("DIAGNOSTICS_LOOPBACK_PAYLOAD", "payload")? {
        config.diagnostics.loopback_payload = val;
    }
    if let Some(val) = env_value("DIAGNOSTICS_STATUS_SAMPLE_BYTES", "byte count")? {
        config.diagnostics.status_sample_bytes = val;
    }

    if let Some(val) = env_value::<String>("CLASSIFIER_GRANULARITY", "granularity")? {
        config.classifier.granularity = match val.to_lowercase().as_str() {
            "fine" => Granularity::Fine,
            "coarse" => Granularity::Coarse,
            _ => {
                return Err(ConfigError::env(
                    format!("{ENV_PREFIX}_CLASSIFIER_GRANULARITY"),
                    "expected \"fine\" or \"coarse\"",
                ))
            }
        };
    }

    if let Some(val) = env_value::<String>("LOGGING_LEVEL", "level")? {
        config.logging.level = val;
    }
    if let Some(val) = env_value::<String>("LOGGING_FORMAT", "format")? {
        config.logging.format = match val.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => {
                return Err(ConfigError::env(
                    format!("{ENV_PREFIX}_LOGGING_FORMAT"),
                    "expected \"pretty\" or \"compact\"",
                ))
            }
        };
    }
    if let Some(val) = env_value::<String>("LOGGING_TO_FILE", "flag")? {
        config.logging.to_file = val.eq_ignore_ascii_case("true") || val == "1";
    }
    if let Some(val) = env_value::<PathBuf>("LOGGING_DIRECTORY", "path")? {
        config.logging.directory = Some(val);
    }

    Ok(())
}
