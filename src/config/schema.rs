//! Configuration schema definitions.
//!
//! Every section has serde defaults, so a config file only needs the keys it
//! wants to change. `Config::engine_settings` and `Config::error_code_table`
//! turn the loaded values into the types the diagnostics consume.

use super::error::{ConfigError, ConfigResult};
use crate::diagnostics::{
    default_error_codes, platform_os_codes, stress_block, Classifier, EngineSettings,
    ErrorCodeTable, Granularity, StatusCategory, DEFAULT_LOOPBACK_PAYLOAD,
    DEFAULT_STRESS_DURATION, DEFAULT_STRESS_PATTERN, DEFAULT_STRESS_REPEAT,
};
use crate::port::{DataBits, FlowControl, Parity, PortConfiguration, StopBits};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub diagnostics: DiagnosticsConfig,
    pub classifier: ClassifierConfig,
    /// Error code descriptions, keyed by the code as a string.
    pub error_codes: BTreeMap<String, String>,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            classifier: ClassifierConfig::default(),
            error_codes: default_error_code_entries(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Check every section; the first problem found is reported.
    pub fn validate(&self) -> ConfigResult<()> {
        self.serial.validate()?;
        self.diagnostics.validate()?;
        self.classifier.os_code_table()?;
        self.error_code_table()?;
        Ok(())
    }

    /// Settings for the diagnostic engine.
    pub fn engine_settings(&self) -> ConfigResult<EngineSettings> {
        self.validate()?;
        Ok(EngineSettings {
            port: self.serial.port_configuration(),
            loopback_payload: self.diagnostics.loopback_payload.as_bytes().to_vec(),
            stress_block: stress_block(
                self.diagnostics.stress_pattern.as_bytes(),
                self.diagnostics.stress_repeat,
            ),
            stress_duration: self.diagnostics.stress_duration(),
            status_sample_bytes: self.diagnostics.status_sample_bytes,
            classifier: Classifier::new(self.classifier.granularity, self.classifier.os_code_table()?),
        })
    }

    /// The error code table, with keys parsed as integers.
    pub fn error_code_table(&self) -> ConfigResult<ErrorCodeTable> {
        self.error_codes
            .iter()
            .map(|(key, desc)| {
                key.trim()
                    .parse::<i64>()
                    .map(|code| (code, desc.clone()))
                    .map_err(|_| {
                        ConfigError::invalid(format!("error_codes.{key}"), "key must be an integer")
                    })
            })
            .collect()
    }
}

fn default_error_code_entries() -> BTreeMap<String, String> {
    default_error_codes()
        .iter()
        .map(|(code, desc)| (code.to_string(), desc.to_string()))
        .collect()
}

/// `[serial]`: how ports are opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub baud_rate: u32,
    /// Per-read timeout in milliseconds.
    pub read_timeout_ms: u64,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Friendly names for device addresses.
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            read_timeout_ms: 1000,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration {
            baud_rate: self.baud_rate,
            data_bits: self.data_bits,
            flow_control: self.flow_control,
            parity: self.parity,
            stop_bits: self.stop_bits,
            timeout: self.read_timeout(),
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.baud_rate == 0 {
            return Err(ConfigError::invalid("serial.baud_rate", "must be greater than zero"));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "serial.read_timeout_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// `[diagnostics]`: test payloads and durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub stress_duration_secs: u64,
    pub loopback_payload: String,
    pub stress_pattern: String,
    pub stress_repeat: usize,
    /// Bytes read from a port found ready; 0 disables sampling.
    pub status_sample_bytes: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            stress_duration_secs: DEFAULT_STRESS_DURATION.as_secs(),
            loopback_payload: String::from_utf8_lossy(DEFAULT_LOOPBACK_PAYLOAD).into_owned(),
            stress_pattern: String::from_utf8_lossy(DEFAULT_STRESS_PATTERN).into_owned(),
            stress_repeat: DEFAULT_STRESS_REPEAT,
            status_sample_bytes: 100,
        }
    }
}

impl DiagnosticsConfig {
    pub fn stress_duration(&self) -> Duration {
        Duration::from_secs(self.stress_duration_secs)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.stress_duration_secs == 0 {
            return Err(ConfigError::invalid(
                "diagnostics.stress_duration_secs",
                "must be at least one second",
            ));
        }
        if self.loopback_payload.is_empty() {
            return Err(ConfigError::invalid(
                "diagnostics.loopback_payload",
                "must not be empty",
            ));
        }
        if self.stress_pattern.is_empty() || self.stress_repeat == 0 {
            return Err(ConfigError::invalid(
                "diagnostics.stress_pattern",
                "stress block must not be empty",
            ));
        }
        Ok(())
    }
}

/// `[classifier]`: how open failures are categorized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub granularity: Granularity,
    /// Raw OS error code to category. Replaces the platform defaults when set.
    pub os_codes: BTreeMap<String, StatusCategory>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Fine,
            os_codes: platform_os_codes()
                .into_iter()
                .map(|(code, category)| (code.to_string(), category))
                .collect(),
        }
    }
}

impl ClassifierConfig {
    pub fn os_code_table(&self) -> ConfigResult<HashMap<i32, StatusCategory>> {
        self.os_codes
            .iter()
            .map(|(key, category)| {
                key.trim()
                    .parse::<i32>()
                    .map(|code| (code, *category))
                    .map_err(|_| {
                        ConfigError::invalid(
                            format!("classifier.os_codes.{key}"),
                            "key must be an integer",
                        )
                    })
            })
            .collect()
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level filter: "trace", "debug", "info", "warn", "error". `RUST_LOG` wins.
    pub level: String,
    pub format: LogFormat,
    /// Write a timestamped log file for each run.
    pub to_file: bool,
    /// Where log files go; the current directory when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            to_file: true,
            directory: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}
