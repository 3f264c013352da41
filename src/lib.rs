//! COM Monitor Library
//!
//! Serial port diagnostics: enumerate the ports on the machine, classify why
//! a port can or cannot be opened, run loopback and stress integrity tests,
//! and translate numeric error codes into descriptions.
//!
//! # Modules
//!
//! - `port`: Port abstraction layer, enumeration and the in-memory mock
//! - `diagnostics`: Status classifier, loopback and stress tests, orchestrator
//! - `config`: Configuration management with TOML support
//! - `logging`: Tracing subscriber setup with per-session log files
//! - `error`: Application-level error handling
//!
//! # Example
//!
//! ```rust
//! use com_monitor::{DiagnosticEngine, Diagnostics, EngineSettings};
//! use com_monitor::{MockPortOpener, MockSerialPort, PortInfo};
//!
//! let opener = MockPortOpener::new().with_port("COM3", MockSerialPort::echo("COM3"));
//! let engine = DiagnosticEngine::new(opener, EngineSettings::default());
//!
//! let result = engine.run_loopback(&PortInfo::from_device("COM3"));
//! assert!(result.passed());
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod port;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
pub use diagnostics::{
    lookup_error_code, run_all_diagnostics, CancelToken, Classifier, DiagnosticEngine,
    DiagnosticKind, DiagnosticReport, Diagnostics, EngineSettings, ErrorCodeTable, Granularity,
    PortStatus, StatusCategory, TestKind, TestOutcome, TestResult,
};
pub use error::{AppError, AppResult};
pub use port::{
    enumerate_ports, select_port, DataBits, EchoMode, FlowControl, MockPortOpener, MockSerialPort,
    Parity, PortConfiguration, PortError, PortInfo, PortOpener, SerialPortAdapter, StopBits,
    SyncSerialPort, SystemPortOpener,
};
