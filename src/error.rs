use crate::config::ConfigError;
use crate::port::PortError;
use thiserror::Error;

/// A specialized `Result` type for the command-line front end.
pub type AppResult<T> = Result<T, AppError>;

/// Unified application error type.
///
/// Diagnostic failures on a port are not errors; they come back as
/// `PortStatus` or `TestResult` values. This type covers everything around
/// them: configuration, logging setup, argument resolution and output.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("A serial port error occurred: {0}")]
    Port(#[from] PortError),

    #[error("No port matches '{0}'")]
    InvalidSelection(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No Serial Ports Detected")]
    NoPorts,

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("A serialization error occurred: {0}")]
    Json(#[from] serde_json::Error),

    #[error("An I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("Diagnostic task failed: {0}")]
    Task(String),
}

impl AppError {
    /// Process exit code for this error: 2 for usage and setup problems,
    /// 1 for anything that went wrong while talking to hardware.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_)
            | Self::InvalidSelection(_)
            | Self::InvalidArgument(_)
            | Self::Logging(_) => 2,
            _ => 1,
        }
    }
}
