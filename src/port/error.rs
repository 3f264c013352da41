//! Port-specific error types.
//!
//! Defines error types for serial port operations, separate from application-level
//! errors, together with the [`FailureSignal`] that the status classifier consumes.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Port configuration failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The port is held open by someone else.
    #[error("Port is busy: {0}")]
    Busy(String),

    /// The device reported a hardware-level failure.
    #[error("Device failure: {0}")]
    Device(String),

    /// The OS rejected the request with a raw error code.
    #[error("OS error {code}: {message}")]
    Os { code: i32, message: String },

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout(duration)
    }

    /// Create an Os error from a raw code and its description.
    pub fn os(code: i32, message: impl Into<String>) -> Self {
        Self::Os {
            code,
            message: message.into(),
        }
    }

    /// True when the error only means "no data arrived in time".
    ///
    /// Timeouts are a normal outcome for the integrity tests and must not be
    /// confused with a device failure.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
            Self::Serial(e) => matches!(
                e.kind(),
                serialport::ErrorKind::Io(io::ErrorKind::TimedOut)
                    | serialport::ErrorKind::Io(io::ErrorKind::WouldBlock)
            ),
            _ => false,
        }
    }

    /// Describe this error as a platform failure signal for classification.
    pub fn failure_signal(&self) -> FailureSignal {
        let message = self.to_string();
        match self {
            Self::NotFound(_) => FailureSignal::new(SignalKind::NotFound, message),
            Self::Config(_) => FailureSignal::new(SignalKind::InvalidParameter, message),
            Self::Busy(_) => FailureSignal::new(SignalKind::AccessDenied, message),
            Self::Device(_) => FailureSignal::new(SignalKind::GeneralFailure, message),
            Self::Timeout(_) => FailureSignal::new(SignalKind::Other, message),
            Self::Os { code, .. } => FailureSignal::new(SignalKind::Other, message).with_code(*code),
            Self::Io(e) => {
                let signal = FailureSignal::new(SignalKind::from_io(e.kind()), message);
                match e.raw_os_error() {
                    Some(code) => signal.with_code(code),
                    None => signal,
                }
            }
            Self::Serial(e) => {
                let kind = match e.kind() {
                    serialport::ErrorKind::NoDevice => SignalKind::NotFound,
                    serialport::ErrorKind::InvalidInput => SignalKind::InvalidParameter,
                    serialport::ErrorKind::Io(kind) => SignalKind::from_io(kind),
                    serialport::ErrorKind::Unknown => SignalKind::Other,
                };
                FailureSignal::new(kind, message)
            }
        }
    }
}

/// Coarse kind of a platform open failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    AccessDenied,
    NotFound,
    GeneralFailure,
    NotConnected,
    InvalidParameter,
    /// Anything the platform did not describe more precisely.
    Other,
}

impl SignalKind {
    /// Map a std I/O error kind onto a signal kind.
    pub fn from_io(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::PermissionDenied | io::ErrorKind::AddrInUse => Self::AccessDenied,
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof => Self::NotConnected,
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => Self::InvalidParameter,
            _ => Self::Other,
        }
    }
}

/// Platform failure signal produced by a failed open attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSignal {
    pub kind: SignalKind,
    /// Raw OS error code, when the platform supplied one.
    pub os_code: Option<i32>,
    pub message: String,
}

impl FailureSignal {
    pub fn new(kind: SignalKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            os_code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.os_code = Some(code);
        self
    }
}
