//! Status classification of open attempts.
//!
//! A failed open is reduced to a [`FailureSignal`]; the [`Classifier`] maps
//! that signal onto exactly one [`StatusCategory`]. Signal kinds map through a
//! fixed table, raw OS codes through a configurable one.

use crate::port::{FailureSignal, PortError, SignalKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Human-meaningful status of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    ReadyToUse,
    InUseOrBlocked,
    UnavailableOrDisabled,
    HardwareFailure,
    Disconnected,
    InvalidConfiguration,
    /// Coarse fallback for platforms without fine-grained failure codes.
    UnavailableOrInUse,
    UnknownError,
}

impl StatusCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::ReadyToUse => "Ready to Use",
            Self::InUseOrBlocked => "In Use or Blocked",
            Self::UnavailableOrDisabled => "Unavailable or Disabled",
            Self::HardwareFailure => "Hardware Failure",
            Self::Disconnected => "Disconnected",
            Self::InvalidConfiguration => "Invalid Configuration",
            Self::UnavailableOrInUse => "Unavailable or In Use",
            Self::UnknownError => "Unknown Error",
        }
    }

    pub fn is_ready(self) -> bool {
        self == Self::ReadyToUse
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of trying to open a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAttemptOutcome {
    pub succeeded: bool,
    /// Present only when `succeeded` is false.
    pub failure_signal: Option<FailureSignal>,
}

impl OpenAttemptOutcome {
    pub fn success() -> Self {
        Self {
            succeeded: true,
            failure_signal: None,
        }
    }

    pub fn failure(signal: FailureSignal) -> Self {
        Self {
            succeeded: false,
            failure_signal: Some(signal),
        }
    }

    /// Outcome of an open call.
    pub fn from_result<T>(result: &Result<T, PortError>) -> Self {
        match result {
            Ok(_) => Self::success(),
            Err(e) => Self::failure(e.failure_signal()),
        }
    }
}

/// Classified status of a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortStatus {
    pub category: StatusCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Bytes received while sampling a ready port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_len: Option<usize>,
}

impl PortStatus {
    pub fn new(category: StatusCategory) -> Self {
        Self {
            category,
            detail: None,
            sample_len: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({})", self.category, detail),
            None => write!(f, "{}", self.category),
        }
    }
}

/// How much detail the platform's failure signals carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Fine,
    /// Every failure collapses to [`StatusCategory::UnavailableOrInUse`].
    Coarse,
}

/// Maps open attempts to port statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    granularity: Granularity,
    os_codes: HashMap<i32, StatusCategory>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Granularity::Fine, platform_os_codes())
    }
}

impl Classifier {
    pub fn new(granularity: Granularity, os_codes: HashMap<i32, StatusCategory>) -> Self {
        Self {
            granularity,
            os_codes,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Classify an open attempt. Never fails.
    pub fn classify(&self, outcome: &OpenAttemptOutcome) -> PortStatus {
        if outcome.succeeded {
            return PortStatus::new(StatusCategory::ReadyToUse);
        }

        let Some(signal) = &outcome.failure_signal else {
            let category = match self.granularity {
                Granularity::Fine => StatusCategory::UnknownError,
                Granularity::Coarse => StatusCategory::UnavailableOrInUse,
            };
            return PortStatus::new(category);
        };

        let category = match self.granularity {
            Granularity::Coarse => StatusCategory::UnavailableOrInUse,
            Granularity::Fine => kind_category(signal.kind)
                .or_else(|| signal.os_code.and_then(|code| self.os_codes.get(&code).copied()))
                .unwrap_or(StatusCategory::UnknownError),
        };

        PortStatus::new(category).with_detail(signal.message.clone())
    }
}

/// Fixed association between signal kinds and categories.
fn kind_category(kind: SignalKind) -> Option<StatusCategory> {
    match kind {
        SignalKind::AccessDenied => Some(StatusCategory::InUseOrBlocked),
        SignalKind::NotFound => Some(StatusCategory::UnavailableOrDisabled),
        SignalKind::GeneralFailure => Some(StatusCategory::HardwareFailure),
        SignalKind::NotConnected => Some(StatusCategory::Disconnected),
        SignalKind::InvalidParameter => Some(StatusCategory::InvalidConfiguration),
        SignalKind::Other => None,
    }
}

/// Default OS code table for the build platform.
#[cfg(windows)]
pub fn platform_os_codes() -> HashMap<i32, StatusCategory> {
    use winapi::shared::winerror::{
        ERROR_ACCESS_DENIED, ERROR_DEVICE_NOT_CONNECTED, ERROR_FILE_NOT_FOUND, ERROR_GEN_FAILURE,
        ERROR_INVALID_PARAMETER,
    };

    HashMap::from([
        (ERROR_ACCESS_DENIED as i32, StatusCategory::InUseOrBlocked),
        (ERROR_FILE_NOT_FOUND as i32, StatusCategory::UnavailableOrDisabled),
        (ERROR_GEN_FAILURE as i32, StatusCategory::HardwareFailure),
        (ERROR_DEVICE_NOT_CONNECTED as i32, StatusCategory::Disconnected),
        (ERROR_INVALID_PARAMETER as i32, StatusCategory::InvalidConfiguration),
    ])
}

/// Default OS code table for the build platform.
#[cfg(unix)]
pub fn platform_os_codes() -> HashMap<i32, StatusCategory> {
    HashMap::from([
        (libc::EACCES, StatusCategory::InUseOrBlocked),
        (libc::EBUSY, StatusCategory::InUseOrBlocked),
        (libc::ENOENT, StatusCategory::UnavailableOrDisabled),
        (libc::EIO, StatusCategory::HardwareFailure),
        (libc::ENXIO, StatusCategory::Disconnected),
        (libc::ENODEV, StatusCategory::Disconnected),
        (libc::EINVAL, StatusCategory::InvalidConfiguration),
    ])
}

/// Default OS code table for the build platform.
#[cfg(not(any(unix, windows)))]
pub fn platform_os_codes() -> HashMap<i32, StatusCategory> {
    HashMap::new()
}
