//! Structured results of the integrity tests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which integrity test produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Loopback,
    Stress,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loopback => f.write_str("Loopback"),
            Self::Stress => f.write_str("Stress"),
        }
    }
}

/// Verdict of an integrity test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    /// The link answered, but not with what was sent.
    Failed,
    /// A device-level failure stopped the test.
    ErroredOut,
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("PASSED"),
            Self::Failed => f.write_str("FAILED"),
            Self::ErroredOut => f.write_str("ERRORED OUT"),
        }
    }
}

/// Result of one loopback or stress run. Never mutated after it is returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub port_device: String,
    pub kind: TestKind,
    pub outcome: TestOutcome,
    /// Mismatched blocks (stress) or 1 for a mismatched loopback.
    pub error_count: u64,
    /// Bytes written to the port.
    pub bytes_exchanged: u64,
    pub bytes_read: u64,
    pub iterations: u64,
    pub elapsed: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.outcome == TestOutcome::Passed
    }

    /// A test that never got a handle to run against.
    pub(crate) fn open_failed(port_device: &str, kind: TestKind, detail: String) -> Self {
        Tally::new(port_device, kind).finish(TestOutcome::ErroredOut, Duration::ZERO, Some(detail))
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} test on {}: {} ({} errors, {} bytes written, {} bytes read",
            self.kind,
            self.port_device,
            self.outcome,
            self.error_count,
            self.bytes_exchanged,
            self.bytes_read
        )?;
        if self.kind == TestKind::Stress {
            write!(f, ", {} iterations", self.iterations)?;
        }
        write!(f, ", {:.2?})", self.elapsed)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        if self.cancelled {
            f.write_str(" [cancelled]")?;
        }
        Ok(())
    }
}

/// Running counters of a test in progress.
#[derive(Debug, Clone)]
pub(crate) struct Tally {
    port_device: String,
    kind: TestKind,
    pub error_count: u64,
    pub bytes_exchanged: u64,
    pub bytes_read: u64,
    pub iterations: u64,
    pub cancelled: bool,
}

impl Tally {
    pub fn new(port_device: &str, kind: TestKind) -> Self {
        Self {
            port_device: port_device.to_string(),
            kind,
            error_count: 0,
            bytes_exchanged: 0,
            bytes_read: 0,
            iterations: 0,
            cancelled: false,
        }
    }

    pub fn finish(self, outcome: TestOutcome, elapsed: Duration, detail: Option<String>) -> TestResult {
        TestResult {
            port_device: self.port_device,
            kind: self.kind,
            outcome,
            error_count: self.error_count,
            bytes_exchanged: self.bytes_exchanged,
            bytes_read: self.bytes_read,
            iterations: self.iterations,
            elapsed,
            detail,
            cancelled: self.cancelled,
        }
    }
}
