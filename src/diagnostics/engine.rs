//! Diagnostic entry points.
//!
//! `DiagnosticEngine` owns an explicit settings struct and a `PortOpener`.
//! Every operation opens the port itself and drops the handle before
//! returning, on success and failure paths alike, so a later operation on
//! the same device never finds it still held.

use super::classifier::{Classifier, OpenAttemptOutcome, PortStatus};
use super::exchange::read_block;
use super::loopback::{self, DEFAULT_LOOPBACK_PAYLOAD};
use super::outcome::{TestKind, TestResult};
use super::stress::{self, CancelToken, DEFAULT_STRESS_DURATION, DEFAULT_STRESS_PATTERN, DEFAULT_STRESS_REPEAT};
use crate::port::{PortConfiguration, PortInfo, PortOpener};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Inputs for the diagnostics, normally built from the loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Open parameters; `port.timeout` is the per-read timeout.
    pub port: PortConfiguration,
    pub loopback_payload: Vec<u8>,
    pub stress_block: Vec<u8>,
    pub stress_duration: Duration,
    /// Bytes to sample from a port found ready; 0 skips sampling.
    pub status_sample_bytes: usize,
    pub classifier: Classifier,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            port: PortConfiguration::default(),
            loopback_payload: DEFAULT_LOOPBACK_PAYLOAD.to_vec(),
            stress_block: stress::stress_block(DEFAULT_STRESS_PATTERN, DEFAULT_STRESS_REPEAT),
            stress_duration: DEFAULT_STRESS_DURATION,
            status_sample_bytes: 100,
            classifier: Classifier::default(),
        }
    }
}

impl EngineSettings {
    pub fn read_timeout(&self) -> Duration {
        self.port.timeout
    }
}

/// One operation per diagnostic kind.
pub trait Diagnostics {
    /// Open the port once and classify the outcome.
    fn classify_status(&self, port: &PortInfo) -> PortStatus;

    /// Open the port and run a single loopback exchange.
    fn run_loopback(&self, port: &PortInfo) -> TestResult;

    /// Open the port and run the stress test for `duration`.
    fn run_stress(&self, port: &PortInfo, duration: Duration) -> TestResult;
}

/// The diagnostic to run, chosen once by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Status,
    Loopback,
    Stress { duration: Duration },
}

impl DiagnosticKind {
    pub fn run<D: Diagnostics + ?Sized>(&self, diagnostics: &D, port: &PortInfo) -> DiagnosticReport {
        match *self {
            Self::Status => DiagnosticReport::Status {
                port: port.clone(),
                status: diagnostics.classify_status(port),
            },
            Self::Loopback => DiagnosticReport::Test(diagnostics.run_loopback(port)),
            Self::Stress { duration } => {
                DiagnosticReport::Test(diagnostics.run_stress(port, duration))
            }
        }
    }

    /// Whether this diagnostic stops early when the engine's token is cancelled.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Stress { .. })
    }
}

/// Result of a dispatched diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum DiagnosticReport {
    Status { port: PortInfo, status: PortStatus },
    Test(TestResult),
}

impl DiagnosticReport {
    /// Ready port or passed test.
    pub fn is_healthy(&self) -> bool {
        match self {
            Self::Status { status, .. } => status.category.is_ready(),
            Self::Test(result) => result.passed(),
        }
    }
}

/// Runs diagnostics against ports obtained from an opener.
#[derive(Debug)]
pub struct DiagnosticEngine<O> {
    opener: O,
    settings: EngineSettings,
    cancel: CancelToken,
}

impl<O: PortOpener> DiagnosticEngine<O> {
    pub fn new(opener: O, settings: EngineSettings) -> Self {
        Self {
            opener,
            settings,
            cancel: CancelToken::new(),
        }
    }

    /// Let `cancel` stop stress runs early.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    fn open(&self, port: &PortInfo) -> Result<O::Port, String> {
        self.opener
            .open(&port.device, &self.settings.port)
            .map_err(|e| {
                let status = self
                    .settings
                    .classifier
                    .classify(&OpenAttemptOutcome::failure(e.failure_signal()));
                error!(port = %port.device, status = %status.category, error = %e, "open failed");
                format!("open failed: {}: {}", status.category, e)
            })
    }
}

impl<O: PortOpener> Diagnostics for DiagnosticEngine<O> {
    fn classify_status(&self, port: &PortInfo) -> PortStatus {
        let opened = self.opener.open(&port.device, &self.settings.port);
        let mut status = self
            .settings
            .classifier
            .classify(&OpenAttemptOutcome::from_result(&opened));

        match opened {
            Ok(mut handle) => {
                info!(port = %port.name, "Port {} is {}.", port.name, status.category);
                if self.settings.status_sample_bytes > 0 {
                    match read_block(
                        &mut handle,
                        self.settings.status_sample_bytes,
                        self.settings.read_timeout(),
                    ) {
                        Ok(sample) => {
                            debug!(port = %port.name, bytes = sample.len(), "Data received: {:?}", sample);
                            status.sample_len = Some(sample.len());
                        }
                        Err(e) => warn!(port = %port.name, error = %e, "sampling a ready port failed"),
                    }
                }
            }
            Err(e) => {
                error!(port = %port.name, error = %e, "Port {} is {}.", port.name, status.category);
            }
        }

        log_port_info(port, &status);
        status
    }

    fn run_loopback(&self, port: &PortInfo) -> TestResult {
        debug!(port = %port.device, "loopback requested");
        match self.open(port) {
            Ok(mut handle) => loopback::run_loopback(
                &mut handle,
                &self.settings.loopback_payload,
                self.settings.read_timeout(),
            ),
            Err(detail) => TestResult::open_failed(&port.device, TestKind::Loopback, detail),
        }
    }

    fn run_stress(&self, port: &PortInfo, duration: Duration) -> TestResult {
        debug!(port = %port.device, duration = ?duration, "stress requested");
        match self.open(port) {
            Ok(mut handle) => stress::run_stress(
                &mut handle,
                &self.settings.stress_block,
                duration,
                self.settings.read_timeout(),
                &self.cancel,
            ),
            Err(detail) => TestResult::open_failed(&port.device, TestKind::Stress, detail),
        }
    }
}

fn log_port_info(port: &PortInfo, status: &PortStatus) {
    info!("Port Name: {}", port.name);
    info!("Port Description: {}", port.description);
    info!("Port Status: {}", status.category);
    info!("Port Device: {}", port.device);
    info!("Port HWID: {}", port.hardware_id);
}
