//! Port diagnostics engine.
//!
//! Classifies why a port can or cannot be opened and runs the loopback and
//! stress integrity tests against it.
//!
//! ```text
//! PortOpener ──> DiagnosticEngine ──┬─> classifier   (status)
//!                                   ├─> loopback     (one round trip)
//!                                   └─> stress       (timed soak)
//! run_all_diagnostics ──> classify_status per port, in order
//! ```

pub mod classifier;
pub mod engine;
pub mod error_codes;
mod exchange;
pub mod loopback;
pub mod orchestrator;
pub mod outcome;
pub mod stress;

pub use classifier::{
    platform_os_codes, Classifier, Granularity, OpenAttemptOutcome, PortStatus, StatusCategory,
};
pub use engine::{DiagnosticEngine, DiagnosticKind, DiagnosticReport, Diagnostics, EngineSettings};
pub use error_codes::{default_error_codes, lookup_error_code, ErrorCodeTable, UNRECOGNIZED_CODE};
pub use loopback::{run_loopback, DEFAULT_LOOPBACK_PAYLOAD};
pub use orchestrator::run_all_diagnostics;
pub use outcome::{TestKind, TestOutcome, TestResult};
pub use stress::{
    run_stress, stress_block, CancelToken, DEFAULT_STRESS_DURATION, DEFAULT_STRESS_PATTERN,
    DEFAULT_STRESS_REPEAT,
};
