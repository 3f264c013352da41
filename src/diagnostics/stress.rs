//! Duration-bounded soak test.
//!
//! Repeats block-sized loopback exchanges until the requested duration has
//! elapsed and counts the blocks that did not come back intact.

use super::exchange::{read_block, write_block};
use super::outcome::{Tally, TestKind, TestOutcome, TestResult};
use crate::port::SerialPortAdapter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Pattern repeated to build the default stress block.
pub const DEFAULT_STRESS_PATTERN: &[u8] = b"0123456789ABCDEF";

/// Repetitions of the pattern per block (1024 bytes by default).
pub const DEFAULT_STRESS_REPEAT: usize = 64;

/// Default length of a stress run.
pub const DEFAULT_STRESS_DURATION: Duration = Duration::from_secs(10);

/// Build a stress block by repeating `pattern`.
pub fn stress_block(pattern: &[u8], repeat: usize) -> Vec<u8> {
    pattern.repeat(repeat)
}

/// Cooperative stop signal for long-running tests.
///
/// Clones share the same flag. A token that is never cancelled has no effect
/// on a run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Run the stress test on an open port.
///
/// Partial or missing read-backs count as errors and the loop carries on; a
/// device failure stops it with `ErroredOut`, keeping the counts gathered so
/// far. A cancelled run stops at the next block boundary and reports `Failed`,
/// as does a run that exchanged no blocks at all.
pub fn run_stress<P>(
    port: &mut P,
    block: &[u8],
    duration: Duration,
    read_timeout: Duration,
    cancel: &CancelToken,
) -> TestResult
where
    P: SerialPortAdapter + ?Sized,
{
    let started = Instant::now();
    let mut tally = Tally::new(port.name(), TestKind::Stress);

    info!(
        port = port.name(),
        block_len = block.len(),
        duration = ?duration,
        "stress test started"
    );

    if let Err(e) = port.clear_buffers() {
        warn!(port = port.name(), error = %e, "stress: could not clear buffers");
        return tally.finish(TestOutcome::ErroredOut, started.elapsed(), Some(e.to_string()));
    }

    while started.elapsed() < duration {
        if cancel.is_cancelled() {
            tally.cancelled = true;
            info!(port = port.name(), iterations = tally.iterations, "stress test cancelled");
            break;
        }

        match write_block(port, block) {
            Ok(n) => tally.bytes_exchanged += n as u64,
            Err(e) => {
                tally.bytes_exchanged += e.written as u64;
                return abort(tally, started, port.name(), e.to_string());
            }
        }

        let received = match read_block(port, block.len(), read_timeout) {
            Ok(data) => data,
            Err(e) => return abort(tally, started, port.name(), e.to_string()),
        };
        tally.bytes_read += received.len() as u64;
        tally.iterations += 1;

        if received != block {
            tally.error_count += 1;
            debug!(
                port = port.name(),
                iteration = tally.iterations,
                received = received.len(),
                expected = block.len(),
                "stress block mismatch"
            );
            // Drop any late bytes so the next block starts clean.
            if let Err(e) = port.clear_buffers() {
                return abort(tally, started, port.name(), e.to_string());
            }
        }
    }

    let elapsed = started.elapsed();
    let (outcome, detail) = if tally.iterations == 0 {
        (TestOutcome::Failed, Some("no blocks exchanged".to_string()))
    } else if tally.cancelled {
        (
            TestOutcome::Failed,
            Some(format!("cancelled after {:.2?} of {:.2?}", elapsed, duration)),
        )
    } else if tally.error_count == 0 {
        (TestOutcome::Passed, None)
    } else {
        (TestOutcome::Failed, None)
    };

    if outcome == TestOutcome::Passed {
        info!(
            port = port.name(),
            iterations = tally.iterations,
            bytes = tally.bytes_exchanged,
            "stress test passed"
        );
    } else {
        warn!(
            port = port.name(),
            iterations = tally.iterations,
            errors = tally.error_count,
            cancelled = tally.cancelled,
            "stress test failed"
        );
    }

    tally.finish(outcome, elapsed, detail)
}

fn abort(tally: Tally, started: Instant, port: &str, detail: String) -> TestResult {
    warn!(
        port,
        iterations = tally.iterations,
        errors = tally.error_count,
        error = %detail,
        "stress test aborted by device failure"
    );
    tally.finish(TestOutcome::ErroredOut, started.elapsed(), Some(detail))
}
