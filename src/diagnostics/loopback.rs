//! Single round-trip integrity check.
//!
//! Writes a payload once and expects the same bytes back, as seen through a
//! wired loopback plug (TX tied to RX). There are no retries.

use super::exchange::{read_block, write_block};
use super::outcome::{Tally, TestKind, TestOutcome, TestResult};
use crate::port::SerialPortAdapter;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Payload used when none is configured.
pub const DEFAULT_LOOPBACK_PAYLOAD: &[u8] = b"COMMonitor loopback test";

/// Run one loopback exchange on an open port.
///
/// - `Passed`: the bytes read equal the payload exactly.
/// - `Failed`: fewer or different bytes came back, including none at all.
/// - `ErroredOut`: clearing, writing or reading raised a device failure.
pub fn run_loopback<P>(port: &mut P, payload: &[u8], read_timeout: Duration) -> TestResult
where
    P: SerialPortAdapter + ?Sized,
{
    let started = Instant::now();
    let mut tally = Tally::new(port.name(), TestKind::Loopback);
    tally.iterations = 1;

    if let Err(e) = port.clear_buffers() {
        warn!(port = port.name(), error = %e, "loopback: could not clear buffers");
        tally.iterations = 0;
        return tally.finish(TestOutcome::ErroredOut, started.elapsed(), Some(e.to_string()));
    }

    match write_block(port, payload) {
        Ok(n) => tally.bytes_exchanged = n as u64,
        Err(e) => {
            tally.bytes_exchanged = e.written as u64;
            warn!(port = port.name(), written = e.written, error = %e, "loopback: write failed");
            return tally.finish(TestOutcome::ErroredOut, started.elapsed(), Some(e.to_string()));
        }
    }

    let received = match read_block(port, payload.len(), read_timeout) {
        Ok(data) => data,
        Err(e) => {
            warn!(port = port.name(), error = %e, "loopback: read failed");
            return tally.finish(TestOutcome::ErroredOut, started.elapsed(), Some(e.to_string()));
        }
    };
    tally.bytes_read = received.len() as u64;
    debug!(port = port.name(), sent = ?payload, received = ?received, "loopback exchange");

    if received == payload {
        info!(port = port.name(), bytes = payload.len(), "loopback passed");
        tally.finish(TestOutcome::Passed, started.elapsed(), None)
    } else {
        let detail = if received.is_empty() {
            "no data received before timeout".to_string()
        } else if received.len() < payload.len() {
            format!("received {} of {} bytes", received.len(), payload.len())
        } else {
            match first_difference(payload, &received) {
                Some(at) => format!("data mismatch at byte {at}"),
                None => "data mismatch".to_string(),
            }
        };
        warn!(port = port.name(), %detail, "loopback failed");
        tally.error_count = 1;
        tally.finish(TestOutcome::Failed, started.elapsed(), Some(detail))
    }
}

fn first_difference(expected: &[u8], actual: &[u8]) -> Option<usize> {
    expected.iter().zip(actual).position(|(a, b)| a != b)
}
