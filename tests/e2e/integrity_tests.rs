//! Loopback and stress tests through the engine against mock loopback plugs.

use crate::common::{assert_json_contains, create_loopback_port, TestBench};
use com_monitor::diagnostics::{
    CancelToken, DiagnosticKind, DiagnosticReport, Diagnostics, TestKind, TestOutcome,
};
use com_monitor::port::{EchoMode, MockOpenFailure, MockSerialPort};
use pretty_assertions::assert_eq;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

/// Perfect echo paced at roughly one block per millisecond.
fn paced_echo(name: &str, echo: EchoMode) -> MockSerialPort {
    let mut port = create_loopback_port(name, echo);
    port.set_latency(Duration::from_millis(1));
    port
}

#[test]
fn test_loopback_with_echo_passes() {
    let port = create_loopback_port("COM1", EchoMode::Perfect);
    let probe = port.clone();
    let (engine, ports) = TestBench::new().port(port).build();

    let result = engine.run_loopback(&ports[0]);
    assert_eq!(result.outcome, TestOutcome::Passed);
    assert_eq!(result.kind, TestKind::Loopback);
    assert_eq!(result.bytes_exchanged, b"COMMonitor loopback test".len() as u64);
    assert_eq!(probe.get_write_log(), vec![b"COMMonitor loopback test".to_vec()]);
}

#[test]
fn test_loopback_with_corruption_fails() {
    let (engine, ports) = TestBench::new()
        .port(create_loopback_port("COM1", EchoMode::CorruptEvery(1)))
        .build();

    let result = engine.run_loopback(&ports[0]);
    assert_eq!(result.outcome, TestOutcome::Failed);
    assert_eq!(result.error_count, 1);
}

#[test]
fn test_loopback_without_plug_fails() {
    let (engine, ports) = TestBench::new().port(MockSerialPort::new("COM1")).build();

    let result = engine.run_loopback(&ports[0]);
    assert_eq!(result.outcome, TestOutcome::Failed);
    assert_eq!(result.bytes_read, 0);
}

#[test]
fn test_loopback_short_echo_fails() {
    let (engine, ports) = TestBench::new()
        .port(create_loopback_port("COM1", EchoMode::Truncate(4)))
        .build();

    let result = engine.run_loopback(&ports[0]);
    assert_eq!(result.outcome, TestOutcome::Failed);
    assert_eq!(result.bytes_read, 4);
}

#[test]
fn test_loopback_on_unopenable_port_errors_out() {
    let (engine, ports) = TestBench::new()
        .failing_port("COM7", MockOpenFailure::Busy)
        .build();

    let result = engine.run_loopback(&ports[0]);
    assert_eq!(result.outcome, TestOutcome::ErroredOut);
    assert!(result
        .detail
        .as_deref()
        .is_some_and(|d| d.starts_with("open failed")));
}

#[test]
fn test_loopback_uses_configured_payload() {
    let port = create_loopback_port("COM1", EchoMode::Perfect);
    let probe = port.clone();
    let (engine, ports) = TestBench::new()
        .port(port)
        .settings(|s| s.loopback_payload = b"AT\r\n".to_vec())
        .build();

    assert!(engine.run_loopback(&ports[0]).passed());
    assert_eq!(probe.get_write_log(), vec![b"AT\r\n".to_vec()]);
}

#[test]
fn test_stress_with_perfect_echo_passes() {
    let (engine, ports) = TestBench::new()
        .port(paced_echo("COM1", EchoMode::Perfect))
        .build();
    let duration = Duration::from_secs(1);

    let result = engine.run_stress(&ports[0], duration);
    assert_eq!(result.outcome, TestOutcome::Passed);
    assert_eq!(result.error_count, 0);
    assert!(result.iterations > 0);
    assert_eq!(result.bytes_exchanged, result.iterations * 1024);
    assert!(result.elapsed >= duration);
    assert!(result.elapsed < duration + Duration::from_millis(500));
}

#[test]
fn test_stress_with_periodic_corruption_fails() {
    let (engine, ports) = TestBench::new()
        .port(paced_echo("COM1", EchoMode::CorruptEvery(10)))
        .build();

    let result = engine.run_stress(&ports[0], Duration::from_millis(500));
    assert_eq!(result.outcome, TestOutcome::Failed);
    assert!(result.iterations >= 10);
    assert_eq!(result.error_count, result.iterations / 10);
}

#[test]
fn test_stress_silent_line_counts_every_block() {
    let (engine, ports) = TestBench::new()
        .port(paced_echo("COM1", EchoMode::Silent))
        .build();

    let result = engine.run_stress(&ports[0], Duration::from_millis(200));
    assert_eq!(result.outcome, TestOutcome::Failed);
    assert_eq!(result.error_count, result.iterations);
    assert_eq!(result.bytes_read, 0);
}

#[test]
fn test_stress_device_loss_keeps_partial_counts() {
    let mut port = paced_echo("COM1", EchoMode::Perfect);
    port.fail_after_writes(5, io::ErrorKind::BrokenPipe);
    let (engine, ports) = TestBench::new().port(port).build();

    let result = engine.run_stress(&ports[0], Duration::from_secs(5));
    assert_eq!(result.outcome, TestOutcome::ErroredOut);
    assert_eq!(result.iterations, 5);
    assert_eq!(result.bytes_exchanged, 5 * 1024);
    assert!(result.elapsed < Duration::from_secs(5));
}

#[test]
fn test_stress_device_loss_inside_a_block_keeps_written_bytes() {
    let mut port = paced_echo("COM1", EchoMode::Perfect);
    port.set_max_write(256);
    port.fail_after_writes(6, io::ErrorKind::BrokenPipe);
    let (engine, ports) = TestBench::new().port(port).build();

    let result = engine.run_stress(&ports[0], Duration::from_secs(5));
    assert_eq!(result.outcome, TestOutcome::ErroredOut);
    assert_eq!(result.iterations, 1);
    assert_eq!(result.bytes_exchanged, 1024 + 2 * 256);
}

#[test]
fn test_stress_cancellation_stops_early() {
    let cancel = CancelToken::new();
    let (engine, ports) = TestBench::new()
        .port(paced_echo("COM1", EchoMode::Perfect))
        .build();
    let engine = engine.with_cancel(cancel.clone());

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        cancel.cancel();
    });

    let started = Instant::now();
    let result = engine.run_stress(&ports[0], Duration::from_secs(30));
    canceller.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(result.cancelled);
    assert!(result.iterations > 0);
    assert_eq!(result.outcome, TestOutcome::Failed);
}

#[test]
fn test_stress_cancelled_before_first_block_is_unhealthy() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let (engine, ports) = TestBench::new()
        .port(paced_echo("COM1", EchoMode::Perfect))
        .build();
    let engine = engine.with_cancel(cancel);

    let report = DiagnosticKind::Stress {
        duration: Duration::from_secs(10),
    }
    .run(&engine, &ports[0]);

    assert!(!report.is_healthy());
    match report {
        DiagnosticReport::Test(result) => {
            assert_eq!(result.iterations, 0);
            assert_eq!(result.bytes_exchanged, 0);
            assert_eq!(result.outcome, TestOutcome::Failed);
        }
        other => panic!("expected a test report, got {other:?}"),
    }
}

#[test]
fn test_stress_dispatch_serializes_to_json() {
    let (engine, ports) = TestBench::new()
        .port(paced_echo("COM1", EchoMode::Perfect))
        .build();

    let report = DiagnosticKind::Stress {
        duration: Duration::from_millis(100),
    }
    .run(&engine, &ports[0]);
    assert!(matches!(report, DiagnosticReport::Test(_)));

    let json = serde_json::to_value(&report).unwrap();
    assert_json_contains(
        &json,
        &serde_json::json!({
            "report": "test",
            "port_device": "COM1",
            "kind": "stress",
            "outcome": "passed",
            "error_count": 0
        }),
    );
}
