//! Complete workflows: enumerate -> check every port -> run tests -> reopen.
//!
//! These tests verify:
//! - The status sweep keeps input order and isolates failing ports
//! - Every diagnostic releases its port, whatever the outcome
//! - Error code lookup from a loaded configuration

use crate::common::{create_loopback_port, TestBench};
use com_monitor::config::{Config, ConfigLoader};
use com_monitor::diagnostics::{
    lookup_error_code, run_all_diagnostics, Diagnostics, StatusCategory, TestOutcome,
    UNRECOGNIZED_CODE,
};
use com_monitor::port::{EchoMode, MockOpenFailure, MockSerialPort, PortOpener};
use pretty_assertions::assert_eq;
use std::io;
use std::time::Duration;

#[test]
fn test_sweep_with_failing_middle_port() {
    let (engine, ports) = TestBench::new()
        .port(MockSerialPort::new("COM1"))
        .failing_port("COM2", MockOpenFailure::Busy)
        .port(MockSerialPort::new("COM3"))
        .build();

    let results = run_all_diagnostics(&engine, &ports);

    assert_eq!(results.len(), 3);
    let summary: Vec<_> = results
        .iter()
        .map(|(port, status)| (port.device.as_str(), status.category))
        .collect();
    assert_eq!(
        summary,
        [
            ("COM1", StatusCategory::ReadyToUse),
            ("COM2", StatusCategory::InUseOrBlocked),
            ("COM3", StatusCategory::ReadyToUse),
        ]
    );
    assert!(!engine.opener().is_held("COM1"));
    assert!(!engine.opener().is_held("COM3"));
}

#[test]
fn test_sweep_of_no_ports_is_empty() {
    let (engine, ports) = TestBench::new().build();
    assert!(run_all_diagnostics(&engine, &ports).is_empty());
}

#[test]
fn test_port_reopens_after_every_outcome() {
    let mut flaky = create_loopback_port("COM3", EchoMode::Perfect);
    flaky.fail_after_writes(1, io::ErrorKind::BrokenPipe);

    let (engine, ports) = TestBench::new()
        .port(create_loopback_port("COM1", EchoMode::Perfect))
        .port(MockSerialPort::new("COM2"))
        .port(flaky)
        .build();

    let passed = engine.run_loopback(&ports[0]);
    let failed = engine.run_loopback(&ports[1]);
    assert_eq!(passed.outcome, TestOutcome::Passed);
    assert_eq!(failed.outcome, TestOutcome::Failed);

    let errored = engine.run_stress(&ports[2], Duration::from_secs(2));
    assert_eq!(errored.outcome, TestOutcome::ErroredOut);

    let opener = engine.opener();
    for port in &ports {
        assert!(!opener.is_held(&port.device), "{} still held", port.device);
        let reopened = opener.open(&port.device, &engine.settings().port);
        assert!(reopened.is_ok(), "{} could not be reopened", port.device);
    }
}

#[test]
fn test_status_then_loopback_then_stress_on_one_port() {
    let mut port = create_loopback_port("COM1", EchoMode::Perfect);
    port.set_latency(Duration::from_millis(1));
    let (engine, ports) = TestBench::new().port(port).build();
    let target = &ports[0];

    assert_eq!(engine.classify_status(target).category, StatusCategory::ReadyToUse);
    assert!(engine.run_loopback(target).passed());
    assert!(engine.run_stress(target, Duration::from_millis(200)).passed());
    assert_eq!(engine.opener().open_count("COM1"), 3);
    assert!(!engine.opener().is_held("COM1"));
}

#[test]
fn test_lookup_is_total() {
    let table = Config::default().error_code_table().unwrap();

    assert_eq!(lookup_error_code(-1, &table), UNRECOGNIZED_CODE);
    assert_eq!(lookup_error_code(999_999, &table), UNRECOGNIZED_CODE);
    assert_eq!(
        lookup_error_code(999_999, &table),
        lookup_error_code(999_999, &table)
    );
    assert_ne!(lookup_error_code(5, &table), UNRECOGNIZED_CODE);
}

#[test]
fn test_engine_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("com_monitor.toml");
    std::fs::write(
        &path,
        r#"
            [serial]
            read_timeout_ms = 50

            [diagnostics]
            loopback_payload = "PING"
            status_sample_bytes = 0

            [error_codes]
            "7" = "Lucky seven"
        "#,
    )
    .unwrap();

    let config = ConfigLoader::load_from(&path).unwrap().into_config();
    let settings = config.engine_settings().unwrap();
    assert_eq!(settings.read_timeout(), Duration::from_millis(50));
    assert_eq!(settings.loopback_payload, b"PING");

    let table = config.error_code_table().unwrap();
    assert_eq!(lookup_error_code(7, &table), "Lucky seven");
    assert_eq!(lookup_error_code(5, &table), UNRECOGNIZED_CODE);

    let port = create_loopback_port("COM1", EchoMode::Perfect);
    let probe = port.clone();
    let (engine, ports) = TestBench::new()
        .port(port)
        .settings(move |s| *s = settings)
        .build();
    assert!(engine.run_loopback(&ports[0]).passed());
    assert_eq!(probe.get_write_log(), vec![b"PING".to_vec()]);
}
