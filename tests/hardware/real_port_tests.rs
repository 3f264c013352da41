//! Diagnostics against actual serial hardware.
//!
//! These tests are skipped if no hardware is available.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! # Set environment variables
//! export TEST_PORT=COM3                  # or /dev/ttyUSB0 on Linux
//! export TEST_BAUD=9600                  # optional, default: 9600
//! export TEST_LOOPBACK=1                 # if port has TX-RX loopback
//!
//! # Run tests
//! cargo test -- --ignored
//! ```

use com_monitor::diagnostics::{Diagnostics, StatusCategory, TestOutcome};
use com_monitor::port::{PortOpener, SerialPortAdapter, SyncSerialPort};
use std::time::Duration;

use crate::hardware::utils::skip_without_hardware;

#[test]
#[ignore] // Run with --ignored flag
fn test_real_port_status() {
    let Some(test) = skip_without_hardware() else {
        return;
    };

    let engine = test.engine();
    let status = engine.classify_status(&test.port_info());
    println!("Port {} is {}.", test.port_name, status);

    assert_eq!(status.category, StatusCategory::ReadyToUse);
}

#[test]
#[ignore]
fn test_real_port_is_released_after_status() {
    let Some(test) = skip_without_hardware() else {
        return;
    };

    let engine = test.engine();
    let first = engine.classify_status(&test.port_info());
    let second = engine.classify_status(&test.port_info());

    assert_eq!(first.category, second.category);

    let port = SyncSerialPort::open(&test.port_name, &test.to_port_config())
        .expect("port should be free after two status checks");
    assert_eq!(port.name(), test.port_name);
}

#[test]
#[ignore]
fn test_held_port_reports_in_use() {
    let Some(test) = skip_without_hardware() else {
        return;
    };

    // Exclusive access is only enforced by some drivers.
    let engine = test.engine();
    let _held = engine
        .opener()
        .open(&test.port_name, &test.to_port_config())
        .expect("Failed to open port");
    let status = engine.classify_status(&test.port_info());
    println!("While held: {}", status);

    assert!(matches!(
        status.category,
        StatusCategory::InUseOrBlocked | StatusCategory::ReadyToUse
    ));
}

#[test]
#[ignore]
fn test_real_port_loopback() {
    let Some(test) = skip_without_hardware() else {
        return;
    };
    if !test.loopback_enabled {
        println!("⏭️  Skipping loopback test: TEST_LOOPBACK not set to 1");
        return;
    }

    let result = test.engine().run_loopback(&test.port_info());
    println!("{result}");

    assert_eq!(result.outcome, TestOutcome::Passed);
}

#[test]
#[ignore]
fn test_real_port_stress() {
    let Some(test) = skip_without_hardware() else {
        return;
    };
    if !test.loopback_enabled {
        println!("⏭️  Skipping stress test: TEST_LOOPBACK not set to 1");
        return;
    }

    let duration = Duration::from_secs(3);
    let result = test.engine().run_stress(&test.port_info(), duration);
    println!("{result}");

    assert_eq!(result.outcome, TestOutcome::Passed);
    assert!(result.iterations > 0);
    assert!(result.elapsed >= duration);
}
