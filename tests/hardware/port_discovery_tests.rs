//! Port discovery and enumeration tests.
//!
//! These tests don't require specific hardware but will use any available
//! ports on the system. They are still marked as ignored because they require
//! at least some serial hardware to be meaningful.

use com_monitor::diagnostics::run_all_diagnostics;
use com_monitor::port::select_port;
use std::collections::HashSet;

use crate::hardware::utils::{discover_available_ports, print_available_ports, TestPortConfig};

#[test]
#[ignore] // Requires hardware
fn test_port_discovery() {
    println!("Testing port discovery...");

    let ports = discover_available_ports();

    if ports.is_empty() {
        println!("⚠️  No ports found - skipping test");
        println!("   This test requires at least one serial port");
        return;
    }

    print_available_ports();
    for port in &ports {
        assert!(!port.device.is_empty());
        assert!(!port.name.is_empty());
    }
}

#[test]
#[ignore]
fn test_devices_are_unique() {
    let ports = discover_available_ports();
    let devices: HashSet<_> = ports.iter().map(|p| p.device.as_str()).collect();
    assert_eq!(devices.len(), ports.len(), "duplicate device in enumeration");
}

#[test]
#[ignore]
fn test_select_by_index_matches_listing() {
    let ports = discover_available_ports();
    for (i, port) in ports.iter().enumerate() {
        let chosen = select_port(&ports, &(i + 1).to_string());
        assert_eq!(chosen.as_ref(), Some(port));
    }
    assert_eq!(select_port(&ports, &(ports.len() + 1).to_string()), None);
}

#[test]
#[ignore]
fn test_status_sweep_covers_every_port() {
    let Some(test) = TestPortConfig::from_env() else {
        println!("⏭️  Skipping: TEST_PORT not set");
        return;
    };

    let ports = discover_available_ports();
    let results = run_all_diagnostics(&test.engine(), &ports);

    assert_eq!(results.len(), ports.len());
    for ((port, status), listed) in results.iter().zip(&ports) {
        println!("Port {} is {}.", port.name, status);
        assert_eq!(port, listed);
    }
}
