//! Shared test utilities for the diagnostics tests.
//!
//! This module provides common test infrastructure including:
//! - Mock port creation with pre-programmed responses
//! - A bench that wires mock devices into a `DiagnosticEngine`
//! - JSON assertion helpers

#![allow(dead_code)]

use com_monitor::diagnostics::{DiagnosticEngine, EngineSettings};
use com_monitor::port::{
    EchoMode, MockOpenFailure, MockPortOpener, MockSerialPort, PortConfiguration, PortInfo,
};
use serde_json::Value;
use std::time::Duration;

/// Per-read timeout used by the mock benches; short so silent ports fail fast.
pub const TEST_READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Create a mock serial port with pre-programmed responses.
///
/// # Example
/// ```ignore
/// let mock = create_mock_port_with_responses("MOCK0", vec![b"OK\r\n", b"READY\r\n"]);
/// ```
pub fn create_mock_port_with_responses(port_name: &str, responses: Vec<&[u8]>) -> MockSerialPort {
    let mut mock = MockSerialPort::new(port_name);
    for response in responses {
        mock.enqueue_read(response);
    }
    mock
}

/// Create a mock port wired as a loopback plug with the given echo behavior.
pub fn create_loopback_port(port_name: &str, echo: EchoMode) -> MockSerialPort {
    let mut mock = MockSerialPort::new(port_name);
    mock.set_echo(echo);
    mock
}

/// Engine settings tuned for mocks: short timeout, no status sampling.
pub fn fast_settings() -> EngineSettings {
    EngineSettings {
        port: PortConfiguration::default().with_timeout(TEST_READ_TIMEOUT),
        status_sample_bytes: 0,
        ..EngineSettings::default()
    }
}

/// Builder for a diagnostic engine over mock devices.
pub struct TestBench {
    opener: MockPortOpener,
    settings: EngineSettings,
    ports: Vec<PortInfo>,
}

impl TestBench {
    pub fn new() -> Self {
        Self {
            opener: MockPortOpener::new(),
            settings: fast_settings(),
            ports: Vec::new(),
        }
    }

    /// Register a device that opens and behaves like `port`.
    pub fn port(mut self, port: MockSerialPort) -> Self {
        let device = com_monitor::SerialPortAdapter::name(&port).to_string();
        self.ports.push(PortInfo::from_device(device.clone()));
        self.opener = self.opener.with_port(device, port);
        self
    }

    /// Register a device whose open always fails.
    pub fn failing_port(mut self, device: &str, failure: MockOpenFailure) -> Self {
        self.ports.push(PortInfo::from_device(device));
        self.opener = self.opener.with_failure(device, failure);
        self
    }

    pub fn settings(mut self, f: impl FnOnce(&mut EngineSettings)) -> Self {
        f(&mut self.settings);
        self
    }

    /// Ports in registration order, as an enumeration would list them.
    pub fn build(self) -> (DiagnosticEngine<MockPortOpener>, Vec<PortInfo>) {
        (DiagnosticEngine::new(self.opener, self.settings), self.ports)
    }
}

impl Default for TestBench {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert that a JSON value contains specific fields with expected values.
///
/// # Example
/// ```ignore
/// let actual = json!({"outcome": "passed", "port_device": "COM1"});
/// let expected = json!({"outcome": "passed"});
/// assert_json_contains(&actual, &expected); // Passes - actual contains all of expected
/// ```
pub fn assert_json_contains(actual: &Value, expected: &Value) {
    match (actual, expected) {
        (Value::Object(actual_map), Value::Object(expected_map)) => {
            for (key, expected_value) in expected_map {
                let actual_value = actual_map
                    .get(key)
                    .unwrap_or_else(|| panic!("Expected key '{}' not found in actual JSON", key));
                assert_json_contains(actual_value, expected_value);
            }
        }
        (Value::Array(actual_arr), Value::Array(expected_arr)) => {
            assert_eq!(actual_arr.len(), expected_arr.len(), "Array lengths differ");
            for (actual_item, expected_item) in actual_arr.iter().zip(expected_arr.iter()) {
                assert_json_contains(actual_item, expected_item);
            }
        }
        _ => {
            assert_eq!(
                actual, expected,
                "JSON values differ: expected {:?}, got {:?}",
                expected, actual
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use com_monitor::SerialPortAdapter;

    #[test]
    fn test_create_mock_port_with_responses() {
        let mut mock = create_mock_port_with_responses("MOCK0", vec![b"Hello", b"World"]);

        let mut buf = [0u8; 5];
        let n = mock.read_bytes(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"Hello");

        let n = mock.read_bytes(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"World");
    }

    #[test]
    fn test_assert_json_contains_object() {
        let actual = serde_json::json!({
            "outcome": "passed",
            "port_device": "COM1",
            "extra": "data"
        });
        let expected = serde_json::json!({
            "outcome": "passed",
            "port_device": "COM1"
        });

        assert_json_contains(&actual, &expected);
    }

    #[test]
    #[should_panic(expected = "Expected key 'missing' not found")]
    fn test_assert_json_contains_missing_key() {
        let actual = serde_json::json!({"outcome": "passed"});
        let expected = serde_json::json!({"missing": "key"});

        assert_json_contains(&actual, &expected);
    }

    #[test]
    fn test_bench_keeps_registration_order() {
        let (_, ports) = TestBench::new()
            .port(MockSerialPort::new("B"))
            .failing_port("A", MockOpenFailure::Busy)
            .build();
        let devices: Vec<_> = ports.iter().map(|p| p.device.as_str()).collect();
        assert_eq!(devices, ["B", "A"]);
    }
}
