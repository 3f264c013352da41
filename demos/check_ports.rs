//! Check available serial ports on the system.
//!
//! Lists every port with its hardware id, reports whether each one can be
//! opened, and prints the environment needed to run the hardware tests.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example check_ports
//! ```

use com_monitor::diagnostics::{run_all_diagnostics, DiagnosticEngine, EngineSettings};
use com_monitor::port::{enumerate_ports, SystemPortOpener};

fn main() {
    println!("Serial Port Detection Utility");
    println!("{:=<70}", "");
    println!();

    let ports = match enumerate_ports() {
        Ok(ports) => ports,
        Err(e) => {
            println!("❌ Error detecting serial ports: {}", e);
            println!();
            println!("Possible causes:");
            println!("  - Insufficient permissions");
            println!("  - Serial port drivers not installed");
            return;
        }
    };

    if ports.is_empty() {
        println!("❌ No Serial Ports Detected");
        println!();
        println!("This could mean:");
        println!("  - No serial devices are connected");
        println!("  - USB-to-serial drivers are not installed");
        println!("  - Insufficient permissions to access serial ports");
        return;
    }

    let settings = EngineSettings {
        status_sample_bytes: 0,
        ..EngineSettings::default()
    };
    let engine = DiagnosticEngine::new(SystemPortOpener, settings);

    println!("✅ {} Ports found:", ports.len());
    println!();

    for (idx, (port, status)) in run_all_diagnostics(&engine, &ports).iter().enumerate() {
        println!("{}. {}", idx + 1, port);
        println!("{:-<70}", "");
        println!("   Device: {}", port.device);
        println!("   HWID:   {}", port.hardware_id);
        println!("   Status: {}", status);
        println!();
    }

    println!("{:=<70}", "");
    println!("Hardware Testing Instructions:");
    println!("{:=<70}", "");
    println!();
    println!("  # Windows:");
    println!("  set TEST_PORT={}", ports[0].device);
    println!("  set TEST_LOOPBACK=1   (TX wired to RX)");
    println!("  cargo test -- --ignored");
    println!();
    println!("  # Linux/macOS:");
    println!("  export TEST_PORT={}", ports[0].device);
    println!("  export TEST_LOOPBACK=1");
    println!("  cargo test -- --ignored");
}
