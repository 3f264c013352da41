//! Port abstraction layer for serial communication.
//!
//! Provides the handle and opener traits the diagnostics run against, the
//! hardware implementation, a mock for tests, and port enumeration.

pub mod enumerate;
pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use enumerate::{enumerate_ports, select_port, PortInfo};
pub use error::{FailureSignal, PortError, SignalKind};
pub use mock::{EchoMode, MockOpenFailure, MockPortOpener, MockSerialPort};
pub use sync_port::*;
pub use traits::*;
