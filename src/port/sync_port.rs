//! Hardware-backed port handle.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own `SerialPortAdapter`
//! trait, and provides the `SystemPortOpener` used outside of tests.

use super::error::PortError;
use super::traits::{PortConfiguration, PortOpener, SerialPortAdapter};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Synchronous serial port implementation wrapping `serialport::SerialPort`.
///
/// The device is closed when the value is dropped.
pub struct SyncSerialPort {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl SyncSerialPort {
    /// Open a serial port with the given configuration.
    ///
    /// # Example
    /// ```no_run
    /// use com_monitor::port::{SyncSerialPort, PortConfiguration};
    ///
    /// let config = PortConfiguration::default();
    /// let port = SyncSerialPort::open("/dev/ttyUSB0", &config)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str, config: &PortConfiguration) -> Result<Self, PortError> {
        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(config.data_bits.into())
            .flow_control(config.flow_control.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .timeout(config.timeout)
            .open()
            .map_err(|e| open_error(port_name, e))?;

        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }
}

/// Translate a failed open into a `PortError`, keeping the OS code when the
/// driver reported a missing device.
///
/// `serialport` folds several Win32 codes (including access denied) into
/// `NoDevice` straight after the failed call, so the raw code is recovered
/// from the thread's last OS error. `Unknown` is also raised without any
/// syscall behind it, where the last OS error is stale, so it is kept as is.
fn open_error(port_name: &str, e: serialport::Error) -> PortError {
    match e.kind() {
        serialport::ErrorKind::InvalidInput => PortError::config(e.description),
        serialport::ErrorKind::Io(kind) => PortError::Io(io::Error::new(kind, e.description)),
        serialport::ErrorKind::NoDevice => match last_os_code() {
            Some(code) => PortError::os(code, e.description),
            None => PortError::not_found(port_name),
        },
        serialport::ErrorKind::Unknown => PortError::Serial(e),
    }
}

fn last_os_code() -> Option<i32> {
    io::Error::last_os_error()
        .raw_os_error()
        .filter(|code| *code != 0)
}

impl SerialPortAdapter for SyncSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.write(data).map_err(PortError::Io)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.port.read(buffer).map_err(PortError::Io)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.port.set_timeout(timeout).map_err(PortError::Serial)
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        self.port
            .clear(serialport::ClearBuffer::All)
            .map_err(PortError::Serial)
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate())
            .finish()
    }
}

/// Opens real devices through the `serialport` driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPortOpener;

impl PortOpener for SystemPortOpener {
    type Port = SyncSerialPort;

    fn open(&self, device: &str, config: &PortConfiguration) -> Result<Self::Port, PortError> {
        SyncSerialPort::open(device, config)
    }
}
