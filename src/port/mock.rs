//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates serial port behavior without
//! requiring actual hardware: queued reads, a loopback echo (optionally
//! corrupting), injected device faults, and a `MockPortOpener` that enforces
//! exclusive access the way a real driver does.

use super::error::PortError;
use super::traits::{PortConfiguration, PortOpener, SerialPortAdapter};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Writes beyond this many are counted but not kept in the write log.
const WRITE_LOG_LIMIT: usize = 256;

/// How the mock answers writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoMode {
    /// Nothing comes back unless queued with `enqueue_read`.
    #[default]
    Silent,
    /// Every written byte is returned unchanged, like a wired loopback plug.
    Perfect,
    /// Echo, but flip the first byte of every n-th write.
    CorruptEvery(u64),
    /// Echo only the first n bytes of each write.
    Truncate(usize),
}

#[derive(Debug, Default)]
struct MockPortState {
    read_queue: VecDeque<u8>,
    write_log: Vec<Vec<u8>>,
    write_count: u64,
    bytes_written: u64,
    echo: EchoMode,
    should_timeout: bool,
    timeout: Duration,
    latency: Duration,
    /// Every write after this many successful ones fails with the given kind.
    fail_after_writes: Option<(u64, io::ErrorKind)>,
    /// The next read fails with the given kind.
    fail_next_read: Option<io::ErrorKind>,
    /// Largest chunk a single write accepts.
    max_write: Option<usize>,
    buffers_cleared: bool,
}

/// Releases the device in its opener when the last handle clone goes away.
#[derive(Debug)]
struct Lease {
    held: Arc<AtomicBool>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.held.store(false, Ordering::SeqCst);
    }
}

/// Mock serial port implementation for testing.
///
/// # Example
/// ```
/// use com_monitor::port::{EchoMode, MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.set_echo(EchoMode::Perfect);
///
/// port.write_bytes(b"ping").unwrap();
///
/// let mut buffer = [0u8; 4];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"ping");
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
    lease: Option<Arc<Lease>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_secs(1),
                ..Default::default()
            })),
            lease: None,
        }
    }

    /// Create a mock that echoes every write back.
    pub fn echo(name: impl Into<String>) -> Self {
        let mut port = Self::new(name);
        port.set_echo(EchoMode::Perfect);
        port
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Change how writes are echoed back.
    pub fn set_echo(&mut self, echo: EchoMode) {
        self.state.lock().echo = echo;
    }

    /// Delay every read by `latency`.
    pub fn set_latency(&mut self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Set whether the next read/write operation should time out.
    pub fn set_should_timeout(&mut self, should_timeout: bool) {
        self.state.lock().should_timeout = should_timeout;
    }

    /// Simulate the device vanishing after `writes` successful writes.
    pub fn fail_after_writes(&mut self, writes: u64, kind: io::ErrorKind) {
        self.state.lock().fail_after_writes = Some((writes, kind));
    }

    /// Accept at most `bytes` per write call, like a driver with a small
    /// transmit buffer.
    pub fn set_max_write(&mut self, bytes: usize) {
        self.state.lock().max_write = Some(bytes);
    }

    /// Make the next read fail with a device-level error.
    pub fn fail_next_read(&mut self, kind: io::ErrorKind) {
        self.state.lock().fail_next_read = Some(kind);
    }

    /// Get a copy of the first writes made to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> u64 {
        self.state.lock().write_count
    }

    /// Total bytes accepted by successful writes.
    pub fn bytes_written(&self) -> u64 {
        self.state.lock().bytes_written
    }

    /// Current read timeout.
    pub fn timeout(&self) -> Duration {
        self.state.lock().timeout
    }

    /// Get whether buffers have been cleared.
    pub fn was_cleared(&self) -> bool {
        self.state.lock().buffers_cleared
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    fn with_lease(&self, held: Arc<AtomicBool>) -> Self {
        Self {
            name: self.name.clone(),
            state: Arc::clone(&self.state),
            lease: Some(Arc::new(Lease { held })),
        }
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.should_timeout {
            state.should_timeout = false;
            return Err(PortError::timeout(state.timeout));
        }

        if let Some((limit, kind)) = state.fail_after_writes {
            if state.write_count >= limit {
                return Err(PortError::Io(io::Error::new(kind, "mock device failure")));
            }
        }

        let data = match state.max_write {
            Some(max) => &data[..data.len().min(max)],
            None => data,
        };

        state.write_count += 1;
        state.bytes_written += data.len() as u64;
        if state.write_log.len() < WRITE_LOG_LIMIT {
            state.write_log.push(data.to_vec());
        }

        let echo = state.echo;
        match echo {
            EchoMode::Silent => {}
            EchoMode::Perfect => state.read_queue.extend(data),
            EchoMode::CorruptEvery(n) => {
                let start = state.read_queue.len();
                state.read_queue.extend(data);
                if n > 0 && state.write_count % n == 0 {
                    if let Some(byte) = state.read_queue.get_mut(start) {
                        *byte ^= 0xFF;
                    }
                }
            }
            EchoMode::Truncate(keep) => {
                let keep = keep.min(data.len());
                state.read_queue.extend(&data[..keep]);
            }
        }

        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let latency = self.state.lock().latency;
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        let mut state = self.state.lock();

        if state.should_timeout {
            state.should_timeout = false;
            return Err(PortError::timeout(state.timeout));
        }

        if let Some(kind) = state.fail_next_read.take() {
            return Err(PortError::Io(io::Error::new(kind, "mock read failure")));
        }

        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            match state.read_queue.pop_front() {
                Some(queued) => {
                    *byte = queued;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        if bytes_read == 0 {
            // Nothing queued: behave like a read that hit its timeout.
            Err(PortError::Io(io::Error::new(
                io::ErrorKind::WouldBlock,
                "No data available",
            )))
        } else {
            Ok(bytes_read)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.state.lock().timeout = timeout;
        Ok(())
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.read_queue.clear();
        state.buffers_cleared = true;
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .field("leased", &self.lease.is_some())
            .finish()
    }
}

/// Reason a mock device refuses to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOpenFailure {
    Busy,
    NotFound,
    Device,
    InvalidConfig,
    Os(i32),
    Io(io::ErrorKind),
}

impl MockOpenFailure {
    fn to_error(&self, device: &str) -> PortError {
        match self {
            Self::Busy => PortError::Busy(device.to_string()),
            Self::NotFound => PortError::not_found(device),
            Self::Device => PortError::Device(format!("{device} stopped responding")),
            Self::InvalidConfig => PortError::config(format!("{device} rejected settings")),
            Self::Os(code) => PortError::os(*code, format!("{device} open failed")),
            Self::Io(kind) => PortError::Io(io::Error::new(*kind, format!("{device} open failed"))),
        }
    }
}

#[derive(Debug)]
struct MockDevice {
    port: MockSerialPort,
    failure: Option<MockOpenFailure>,
    held: Arc<AtomicBool>,
    opens: AtomicUsize,
}

/// Opener over a fixed set of mock devices.
///
/// A device stays held while any handle returned for it is alive; opening a
/// held device fails with [`PortError::Busy`].
#[derive(Debug, Default)]
pub struct MockPortOpener {
    devices: HashMap<String, MockDevice>,
}

impl MockPortOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device that opens successfully and returns `port`.
    pub fn with_port(mut self, device: impl Into<String>, port: MockSerialPort) -> Self {
        self.insert(device.into(), port, None);
        self
    }

    /// Register a device whose open attempts always fail.
    pub fn with_failure(mut self, device: impl Into<String>, failure: MockOpenFailure) -> Self {
        let device = device.into();
        let port = MockSerialPort::new(device.clone());
        self.insert(device, port, Some(failure));
        self
    }

    fn insert(&mut self, device: String, port: MockSerialPort, failure: Option<MockOpenFailure>) {
        self.devices.insert(
            device,
            MockDevice {
                port,
                failure,
                held: Arc::new(AtomicBool::new(false)),
                opens: AtomicUsize::new(0),
            },
        );
    }

    /// Whether a handle for `device` is currently open.
    pub fn is_held(&self, device: &str) -> bool {
        self.devices
            .get(device)
            .is_some_and(|d| d.held.load(Ordering::SeqCst))
    }

    /// Number of successful opens of `device`.
    pub fn open_count(&self, device: &str) -> usize {
        self.devices
            .get(device)
            .map_or(0, |d| d.opens.load(Ordering::SeqCst))
    }
}

impl PortOpener for MockPortOpener {
    type Port = MockSerialPort;

    fn open(&self, device: &str, config: &PortConfiguration) -> Result<Self::Port, PortError> {
        let entry = self
            .devices
            .get(device)
            .ok_or_else(|| PortError::not_found(device))?;

        if let Some(failure) = &entry.failure {
            return Err(failure.to_error(device));
        }

        if entry.held.swap(true, Ordering::SeqCst) {
            return Err(PortError::Busy(device.to_string()));
        }

        entry.opens.fetch_add(1, Ordering::SeqCst);
        let mut port = entry.port.with_lease(Arc::clone(&entry.held));
        port.set_timeout(config.timeout)?;
        Ok(port)
    }
}
