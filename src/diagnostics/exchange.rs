//! Block-level write and read helpers shared by the integrity tests.

use crate::port::{PortError, SerialPortAdapter};
use std::time::{Duration, Instant};
use thiserror::Error;

/// A block write that stopped after `written` bytes had been accepted.
#[derive(Debug, Error)]
#[error("{source}")]
pub(crate) struct WriteFailure {
    pub written: usize,
    pub source: PortError,
}

/// Write all of `data`, returning the number of bytes written.
///
/// Any error, a write timeout included, is a device failure here. The bytes
/// accepted before the failure are reported with it.
pub(crate) fn write_block<P>(port: &mut P, data: &[u8]) -> Result<usize, WriteFailure>
where
    P: SerialPortAdapter + ?Sized,
{
    let mut written = 0;
    while written < data.len() {
        match port.write_bytes(&data[written..]) {
            Ok(0) => {
                let source = PortError::Device(format!(
                    "{} accepted no bytes after {} of {}",
                    port.name(),
                    written,
                    data.len()
                ));
                return Err(WriteFailure { written, source });
            }
            Ok(n) => written += n,
            Err(source) => return Err(WriteFailure { written, source }),
        }
    }
    Ok(written)
}

/// Read up to `len` bytes, giving up once `timeout` has elapsed.
///
/// A timeout is not an error: whatever arrived so far is returned, possibly
/// nothing. Only device-level failures are propagated.
pub(crate) fn read_block<P>(port: &mut P, len: usize, timeout: Duration) -> Result<Vec<u8>, PortError>
where
    P: SerialPortAdapter + ?Sized,
{
    let mut buffer = vec![0u8; len];
    let mut filled = 0;
    let deadline = Instant::now() + timeout;

    while filled < len {
        match port.read_bytes(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.is_timeout() => break,
            Err(e) => return Err(e),
        }
        if Instant::now() >= deadline {
            break;
        }
    }

    buffer.truncate(filled);
    Ok(buffer)
}
