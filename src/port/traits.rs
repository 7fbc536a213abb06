//! Core traits for serial port abstraction.
//!
//! `SerialPortAdapter` lets hardware ports, scripted mocks, and the simulated
//! bench be driven by the same channel code.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest chunk pulled off a port by [`SerialPortAdapter::read_available`].
const DRAIN_CHUNK: usize = 256;

/// Parameters used when opening a bench port.
///
/// Framing is fixed at 8N1 without flow control, which is what both
/// microcontrollers on the bench speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Timeout of a single raw read. Line-level deadlines are layered on top.
    pub read_timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            read_timeout: Duration::from_secs(1),
        }
    }
}

/// Byte-level I/O against one serial endpoint.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the port, returning how many were accepted.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read into `buffer`, returning the number of bytes read.
    ///
    /// When nothing arrives within the port's read timeout the implementation
    /// returns an error for which [`PortError::is_no_data`] is true.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Name/path of this port.
    fn name(&self) -> &str;

    /// Bytes waiting in the receive buffer, if the backend can tell.
    fn bytes_to_read(&self) -> Option<usize> {
        None
    }

    /// Write everything in `data`, retrying on short writes.
    fn write_all_bytes(&mut self, data: &[u8]) -> Result<(), PortError> {
        let mut sent = 0;
        while sent < data.len() {
            let n = self.write_bytes(&data[sent..])?;
            if n == 0 {
                return Err(PortError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "port accepted no bytes",
                )));
            }
            sent += n;
        }
        Ok(())
    }

    /// Pull whatever is already buffered on the receive side without waiting.
    ///
    /// Backends that cannot report a byte count yield nothing.
    fn read_available(&mut self) -> Result<Vec<u8>, PortError> {
        let mut out = Vec::new();
        let mut chunk = [0u8; DRAIN_CHUNK];
        while let Some(pending) = self.bytes_to_read().filter(|n| *n > 0) {
            let want = pending.min(DRAIN_CHUNK);
            match self.read_bytes(&mut chunk[..want]) {
                Ok(0) => break,
                Ok(n) => out.extend_from_slice(&chunk[..n]),
                Err(e) if e.is_no_data() => break,
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }
}

impl<T: SerialPortAdapter + ?Sized> SerialPortAdapter for Box<T> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        (**self).write_bytes(data)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        (**self).read_bytes(buffer)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn bytes_to_read(&self) -> Option<usize> {
        (**self).bytes_to_read()
    }
}
