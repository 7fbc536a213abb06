//! Port-specific error types.
//!
//! Kept separate from [`crate::error::HarnessError`] so the port layer can be
//! used on its own (port listing, the simulated bench) without pulling in the
//! test-protocol vocabulary.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Port configuration was rejected by the driver.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A single raw read produced no data within the port's read timeout.
    #[error("Read timed out after {0:?}")]
    Timeout(Duration),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout(duration)
    }

    /// True when the error only means "nothing arrived yet".
    ///
    /// Line readers poll until their own deadline, so these are not failures.
    pub fn is_no_data(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::not_found("COM6");
        assert_eq!(err.to_string(), "Serial port not found: COM6");

        let err = PortError::config("Invalid baud rate");
        assert_eq!(err.to_string(), "Configuration error: Invalid baud rate");

    }

    #[test]
    fn test_no_data_classification() {
        assert!(PortError::timeout(Duration::from_millis(100)).is_no_data());
        assert!(PortError::Io(io::Error::new(io::ErrorKind::TimedOut, "t")).is_no_data());
        assert!(PortError::Io(io::Error::new(io::ErrorKind::WouldBlock, "w")).is_no_data());

        assert!(!PortError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone")).is_no_data());
        assert!(!PortError::not_found("COM9").is_no_data());
    }
}
