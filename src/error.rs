//! Errors raised while running the bench.
//!
//! [`HarnessError::Connection`] and [`HarnessError::UnknownCase`] stop a run
//! before any case executes. Every other variant is caught at the test-case
//! boundary and recorded as that case's failure.

use crate::port::PortError;
use thiserror::Error;

/// Result alias used across the protocol and test-case layers.
pub type HarnessResult<T> = Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// A bench port could not be opened.
    #[error("Could not open {channel} port '{port}': {source}")]
    Connection {
        channel: String,
        port: String,
        #[source]
        source: PortError,
    },

    /// The case filter names a case the suite does not have.
    #[error("Unknown case id '{id}' (available: {available})")]
    UnknownCase { id: String, available: String },

    /// The expected line did not show up before the deadline.
    #[error("TIMEOUT: Device '{channel}' response '{expected}' not found.")]
    Timeout { channel: String, expected: String },

    /// A status line was missing the key, or its value was not an integer.
    #[error("Could not parse key '{key}' from line '{line}'. Error: {reason}")]
    Parse {
        line: String,
        key: String,
        reason: String,
    },

    /// The device answered, but not with the expected value.
    #[error("{0}")]
    Assertion(String),

    /// Hard I/O failure on an open channel.
    #[error("{channel} port error: {source}")]
    Port {
        channel: String,
        #[source]
        source: PortError,
    },
}

impl HarnessError {
    pub fn timeout(channel: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::Timeout {
            channel: channel.into(),
            expected: expected.into(),
        }
    }

    pub fn parse(line: &str, key: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            line: line.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn port(channel: impl Into<String>, source: PortError) -> Self {
        Self::Port {
            channel: channel.into(),
            source,
        }
    }
}
