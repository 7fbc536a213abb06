//! Configuration schema definitions.
//!
//! Every section carries `#[serde(default)]`, so a config file only needs the
//! keys it changes.

use super::error::{ConfigError, ConfigResult};
use crate::port::PortConfiguration;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial ports of the two boards
    pub ports: PortsConfig,
    /// Waits and pauses of the test protocol
    pub timing: TimingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the bench cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.ports.dut.trim().is_empty() {
            return Err(ConfigError::bad_setting("ports", "dut", "port name is empty"));
        }
        if self.ports.tester.trim().is_empty() {
            return Err(ConfigError::bad_setting("ports", "tester", "port name is empty"));
        }
        if self.ports.dut == self.ports.tester {
            return Err(ConfigError::bad_setting(
                "ports",
                "tester",
                format!("DUT and tester both use '{}'", self.ports.dut),
            ));
        }
        if self.ports.baud == 0 {
            return Err(ConfigError::bad_setting("ports", "baud", "must be non-zero"));
        }
        if self.timing.response_timeout_ms == 0 {
            return Err(ConfigError::bad_setting(
                "timing",
                "response_timeout_ms",
                "must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Serial port section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PortsConfig {
    /// Port of the device under test
    pub dut: String,
    /// Port of the tester board
    pub tester: String,
    /// Baud rate shared by both boards
    pub baud: u32,
    /// Timeout of a single raw read in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            dut: "COM6".to_string(),
            tester: "COM7".to_string(),
            baud: 9600,
            read_timeout_ms: 1000,
        }
    }
}

impl PortsConfig {
    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration {
            baud_rate: self.baud,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }
}

/// Timing section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Bound on each wait for a device line, in milliseconds
    pub response_timeout_ms: u64,
    /// Pause after opening the ports while the boards reset, in milliseconds
    pub boot_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: 5000,
            boot_settle_ms: 5000,
        }
    }
}

impl TimingConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn boot_settle(&self) -> Duration {
        Duration::from_millis(self.boot_settle_ms)
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive: "trace", "debug", "info", "warn", "error", or a full
    /// `EnvFilter` expression
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}
