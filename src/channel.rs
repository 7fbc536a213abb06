//! Line-oriented channel to one bench device.
//!
//! A [`Channel`] owns its port for the whole run and releases it when
//! dropped, so every exit path of the orchestrator closes what it opened.

use crate::error::{HarnessError, HarnessResult};
use crate::port::SerialPortAdapter;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const READ_CHUNK: usize = 128;

/// A named, line-framed serial connection.
#[derive(Debug)]
pub struct Channel {
    label: String,
    port: Box<dyn SerialPortAdapter>,
    /// Received bytes not yet returned as a full line.
    pending: Vec<u8>,
}

impl Channel {
    /// Wrap an open port. `label` names the device in logs and errors.
    pub fn new(label: impl Into<String>, port: Box<dyn SerialPortAdapter>) -> Self {
        Self {
            label: label.into(),
            port,
            pending: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Write raw bytes.
    pub fn send(&mut self, data: &[u8]) -> HarnessResult<()> {
        info!(
            "  [TX->{}] -> {}",
            self.label,
            String::from_utf8_lossy(data).trim_end()
        );
        self.port
            .write_all_bytes(data)
            .map_err(|e| HarnessError::port(&self.label, e))
    }

    /// Write a single command character such as `B` or `?`.
    pub fn send_command(&mut self, command: u8) -> HarnessResult<()> {
        self.send(&[command])
    }

    /// Write `text` followed by `\n`.
    pub fn send_line(&mut self, text: &str) -> HarnessResult<()> {
        let mut data = Vec::with_capacity(text.len() + 1);
        data.extend_from_slice(text.as_bytes());
        data.push(b'\n');
        self.send(&data)
    }

    /// Next complete line, without its terminator, or `None` once `timeout`
    /// has passed with no full line available.
    pub fn read_line(&mut self, timeout: Duration) -> HarnessResult<Option<String>> {
        self.read_line_by(Instant::now() + timeout)
    }

    fn read_line_by(&mut self, deadline: Instant) -> HarnessResult<Option<String>> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(line) = self.take_line() {
                return Ok(Some(line));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            match self.port.read_bytes(&mut chunk) {
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(e) if e.is_no_data() => {}
                Err(e) => return Err(HarnessError::port(&self.label, e)),
            }
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let end = memchr::memchr(b'\n', &self.pending)?;
        let mut raw: Vec<u8> = self.pending.drain(..=end).collect();
        raw.pop();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        Some(String::from_utf8_lossy(&raw).into_owned())
    }

    /// Read lines until one contains `expected`, returning it trimmed.
    ///
    /// Blank lines are skipped and non-matching lines are logged and dropped.
    /// The deadline is wall-clock time measured from the call.
    pub fn read_until_expected(
        &mut self,
        expected: &str,
        timeout: Duration,
    ) -> HarnessResult<String> {
        let deadline = Instant::now() + timeout;
        while let Some(line) = self.read_line_by(deadline)? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            info!("  [RX<-{}] <- {}", self.label, line);
            if line.contains(expected) {
                return Ok(line.to_string());
            }
        }
        Err(HarnessError::timeout(&self.label, expected))
    }

    /// Throw away everything received so far, returning it as text.
    pub fn discard_input(&mut self) -> HarnessResult<String> {
        let mut junk = std::mem::take(&mut self.pending);
        let buffered = self
            .port
            .read_available()
            .map_err(|e| HarnessError::port(&self.label, e))?;
        junk.extend_from_slice(&buffered);
        debug!("{}: discarded {} buffered bytes", self.label, junk.len());
        Ok(String::from_utf8_lossy(&junk).into_owned())
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        info!("Port {} ({}) closed.", self.port.name(), self.label);
    }
}
