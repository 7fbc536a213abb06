//! Parsing of the DUT's `STATUS:` reports.
//!
//! A status line looks like `STATUS: LDR=412 HL=50 LL=20 BRT=99`: a marker
//! followed by space-separated `KEY=value` tokens.

use crate::error::{HarnessError, HarnessResult};
use std::fmt;

/// Marker that starts every status report.
pub const STATUS_MARKER: &str = "STATUS:";

/// Integer value of `key` in `status_line`.
///
/// The first token starting with `KEY=` wins. A missing key and a
/// non-integer value are both errors.
pub fn parse_status(status_line: &str, key: &str) -> HarnessResult<i64> {
    let prefix = format!("{key}=");
    let token = status_line
        .split(' ')
        .find(|part| part.starts_with(&prefix))
        .ok_or_else(|| HarnessError::parse(status_line, key, "key not present"))?;

    let value = token.split('=').nth(1).unwrap_or_default();
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| HarnessError::parse(status_line, key, format!("{e} (value '{value}')")))
}

/// Every `KEY=value` pair of a status line, in the order reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusReport {
    fields: Vec<(String, String)>,
}

impl StatusReport {
    /// Collect the key/value tokens of `line`. Tokens without `=` are ignored.
    pub fn parse(line: &str) -> Self {
        let body = line
            .find(STATUS_MARKER)
            .map(|idx| &line[idx + STATUS_MARKER.len()..])
            .unwrap_or(line);

        let fields = body
            .split_whitespace()
            .filter_map(|token| token.split_once('='))
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Self { fields }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.fields {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}
