//! Suite results: the console summary and the JSON export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const RULE_WIDTH: usize = 50;

/// Errors writing a report to disk.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result of one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub id: String,
    pub title: String,
    pub passed: bool,
    pub message: String,
}

/// Everything a run produced, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcomes: Vec<CaseOutcome>,
    /// Set when the run aborted before executing any case.
    pub fatal: Option<String>,
}

impl SuiteReport {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            outcomes: Vec::new(),
            fatal: None,
        }
    }

    pub fn record(&mut self, outcome: CaseOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// True when the run completed and no case failed.
    pub fn is_success(&self) -> bool {
        self.fatal.is_none() && self.failed() == 0
    }

    /// Outcome recorded for case `id`.
    pub fn outcome(&self, id: &str) -> Option<&CaseOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }

    /// The summary table printed at the end of a run.
    pub fn render_summary(&self) -> String {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        let mut out = String::new();
        out.push_str(&heavy);
        out.push('\n');
        out.push_str("         AUTOMATED TEST SUMMARY\n");
        out.push_str(&heavy);
        out.push('\n');

        if let Some(fatal) = &self.fatal {
            out.push_str(&format!(" [FATAL] {fatal}\n"));
        }
        for outcome in &self.outcomes {
            let tag = if outcome.passed { "PASS" } else { "FAIL" };
            out.push_str(&format!(" [{tag}] {}: {}\n", outcome.id, outcome.message));
        }

        out.push_str(&light);
        out.push('\n');
        out.push_str(&format!(
            "Total: {} tests | Passed: {} | Failed: {}\n",
            self.total(),
            self.passed(),
            self.failed()
        ));
        out.push_str(&heavy);
        out.push('\n');
        out
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let write_err = |source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, self.to_json()?).map_err(write_err)
    }
}
