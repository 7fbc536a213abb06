//! Errors from locating, reading and checking the bench configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Where a bad setting came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingSource {
    /// File, environment and command line merged, checked before a run.
    Merged,
    /// A `HIL_TESTER_<SECTION>_<KEY>` override.
    Env(String),
}

impl std::fmt::Display for SettingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merged => f.write_str("merged settings"),
            Self::Env(var) => write!(f, "environment variable {var}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// `--config` named a file that is not there.
    #[error("Config file '{}' does not exist", .0.display())]
    Missing(PathBuf),

    #[error("Cannot read config file '{}': {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file '{}' is not valid bench TOML: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A `[section] key` the bench cannot run with.
    #[error("[{section}] {key} from {source_of}: {reason}")]
    BadSetting {
        section: &'static str,
        key: &'static str,
        source_of: SettingSource,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn bad_setting(
        section: &'static str,
        key: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::BadSetting {
            section,
            key,
            source_of: SettingSource::Merged,
            reason: reason.into(),
        }
    }

    pub(crate) fn bad_env_setting(
        section: &'static str,
        key: &'static str,
        var: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::BadSetting {
            section,
            key,
            source_of: SettingSource::Env(var.into()),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
