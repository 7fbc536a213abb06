//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, LogFormat};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "HIL_TESTER";

/// Config file name in the working directory
const LOCAL_CONFIG_FILE: &str = "hil-tester.toml";

/// Config file name in the platform config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "HIL_TESTER_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// File the configuration came from, if any
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load using the standard resolution order, then apply env overrides.
    pub fn load() -> ConfigResult<Self> {
        match resolve_config_path() {
            Some(path) => Self::load_from(path),
            None => Self::with_defaults(),
        }
    }

    /// Load from a specific file. Unlike [`ConfigLoader::load`], a missing
    /// file is an error.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::Missing(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Defaults plus env overrides, used when no config file is found.
    pub fn with_defaults() -> ConfigResult<Self> {
        let mut config = Config::default();
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: None,
            config,
        })
    }

    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using the standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    default_config_path().filter(|path| path.exists())
}

/// Platform config file location, e.g. `~/.config/hil-tester/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "hil-tester").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Value of `HIL_TESTER_<SECTION>_<KEY>`, if set.
fn env_override(section: &str, key: &str) -> Option<(String, String)> {
    let var = format!(
        "{ENV_PREFIX}_{}_{}",
        section.to_ascii_uppercase(),
        key.to_ascii_uppercase()
    );
    std::env::var(&var).ok().map(|value| (var, value))
}

fn parse_override<T: FromStr>(
    section: &'static str,
    key: &'static str,
) -> ConfigResult<Option<T>> {
    let Some((var, value)) = env_override(section, key) else {
        return Ok(None);
    };
    match value.trim().parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(ConfigError::bad_env_setting(
            section,
            key,
            var,
            format!("'{value}' is not a number"),
        )),
    }
}

/// Apply `HIL_TESTER_<SECTION>_<KEY>` overrides to `config`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some((_, val)) = env_override("ports", "dut") {
        config.ports.dut = val;
    }
    if let Some((_, val)) = env_override("ports", "tester") {
        config.ports.tester = val;
    }
    if let Some(baud) = parse_override("ports", "baud")? {
        config.ports.baud = baud;
    }
    if let Some(ms) = parse_override("ports", "read_timeout_ms")? {
        config.ports.read_timeout_ms = ms;
    }

    if let Some(ms) = parse_override("timing", "response_timeout_ms")? {
        config.timing.response_timeout_ms = ms;
    }
    if let Some(ms) = parse_override("timing", "boot_settle_ms")? {
        config.timing.boot_settle_ms = ms;
    }

    if let Some((_, val)) = env_override("logging", "level") {
        config.logging.level = val;
    }
    if let Some((var, val)) = env_override("logging", "format") {
        config.logging.format = match val.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => {
                return Err(ConfigError::bad_env_setting(
                    "logging",
                    "format",
                    var,
                    format!("unknown format '{val}', expected json, pretty or compact"),
                ))
            }
        };
    }

    Ok(())
}
