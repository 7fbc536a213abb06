//! Console logging setup.

use crate::config::{LogFormat, LoggingConfig};
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{directive}': {message}")]
    Filter { directive: String, message: String },

    #[error("Logging already initialised: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Filter from `RUST_LOG` if set, otherwise from the configured level.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| LoggingError::Filter {
        directive: config.level.clone(),
        message: e.to_string(),
    })
}

/// Install the global subscriber. Call once, before the run starts.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;
    let layer = match config.format {
        LogFormat::Json => fmt::layer().json().with_target(true).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_target(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()?;
    Ok(())
}
