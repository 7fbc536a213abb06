//! Bench configuration.
//!
//! TOML file with environment variable overrides. The file is looked up in
//! this order:
//!
//! 1. An explicit path (the `--config` flag)
//! 2. `HIL_TESTER_CONFIG` environment variable
//! 3. `./hil-tester.toml`
//! 4. The platform config dir, e.g. `~/.config/hil-tester/config.toml`
//! 5. Built-in defaults (no file required)
//!
//! Overrides follow `HIL_TESTER_<SECTION>_<KEY>`, for example
//! `HIL_TESTER_PORTS_DUT=/dev/ttyACM0` or `HIL_TESTER_TIMING_BOOT_SETTLE_MS=2000`.
//!
//! ```toml
//! [ports]
//! dut = "COM6"
//! tester = "COM7"
//! baud = 9600
//!
//! [timing]
//! response_timeout_ms = 5000
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult, SettingSource};
pub use loader::{default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{Config, LogFormat, LoggingConfig, PortsConfig, TimingConfig};
