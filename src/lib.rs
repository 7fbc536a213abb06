//! Serial hardware-in-the-loop test harness.
//!
//! Drives a device under test (DUT) and a tester board that presses the DUT's
//! buttons, both over serial, and checks the DUT's reports against expected
//! values.
//!
//! # Modules
//!
//! - `port`: serial port abstraction, hardware backend and scriptable mock
//! - `channel`: line framing and read-until-match with timeout
//! - `status`: parsing of `STATUS:` lines
//! - `transaction`: button press, value entry and status query exchanges
//! - `cases`: the scripted test cases
//! - `runner`: opens the bench, runs the cases, guarantees teardown
//! - `report`: summary table and JSON export
//! - `sim`: in-process simulated bench
//! - `config`: TOML configuration with environment overrides
//! - `logging`: tracing subscriber setup

pub mod cases;
pub mod channel;
pub mod config;
pub mod error;
pub mod logging;
pub mod port;
pub mod report;
pub mod runner;
pub mod sim;
pub mod status;
pub mod transaction;

pub use cases::{default_cases, Bench, TestCase};
pub use channel::Channel;
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
pub use error::{HarnessError, HarnessResult};
pub use port::{MockSerialPort, PortConfiguration, PortError, SerialPortAdapter, SyncSerialPort};
pub use report::{CaseOutcome, SuiteReport};
pub use runner::{run_suite, HardwareOpener, PortOpener, RunOptions};
pub use sim::SimBench;
pub use status::{parse_status, StatusReport};
pub use transaction::{press_button, query_status, send_value_and_confirm, Button};
