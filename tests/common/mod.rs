//! Shared helpers for the integration tests.
//!
//! - scripted benches built from canned DUT/tester lines
//! - openers that hand out mock ports by name
//! - run options with timings short enough for CI

#![allow(dead_code)]

use serial_hil_tester::port::{MockSerialPort, PortConfiguration, PortError, SerialPortAdapter};
use serial_hil_tester::runner::{RunOptions, DUT_LABEL, TESTER_LABEL};
use serial_hil_tester::{Bench, Channel};
use std::time::Duration;

/// Response timeout used by scripted scenarios that are expected to pass.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_millis(200);

/// Response timeout for scenarios that are expected to time out.
pub const SHORT_TIMEOUT: Duration = Duration::from_millis(50);

/// A bench whose DUT will print `dut_lines` and whose tester will print
/// `tester_lines`, in order. The returned mocks share state with the bench.
pub fn scripted_bench(
    dut_lines: &[&str],
    tester_lines: &[&str],
    timeout: Duration,
) -> (Bench, MockSerialPort, MockSerialPort) {
    let dut = MockSerialPort::with_lines("COM6", dut_lines.iter().copied());
    let tester = MockSerialPort::with_lines("COM7", tester_lines.iter().copied());
    let bench = Bench::new(
        Channel::new(DUT_LABEL, Box::new(dut.clone())),
        Channel::new(TESTER_LABEL, Box::new(tester.clone())),
        timeout,
    );
    (bench, dut, tester)
}

/// Run options for mock or simulated benches: no boot pause, short waits.
pub fn quick_options(dut_port: &str, tester_port: &str) -> RunOptions {
    RunOptions {
        dut_port: dut_port.to_string(),
        tester_port: tester_port.to_string(),
        response_timeout: RESPONSE_TIMEOUT,
        boot_settle: Duration::ZERO,
        ..RunOptions::default()
    }
}

/// Opener that serves clones of the given mocks by port name and reports
/// every other name as missing.
pub fn mock_opener(
    ports: Vec<MockSerialPort>,
) -> impl FnMut(&str, PortConfiguration) -> Result<Box<dyn SerialPortAdapter>, PortError> {
    move |name: &str, _config: PortConfiguration| {
        ports
            .iter()
            .find(|p| p.name() == name)
            .map(|p| Box::new(p.clone()) as Box<dyn SerialPortAdapter>)
            .ok_or_else(|| PortError::not_found(name))
    }
}

/// DUT lines for one press/enter/query round.
pub fn round(press_echo: &str, value: i64, update_echo: &str, status: &str) -> Vec<String> {
    vec![
        press_echo.to_string(),
        format!("Received: {value}"),
        update_echo.to_string(),
        status.to_string(),
    ]
}
