//! Orchestrates one pass over the bench.
//!
//! Check the case filter, open both channels, let the boards boot, run each
//! selected case behind its own error boundary, then release the channels.
//! An unknown case id or a port that will not open ends the run early.

use crate::cases::{Bench, TestCase};
use crate::channel::Channel;
use crate::error::{HarnessError, HarnessResult};
use crate::port::{PortConfiguration, PortError, SerialPortAdapter, SyncSerialPort};
use crate::report::{CaseOutcome, SuiteReport};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use tracing::{error, info, warn};

/// Channel label of the device under test.
pub const DUT_LABEL: &str = "DUT";
/// Channel label of the button-pressing tester.
pub const TESTER_LABEL: &str = "TESTER";

/// Everything the runner needs to know about one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dut_port: String,
    pub tester_port: String,
    pub port: PortConfiguration,
    /// Bound on every single wait for a device line.
    pub response_timeout: Duration,
    /// Pause after opening so both boards finish their reset.
    pub boot_settle: Duration,
    /// Case ids to run, matched case-insensitively. Empty means all of them.
    pub only: Vec<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dut_port: "COM6".to_string(),
            tester_port: "COM7".to_string(),
            port: PortConfiguration::default(),
            response_timeout: Duration::from_secs(5),
            boot_settle: Duration::from_secs(5),
            only: Vec::new(),
        }
    }
}

impl RunOptions {
    fn selects(&self, case: &TestCase) -> bool {
        self.only.is_empty() || self.only.iter().any(|id| id.eq_ignore_ascii_case(case.id))
    }

    /// Cases picked by `only`, in suite order. Every id must name a case.
    fn select<'a>(&self, cases: &'a [TestCase]) -> HarnessResult<Vec<&'a TestCase>> {
        let unknown = self
            .only
            .iter()
            .find(|id| !cases.iter().any(|case| id.eq_ignore_ascii_case(case.id)));
        if let Some(id) = unknown {
            let available: Vec<_> = cases.iter().map(|case| case.id).collect();
            return Err(HarnessError::UnknownCase {
                id: id.clone(),
                available: available.join(", "),
            });
        }
        Ok(cases.iter().filter(|case| self.selects(case)).collect())
    }
}

/// Opens a named port. Implemented for closures so tests can hand out mocks.
pub trait PortOpener {
    fn open(
        &mut self,
        port_name: &str,
        config: PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}

impl<F> PortOpener for F
where
    F: FnMut(&str, PortConfiguration) -> Result<Box<dyn SerialPortAdapter>, PortError>,
{
    fn open(
        &mut self,
        port_name: &str,
        config: PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        self(port_name, config)
    }
}

/// Opens real serial ports.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardwareOpener;

impl PortOpener for HardwareOpener {
    fn open(
        &mut self,
        port_name: &str,
        config: PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        Ok(Box::new(SyncSerialPort::open(port_name, config)?))
    }
}

/// Run `cases` against the ports named in `options`.
///
/// Channels are released before this returns, whichever way the run went.
pub fn run_suite(
    options: &RunOptions,
    cases: &[TestCase],
    opener: &mut dyn PortOpener,
) -> SuiteReport {
    let mut report = SuiteReport::start();

    if let Err(e) = run_selected(options, cases, opener, &mut report) {
        error!("*** FATAL ERROR: no tests were run. ***");
        error!("Error: {e}");
        report.fatal = Some(e.to_string());
    }

    report.finish();
    report
}

fn run_selected(
    options: &RunOptions,
    cases: &[TestCase],
    opener: &mut dyn PortOpener,
    report: &mut SuiteReport,
) -> HarnessResult<()> {
    let selected = options.select(cases)?;
    let mut bench = open_bench(options, opener)?;
    settle(&mut bench, options.boot_settle);
    for case in selected {
        report.record(run_case(&mut bench, case));
    }
    Ok(())
}

fn open_channel(
    opener: &mut dyn PortOpener,
    label: &str,
    port_name: &str,
    config: PortConfiguration,
) -> HarnessResult<Channel> {
    info!("Attempting to open {label} port {port_name}...");
    let port = opener
        .open(port_name, config)
        .map_err(|source| HarnessError::Connection {
            channel: label.to_string(),
            port: port_name.to_string(),
            source,
        })?;
    info!("*** SUCCESS: {label} Port {port_name} opened. ***");
    Ok(Channel::new(label, port))
}

fn open_bench(options: &RunOptions, opener: &mut dyn PortOpener) -> HarnessResult<Bench> {
    let dut = open_channel(opener, DUT_LABEL, &options.dut_port, options.port)?;
    // If this fails, `dut` is dropped and its port closed on the way out.
    let tester = open_channel(opener, TESTER_LABEL, &options.tester_port, options.port)?;
    let bench = Bench::new(dut, tester, options.response_timeout)
        .with_echo_timeout(options.port.read_timeout);
    Ok(bench)
}

/// Wait for both boards to boot, then throw away their boot chatter.
fn settle(bench: &mut Bench, boot_settle: Duration) {
    info!("Waiting for devices to boot ({boot_settle:?})...");
    std::thread::sleep(boot_settle);

    if let Err(e) = bench.dut.discard_input() {
        warn!("Could not clear DUT boot output: {e}");
    }
    match bench.tester.discard_input() {
        Ok(boot) => info!("Tester boot: {}", boot.trim()),
        Err(e) => warn!("Could not clear tester boot output: {e}"),
    }
    info!("Serial buffers cleared. Starting tests...");
}

/// Run one case, converting any error or panic into a failed outcome.
///
/// A failed assertion is recorded with its own message, for example
/// `High Limit was 51, expected 50`. Timeouts, parse and port errors, and
/// panics are recorded as `Test crashed: ...` so they read differently from
/// a device that answered with the wrong value.
pub fn run_case(bench: &mut Bench, case: &TestCase) -> CaseOutcome {
    info!("{}", "-".repeat(40));
    info!("--- Running {}: {} ---", case.id, case.title);

    let result = panic::catch_unwind(AssertUnwindSafe(|| (case.run)(bench)));
    let (passed, message) = match result {
        Ok(Ok(message)) => (true, message),
        Ok(Err(HarnessError::Assertion(message))) => (false, message),
        Ok(Err(e)) => (false, format!("Test crashed: {e}")),
        Err(payload) => (false, format!("Test crashed: {}", panic_message(&*payload))),
    };

    if passed {
        info!("{} passed: {message}", case.id);
    } else {
        warn!("{} failed: {message}", case.id);
    }

    CaseOutcome {
        id: case.id.to_string(),
        title: case.title.to_string(),
        passed,
        message,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockSerialPort;

    fn quick_options() -> RunOptions {
        RunOptions {
            response_timeout: Duration::from_millis(30),
            boot_settle: Duration::ZERO,
            ..RunOptions::default()
        }
    }

    fn exploding(_: &mut Bench) -> HarnessResult<String> {
        panic!("relay stuck");
    }

    fn passing(_: &mut Bench) -> HarnessResult<String> {
        Ok("PASSED: trivially".to_string())
    }

    fn mock_opener(
        name: &str,
        _: PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        Ok(Box::new(MockSerialPort::new(name)))
    }

    #[test]
    fn test_panicking_case_does_not_stop_later_cases() {
        let cases = [
            TestCase {
                id: "TCX",
                title: "explodes",
                run: exploding,
            },
            TestCase {
                id: "TCY",
                title: "passes",
                run: passing,
            },
        ];

        let report = run_suite(&quick_options(), &cases, &mut mock_opener);

        assert_eq!(report.total(), 2);
        let crashed = report.outcome("TCX").unwrap();
        assert!(!crashed.passed);
        assert_eq!(crashed.message, "Test crashed: relay stuck");
        assert!(report.outcome("TCY").unwrap().passed);
    }

    #[test]
    fn test_only_filter_is_case_insensitive() {
        let cases = [
            TestCase {
                id: "TC1",
                title: "a",
                run: passing,
            },
            TestCase {
                id: "TC2",
                title: "b",
                run: passing,
            },
        ];
        let options = RunOptions {
            only: vec!["tc2".to_string()],
            ..quick_options()
        };

        let report = run_suite(&options, &cases, &mut mock_opener);
        let ids: Vec<_> = report.outcomes.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["TC2"]);
    }

    #[test]
    fn test_unknown_case_id_is_fatal_before_opening_ports() {
        let cases = [TestCase {
            id: "TC1",
            title: "a",
            run: passing,
        }];
        let options = RunOptions {
            only: vec!["TC1".to_string(), "TC9".to_string()],
            ..quick_options()
        };
        let mut opened = Vec::new();
        let mut opener = |name: &str, config: PortConfiguration| {
            opened.push(name.to_string());
            mock_opener(name, config)
        };

        let report = run_suite(&options, &cases, &mut opener);

        assert_eq!(report.total(), 0);
        assert!(!report.is_success());
        assert_eq!(
            report.fatal.as_deref(),
            Some("Unknown case id 'TC9' (available: TC1)")
        );
        assert!(opened.is_empty());
    }

    #[test]
    fn test_bench_drains_tester_echo_with_raw_read_timeout() {
        let options = RunOptions {
            port: PortConfiguration {
                read_timeout: Duration::from_millis(7),
                ..PortConfiguration::default()
            },
            ..quick_options()
        };

        let bench = open_bench(&options, &mut mock_opener).unwrap();

        assert_eq!(bench.echo_timeout, Duration::from_millis(7));
        assert_eq!(bench.response_timeout, Duration::from_millis(30));
    }

    #[test]
    fn test_settle_discards_boot_output() {
        let dut = MockSerialPort::with_lines("COM6", ["DUT booting", "Received: 50"]);
        let tester = MockSerialPort::with_lines("COM7", ["Tester ready"]);
        let mut bench = Bench::new(
            Channel::new(DUT_LABEL, Box::new(dut.clone())),
            Channel::new(TESTER_LABEL, Box::new(tester.clone())),
            Duration::from_millis(10),
        );

        settle(&mut bench, Duration::ZERO);
        assert_eq!(dut.available_bytes(), 0);
        assert_eq!(tester.available_bytes(), 0);
    }
}
