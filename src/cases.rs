//! Scripted test cases run against the bench.
//!
//! A case returns its pass message on success. Any error, including a failed
//! assertion, means the case failed; turning that into a recorded result is
//! the runner's job.

use crate::channel::Channel;
use crate::error::{HarnessError, HarnessResult};
use crate::port::PortConfiguration;
use crate::status::parse_status;
use crate::transaction::{press_button, query_status, send_value_and_confirm, Button};
use std::time::Duration;
use tracing::info;

/// The two open channels plus the timeouts of each exchange.
#[derive(Debug)]
pub struct Bench {
    pub dut: Channel,
    pub tester: Channel,
    pub response_timeout: Duration,
    /// Bound on draining the tester's own echo after a press.
    pub echo_timeout: Duration,
}

impl Bench {
    pub fn new(dut: Channel, tester: Channel, response_timeout: Duration) -> Self {
        let echo_timeout = response_timeout.min(PortConfiguration::default().read_timeout);
        Self {
            dut,
            tester,
            response_timeout,
            echo_timeout,
        }
    }

    pub fn with_echo_timeout(mut self, echo_timeout: Duration) -> Self {
        self.echo_timeout = echo_timeout;
        self
    }

    /// Press `button` through the tester and wait for the DUT to register it.
    pub fn press(&mut self, button: Button) -> HarnessResult<()> {
        press_button(
            &mut self.tester,
            &mut self.dut,
            button.command(),
            button.press_echo(),
            self.response_timeout,
            self.echo_timeout,
        )
    }

    /// Enter `value` for the mode selected by `button`.
    pub fn enter_value(&mut self, button: Button, value: i64) -> HarnessResult<()> {
        send_value_and_confirm(&mut self.dut, value, button.update_echo(), self.response_timeout)
    }

    /// Query the DUT and extract `key` from its status line.
    pub fn read_status(&mut self, key: &str) -> HarnessResult<i64> {
        let line = query_status(&mut self.dut, self.response_timeout)?;
        parse_status(&line, key)
    }

    /// Press `button`, enter `value`, and read back `key`.
    pub fn set_and_read(&mut self, button: Button, value: i64, key: &str) -> HarnessResult<i64> {
        self.press(button)?;
        self.enter_value(button, value)?;
        self.read_status(key)
    }
}

/// Signature shared by all test cases.
pub type CaseFn = fn(&mut Bench) -> HarnessResult<String>;

/// A named, runnable test case.
#[derive(Debug, Clone, Copy)]
pub struct TestCase {
    /// Short identifier used in the summary, e.g. `TC2`.
    pub id: &'static str,
    pub title: &'static str,
    pub run: CaseFn,
}

/// TC1–TC3 in execution order.
pub fn default_cases() -> Vec<TestCase> {
    vec![
        TestCase {
            id: "TC1",
            title: "Control LED Brightness",
            run: tc1_led_ldr_check,
        },
        TestCase {
            id: "TC2",
            title: "Set High Limit",
            run: tc2_set_high_limit,
        },
        TestCase {
            id: "TC3",
            title: "Set Low Limit",
            run: tc3_set_low_limit,
        },
    ]
}

/// TC1: brightness 99 must light the LDR more than brightness 0.
pub fn tc1_led_ldr_check(bench: &mut Bench) -> HarnessResult<String> {
    info!("Pressing LED Button (for 0%)");
    let ldr_at_0 = bench.set_and_read(Button::Led, 0, "LDR")?;
    info!("LDR value at 0% brightness: {ldr_at_0}");

    info!("Pressing LED Button (for 99%)");
    let ldr_at_99 = bench.set_and_read(Button::Led, 99, "LDR")?;
    info!("LDR value at 99% brightness: {ldr_at_99}");

    if ldr_at_99 <= ldr_at_0 {
        return Err(HarnessError::Assertion(format!(
            "LDR at 99% ({ldr_at_99}) was NOT greater than LDR at 0% ({ldr_at_0})"
        )));
    }
    Ok(format!("PASSED: LDR {ldr_at_0} -> {ldr_at_99}"))
}

/// TC2: the high limit reads back as 50 after being set to 50.
pub fn tc2_set_high_limit(bench: &mut Bench) -> HarnessResult<String> {
    check_limit(bench, Button::HighLimit, "HL", "High Limit", 50)
}

/// TC3: the low limit reads back as 20 after being set to 20.
pub fn tc3_set_low_limit(bench: &mut Bench) -> HarnessResult<String> {
    check_limit(bench, Button::LowLimit, "LL", "Low Limit", 20)
}

fn check_limit(
    bench: &mut Bench,
    button: Button,
    key: &str,
    label: &str,
    expected: i64,
) -> HarnessResult<String> {
    info!("Pressing {label} Button...");
    let actual = bench.set_and_read(button, expected, key)?;
    info!("Current {label} ({key}) from device: {actual}");

    if actual != expected {
        return Err(HarnessError::Assertion(format!(
            "{label} was {actual}, expected {expected}"
        )));
    }
    Ok(format!("PASSED: {label} set to {expected}"))
}
