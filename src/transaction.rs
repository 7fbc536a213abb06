//! Request/response exchanges with the DUT and the tester.
//!
//! Each primitive writes one request and then waits for the marker line that
//! confirms it. Waits are bounded by the caller's response timeout.

use crate::channel::Channel;
use crate::error::HarnessResult;
use crate::status::{StatusReport, STATUS_MARKER};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Status request understood by the DUT.
pub const STATUS_REQUEST: u8 = b'?';

/// Physical buttons the tester can press on the DUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Selects LED brightness as the value to edit.
    Led,
    /// Selects the high limit as the value to edit.
    HighLimit,
    /// Selects the low limit as the value to edit.
    LowLimit,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::Led, Button::HighLimit, Button::LowLimit];

    /// Command byte sent to the tester (and accepted by the DUT directly).
    pub fn command(self) -> u8 {
        match self {
            Button::Led => b'B',
            Button::HighLimit => b'H',
            Button::LowLimit => b'L',
        }
    }

    pub fn from_command(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.command() == byte)
    }

    /// Line the DUT prints when it registers the press.
    pub fn press_echo(self) -> &'static str {
        match self {
            Button::Led => "LED Control: Pressed",
            Button::HighLimit => "High Limit: Pressed",
            Button::LowLimit => "Low Limit: Pressed",
        }
    }

    /// Line the DUT prints after applying a value in this button's mode.
    pub fn update_echo(self) -> &'static str {
        match self {
            Button::Led => "-> Updated Brightness",
            Button::HighLimit => "-> Updated High Limit",
            Button::LowLimit => "-> Updated Low Limit",
        }
    }
}

/// Ask the tester to press `button_char` and wait for the DUT to notice.
///
/// The tester's own echo is drained afterwards, waiting at most
/// `echo_timeout`, to keep both streams in step. A missing tester echo only
/// warrants a warning; the DUT confirmation is what the test depends on.
pub fn press_button(
    tester: &mut Channel,
    dut: &mut Channel,
    button_char: u8,
    dut_echo: &str,
    timeout: Duration,
    echo_timeout: Duration,
) -> HarnessResult<()> {
    tester.send_command(button_char)?;
    dut.read_until_expected(dut_echo, timeout)?;
    info!("  Button press confirmed by DUT.");

    match tester.read_line(echo_timeout)? {
        Some(echo) => info!("  [RX<-{}] <- {}", tester.label(), echo.trim()),
        None => warn!("{} sent no echo for '{}'", tester.label(), button_char as char),
    }
    Ok(())
}

/// Send `value` as a decimal line and wait for both DUT confirmations.
pub fn send_value_and_confirm(
    dut: &mut Channel,
    value: i64,
    value_echo: &str,
    timeout: Duration,
) -> HarnessResult<()> {
    dut.send_line(&value.to_string())?;
    dut.read_until_expected(&format!("Received: {value}"), timeout)?;
    dut.read_until_expected(value_echo, timeout)?;
    info!("  Value set successfully.");
    Ok(())
}

/// Request a status report and return the `STATUS:` line.
pub fn query_status(dut: &mut Channel, timeout: Duration) -> HarnessResult<String> {
    dut.send_command(STATUS_REQUEST)?;
    let line = dut.read_until_expected(STATUS_MARKER, timeout)?;
    debug!("status fields: {}", StatusReport::parse(&line));
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarnessError;
    use crate::port::MockSerialPort;
    use std::time::Instant;

    const SHORT: Duration = Duration::from_millis(40);

    fn pair(
        tester_lines: &[&str],
        dut_lines: &[&str],
    ) -> (Channel, MockSerialPort, Channel, MockSerialPort) {
        let tester_port = MockSerialPort::with_lines("COM7", tester_lines.iter().copied());
        let dut_port = MockSerialPort::with_lines("COM6", dut_lines.iter().copied());
        (
            Channel::new("TESTER", Box::new(tester_port.clone())),
            tester_port,
            Channel::new("DUT", Box::new(dut_port.clone())),
            dut_port,
        )
    }

    #[test]
    fn test_button_round_trip_through_command() {
        for button in Button::ALL {
            assert_eq!(Button::from_command(button.command()), Some(button));
        }
        assert_eq!(Button::from_command(b'?'), None);
    }

    #[test]
    fn test_press_button_writes_to_tester_and_drains_echo() {
        let (mut tester, tester_port, mut dut, dut_port) =
            pair(&["Pressed B", "left over"], &["LED Control: Pressed"]);

        press_button(&mut tester, &mut dut, b'B', "LED Control: Pressed", SHORT, SHORT).unwrap();

        assert_eq!(tester_port.written(), b"B");
        assert!(dut_port.written().is_empty());
        // Exactly one tester line was consumed.
        assert_eq!(tester.read_line(SHORT).unwrap().as_deref(), Some("left over"));
    }

    #[test]
    fn test_press_button_tolerates_missing_tester_echo() {
        let (mut tester, _, mut dut, _) = pair(&[], &["High Limit: Pressed"]);
        let result = press_button(&mut tester, &mut dut, b'H', "High Limit: Pressed", SHORT, SHORT);
        assert!(result.is_ok());
    }

    #[test]
    fn test_silent_tester_costs_only_the_echo_timeout() {
        let (mut tester, _, mut dut, _) = pair(&[], &["Low Limit: Pressed"]);
        let response_timeout = Duration::from_secs(5);
        let echo_timeout = Duration::from_millis(20);

        let started = Instant::now();
        press_button(
            &mut tester,
            &mut dut,
            b'L',
            "Low Limit: Pressed",
            response_timeout,
            echo_timeout,
        )
        .unwrap();

        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_press_button_times_out_without_dut_confirmation() {
        let (mut tester, _, mut dut, _) = pair(&["Pressed H"], &[]);
        let err = press_button(&mut tester, &mut dut, b'H', "High Limit: Pressed", SHORT, SHORT)
            .unwrap_err();
        assert!(matches!(err, HarnessError::Timeout { .. }));
    }

    #[test]
    fn test_send_value_and_confirm() {
        let (_, _, mut dut, dut_port) = pair(&[], &["Received: 50", "-> Updated High Limit"]);

        send_value_and_confirm(&mut dut, 50, "-> Updated High Limit", SHORT).unwrap();
        assert_eq!(dut_port.written(), b"50\n");
    }

    #[test]
    fn test_send_value_requires_both_confirmations() {
        let (_, _, mut dut, _) = pair(&[], &["Received: 50"]);
        let err = send_value_and_confirm(&mut dut, 50, "-> Updated High Limit", SHORT).unwrap_err();
        assert!(err.to_string().contains("-> Updated High Limit"));
    }

    #[test]
    fn test_send_value_rejects_wrong_echo() {
        let (_, _, mut dut, _) = pair(&[], &["Received: 5", "-> Updated High Limit"]);
        let err = send_value_and_confirm(&mut dut, 50, "-> Updated High Limit", SHORT).unwrap_err();
        assert!(err.to_string().contains("Received: 50"));
    }

    #[test]
    fn test_query_status_returns_status_line() {
        let (_, _, mut dut, dut_port) = pair(&[], &["noise", "STATUS: LDR=10 HL=50 LL=20"]);
        let line = query_status(&mut dut, SHORT).unwrap();
        assert_eq!(line, "STATUS: LDR=10 HL=50 LL=20");
        assert_eq!(dut_port.written(), b"?");
    }
}
