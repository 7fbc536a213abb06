//! In-process stand-in for the two-board bench.
//!
//! [`SimBench`] hands out a DUT port and a tester port that share one model
//! of the hardware: a tester press reaches the DUT the way the GPIO line
//! would, the DUT tracks which value is being edited, and its light sensor
//! reading follows the LED brightness. Faults can be injected to exercise
//! the failure paths of the suite without a soldering iron.

use crate::port::{PortConfiguration, PortError, SerialPortAdapter};
use crate::runner::PortOpener;
use crate::transaction::{Button, STATUS_REQUEST};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::trace;

/// Port name the simulated DUT answers to.
pub const SIM_DUT_PORT: &str = "sim:dut";
/// Port name the simulated tester answers to.
pub const SIM_TESTER_PORT: &str = "sim:tester";

const MAX_BRIGHTNESS: i64 = 99;
/// LDR reading with the LED off.
const AMBIENT_LDR: i64 = 40;
/// LDR counts gained per brightness step.
const LDR_PER_STEP: i64 = 8;
/// How long an empty read blocks before reporting no data.
const IDLE_DELAY: Duration = Duration::from_millis(2);

#[derive(Debug)]
struct BenchState {
    /// Bytes the DUT has printed and the host has not read yet.
    dut_out: VecDeque<u8>,
    tester_out: VecDeque<u8>,
    /// Digits of a value the host is typing into the DUT.
    dut_line: Vec<u8>,
    mode: Option<Button>,
    brightness: i64,
    high_limit: i64,
    low_limit: i64,
    muted_press: Option<Button>,
    high_limit_skew: i64,
}

impl BenchState {
    fn new() -> Self {
        let mut state = Self {
            dut_out: VecDeque::new(),
            tester_out: VecDeque::new(),
            dut_line: Vec::new(),
            mode: None,
            brightness: 0,
            high_limit: 80,
            low_limit: 10,
            muted_press: None,
            high_limit_skew: 0,
        };
        state.dut_print("DUT ready");
        state.tester_print("Tester ready");
        state
    }

    fn dut_print(&mut self, line: &str) {
        trace!("sim DUT prints {line:?}");
        self.dut_out.extend(line.bytes());
        self.dut_out.extend(b"\r\n");
    }

    fn tester_print(&mut self, line: &str) {
        self.tester_out.extend(line.bytes());
        self.tester_out.extend(b"\r\n");
    }

    fn ldr(&self) -> i64 {
        AMBIENT_LDR + self.brightness * LDR_PER_STEP
    }

    fn press(&mut self, button: Button) {
        self.mode = Some(button);
        if self.muted_press != Some(button) {
            self.dut_print(button.press_echo());
        }
    }

    fn dut_input(&mut self, byte: u8) {
        if let Some(button) = Button::from_command(byte) {
            self.press(button);
            return;
        }
        match byte {
            STATUS_REQUEST => {
                let status = format!(
                    "STATUS: LDR={} HL={} LL={} BRT={}",
                    self.ldr(),
                    self.high_limit,
                    self.low_limit,
                    self.brightness
                );
                self.dut_print(&status);
            }
            b'\n' => self.apply_value(),
            b'\r' => {}
            b'0'..=b'9' | b'-' => self.dut_line.push(byte),
            _ => self.dut_print("Unknown command"),
        }
    }

    fn apply_value(&mut self) {
        let text = String::from_utf8_lossy(&std::mem::take(&mut self.dut_line)).into_owned();
        let Ok(value) = text.parse::<i64>() else {
            self.dut_print("Invalid value");
            return;
        };
        self.dut_print(&format!("Received: {value}"));

        let Some(mode) = self.mode.take() else {
            self.dut_print("-> Ignored (no button pressed)");
            return;
        };
        match mode {
            Button::Led => self.brightness = value.clamp(0, MAX_BRIGHTNESS),
            Button::HighLimit => self.high_limit = value + self.high_limit_skew,
            Button::LowLimit => self.low_limit = value,
        }
        self.dut_print(mode.update_echo());
    }

    fn tester_input(&mut self, byte: u8) {
        match Button::from_command(byte) {
            Some(button) => {
                self.press(button);
                self.tester_print(&format!("Tester: pressed {}", byte as char));
            }
            None if byte.is_ascii_whitespace() => {}
            None => self.tester_print("Tester: unknown command"),
        }
    }
}

/// Shared model of the DUT and tester boards.
#[derive(Debug, Clone)]
pub struct SimBench {
    state: Arc<Mutex<BenchState>>,
}

impl Default for SimBench {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBench {
    /// A freshly booted bench; each board has printed one boot line.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BenchState::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BenchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn dut_port(&self) -> SimPort {
        SimPort {
            name: SIM_DUT_PORT.to_string(),
            side: Side::Dut,
            bench: self.clone(),
        }
    }

    pub fn tester_port(&self) -> SimPort {
        SimPort {
            name: SIM_TESTER_PORT.to_string(),
            side: Side::Tester,
            bench: self.clone(),
        }
    }

    /// The DUT acts on presses of `button` but no longer prints its echo.
    pub fn mute_press_echo(&self, button: Button) {
        self.lock().muted_press = Some(button);
    }

    /// Store every high limit off by `skew`, as a firmware bug would.
    pub fn skew_high_limit(&self, skew: i64) {
        self.lock().high_limit_skew = skew;
    }

    pub fn brightness(&self) -> i64 {
        self.lock().brightness
    }

    pub fn high_limit(&self) -> i64 {
        self.lock().high_limit
    }

    pub fn low_limit(&self) -> i64 {
        self.lock().low_limit
    }

    /// Opener that resolves [`SIM_DUT_PORT`] and [`SIM_TESTER_PORT`].
    pub fn opener(&self) -> SimOpener {
        SimOpener {
            bench: self.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Dut,
    Tester,
}

/// Host-side end of one simulated board's serial line.
#[derive(Debug)]
pub struct SimPort {
    name: String,
    side: Side,
    bench: SimBench,
}

impl SerialPortAdapter for SimPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.bench.lock();
        for &byte in data {
            match self.side {
                Side::Dut => state.dut_input(byte),
                Side::Tester => state.tester_input(byte),
            }
        }
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        {
            let mut state = self.bench.lock();
            let out = match self.side {
                Side::Dut => &mut state.dut_out,
                Side::Tester => &mut state.tester_out,
            };
            let n = buffer.len().min(out.len());
            for (slot, byte) in buffer.iter_mut().zip(out.drain(..n)) {
                *slot = byte;
            }
            if n > 0 {
                return Ok(n);
            }
        }
        // Lock released so the other side can keep talking while we idle.
        std::thread::sleep(IDLE_DELAY);
        Err(PortError::timeout(IDLE_DELAY))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bytes_to_read(&self) -> Option<usize> {
        let state = self.bench.lock();
        Some(match self.side {
            Side::Dut => state.dut_out.len(),
            Side::Tester => state.tester_out.len(),
        })
    }
}

/// Resolves the simulated port names to the bench's two ports.
#[derive(Debug, Clone)]
pub struct SimOpener {
    bench: SimBench,
}

impl PortOpener for SimOpener {
    fn open(
        &mut self,
        port_name: &str,
        _config: PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        match port_name {
            SIM_DUT_PORT => Ok(Box::new(self.bench.dut_port())),
            SIM_TESTER_PORT => Ok(Box::new(self.bench.tester_port())),
            other => Err(PortError::not_found(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(port: &mut SimPort) -> String {
        String::from_utf8(port.read_available().unwrap()).unwrap()
    }

    #[test]
    fn test_boards_print_boot_line() {
        let bench = SimBench::new();
        assert_eq!(read_all(&mut bench.dut_port()), "DUT ready\r\n");
        assert_eq!(read_all(&mut bench.tester_port()), "Tester ready\r\n");
    }

    #[test]
    fn test_tester_press_reaches_dut() {
        let bench = SimBench::new();
        let mut dut = bench.dut_port();
        let mut tester = bench.tester_port();
        read_all(&mut dut);
        read_all(&mut tester);

        tester.write_bytes(b"H").unwrap();
        assert_eq!(read_all(&mut dut), "High Limit: Pressed\r\n");
        assert_eq!(read_all(&mut tester), "Tester: pressed H\r\n");
    }

    #[test]
    fn test_value_entry_updates_selected_mode() {
        let bench = SimBench::new();
        let mut dut = bench.dut_port();
        read_all(&mut dut);

        dut.write_bytes(b"L").unwrap();
        dut.write_bytes(b"20\n").unwrap();
        assert_eq!(
            read_all(&mut dut),
            "Low Limit: Pressed\r\nReceived: 20\r\n-> Updated Low Limit\r\n"
        );
        assert_eq!(bench.low_limit(), 20);
    }

    #[test]
    fn test_value_without_mode_is_ignored() {
        let bench = SimBench::new();
        let mut dut = bench.dut_port();
        read_all(&mut dut);

        dut.write_bytes(b"55\n").unwrap();
        assert!(read_all(&mut dut).contains("Ignored"));
        assert_eq!(bench.high_limit(), 80);
    }

    #[test]
    fn test_ldr_follows_brightness() {
        let bench = SimBench::new();
        let mut dut = bench.dut_port();
        read_all(&mut dut);

        dut.write_bytes(b"B150\n?").unwrap();
        let out = read_all(&mut dut);
        assert_eq!(bench.brightness(), MAX_BRIGHTNESS);
        let expected = AMBIENT_LDR + MAX_BRIGHTNESS * LDR_PER_STEP;
        assert!(out.contains(&format!("STATUS: LDR={expected} ")));
    }

    #[test]
    fn test_opener_rejects_unknown_names() {
        let bench = SimBench::new();
        let mut opener = bench.opener();
        assert!(opener.open(SIM_DUT_PORT, PortConfiguration::default()).is_ok());
        assert!(matches!(
            opener.open("COM6", PortConfiguration::default()),
            Err(PortError::NotFound(_))
        ));
    }
}
