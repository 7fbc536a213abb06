//! Scriptable in-memory serial port.
//!
//! `MockSerialPort` plays back queued bytes, records everything written, and
//! can react to specific writes with canned replies. Clones share state, so a
//! test can keep a handle while the harness owns another.

use super::error::PortError;
use super::traits::SerialPortAdapter;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes returned by subsequent reads.
    read_queue: VecDeque<u8>,
    /// Every write, in order.
    write_log: Vec<Vec<u8>>,
    /// Replies queued when a write equal to the trigger is seen. Consumed once.
    reactions: VecDeque<(Vec<u8>, Vec<u8>)>,
    /// Fail the next read/write with a hard I/O error.
    fail_next: bool,
    /// Simulated raw read timeout when the queue is empty.
    idle_delay: Duration,
}

/// In-memory serial port for tests.
///
/// # Example
/// ```
/// use serial_hil_tester::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("DUT");
/// port.react_to(b"?", b"STATUS: HL=50\n");
///
/// port.write_bytes(b"?").unwrap();
/// let mut buffer = [0u8; 32];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"STATUS: HL=50\n");
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create an empty mock port.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                idle_delay: Duration::from_millis(1),
                ..Default::default()
            })),
        }
    }

    /// Create a mock that will emit `lines`, each terminated with `\n`.
    pub fn with_lines<I, S>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut port = Self::new(name);
        for line in lines {
            port.enqueue_line(line.as_ref());
        }
        port
    }

    fn lock(&self) -> MutexGuard<'_, MockPortState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append raw bytes to the read queue.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.lock().read_queue.extend(data);
    }

    /// Append one `\n`-terminated line to the read queue.
    pub fn enqueue_line(&mut self, line: &str) {
        let mut state = self.lock();
        state.read_queue.extend(line.as_bytes());
        state.read_queue.push_back(b'\n');
    }

    /// When `trigger` is written, queue `reply` for reading. Reactions fire in
    /// registration order, each at most once.
    pub fn react_to(&mut self, trigger: &[u8], reply: &[u8]) {
        self.lock()
            .reactions
            .push_back((trigger.to_vec(), reply.to_vec()));
    }

    /// Make the next read or write fail with a broken-pipe error.
    pub fn fail_next(&mut self) {
        self.lock().fail_next = true;
    }

    /// How long an empty read blocks before reporting no data.
    pub fn set_idle_delay(&mut self, delay: Duration) {
        self.lock().idle_delay = delay;
    }

    /// Copy of every write, one entry per call.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.lock().write_log.clone()
    }

    /// All written bytes concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.lock().write_log.concat()
    }

    /// Bytes still waiting to be read.
    pub fn available_bytes(&self) -> usize {
        self.lock().read_queue.len()
    }

    /// Number of live handles sharing this mock's state.
    ///
    /// A test holding one clone sees `1` once the harness has dropped its copy.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.state)
    }

    fn broken_pipe() -> PortError {
        PortError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "mock port failure",
        ))
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.lock();
        if std::mem::take(&mut state.fail_next) {
            return Err(Self::broken_pipe());
        }

        state.write_log.push(data.to_vec());

        let fired = state
            .reactions
            .iter()
            .position(|(trigger, _)| trigger.as_slice() == data);
        if let Some(idx) = fired {
            if let Some((_, reply)) = state.reactions.remove(idx) {
                state.read_queue.extend(reply);
            }
        }

        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let idle_delay = {
            let mut state = self.lock();
            if std::mem::take(&mut state.fail_next) {
                return Err(Self::broken_pipe());
            }

            let mut bytes_read = 0;
            for byte in buffer.iter_mut() {
                match state.read_queue.pop_front() {
                    Some(b) => {
                        *byte = b;
                        bytes_read += 1;
                    }
                    None => break,
                }
            }
            if bytes_read > 0 {
                return Ok(bytes_read);
            }
            state.idle_delay
        };

        // Behave like a real port with a read timeout: block, then report none.
        std::thread::sleep(idle_delay);
        Err(PortError::timeout(idle_delay))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bytes_to_read(&self) -> Option<usize> {
        Some(self.available_bytes())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello");

        let mut buffer = [0u8; 10];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buffer[..n], b"Hello");
    }

    #[test]
    fn test_with_lines_terminates_each_line() {
        let port = MockSerialPort::with_lines("DUT", ["Received: 0", "-> Updated Brightness"]);
        assert_eq!(port.available_bytes(), "Received: 0\n-> Updated Brightness\n".len());
    }

    #[test]
    fn test_write_logging() {
        let mut port = MockSerialPort::new("MOCK0");
        port.write_bytes(b"B").unwrap();
        port.write_bytes(b"50\n").unwrap();

        assert_eq!(port.write_log(), vec![b"B".to_vec(), b"50\n".to_vec()]);
        assert_eq!(port.written(), b"B50\n");
    }

    #[test]
    fn test_reaction_fires_once() {
        let mut port = MockSerialPort::new("DUT");
        port.react_to(b"?", b"STATUS: LL=20\n");

        port.write_bytes(b"?").unwrap();
        port.write_bytes(b"?").unwrap();
        assert_eq!(port.available_bytes(), "STATUS: LL=20\n".len());
    }

    #[test]
    fn test_empty_read_reports_no_data() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_idle_delay(Duration::ZERO);

        let mut buffer = [0u8; 10];
        let err = port.read_bytes(&mut buffer).unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn test_fail_next_is_hard_error() {
        let mut port = MockSerialPort::new("MOCK0");
        port.fail_next();

        let err = port.write_bytes(b"B").unwrap_err();
        assert!(!err.is_no_data());
        // Only the next operation fails.
        assert!(port.write_bytes(b"B").is_ok());
    }

    #[test]
    fn test_handle_count_tracks_clones() {
        let port = MockSerialPort::new("MOCK0");
        let boxed: Box<dyn SerialPortAdapter> = Box::new(port.clone());
        assert_eq!(port.handle_count(), 2);
        drop(boxed);
        assert_eq!(port.handle_count(), 1);
    }
}
