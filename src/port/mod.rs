//! Port abstraction layer for serial communication.
//!
//! Everything above this layer talks to a [`SerialPortAdapter`], so the same
//! test protocol runs against real hardware, scripted mocks, or the simulated
//! bench in [`crate::sim`].

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::MockSerialPort;
pub use sync_port::{list_ports, SyncSerialPort};
pub use traits::{PortConfiguration, SerialPortAdapter};
