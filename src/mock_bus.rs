//! We use this mocking module in unit tests to emulate the power switch on an I2C bus.
//!
//! The device side is modelled as a 256 byte register file behind a pointer register, like the real expander:
//! a one byte write moves the pointer, a two byte write stores `data` at `register`, and a one byte read returns
//! the register under the pointer.

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use fugit::MillisDurationU32;
use thiserror::Error;

use crate::bus::BusTransport;

/// Our mock type used to emulate the switch behind an I2C bus.
pub struct MockBus {
    /// Simulated device registers.
    registers: [u8; 256],
    /// Register the next read returns.
    pointer: u8,
    /// Every byte written, in order, until the buffer is full.
    write_buffer: heapless::Vec<u8, 1024>,
    /// Number of read and write calls, including failed ones.
    transactions: usize,
    is_open: bool,
    target: Option<u8>,
    timeout: Option<MillisDurationU32>,
    /// Closes of an open handle. Shared, so it can still be read after the bus is moved away or dropped.
    closes: Arc<AtomicUsize>,
    /// Flag to simulate `open` failing.
    should_error_on_open: bool,
    /// Flag to simulate the slave address being rejected.
    should_error_on_target: bool,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
    /// Reads return no data.
    short_read: bool,
    /// Accept at most this many bytes per write.
    write_limit: Option<usize>,
    /// Writes addressed to this 16-bit register (either sub-register) fail.
    failing_register: Option<u8>,
    /// Reads of `(sub_register, xor)` come back with `xor` flipped.
    readback_fault: Option<(u8, u8)>,
}

#[derive(Debug, Error)]
pub enum MockBusError {
    /// The bus device does not exist.
    #[error("No such bus device")]
    NotFound,
    /// Nobody acknowledges the slave address.
    #[error("Slave address not acknowledged")]
    NoAcknowledge,
    /// Transaction on a closed handle.
    #[error("Bus is closed")]
    NotOpen,
    /// Generic simulated error for testing
    #[error("Simulated error")]
    SimulatedError,
}

impl embedded_io::Error for MockBusError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockBusError::NotFound => embedded_io::ErrorKind::NotFound,
            MockBusError::NoAcknowledge => embedded_io::ErrorKind::AddrNotAvailable,
            MockBusError::NotOpen => embedded_io::ErrorKind::NotConnected,
            MockBusError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockBus {
    type Error = MockBusError;
}

impl embedded_io::Write for MockBus {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.transactions += 1;
        if !self.is_open {
            return Err(MockBusError::NotOpen);
        }
        if self.should_error_on_write {
            return Err(MockBusError::SimulatedError);
        }
        if let (Some(register), Some(&first)) = (self.failing_register, buf.first()) {
            if first == register || first == register.wrapping_add(1) {
                return Err(MockBusError::SimulatedError);
            }
        }

        let accepted = match self.write_limit {
            Some(limit) => buf.len().min(limit),
            None => buf.len(),
        };
        let buf = &buf[..accepted];

        for &byte in buf {
            if self.write_buffer.push(byte).is_err() {
                break;
            }
        }

        match *buf {
            [register] => self.pointer = register,
            [register, data] => {
                self.registers[usize::from(register)] = data;
                self.pointer = register;
            }
            _ => {}
        }

        Ok(accepted)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Read for MockBus {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.transactions += 1;
        if !self.is_open {
            return Err(MockBusError::NotOpen);
        }
        if self.should_error_on_read {
            return Err(MockBusError::SimulatedError);
        }
        if self.short_read || buf.is_empty() {
            return Ok(0);
        }

        let mut value = self.registers[usize::from(self.pointer)];
        if let Some((register, xor)) = self.readback_fault {
            if register == self.pointer {
                value ^= xor;
            }
        }
        buf[0] = value;
        Ok(1)
    }
}

impl BusTransport for MockBus {
    fn open(&mut self, _path: &Path) -> Result<(), Self::Error> {
        if self.should_error_on_open {
            return Err(MockBusError::NotFound);
        }
        self.is_open = true;
        Ok(())
    }

    fn configure_target(&mut self, address: u8) -> Result<(), Self::Error> {
        if !self.is_open {
            return Err(MockBusError::NotOpen);
        }
        if self.should_error_on_target {
            return Err(MockBusError::NoAcknowledge);
        }
        self.target = Some(address);
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Option<MillisDurationU32>) -> Result<(), Self::Error> {
        if !self.is_open {
            return Err(MockBusError::NotOpen);
        }
        if timeout.is_some() {
            self.timeout = timeout;
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.is_open {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
        self.is_open = false;
    }
}

impl MockBus {
    /// Create a new MockBus which is already open, with all registers zeroed.
    pub fn new() -> Self {
        Self {
            registers: [0; 256],
            pointer: 0,
            write_buffer: heapless::Vec::new(),
            transactions: 0,
            is_open: true,
            target: None,
            timeout: None,
            closes: Arc::new(AtomicUsize::new(0)),
            should_error_on_open: false,
            should_error_on_target: false,
            should_error_on_write: false,
            should_error_on_read: false,
            short_read: false,
            write_limit: None,
            failing_register: None,
            readback_fault: None,
        }
    }

    /// A bus which has not been opened yet, as handed to `PowerSwitch::initialize`.
    pub fn closed() -> Self {
        Self {
            is_open: false,
            ..Self::new()
        }
    }

    pub fn register(&self, address: u8) -> u8 {
        self.registers[usize::from(address)]
    }

    pub fn set_register(&mut self, address: u8, value: u8) {
        self.registers[usize::from(address)] = value;
    }

    /// Get a reference to the data that was written to this mock bus
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Clear the write buffer
    pub fn clear_written_data(&mut self) {
        self.write_buffer.clear();
    }

    pub fn transactions(&self) -> usize {
        self.transactions
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn target(&self) -> Option<u8> {
        self.target
    }

    /// Timeout most recently applied through [`BusTransport::set_timeout`].
    pub fn timeout(&self) -> Option<MillisDurationU32> {
        self.timeout
    }

    /// How many times an open handle was closed.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// A handle on the close counter which outlives the bus.
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }

    pub fn set_open_error(&mut self, should_error: bool) {
        self.should_error_on_open = should_error;
    }

    pub fn set_target_error(&mut self, should_error: bool) {
        self.should_error_on_target = should_error;
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    pub fn set_short_read(&mut self, short: bool) {
        self.short_read = short;
    }

    pub fn set_write_limit(&mut self, limit: Option<usize>) {
        self.write_limit = limit;
    }

    /// Make every write to the 16-bit register at `register` fail.
    pub fn set_failing_register(&mut self, register: Option<u8>) {
        self.failing_register = register;
    }

    /// Flip the bits in `xor` whenever `sub_register` is read.
    pub fn set_readback_fault(&mut self, sub_register: u8, xor: u8) {
        self.readback_fault = Some((sub_register, xor));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, Write};

    #[test]
    fn pointer_write_then_read() {
        let mut mock = MockBus::new();
        mock.set_register(0x10, 0xAB);

        assert_eq!(mock.write(&[0x10]).unwrap(), 1);
        let mut buf = [0u8; 1];
        assert_eq!(mock.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 0xAB);
    }

    #[test]
    fn register_write_stores_data() {
        let mut mock = MockBus::new();
        mock.write(&[0x04, 0x55]).unwrap();
        assert_eq!(mock.register(0x04), 0x55);
        assert_eq!(mock.written_data(), &[0x04, 0x55]);
    }

    #[test]
    fn closed_bus_rejects_transactions() {
        let mut mock = MockBus::closed();
        assert!(matches!(mock.write(&[0x04]), Err(MockBusError::NotOpen)));

        mock.open(Path::new("/dev/i2c-2")).unwrap();
        assert!(mock.write(&[0x04]).is_ok());

        mock.close();
        mock.close();
        assert_eq!(mock.close_count(), 1);
        assert!(!mock.is_open());
    }

    #[test]
    fn close_counter_outlives_the_bus() {
        let mut mock = MockBus::new();
        let closes = mock.close_counter();
        mock.close();
        drop(mock);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn timeout_is_recorded_while_open() {
        let mut mock = MockBus::closed();
        assert!(matches!(
            mock.set_timeout(Some(MillisDurationU32::millis(100))),
            Err(MockBusError::NotOpen)
        ));

        mock.open(Path::new("/dev/i2c-2")).unwrap();
        mock.set_timeout(Some(MillisDurationU32::millis(100))).unwrap();
        mock.set_timeout(None).unwrap();
        assert_eq!(mock.timeout().map(|t| t.to_millis()), Some(100));
    }

    #[test]
    fn failing_register_covers_both_bytes() {
        let mut mock = MockBus::new();
        mock.set_failing_register(Some(0x8C));
        assert!(mock.write(&[0x8C, 0x00]).is_err());
        assert!(mock.write(&[0x8D, 0x00]).is_err());
        assert!(mock.write(&[0x04, 0x00]).is_ok());
    }

    #[test]
    fn test_clear_written_data() {
        let mut mock = MockBus::new();
        mock.write(&[0x01, 0x02]).unwrap();
        assert!(!mock.written_data().is_empty());

        mock.clear_written_data();
        assert!(mock.written_data().is_empty());
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            MockBusError::NotFound.kind(),
            embedded_io::ErrorKind::NotFound
        ));
        assert!(matches!(
            MockBusError::NotOpen.kind(),
            embedded_io::ErrorKind::NotConnected
        ));
        assert!(matches!(
            MockBusError::SimulatedError.kind(),
            embedded_io::ErrorKind::Other
        ));
    }
}
