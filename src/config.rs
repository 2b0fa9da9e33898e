//! Where the power switch lives and how to reach it.

use std::path::{Path, PathBuf};

use fugit::MillisDurationU32;

use crate::register::PowerRegisters;

/// Bus device of the reference hardware.
pub const DEFAULT_DEVICE: &str = "/dev/i2c-2";
/// Slave address of the reference hardware.
pub const DEFAULT_SLAVE_ADDRESS: u8 = 0x22;

/// Everything [`PowerSwitch::initialize`](crate::power::PowerSwitch::initialize) needs to open a session.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Bus character device, e.g. `/dev/i2c-2`.
    pub device: PathBuf,
    /// 7-bit slave address of the switch.
    pub slave_address: u8,
    pub registers: PowerRegisters,
    /// Upper bound for a single bus transaction. `None` leaves the adapter default in place.
    pub timeout: Option<MillisDurationU32>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
            slave_address: DEFAULT_SLAVE_ADDRESS,
            registers: PowerRegisters::default(),
            timeout: None,
        }
    }
}

impl BusConfig {
    pub fn new(device: impl Into<PathBuf>, slave_address: u8) -> Self {
        Self {
            device: device.into(),
            slave_address,
            ..Default::default()
        }
    }

    pub fn with_data_register(mut self, address: u8) -> Self {
        self.registers.data = address;
        self
    }

    pub fn with_io_direction_register(mut self, address: u8) -> Self {
        self.registers.io_direction = address;
        self
    }

    pub fn with_timeout(mut self, timeout: MillisDurationU32) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn device(&self) -> &Path {
        &self.device
    }
}
