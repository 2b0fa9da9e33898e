//! This crate drives a 16 channel DC power switch sitting behind a single 16-bit control register on an I2C bus.
//!
//! Each channel is one bit of the data register: channel `n` is bit `n - 1`, and a set bit means the output is
//! energized. The hardware register is the only state, the driver never caches it. Every mutating call reads the
//! register, combines, and writes it back, and every write is verified by reading the register again.
//!
//! A 16-bit register is accessed as two 8-bit sub-registers, low byte at `address` and high byte at `address + 1`:
//! * Write frame: `[address, data]`.
//! * Read: a one byte pointer-set write `[address]` followed by a one byte read.
//!
//! Default wiring, as used by the reference hardware:
//! * Bus device: `/dev/i2c-2`
//! * Slave address: `0x22`
//! * Data register: `0x04`
//! * I/O direction register: `0x8C`
//!
//! Any transport which implements [`bus::BusTransport`] can be used. With the `linux` feature (on by default) the
//! [`linux::LinuxI2cBus`] transport talks to an i2c-dev character device.
//!
//! ```no_run
//! # #[cfg(all(feature = "linux", target_os = "linux"))]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use i2c_power_switch::{config::BusConfig, linux::LinuxI2cBus, power::PowerSwitch, types::Channel};
//!
//! let switch = PowerSwitch::initialize(LinuxI2cBus::new(), &BusConfig::default())?;
//! switch.enable(Channel::Power3)?;
//! assert!(switch.mask_read()?.contains(Channel::Power3));
//! switch.disable(Channel::Power3)?;
//! # Ok(())
//! # }
//! # #[cfg(not(all(feature = "linux", target_os = "linux")))]
//! # fn main() {}
//! ```

pub mod bus;
pub mod config;
pub mod error;
pub mod power;
pub mod register;
pub mod types;

#[cfg(all(feature = "linux", target_os = "linux"))]
pub mod linux;

#[cfg(test)]
mod mock_bus;
