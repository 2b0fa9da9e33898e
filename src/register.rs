//! Access to the switch's 16-bit registers.
//!
//! The hardware only knows 8-bit registers, so a 16-bit register at `address` is the pair of sub-registers
//! `address` (low byte) and `address + 1` (high byte).

use crate::{
    bus::{BusTransport, read_bytes, write_bytes},
    error::{Error, Result},
};

/// Data register address used by the reference hardware.
pub const DEFAULT_DATA_REGISTER: u8 = 0x04;
/// I/O direction register address used by the reference hardware.
pub const DEFAULT_IO_DIRECTION_REGISTER: u8 = 0x8C;

/// I/O direction value declaring all 16 lines as outputs.
pub const ALL_OUTPUTS: u16 = 0x0000;

/// The two 16-bit registers of the power switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerRegisters {
    /// __R/W__ - Output state, one bit per channel.
    pub data: u8,
    /// __W__ - Line direction. Written once at initialization, a `0` bit is an output.
    pub io_direction: u8,
}

impl Default for PowerRegisters {
    fn default() -> Self {
        Self {
            data: DEFAULT_DATA_REGISTER,
            io_direction: DEFAULT_IO_DIRECTION_REGISTER,
        }
    }
}

/// Read the 16-bit register at `address`.
///
/// Each byte is fetched with a pointer-set write of its sub-register address followed by a one byte read. Any
/// failure aborts the whole read, no partial value is returned.
pub fn read_u16<B: BusTransport>(bus: &mut B, address: u8) -> Result<u16, B::Error> {
    let mut bytes = [0u8; 2];
    for (offset, byte) in (0u8..).zip(bytes.iter_mut()) {
        let sub_register = address.wrapping_add(offset);
        write_bytes(bus, &[sub_register])?;
        read_bytes(bus, core::slice::from_mut(byte))?;
    }

    let value = u16::from_le_bytes(bytes);
    log::trace!("Read 0x{value:04X} from register 0x{address:02X}");
    Ok(value)
}

/// Write `value` to the 16-bit register at `address` and verify it by reading it back.
///
/// The low byte goes out as `[address, low]`, then the high byte as `[address + 1, high]`. A readback which differs
/// from `value` is reported as [`Error::VerifyMismatch`]; the write is not retried.
pub fn write_u16<B: BusTransport>(bus: &mut B, address: u8, value: u16) -> Result<(), B::Error> {
    let [low, high] = value.to_le_bytes();
    write_bytes(bus, &[address, low])?;
    write_bytes(bus, &[address.wrapping_add(1), high])?;
    log::trace!("Wrote 0x{value:04X} to register 0x{address:02X}");

    let observed = read_u16(bus, address)?;
    if observed != value {
        return Err(Error::VerifyMismatch {
            register: address,
            expected: value,
            observed,
        });
    }
    Ok(())
}
