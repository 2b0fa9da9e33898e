//! Byte level access to the serial bus the power switch hangs off.

use std::path::Path;

use fugit::MillisDurationU32;

use crate::error::{Error, Result};

/// A byte addressable bus handle, e.g. an i2c-dev character device.
///
/// Reads and writes go through [`embedded_io::Read`] & [`embedded_io::Write`]. A single `read`/`write` call is one
/// bus transaction addressed to the target set with [`configure_target`](Self::configure_target).
pub trait BusTransport: embedded_io::Read + embedded_io::Write {
    /// Open the bus device at `path` for reading and writing.
    fn open(&mut self, path: &Path) -> core::result::Result<(), Self::Error>;

    /// Select the slave address all following transactions go to.
    fn configure_target(&mut self, address: u8) -> core::result::Result<(), Self::Error>;

    /// Bound every following transaction by `timeout`. `None` keeps whatever the handle uses now.
    ///
    /// Transports without a configurable timeout accept and ignore it.
    fn set_timeout(&mut self, timeout: Option<MillisDurationU32>) -> core::result::Result<(), Self::Error> {
        let _ = timeout;
        Ok(())
    }

    /// Release the handle. Calling this on a closed handle does nothing.
    fn close(&mut self);
}

/// Write `buffer` as one transaction. Anything less than the full buffer being accepted is a failure.
pub fn write_bytes<B: BusTransport>(bus: &mut B, buffer: &[u8]) -> Result<usize, B::Error> {
    let written = bus.write(buffer).map_err(Error::Io)?;
    if written != buffer.len() {
        return Err(Error::ShortWrite {
            expected: buffer.len(),
            actual: written,
        });
    }
    Ok(written)
}

/// Read exactly `buffer.len()` bytes in one transaction.
pub fn read_bytes<B: BusTransport>(bus: &mut B, buffer: &mut [u8]) -> Result<(), B::Error> {
    let read = bus.read(buffer).map_err(Error::Io)?;
    if read != buffer.len() {
        return Err(Error::ShortRead {
            expected: buffer.len(),
            actual: read,
        });
    }
    Ok(())
}
