//! [`BusTransport`] for Linux i2c-dev character devices (`/dev/i2c-N`).

use std::{
    fs::{File, OpenOptions},
    io,
    os::{fd::AsRawFd, raw::c_int},
    path::Path,
};

use fugit::MillisDurationU32;

use crate::bus::BusTransport;

/// Set the slave address for following read/write calls.
const I2C_SLAVE: u16 = 0x0703;
/// Set the adapter timeout, in units of 10 ms.
const I2C_TIMEOUT: u16 = 0x0702;

mod ioctl {
    use super::{I2C_SLAVE, I2C_TIMEOUT};

    nix::ioctl_write_int_bad!(i2c_set_slave, I2C_SLAVE);
    nix::ioctl_write_int_bad!(i2c_set_timeout, I2C_TIMEOUT);
}

/// Error returned by [`LinuxI2cBus`], a thin wrapper making [`std::io::Error`] usable as an [`embedded_io::Error`].
#[derive(Debug)]
pub struct LinuxI2cError(pub io::Error);

impl core::fmt::Display for LinuxI2cError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for LinuxI2cError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<io::Error> for LinuxI2cError {
    fn from(err: io::Error) -> Self {
        LinuxI2cError(err)
    }
}

impl From<nix::errno::Errno> for LinuxI2cError {
    fn from(err: nix::errno::Errno) -> Self {
        LinuxI2cError(err.into())
    }
}

impl embedded_io::Error for LinuxI2cError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            io::ErrorKind::NotConnected => embedded_io::ErrorKind::NotConnected,
            io::ErrorKind::AddrNotAvailable => embedded_io::ErrorKind::AddrNotAvailable,
            io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

/// An i2c-dev bus handle. Starts closed, see [`BusTransport::open`].
#[derive(Debug, Default)]
pub struct LinuxI2cBus {
    file: Option<File>,
}

impl LinuxI2cBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn file(&mut self) -> Result<&mut File, LinuxI2cError> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected).into())
    }
}

impl embedded_io::ErrorType for LinuxI2cBus {
    type Error = LinuxI2cError;
}

impl embedded_io::Read for LinuxI2cBus {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        io::Read::read(self.file()?, buf).map_err(LinuxI2cError)
    }
}

impl embedded_io::Write for LinuxI2cBus {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        io::Write::write(self.file()?, buf).map_err(LinuxI2cError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        io::Write::flush(self.file()?).map_err(LinuxI2cError)
    }
}

impl BusTransport for LinuxI2cBus {
    fn open(&mut self, path: &Path) -> Result<(), Self::Error> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        self.file = Some(file);
        Ok(())
    }

    fn configure_target(&mut self, address: u8) -> Result<(), Self::Error> {
        let fd = self.file()?.as_raw_fd();
        // SAFETY: `fd` belongs to the open file held in `self.file`, I2C_SLAVE takes its argument by value.
        unsafe { ioctl::i2c_set_slave(fd, c_int::from(address)) }?;
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Option<MillisDurationU32>) -> Result<(), Self::Error> {
        let Some(timeout) = timeout else {
            return Ok(());
        };
        let fd = self.file()?.as_raw_fd();
        // The adapter counts in jiffies of 10 ms, never ask for zero.
        let ticks = c_int::try_from(timeout.to_millis().div_ceil(10).max(1)).unwrap_or(c_int::MAX);
        // SAFETY: `fd` belongs to the open file held in `self.file`, I2C_TIMEOUT takes its argument by value.
        unsafe { ioctl::i2c_set_timeout(fd, ticks) }?;
        Ok(())
    }

    fn close(&mut self) {
        // Dropping the file closes the descriptor.
        self.file = None;
    }
}
