//! Our error types for the power switch.

use thiserror::Error;

use crate::types::ChannelOutOfRange;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for power switch communications.
///
/// `I` is the error type of the underlying bus transport.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Failed to open the bus")]
    OpenFailed(I),
    #[error("Failed to acquire bus access and/or talk to slave 0x{address:02X}")]
    TargetAcquireFailed { address: u8, error: I },
    #[error("Bus communication error")]
    Io(I),
    #[error("Short write: {actual} of {expected} bytes accepted")]
    ShortWrite { expected: usize, actual: usize },
    #[error("Short read: {actual} of {expected} bytes returned")]
    ShortRead { expected: usize, actual: usize },
    #[error("Readback of register 0x{register:02X} failed. Expected 0x{expected:04X}, got 0x{observed:04X}")]
    VerifyMismatch {
        register: u8,
        expected: u16,
        observed: u16,
    },
    #[error(transparent)]
    ChannelOutOfRange(#[from] ChannelOutOfRange),
    #[error("Power switch is not initialized")]
    NotInitialized,
}

/// Coarse classification of an [`Error`], independent of the transport error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bus device could not be opened.
    OpenFailed,
    /// The slave address could not be configured.
    TargetAcquireFailed,
    /// A byte transaction failed or was incomplete.
    IoFailed,
    /// A write did not read back as written.
    VerifyMismatch,
    /// Channel ID outside of 1..=16.
    ChannelOutOfRange,
    /// The session has been deinitialized.
    NotInitialized,
}

impl<I: embedded_io::Error> Error<I> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::OpenFailed(_) => ErrorKind::OpenFailed,
            Error::TargetAcquireFailed { .. } => ErrorKind::TargetAcquireFailed,
            Error::Io(_) | Error::ShortWrite { .. } | Error::ShortRead { .. } => ErrorKind::IoFailed,
            Error::VerifyMismatch { .. } => ErrorKind::VerifyMismatch,
            Error::ChannelOutOfRange(_) => ErrorKind::ChannelOutOfRange,
            Error::NotInitialized => ErrorKind::NotInitialized,
        }
    }
}
