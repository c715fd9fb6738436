//! Our error types for the PS 2000 B PSUs.

use thiserror::Error;

use crate::fault::DeviceFault;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Frame level failures, in either direction.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProtocolError {
    #[error("Response truncated: got {actual} bytes, need at least 5")]
    Truncated { actual: usize },
    #[error("Checksum mismatch: calculated 0x{expected:04X}, received 0x{received:04X}")]
    ChecksumMismatch { expected: u16, received: u16 },
    #[error("Payload of {len} bytes does not fit a telegram (max 16)")]
    PayloadTooLong { len: usize },
}

/// Custom error type for PS 2000 B communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    Serial(I),
    #[error("Telegram error: {0}")]
    Protocol(ProtocolError),
    #[error("Device reported: {0}")]
    Device(DeviceFault),
    #[error("Invalid range")]
    InvalidRange,
    #[error("Invalid response received")]
    InvalidResponse,
    #[error("Response does not fit the receive buffer")]
    BufferOverflow,
}

impl<I: embedded_io::Error> From<ProtocolError> for Error<I> {
    fn from(err: ProtocolError) -> Self {
        Error::Protocol(err)
    }
}

impl<I: embedded_io::Error> From<DeviceFault> for Error<I> {
    fn from(err: DeviceFault) -> Self {
        Error::Device(err)
    }
}
