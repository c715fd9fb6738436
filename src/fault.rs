//! Faults reported by the device itself.
//!
//! When a response carries `0xFF` in place of the object byte, the following byte is an error code. `0x00`
//! means the request was accepted, everything else maps onto [`DeviceFault`].

use strum_macros::EnumIter;
use thiserror::Error;

/// Marker the device places at offset 2 of a response to signal an error/acknowledge telegram.
pub const ERROR_MARKER: u8 = 0xFF;

/// Error code of an acknowledge telegram for a successful request.
pub const NO_ERROR: u8 = 0x00;

/// The documented fault vocabulary of the PS 2000 B.
#[derive(Error, Debug, EnumIter, PartialEq, Eq, Clone, Copy)]
pub enum DeviceFault {
    /// 0x03
    #[error("checksum incorrect")]
    ChecksumIncorrect,
    /// 0x04
    #[error("start delimiter incorrect")]
    StartDelimiterIncorrect,
    /// 0x05
    #[error("wrong address for output")]
    WrongOutputAddress,
    /// 0x07
    #[error("object not defined")]
    ObjectNotDefined,
    /// 0x08
    #[error("object length incorrect")]
    ObjectLengthIncorrect,
    /// 0x09: usually means the device is not in remote control mode.
    #[error("access denied")]
    AccessDenied,
    /// 0x0F
    #[error("device is locked")]
    DeviceLocked,
    /// 0x30
    #[error("upper limit exceeded")]
    UpperLimitExceeded,
    /// 0x31
    #[error("lower limit exceeded")]
    LowerLimitExceeded,
    /// Any other non-zero code.
    #[error("unknown device fault 0x{0:02X}")]
    UnknownFault(u8),
}

impl DeviceFault {
    /// Map a non-zero error code onto a fault.
    pub fn from_code(code: u8) -> Self {
        use DeviceFault as DF;
        match code {
            0x03 => DF::ChecksumIncorrect,
            0x04 => DF::StartDelimiterIncorrect,
            0x05 => DF::WrongOutputAddress,
            0x07 => DF::ObjectNotDefined,
            0x08 => DF::ObjectLengthIncorrect,
            0x09 => DF::AccessDenied,
            0x0F => DF::DeviceLocked,
            0x30 => DF::UpperLimitExceeded,
            0x31 => DF::LowerLimitExceeded,
            other => DF::UnknownFault(other),
        }
    }

    /// The error code the device uses for this fault.
    pub fn code(&self) -> u8 {
        use DeviceFault as DF;
        match *self {
            DF::ChecksumIncorrect => 0x03,
            DF::StartDelimiterIncorrect => 0x04,
            DF::WrongOutputAddress => 0x05,
            DF::ObjectNotDefined => 0x07,
            DF::ObjectLengthIncorrect => 0x08,
            DF::AccessDenied => 0x09,
            DF::DeviceLocked => 0x0F,
            DF::UpperLimitExceeded => 0x30,
            DF::LowerLimitExceeded => 0x31,
            DF::UnknownFault(code) => code,
        }
    }
}

/// Inspect a checksum-validated response for a device reported error.
///
/// Responses which do not carry [`ERROR_MARKER`] at offset 2 echo the requested object and are passed through.
pub fn decode(response: &[u8]) -> Result<(), DeviceFault> {
    match (response.get(2), response.get(3)) {
        (Some(&ERROR_MARKER), Some(&NO_ERROR)) => Ok(()),
        (Some(&ERROR_MARKER), Some(&code)) => Err(DeviceFault::from_code(code)),
        _ => Ok(()),
    }
}
