//! Telegram framing.
//!
//! ```text
//! ┌──────┬──────┬──────┬─────────────────┬──────────┐
//! │  SD  │  DN  │ OBJ  │  data (0..=16)  │ CS (BE)  │
//! └──────┴──────┴──────┴─────────────────┴──────────┘
//! ```
//!
//! `SD` is `0x30 + kind`, plus `len - 1` when data is present. `CS` is the [checksum](crate::checksum) of
//! every byte in front of it.

use crate::{checksum, error::ProtocolError};

/// Upper bound on the data section of a telegram. Four bits of the start delimiter hold `len - 1`.
pub const MAX_PAYLOAD: usize = 16;

/// SD + DN + OBJ.
pub const HEADER_LEN: usize = 3;

/// Largest possible telegram in either direction.
pub const MAX_TELEGRAM: usize = HEADER_LEN + MAX_PAYLOAD + 2;

/// Smallest response we accept. Even an acknowledge carries an error byte.
pub const MIN_RESPONSE: usize = 5;

const START_DELIMITER_BASE: u8 = 0x30;

pub type Frame = heapless::Vec<u8, MAX_TELEGRAM>;

/// Direction of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestKind {
    /// Read an object.
    Query = 0x40,
    /// Write an object.
    Send = 0xC0,
}

impl From<RequestKind> for u8 {
    fn from(value: RequestKind) -> Self {
        value as u8
    }
}

/// Build an outbound telegram.
pub fn encode(
    kind: RequestKind,
    node: u8,
    object_id: u8,
    payload: &[u8],
) -> Result<Frame, ProtocolError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(ProtocolError::PayloadTooLong { len: payload.len() });
    }

    let mut start = START_DELIMITER_BASE + u8::from(kind);
    if !payload.is_empty() {
        start += (payload.len() - 1) as u8;
    }

    let too_long = |_| ProtocolError::PayloadTooLong { len: payload.len() };
    let mut frame = Frame::new();
    frame
        .extend_from_slice(&[start, node, object_id])
        .map_err(too_long)?;
    frame.extend_from_slice(payload).map_err(too_long)?;
    let cs = checksum::compute(&frame);
    frame.extend_from_slice(&cs.to_be_bytes()).map_err(too_long)?;
    Ok(frame)
}

/// Check the length and trailing checksum of an inbound telegram.
pub fn decode_and_validate(raw: &[u8]) -> Result<Response<'_>, ProtocolError> {
    if raw.len() < MIN_RESPONSE {
        return Err(ProtocolError::Truncated { actual: raw.len() });
    }

    let (body, cs) = raw.split_at(raw.len() - 2);
    let received = u16::from_be_bytes([cs[0], cs[1]]);
    let expected = checksum::compute(body);
    if expected != received {
        return Err(ProtocolError::ChecksumMismatch { expected, received });
    }

    Ok(Response { frame: raw })
}

/// A response whose checksum has been verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'a> {
    frame: &'a [u8],
}

impl<'a> Response<'a> {
    /// Everything except the checksum.
    pub fn body(&self) -> &'a [u8] {
        &self.frame[..self.frame.len() - 2]
    }

    /// The whole telegram, checksum included.
    pub fn frame(&self) -> &'a [u8] {
        self.frame
    }

    /// Data between the header and the checksum.
    pub fn payload(&self) -> &'a [u8] {
        &self.frame[HEADER_LEN..self.frame.len() - 2]
    }

    /// Byte at offset 2: the echoed object, or `0xFF` for an acknowledge/error telegram.
    pub fn object(&self) -> u8 {
        self.frame[2]
    }

    /// Byte at offset 3: the error code of an acknowledge telegram.
    pub fn error_code(&self) -> u8 {
        self.frame[3]
    }
}
