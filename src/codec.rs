//! Typed object access on top of [`Exchange`].
//!
//! These perform no validation of their own beyond making sure a validated answer is long enough for the
//! value being decoded.

use embedded_io::{Read, ReadReady, Write};

use crate::{
    error::{Error, Result},
    exchange::{Exchange, SettleDelay, TelegramObserver},
    fault::{ERROR_MARKER, NO_ERROR},
    telegram::{HEADER_LEN, MAX_PAYLOAD, RequestKind},
};

/// Longest string object the device can answer with.
pub type ObjectString = heapless::String<MAX_PAYLOAD>;

/// Raw data of a binary object.
pub type ObjectBytes = heapless::Vec<u8, MAX_PAYLOAD>;

impl<S, D, O> Exchange<S, D, O>
where
    S: Read + Write + ReadReady,
    D: SettleDelay,
    O: TelegramObserver,
{
    /// Read a binary object.
    pub fn get_binary(&mut self, object_id: u8) -> Result<ObjectBytes, S::Error> {
        let node = self.node();
        let response = self.exchange(RequestKind::Query, node, object_id, &[])?;
        to_object_bytes(response.payload())
    }

    /// Write a binary object as a `[mask, data]` pair.
    pub fn set_binary(&mut self, object_id: u8, mask: u8, data: u8) -> Result<ObjectBytes, S::Error> {
        let node = self.node();
        let response = self.exchange(RequestKind::Send, node, object_id, &[mask, data])?;
        to_object_bytes(response.payload())
    }

    /// Write a binary object and report whether the device answered with a plain acknowledge (`0xFF`, `0x00`).
    pub fn set_binary_acknowledged(
        &mut self,
        object_id: u8,
        mask: u8,
        data: u8,
    ) -> Result<bool, S::Error> {
        let node = self.node();
        let response = self.exchange(RequestKind::Send, node, object_id, &[mask, data])?;
        Ok(response.object() == ERROR_MARKER && response.error_code() == NO_ERROR)
    }

    /// Read a string object.
    ///
    /// String answers carry a terminating byte in front of the checksum which is not part of the text.
    pub fn get_string(&mut self, object_id: u8) -> Result<ObjectString, S::Error> {
        let node = self.node();
        let response = self.exchange(RequestKind::Query, node, object_id, &[])?;
        let frame = response.frame();
        let text = frame
            .get(HEADER_LEN..frame.len().saturating_sub(3))
            .unwrap_or_default();
        let text = core::str::from_utf8(text).map_err(|_| Error::InvalidResponse)?;
        ObjectString::try_from(text).map_err(|_| Error::InvalidResponse)
    }

    /// Read a float object.
    ///
    /// The device sends floats byte swapped relative to IEEE-754 big-endian.
    pub fn get_float(&mut self, object_id: u8) -> Result<f32, S::Error> {
        let node = self.node();
        let response = self.exchange(RequestKind::Query, node, object_id, &[])?;
        let mut raw: [u8; 4] = response
            .payload()
            .try_into()
            .map_err(|_| Error::InvalidResponse)?;
        raw.reverse();
        Ok(f32::from_be_bytes(raw))
    }

    /// Read a big-endian 16-bit integer object.
    pub fn get_integer(&mut self, object_id: u8) -> Result<u16, S::Error> {
        let node = self.node();
        let response = self.exchange(RequestKind::Query, node, object_id, &[])?;
        integer_at_header_end(response.frame())
    }

    /// Write a big-endian 16-bit integer object.
    ///
    /// Returns the integer found at the same position of the acknowledge.
    pub fn set_integer(&mut self, object_id: u8, value: u16) -> Result<u16, S::Error> {
        let node = self.node();
        let response = self.exchange(RequestKind::Send, node, object_id, &value.to_be_bytes())?;
        integer_at_header_end(response.frame())
    }
}

fn to_object_bytes<I: embedded_io::Error>(payload: &[u8]) -> Result<ObjectBytes, I> {
    ObjectBytes::from_slice(payload).map_err(|_| Error::InvalidResponse)
}

fn integer_at_header_end<I: embedded_io::Error>(frame: &[u8]) -> Result<u16, I> {
    match frame.get(HEADER_LEN..HEADER_LEN + 2) {
        Some(&[high, low]) => Ok(u16::from_be_bytes([high, low])),
        _ => Err(Error::InvalidResponse),
    }
}
