//! This crate provides an interface for communicating with and controlling the EA-PS 2000 B series of
//! programmable bench power supplies.
//!
//! It supports `no-std` environments by disabling the default `std` feature.
//!
//! Example PSU model numbers which this should work with:
//! * PS 2042-06 B
//! * PS 2042-10 B
//! * PS 2042-20 B
//! * PS 2084-03 B
//! * PS 2084-05 B
//!
//! It speaks the EA telegram protocol (a short, length-prefixed frame with an additive checksum) and is
//! suitable for the USB virtual COM port of the units or any other byte stream transport which implements
//! [embedded_io::Read], [embedded_io::Write] and [embedded_io::ReadReady].
//!
//! The serial port used for PSU comms should be configured like so:
//! * Baud rate: 115200
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: Odd

#![cfg_attr(not(feature = "std"), no_std)]

pub mod checksum;
pub mod codec;
pub mod error;
pub mod exchange;
pub mod fault;
pub mod object;
pub mod psu;
pub mod telegram;
pub mod types;

#[cfg(test)]
mod mock_serial;
