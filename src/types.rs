//! This module contains types relevant to the PSU objects and their scaling.

use modular_bitfield::prelude::*;

/// Raw value which represents 100% of a nominal rating.
pub const FULL_SCALE: u16 = 25600;

/// Largest raw value the device accepts in a write. Writes are 16-bit signed.
pub const MAX_RAW: u16 = i16::MAX as u16;

/// Nominal ratings read from the device when a session opens.
///
/// All setpoints, thresholds and actual values are transferred as a fraction of these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Volts.
    pub nominal_voltage: f32,
    /// Amps.
    pub nominal_current: f32,
}

impl Calibration {
    pub const fn new(nominal_voltage: f32, nominal_current: f32) -> Self {
        Self {
            nominal_voltage,
            nominal_current,
        }
    }

    #[inline]
    pub fn raw_to_voltage(&self, raw: u16) -> f32 {
        scale_up(raw, self.nominal_voltage)
    }

    #[inline]
    pub fn voltage_to_raw(&self, volts: f32) -> Option<u16> {
        scale_down(volts, self.nominal_voltage)
    }

    #[inline]
    pub fn raw_to_current(&self, raw: u16) -> f32 {
        scale_up(raw, self.nominal_current)
    }

    #[inline]
    pub fn current_to_raw(&self, amps: f32) -> Option<u16> {
        scale_down(amps, self.nominal_current)
    }
}

/// `physical = nominal * raw / 25600`
pub fn scale_up(raw: u16, nominal: f32) -> f32 {
    nominal * raw as f32 / FULL_SCALE as f32
}

/// `raw = round(physical * 25600 / nominal)`
///
/// Returns `None` when the result is not representable: negative or non-finite input, a non-positive
/// nominal, or a raw value above [`MAX_RAW`].
pub fn scale_down(physical: f32, nominal: f32) -> Option<u16> {
    if !(nominal > 0.0) || !physical.is_finite() || physical < 0.0 {
        return None;
    }
    let scaled = physical * FULL_SCALE as f32 / nominal;
    if !scaled.is_finite() || scaled >= MAX_RAW as f32 + 1.0 {
        return None;
    }
    // Round half up on the fraction alone.
    let whole = scaled as u16;
    let rounded = if scaled - whole as f32 >= 0.5 {
        whole + 1
    } else {
        whole
    };
    (rounded <= MAX_RAW).then_some(rounded)
}

/// Remote and output bits of the control object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlState {
    pub remote: bool,
    pub output: bool,
}

impl ControlState {
    /// Decode the first two data bytes of a control/status answer.
    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        let status = StatusWord::from_bytes(bytes);
        Self {
            remote: status.control_location() == CONTROL_REMOTE,
            output: status.output_on(),
        }
    }
}

const CONTROL_REMOTE: u8 = 0b01;
const REGULATION_CC: u8 = 0b10;

/// Device state word as laid out in the PS 2000 B object list.
///
/// Byte 0 holds the control location, byte 1 the output and alarm bits.
#[bitfield(bytes = 2)]
#[derive(Debug, Clone, Copy)]
pub struct StatusWord {
    /// `0b01` when under remote control.
    pub control_location: B2,
    #[skip]
    unused_location: B6,
    pub output_on: bool,
    /// `0b00` constant voltage, `0b10` constant current.
    pub regulation: B2,
    pub over_voltage: bool,
    pub over_current: bool,
    pub over_power: bool,
    pub over_temperature: bool,
    #[skip]
    unused_alarm: B1,
}

/// Status flags of the actual value object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceStatus {
    pub remote: bool,
    pub local: bool,
    pub output_on: bool,
    pub constant_current: bool,
    pub constant_voltage: bool,
    pub over_voltage: bool,
    pub over_current: bool,
    pub over_power: bool,
    pub over_temperature: bool,
}

impl From<StatusWord> for DeviceStatus {
    fn from(word: StatusWord) -> Self {
        let remote = word.control_location() == CONTROL_REMOTE;
        let constant_current = word.regulation() == REGULATION_CC;
        Self {
            remote,
            local: !remote,
            output_on: word.output_on(),
            constant_current,
            constant_voltage: !constant_current,
            over_voltage: word.over_voltage(),
            over_current: word.over_current(),
            over_power: word.over_power(),
            over_temperature: word.over_temperature(),
        }
    }
}

/// Snapshot of the actual value object: status plus measured output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActualState {
    pub status: DeviceStatus,
    /// Volts.
    pub voltage: f32,
    /// Amps.
    pub current: f32,
}

impl ActualState {
    /// Decode the six data bytes of the actual value object.
    pub fn from_bytes(bytes: [u8; 6], calibration: &Calibration) -> Self {
        let status = StatusWord::from_bytes([bytes[0], bytes[1]]);
        let voltage_raw = u16::from_be_bytes([bytes[2], bytes[3]]);
        let current_raw = u16::from_be_bytes([bytes[4], bytes[5]]);
        Self {
            status: status.into(),
            voltage: calibration.raw_to_voltage(voltage_raw),
            current: calibration.raw_to_current(current_raw),
        }
    }
}
