//! This module is used to define the objects of the PS 2000 B.
//!
//! The table is fixed for the device family and is not configurable.
use strum_macros::EnumIter;

#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter)]
#[repr(u8)]
pub enum PsObject {
    /// __R__ - Device type, string.
    DeviceType = 0,
    /// __R__ - Serial number, string.
    SerialNo = 1,
    /// __R__ - Nominal voltage, float.
    NominalVoltage = 2,
    /// __R__ - Nominal current, float.
    NominalCurrent = 3,
    /// __R__ - Nominal power, float.
    NominalPower = 4,
    /// __R__ - Article number, string.
    ArticleNo = 6,
    /// __R__ - Manufacturer, string.
    Manufacturer = 8,
    /// __R__ - Software version, string.
    SoftwareVersion = 9,
    /// __R__ - Device class, integer.
    DeviceClass = 19,
    /// __R/W__ - Over voltage protection threshold.
    ///
    /// Scaled integer, `25600` is 100% of nominal voltage.
    OvpThreshold = 38,
    /// __R/W__ - Over current protection threshold.
    ///
    /// Scaled integer, `25600` is 100% of nominal current.
    OcpThreshold = 39,
    /// __R/W__ - Voltage setpoint. Scaled integer.
    VoltageSetpoint = 50,
    /// __R/W__ - Current setpoint. Scaled integer.
    CurrentSetpoint = 51,
    /// __R/W__ - Power supply control.
    ///
    /// Written as a `[mask, value]` pair:
    /// * `0x10` - Remote control.
    /// * `0x01` - Output on.
    Control = 54,
    /// __R__ - Device status and actual values.
    ///
    /// See [`ActualState`](crate::types::ActualState).
    StatusActual = 71,
}

impl From<PsObject> for u8 {
    fn from(value: PsObject) -> Self {
        value as u8
    }
}

/// Bit masks of the [`PsObject::Control`] object.
pub mod control {
    pub const REMOTE: u8 = 0x10;
    pub const OUTPUT: u8 = 0x01;
}
