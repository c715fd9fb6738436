use embedded_io::{Read, ReadReady, Write};
use tracing::{debug, warn};

use crate::{
    codec::ObjectString,
    error::{Error, Result},
    exchange::{Exchange, SettleDelay, TelegramObserver},
    object::{PsObject, control},
    types::{ActualState, Calibration, ControlState},
};

/// You can create a Ps2000 using any interface which implements [embedded_io::Read], [embedded_io::Write] &
/// [embedded_io::ReadReady].
///
/// For its methods, "get" reads an object back from the device and "set" writes one. Voltages are in volts and
/// currents in amps, converted against the nominal ratings read when the session was opened.
///
/// The session holds the device in remote control mode. It is released again by [`Ps2000::close`], or on drop
/// if `close` was never called.
pub struct Ps2000<S, D, O = ()>
where
    S: Read + Write + ReadReady,
    D: SettleDelay,
    O: TelegramObserver,
{
    exchange: Exchange<S, D, O>,
    calibration: Calibration,
    /// We put the device into remote mode and still owe it a release.
    remote_held: bool,
}

impl<S, D, O> Ps2000<S, D, O>
where
    S: Read + Write + ReadReady,
    D: SettleDelay,
    O: TelegramObserver,
{
    /// Open a session with the device on node 0.
    ///
    /// Reads the nominal voltage and current, then switches the device to remote control.
    pub fn connect(interface: S, delay: D, observer: O) -> Result<Self, S::Error> {
        Self::connect_with_node(interface, delay, observer, 0)
    }

    /// Open a session with the device on a specific node.
    pub fn connect_with_node(interface: S, delay: D, observer: O, node: u8) -> Result<Self, S::Error> {
        let mut exchange = Exchange::new(interface, delay, observer).with_node(node);

        let nominal_voltage = exchange.get_float(PsObject::NominalVoltage.into())?;
        let nominal_current = exchange.get_float(PsObject::NominalCurrent.into())?;
        if !(nominal_voltage > 0.0 && nominal_current > 0.0) {
            return Err(Error::InvalidResponse);
        }
        debug!(node, nominal_voltage, nominal_current, "nominal ratings");

        let mut psu = Self {
            exchange,
            calibration: Calibration::new(nominal_voltage, nominal_current),
            remote_held: false,
        };
        psu.set_remote(true)?;
        debug!(node, "session open");
        Ok(psu)
    }

    /// Release remote control and close the session.
    ///
    /// Unlike dropping the session, this reports whether the release was accepted.
    pub fn close(mut self) -> Result<(), S::Error> {
        self.release_remote()
    }

    fn release_remote(&mut self) -> Result<(), S::Error> {
        if self.remote_held {
            // Clear first so a failed release is not retried on drop.
            self.remote_held = false;
            self.set_remote(false)?;
            debug!(node = self.exchange.node(), "session closed");
        }
        Ok(())
    }

    /// The nominal ratings captured when the session was opened.
    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Return the device type, e.g. `PS 2042-20B`.
    pub fn get_device_type(&mut self) -> Result<ObjectString, S::Error> {
        self.exchange.get_string(PsObject::DeviceType.into())
    }

    /// Return the serial number.
    pub fn get_serial(&mut self) -> Result<ObjectString, S::Error> {
        self.exchange.get_string(PsObject::SerialNo.into())
    }

    /// Return the nominal voltage in volts as reported by the device.
    pub fn get_nominal_voltage(&mut self) -> Result<f32, S::Error> {
        self.exchange.get_float(PsObject::NominalVoltage.into())
    }

    /// Return the nominal current in amps as reported by the device.
    pub fn get_nominal_current(&mut self) -> Result<f32, S::Error> {
        self.exchange.get_float(PsObject::NominalCurrent.into())
    }

    /// Return the nominal power in watts.
    pub fn get_nominal_power(&mut self) -> Result<f32, S::Error> {
        self.exchange.get_float(PsObject::NominalPower.into())
    }

    /// Return the article number.
    pub fn get_article(&mut self) -> Result<ObjectString, S::Error> {
        self.exchange.get_string(PsObject::ArticleNo.into())
    }

    /// Return the manufacturer.
    pub fn get_manufacturer(&mut self) -> Result<ObjectString, S::Error> {
        self.exchange.get_string(PsObject::Manufacturer.into())
    }

    /// Return the firmware version string.
    pub fn get_software_version(&mut self) -> Result<ObjectString, S::Error> {
        self.exchange.get_string(PsObject::SoftwareVersion.into())
    }

    /// Return the raw device class.
    pub fn get_device_class(&mut self) -> Result<u16, S::Error> {
        self.exchange.get_integer(PsObject::DeviceClass.into())
    }

    /// Get the over voltage protection threshold in volts.
    pub fn get_ovp_threshold(&mut self) -> Result<f32, S::Error> {
        let raw = self.exchange.get_integer(PsObject::OvpThreshold.into())?;
        Ok(self.calibration.raw_to_voltage(raw))
    }

    /// Set the over voltage protection threshold in volts.
    pub fn set_ovp_threshold(&mut self, volts: f32) -> Result<(), S::Error> {
        let raw = self
            .calibration
            .voltage_to_raw(volts)
            .ok_or(Error::InvalidRange)?;
        self.exchange
            .set_integer(PsObject::OvpThreshold.into(), raw)?;
        Ok(())
    }

    /// Get the over current protection threshold in amps.
    pub fn get_ocp_threshold(&mut self) -> Result<f32, S::Error> {
        let raw = self.exchange.get_integer(PsObject::OcpThreshold.into())?;
        Ok(self.calibration.raw_to_current(raw))
    }

    /// Set the over current protection threshold in amps.
    pub fn set_ocp_threshold(&mut self, amps: f32) -> Result<(), S::Error> {
        let raw = self
            .calibration
            .current_to_raw(amps)
            .ok_or(Error::InvalidRange)?;
        self.exchange
            .set_integer(PsObject::OcpThreshold.into(), raw)?;
        Ok(())
    }

    /// Get the output target voltage in volts.
    pub fn get_voltage_setpoint(&mut self) -> Result<f32, S::Error> {
        let raw = self.exchange.get_integer(PsObject::VoltageSetpoint.into())?;
        Ok(self.calibration.raw_to_voltage(raw))
    }

    /// Set the output target voltage in volts.
    pub fn set_voltage(&mut self, volts: f32) -> Result<(), S::Error> {
        let raw = self
            .calibration
            .voltage_to_raw(volts)
            .ok_or(Error::InvalidRange)?;
        self.exchange
            .set_integer(PsObject::VoltageSetpoint.into(), raw)?;
        Ok(())
    }

    /// Get the output current limit in amps.
    pub fn get_current_setpoint(&mut self) -> Result<f32, S::Error> {
        let raw = self.exchange.get_integer(PsObject::CurrentSetpoint.into())?;
        Ok(self.calibration.raw_to_current(raw))
    }

    /// Set the output current limit in amps.
    pub fn set_current(&mut self, amps: f32) -> Result<(), S::Error> {
        let raw = self
            .calibration
            .current_to_raw(amps)
            .ok_or(Error::InvalidRange)?;
        self.exchange
            .set_integer(PsObject::CurrentSetpoint.into(), raw)?;
        Ok(())
    }

    /// Read the remote and output bits.
    pub fn get_control(&mut self) -> Result<ControlState, S::Error> {
        let bytes = self.exchange.get_binary(PsObject::Control.into())?;
        match bytes.as_slice() {
            [first, second, ..] => Ok(ControlState::from_bytes([*first, *second])),
            _ => Err(Error::InvalidResponse),
        }
    }

    /// Return true if the device is under remote control.
    pub fn get_remote(&mut self) -> Result<bool, S::Error> {
        Ok(self.get_control()?.remote)
    }

    /// Enter or leave remote control. Returns whether the device acknowledged.
    ///
    /// While not in remote control the device refuses setpoint and output changes with
    /// [`DeviceFault::AccessDenied`](crate::fault::DeviceFault::AccessDenied).
    pub fn set_remote(&mut self, remote: bool) -> Result<bool, S::Error> {
        let acknowledged = self.set_control(control::REMOTE, remote)?;
        self.remote_held = remote;
        Ok(acknowledged)
    }

    /// Return true if the output is switched on.
    pub fn get_output(&mut self) -> Result<bool, S::Error> {
        Ok(self.get_control()?.output)
    }

    /// Switch the output on or off. Returns whether the device acknowledged.
    pub fn set_output(&mut self, output: bool) -> Result<bool, S::Error> {
        self.set_control(control::OUTPUT, output)
    }

    fn set_control(&mut self, mask: u8, on: bool) -> Result<bool, S::Error> {
        let data = if on { mask } else { 0x00 };
        self.exchange
            .set_binary_acknowledged(PsObject::Control.into(), mask, data)
    }

    /// Read the device status together with the measured output voltage and current.
    pub fn get_actual(&mut self) -> Result<ActualState, S::Error> {
        let bytes = self.exchange.get_binary(PsObject::StatusActual.into())?;
        let raw: [u8; 6] = bytes
            .get(..6)
            .and_then(|b| b.try_into().ok())
            .ok_or(Error::InvalidResponse)?;
        Ok(ActualState::from_bytes(raw, &self.calibration))
    }

    /// Return the measured output voltage in volts.
    pub fn get_actual_voltage(&mut self) -> Result<f32, S::Error> {
        Ok(self.get_actual()?.voltage)
    }

    /// Return the measured output current in amps.
    pub fn get_actual_current(&mut self) -> Result<f32, S::Error> {
        Ok(self.get_actual()?.current)
    }
}

impl<S, D, O> Drop for Ps2000<S, D, O>
where
    S: Read + Write + ReadReady,
    D: SettleDelay,
    O: TelegramObserver,
{
    fn drop(&mut self) {
        if let Err(error) = self.release_remote() {
            warn!(?error, "failed to release remote control");
        }
    }
}
