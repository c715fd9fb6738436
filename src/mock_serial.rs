//! We use this mocking module in unit tests to emulate a serial port and the PSU on the other end of it.

use fugit::MillisDurationU32;

use crate::{checksum, exchange::SettleDelay, telegram::Frame};

/// Our mock type used to emulate a serial port with a scripted answer.
pub struct MockSerial {
    /// Buffer to store data written to the mock serial port
    write_buffer: heapless::Vec<u8, 256>,
    /// Buffer containing pre-configured response data to be read
    read_buffer: heapless::Vec<u8, 256>,
    /// Current position in the read buffer
    read_position: usize,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
    /// Flag to simulate errors polling for buffered data
    should_error_on_read_ready: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum MockSerialError {
    /// Simulated buffer overflow
    #[error("mock buffer overflow")]
    BufferOverflow,
    /// Generic simulated error for testing
    #[error("simulated error")]
    SimulatedError,
}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        let available_bytes = self.read_buffer.len() - self.read_position;
        let bytes_to_read = core::cmp::min(buf.len(), available_bytes);

        buf[..bytes_to_read].copy_from_slice(
            &self.read_buffer[self.read_position..self.read_position + bytes_to_read],
        );

        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl embedded_io::ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        if self.should_error_on_read_ready {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(self.read_position < self.read_buffer.len())
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            should_error_on_write: false,
            should_error_on_read: false,
            should_error_on_read_ready: false,
        }
    }

    /// Set the data that will be returned when read() is called
    pub fn set_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.read_buffer.clear();
        self.read_position = 0;
        self.read_buffer
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    /// Configure whether polling for buffered data should fail with an error
    pub fn set_read_ready_error(&mut self, should_error: bool) {
        self.should_error_on_read_ready = should_error;
    }
}

/// Settle delay which only counts how often it was asked to wait.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub calls: usize,
    pub last: Option<MillisDurationU32>,
}

impl SettleDelay for RecordingDelay {
    fn settle(&mut self, duration: MillisDurationU32) {
        self.calls += 1;
        self.last = Some(duration);
    }
}

/// Register state of a simulated PS 2000 B.
#[derive(Debug, Clone)]
pub struct SimulatedPsu {
    pub nominal_voltage: f32,
    pub nominal_current: f32,
    pub nominal_power: f32,
    pub device_class: u16,
    pub remote: bool,
    pub output: bool,
    /// Also refuse reads of setpoints and thresholds while under local control.
    pub lockout_reads: bool,
    pub voltage_setpoint: u16,
    pub current_setpoint: u16,
    pub ovp_threshold: u16,
    pub ocp_threshold: u16,
    pub actual_voltage: u16,
    pub actual_current: u16,
    /// Every telegram received, in order.
    pub received: heapless::Vec<Frame, 64>,
    /// Answer the next telegram with a broken checksum.
    pub corrupt_next: bool,
    pending: Frame,
    read_position: usize,
}

impl SimulatedPsu {
    /// A PS 2042-20 B.
    pub fn new() -> Self {
        Self {
            nominal_voltage: 42.0,
            nominal_current: 20.0,
            nominal_power: 320.0,
            device_class: 0x0010,
            remote: false,
            output: false,
            lockout_reads: false,
            voltage_setpoint: 0,
            current_setpoint: 0,
            ovp_threshold: 28160,
            ocp_threshold: 28160,
            actual_voltage: 0,
            actual_current: 0,
            received: heapless::Vec::new(),
            corrupt_next: false,
            pending: Frame::new(),
            read_position: 0,
        }
    }

    fn string_object(object: u8) -> Option<&'static [u8]> {
        match object {
            0 => Some(b"PS 2042-20B"),
            1 => Some(b"1234567890"),
            6 => Some(b"39200139"),
            8 => Some(b"EA-ELEKTRO"),
            9 => Some(b"V2.01 16.06.10"),
            _ => None,
        }
    }

    fn answer(&mut self, object: u8, data: &[u8]) {
        let mut frame = Frame::new();
        let start = 0x70 + data.len().saturating_sub(1) as u8;
        frame.extend_from_slice(&[start, 0x00, object]).unwrap();
        frame.extend_from_slice(data).unwrap();
        let mut cs = checksum::compute(&frame);
        if self.corrupt_next {
            cs = cs.wrapping_add(1);
            self.corrupt_next = false;
        }
        frame.extend_from_slice(&cs.to_be_bytes()).unwrap();
        self.pending = frame;
        self.read_position = 0;
    }

    fn acknowledge(&mut self, code: u8) {
        self.answer(0xFF, &[code]);
    }

    fn handle(&mut self, telegram: &[u8]) {
        if telegram.len() < 5 {
            return self.acknowledge(0x08);
        }
        let (body, cs) = telegram.split_at(telegram.len() - 2);
        if !checksum::verify(body, u16::from_be_bytes([cs[0], cs[1]])) {
            return self.acknowledge(0x03);
        }
        if body[1] != 0 {
            return self.acknowledge(0x05);
        }

        let object = body[2];
        let data = &body[3..];
        match body[0] & 0xF0 {
            0x70 => self.query(object),
            0xF0 => self.send(object, data),
            _ => self.acknowledge(0x04),
        }
    }

    fn query(&mut self, object: u8) {
        if let Some(text) = Self::string_object(object) {
            // Strings are null terminated on the wire.
            let mut data: heapless::Vec<u8, 17> = heapless::Vec::new();
            data.extend_from_slice(text).unwrap();
            data.push(0x00).unwrap();
            return self.answer(object, &data);
        }

        if self.lockout_reads && !self.remote && matches!(object, 38 | 39 | 50 | 51) {
            return self.acknowledge(0x09);
        }

        match object {
            2 => self.answer(object, &self.nominal_voltage.to_le_bytes()),
            3 => self.answer(object, &self.nominal_current.to_le_bytes()),
            4 => self.answer(object, &self.nominal_power.to_le_bytes()),
            19 => self.answer(object, &self.device_class.to_be_bytes()),
            38 => self.answer(object, &self.ovp_threshold.to_be_bytes()),
            39 => self.answer(object, &self.ocp_threshold.to_be_bytes()),
            50 => self.answer(object, &self.voltage_setpoint.to_be_bytes()),
            51 => self.answer(object, &self.current_setpoint.to_be_bytes()),
            54 => self.answer(object, &[self.remote as u8, self.output as u8]),
            71 => {
                let v = self.actual_voltage.to_be_bytes();
                let i = self.actual_current.to_be_bytes();
                let data = [self.remote as u8, self.output as u8, v[0], v[1], i[0], i[1]];
                self.answer(object, &data)
            }
            _ => self.acknowledge(0x07),
        }
    }

    fn send(&mut self, object: u8, data: &[u8]) {
        if data.len() != 2 {
            return self.acknowledge(0x08);
        }

        if object == 54 {
            let (mask, value) = (data[0], data[1]);
            if mask & 0x10 != 0 {
                self.remote = value & 0x10 != 0;
            }
            if mask & 0x01 != 0 {
                if !self.remote {
                    return self.acknowledge(0x09);
                }
                self.output = value & 0x01 != 0;
            }
            return self.acknowledge(0x00);
        }

        match object {
            38 | 39 | 50 | 51 => {}
            0..=9 | 19 | 71 => return self.acknowledge(0x09),
            _ => return self.acknowledge(0x07),
        }
        if !self.remote {
            return self.acknowledge(0x09);
        }
        let value = u16::from_be_bytes([data[0], data[1]]);
        if value > 28160 {
            return self.acknowledge(0x30);
        }
        match object {
            38 => self.ovp_threshold = value,
            39 => self.ocp_threshold = value,
            50 => self.voltage_setpoint = value,
            _ => self.current_setpoint = value,
        }
        self.acknowledge(0x00)
    }
}

impl embedded_io::ErrorType for SimulatedPsu {
    type Error = MockSerialError;
}

impl embedded_io::Write for SimulatedPsu {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut telegram = Frame::new();
        telegram
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;
        self.received
            .push(telegram)
            .map_err(|_| MockSerialError::BufferOverflow)?;
        self.handle(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Read for SimulatedPsu {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let available = &self.pending[self.read_position..];
        let n = core::cmp::min(buf.len(), available.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.read_position += n;
        Ok(n)
    }
}

impl embedded_io::ReadReady for SimulatedPsu {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read_position < self.pending.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, ReadReady, Write};

    #[test]
    fn test_write_data() {
        let mut mock = MockSerial::new();
        let test_data = b"Hello, World!";

        let result = mock.write(test_data);
        assert_eq!(result.unwrap(), test_data.len());
        assert_eq!(mock.written_data(), test_data);
    }

    #[test]
    fn test_write_buffer_overflow() {
        let mut mock = MockSerial::new();
        let large_data = [0u8; 300];

        let result = mock.write(&large_data);
        assert!(matches!(result.unwrap_err(), MockSerialError::BufferOverflow));
    }

    #[test]
    fn test_read_drains_then_not_ready() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"Hello World").unwrap();

        let mut buffer = [0u8; 5];
        assert!(mock.read_ready().unwrap());
        assert_eq!(mock.read(&mut buffer).unwrap(), 5);
        assert_eq!(&buffer, b"Hello");

        let mut rest = [0u8; 10];
        assert_eq!(mock.read(&mut rest).unwrap(), 6);
        assert_eq!(&rest[..6], b" World");
        assert!(!mock.read_ready().unwrap());
    }

    #[test]
    fn test_error_simulation() {
        let mut mock = MockSerial::new();
        mock.set_write_error(true);
        assert!(mock.write(b"test").is_err());
        assert!(mock.flush().is_err());
        assert!(mock.written_data().is_empty());

        mock.set_read_data(b"data").unwrap();
        mock.set_read_error(true);
        let mut buffer = [0u8; 4];
        assert!(mock.read(&mut buffer).is_err());
        assert!(mock.read_ready().unwrap());

        mock.set_read_ready_error(true);
        assert!(mock.read_ready().is_err());
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            MockSerialError::BufferOverflow.kind(),
            embedded_io::ErrorKind::OutOfMemory
        ));
        assert!(matches!(
            MockSerialError::SimulatedError.kind(),
            embedded_io::ErrorKind::Other
        ));
    }

    #[test]
    fn test_simulated_psu_answers_query() {
        let mut psu = SimulatedPsu::new();
        psu.write(&[0x70, 0x00, 0x32, 0x00, 0xA2]).unwrap();
        let mut buffer = [0u8; 16];
        let n = psu.read(&mut buffer).unwrap();
        // 0x71 = query answer with two data bytes.
        assert_eq!(&buffer[..n], &[0x71, 0x00, 0x32, 0x00, 0x00, 0x00, 0xA3]);
    }

    #[test]
    fn test_simulated_psu_rejects_bad_checksum() {
        let mut psu = SimulatedPsu::new();
        psu.write(&[0x70, 0x00, 0x32, 0x00, 0xA3]).unwrap();
        let mut buffer = [0u8; 16];
        let n = psu.read(&mut buffer).unwrap();
        assert_eq!(&buffer[2..4], &[0xFF, 0x03]);
        assert_eq!(n, 6);
    }

    #[test]
    fn test_simulated_psu_read_lockout() {
        let mut psu = SimulatedPsu::new();
        psu.lockout_reads = true;
        let mut buffer = [0u8; 16];

        psu.write(&[0x70, 0x00, 0x32, 0x00, 0xA2]).unwrap();
        let n = psu.read(&mut buffer).unwrap();
        assert_eq!(&buffer[2..4], &[0xFF, 0x09]);
        assert_eq!(n, 6);

        // Identity objects stay readable.
        psu.write(&[0x70, 0x00, 0x02, 0x00, 0x72]).unwrap();
        let n = psu.read(&mut buffer).unwrap();
        assert_eq!(buffer[2], 0x02);
        assert_eq!(n, 9);
    }
}
