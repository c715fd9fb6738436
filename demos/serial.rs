use std::env;

use ea_ps2000::{
    exchange::{StdDelay, TelegramObserver},
    psu::Ps2000,
};
use inquire::Select;
use serialport::SerialPort;

// Configuration constants - adjust these for your setup
const BAUD_RATE: u32 = 115200;
const SERIAL_TIMEOUT_MS: u64 = 300;
const OUTPUT_VOLTAGE_V: f32 = 5.5;
const CURRENT_LIMIT_A: f32 = 0.1;
const STABILIZATION_DELAY_MS: u64 = 1000;

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::ReadReady for PortWrapper {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        let pending = self
            .0
            .bytes_to_read()
            .map_err(|e| IoError(std::io::Error::from(e)))?;
        Ok(pending > 0)
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

/// Print every telegram, like the verbose mode of the vendor tools.
struct HexDump;

impl TelegramObserver for HexDump {
    fn on_transmit(&mut self, telegram: &[u8]) {
        println!("telegram: {:02X?}", telegram);
    }

    fn on_receive(&mut self, telegram: &[u8]) {
        println!("answer:   {:02X?}", telegram);
    }
}

fn main() {
    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });
    let verbose = env::args().any(|arg| arg == "--verbose");

    println!("Using port: {}", port_name);

    // 115200 8O1
    let port = serialport::new(&port_name, BAUD_RATE)
        .parity(serialport::Parity::Odd)
        .timeout(std::time::Duration::from_millis(SERIAL_TIMEOUT_MS))
        .open()
        .expect("Failed to open serial port");

    if verbose {
        run(Ps2000::connect(PortWrapper(port), StdDelay, HexDump).expect("Failed to connect"));
    } else {
        run(Ps2000::connect(PortWrapper(port), StdDelay, ()).expect("Failed to connect"));
    }
}

fn run<O: TelegramObserver>(mut psu: Ps2000<PortWrapper, StdDelay, O>) {
    println!("Device type: {}", psu.get_device_type().unwrap());
    println!("Serial number: {}", psu.get_serial().unwrap());
    println!("Manufacturer: {}", psu.get_manufacturer().unwrap());
    println!("Firmware: {}", psu.get_software_version().unwrap());

    let calibration = psu.calibration();
    println!(
        "Nominal: {}V / {}A / {}W",
        calibration.nominal_voltage,
        calibration.nominal_current,
        psu.get_nominal_power().unwrap()
    );

    psu.set_voltage(OUTPUT_VOLTAGE_V).unwrap();
    println!("Set output voltage to {}V", psu.get_voltage_setpoint().unwrap());

    psu.set_current(CURRENT_LIMIT_A).unwrap();
    println!("Set current limit to {}A", psu.get_current_setpoint().unwrap());

    println!("OVP: {}V, OCP: {}A", psu.get_ovp_threshold().unwrap(), psu.get_ocp_threshold().unwrap());

    psu.set_output(true).unwrap();
    println!("Output enabled");

    std::thread::sleep(std::time::Duration::from_millis(STABILIZATION_DELAY_MS));

    let actual = psu.get_actual().unwrap();
    println!("Measured: {:.3}V {:.3}A", actual.voltage, actual.current);
    println!("{:#?}", actual.status);

    psu.set_output(false).unwrap();
    println!("Output disabled");

    psu.close().unwrap();
}
