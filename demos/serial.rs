use std::env;

use inquire::Select;
use psu_line_adapter::{
    config::{Parity, SerialConfig},
    psu::PsuAdapter,
    reply::NO_REPLY,
    std_clock::StdClock,
    transport::LineTransport,
    types::Channel,
};
use serialport::SerialPort;

// Configuration constants - adjust these for your setup
const OUTPUT_VOLTAGE_V: f32 = 5.5;
const CURRENT_LIMIT_A: f32 = 0.1;
const STABILIZATION_DELAY_MS: u64 = 1000;
// Reads are driven by the adapter's own timeouts, keep the port's short.
const SERIAL_TIMEOUT_MS: u64 = 10;

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

fn print_reading(label: &str, value: f32, unit: &str) {
    if value == NO_REPLY {
        println!("{label}: no reply");
    } else {
        println!("{label}: {value:.3}{unit}");
    }
}

fn main() {
    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        // List available serial ports
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        // Interactive selection
        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    // Signal inversion is expected to be done by an RS232 level shifter on hosted systems.
    let config = SerialConfig::default();
    let port = serialport::new(&port_name, config.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .stop_bits(serialport::StopBits::One)
        .parity(match config.parity {
            Parity::None => serialport::Parity::None,
            Parity::Even => serialport::Parity::Even,
            Parity::Odd => serialport::Parity::Odd,
        })
        .timeout(std::time::Duration::from_millis(SERIAL_TIMEOUT_MS))
        .open()
        .expect("Failed to open serial port");

    let transport = LineTransport::new(PortWrapper(port), StdClock::new());
    let mut psu = PsuAdapter::new(transport);

    psu.set_voltage(Channel::One, OUTPUT_VOLTAGE_V).unwrap();
    println!("Set channel 1 voltage to {}V", OUTPUT_VOLTAGE_V);

    psu.set_current(Channel::One, CURRENT_LIMIT_A).unwrap();
    println!("Set channel 1 current limit to {}A", CURRENT_LIMIT_A);

    // Enables channels 1 and 2 together.
    psu.set_output_state(Channel::One, true).unwrap();
    println!("Outputs 1 and 2 enabled");

    // Select the 5V preset on the fixed channel.
    psu.set_output_state(Channel::Three, true).unwrap();
    println!("Channel 3 set to 5V");

    // Wait for output to stabilize
    std::thread::sleep(std::time::Duration::from_millis(STABILIZATION_DELAY_MS));

    print_reading("Channel 1 voltage", psu.get_voltage(Channel::One).unwrap(), "V");
    print_reading("Channel 1 current", psu.get_current(Channel::One).unwrap(), "A");
    print_reading("Channel 3 voltage", psu.get_voltage(Channel::Three).unwrap(), "V");

    psu.set_output_state(Channel::One, false).unwrap();
    psu.set_output_state(Channel::Three, false).unwrap();
    println!("Outputs disabled");
}
