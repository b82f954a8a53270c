//! Serial port device link.
//!
//! Works with anything the OS exposes as a serial port: USB CDC adapters and
//! Bluetooth SPP virtual ports (HC-05/06 via `rfcomm` or a Windows COM port).

use crate::error::{CounterError, Result};
use crate::telemetry::traits::DeviceLink;
use serde::Serialize;
use std::io::{self, Read};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Lines longer than this without a terminator are discarded.
pub const MAX_LINE_BYTES: usize = 1024;

const READ_CHUNK_BYTES: usize = 256;

/// A [`DeviceLink`] backed by an OS serial port.
pub struct SerialDeviceLink {
    port: Box<dyn serialport::SerialPort>,
    address: String,
    buffer: Vec<u8>,
    /// Set after an over-long line; bytes are dropped through the next `\n`
    discarding: bool,
}

impl SerialDeviceLink {
    /// Open `address` at `baud_rate`.
    ///
    /// Failure here is fatal for the process: there is nothing to serve
    /// without a data source.
    pub fn open(address: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(address, baud_rate)
            .timeout(Duration::from_millis(crate::DEFAULT_READ_TIMEOUT_MS))
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|e| CounterError::connection_error(address, e))?;

        info!("Connected to {} at {} bps", address, baud_rate);

        Ok(Self::from_port(port, address))
    }

    /// Wrap an already opened port.
    pub fn from_port(port: Box<dyn serialport::SerialPort>, address: impl Into<String>) -> Self {
        Self {
            port,
            address: address.into(),
            buffer: Vec::with_capacity(MAX_LINE_BYTES),
            discarding: false,
        }
    }

    /// Drop the tail of an over-long line once its terminator shows up.
    fn skip_discarded(&mut self) {
        match self.buffer.iter().position(|b| *b == b'\n') {
            Some(end) => {
                self.buffer.drain(..=end);
                self.discarding = false;
            }
            None => self.buffer.clear(),
        }
    }
}

impl DeviceLink for SerialDeviceLink {
    fn has_data_available(&mut self) -> Result<bool> {
        if self.buffer.contains(&b'\n') {
            return Ok(true);
        }
        let waiting = self.port.bytes_to_read().map_err(io::Error::from)?;
        Ok(waiting > 0)
    }

    fn read_line(&mut self, timeout: Duration) -> Result<Option<String>> {
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; READ_CHUNK_BYTES];

        loop {
            if self.discarding {
                self.skip_discarded();
            }

            if !self.discarding {
                if let Some(line) = take_line(&mut self.buffer) {
                    return decode_line(line).map(Some);
                }
            }

            if self.buffer.len() > MAX_LINE_BYTES {
                self.buffer.clear();
                self.discarding = true;
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line exceeds {} bytes without terminator", MAX_LINE_BYTES),
                )
                .into());
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            self.port.set_timeout(remaining).map_err(io::Error::from)?;

            match self.port.read(&mut chunk) {
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(None),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn address(&self) -> &str {
        &self.address
    }
}

/// Split the first `\n`-terminated line off the front of `buffer`.
///
/// The terminator and any preceding `\r` are removed. Bytes after the
/// terminator stay buffered for the next call.
fn take_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let end = buffer.iter().position(|b| *b == b'\n')?;
    let mut line: Vec<u8> = buffer.drain(..=end).collect();
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Some(line)
}

fn decode_line(line: Vec<u8>) -> Result<String> {
    Ok(String::from_utf8(line)?)
}

/// A serial port reported by the operating system.
#[derive(Debug, Clone, Serialize)]
pub struct PortInfo {
    /// Port name to pass as the device address
    pub name: String,
    /// Port kind: USB, Bluetooth, PCI or Unknown
    pub kind: String,
    /// Product description for USB ports, when known
    pub product: Option<String>,
}

/// List the serial ports available on this machine.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        warn!("Failed to enumerate serial ports: {}", e);
        CounterError::from(io::Error::from(e))
    })?;

    Ok(ports
        .into_iter()
        .map(|port| {
            let (kind, product) = match port.port_type {
                serialport::SerialPortType::UsbPort(info) => ("USB", info.product),
                serialport::SerialPortType::BluetoothPort => ("Bluetooth", None),
                serialport::SerialPortType::PciPort => ("PCI", None),
                serialport::SerialPortType::Unknown => ("Unknown", None),
            };
            PortInfo {
                name: port.port_name,
                kind: kind.to_string(),
                product,
            }
        })
        .collect())
}
