//! Web server and device configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the web server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Host to bind the server to
    pub host: String,
    /// Port to bind the server to
    pub port: u16,
    /// Whether to enable CORS
    pub enable_cors: bool,
    /// Device address shown on the status page
    pub device_label: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_WEB_PORT,
            enable_cors: true,
            device_label: crate::DEFAULT_DEVICE_ADDRESS.to_string(),
        }
    }
}

impl WebConfig {
    /// Set the host for the web server.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port for the web server.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable CORS.
    pub fn with_cors(mut self, enable_cors: bool) -> Self {
        self.enable_cors = enable_cors;
        self
    }

    /// Set the device address shown on the status page.
    pub fn with_device_label(mut self, label: impl Into<String>) -> Self {
        self.device_label = label.into();
        self
    }

    /// Get the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration for the serial device and its reader loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Port name or path (e.g. `/dev/rfcomm0`, `COM8`)
    pub address: String,
    /// Communication speed in bits per second
    pub baud_rate: u32,
    /// Upper bound on a single line read
    pub read_timeout: Duration,
    /// Pause between polls while the device is silent
    pub poll_interval: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: crate::DEFAULT_DEVICE_ADDRESS.to_string(),
            baud_rate: crate::DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(crate::DEFAULT_READ_TIMEOUT_MS),
            poll_interval: Duration::from_millis(crate::DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl DeviceConfig {
    /// Create a device configuration for `address` at `baud_rate`.
    pub fn new(address: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            address: address.into(),
            baud_rate,
            ..Default::default()
        }
    }

    /// Set the line read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the idle poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Reader loop timings derived from this configuration.
    pub fn reader_config(&self) -> crate::telemetry::ReaderConfig {
        crate::telemetry::ReaderConfig {
            read_timeout: self.read_timeout,
            poll_interval: self.poll_interval,
        }
    }
}
