//! # Smart Counter - Serial Telemetry Bridge
//!
//! Reads `KEY:VALUE` telemetry lines from a serial or Bluetooth (HC-05/06)
//! counter device, keeps the most recent reading in memory, and serves it over
//! HTTP for phones and browsers on the local network.
//!
//! ## Features
//!
//! - **Partial updates**: each line merges only the fields it carries
//! - **Best-effort ingestion**: bad fields, bad lines and read errors are
//!   logged and skipped, never fatal
//! - **Consistent snapshots**: HTTP readers never see a half-applied line
//! - **Library + Binary**: use as a crate or standalone application
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smart_counter::{
//!     start_web_server, DeviceConfig, ReaderLoop, SerialDeviceLink, StateStore, WebConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let device_config = DeviceConfig::new("/dev/rfcomm0", 9600);
//!     let device = SerialDeviceLink::open(&device_config.address, device_config.baud_rate)?;
//!     let store = StateStore::new();
//!
//!     let (_stop, stop_rx) = tokio::sync::watch::channel(false);
//!     let reader = ReaderLoop::new(device, store.clone(), device_config.reader_config());
//!     let _reader_task = reader.spawn(stop_rx);
//!
//!     // Serve on port 5000 until Ctrl-C
//!     let shutdown = async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     };
//!     start_web_server(WebConfig::default(), store, shutdown).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod telemetry;
pub mod web;

// Re-export public API
pub use error::{CounterError, FieldParseError, Result};
pub use telemetry::{
    available_ports, parse_line, DeviceLink, FieldKey, ParsedUpdate, PortInfo, ReaderConfig,
    ReaderLoop, SensorReading, SerialDeviceLink, StateStore, StepOutcome,
};
pub use web::{create_app, start_web_server, AppState, DeviceConfig, WebConfig};

/// The default device address (Linux Bluetooth SPP binding)
pub const DEFAULT_DEVICE_ADDRESS: &str = "/dev/rfcomm0";

/// The default serial speed of HC-05/06 modules
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 5000;

/// The default upper bound on a single line read, in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// The default pause between polls of a silent device, in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
