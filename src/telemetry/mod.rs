//! Counter telemetry: device access, line decoding and the shared reading.
//!
//! This module provides the producer side of the server: a [`DeviceLink`]
//! yields raw lines, [`parse_line`] decodes them into partial updates, and the
//! [`ReaderLoop`] merges those into the [`StateStore`] that HTTP handlers read.

pub mod data;
pub mod device;
pub mod parser;
pub mod reader;
pub mod store;
pub mod traits;

// Re-export commonly used items
pub use data::{FieldKey, ParsedUpdate, SensorReading};
pub use device::{available_ports, PortInfo, SerialDeviceLink};
pub use parser::parse_line;
pub use reader::{ReaderConfig, ReaderLoop, StepOutcome};
pub use store::StateStore;
pub use traits::DeviceLink;
