//! Error handling for the Smart Counter telemetry bridge.

/// A specialized `Result` type for Smart Counter operations.
pub type Result<T> = std::result::Result<T, CounterError>;

/// The main error type for device, reader and web operations.
#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    /// The device port could not be opened at startup
    #[error("Could not open device {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: serialport::Error,
    },

    /// I/O failure while reading from the device
    #[error("Device read error: {0}")]
    Read(#[from] std::io::Error),

    /// Received bytes were not valid UTF-8
    #[error("Failed to decode device line: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CounterError {
    /// Create a new connection error for the given device address
    pub fn connection_error(address: impl Into<String>, source: serialport::Error) -> Self {
        Self::Connection {
            address: address.into(),
            source,
        }
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this is an ordinary per-line read failure rather than a
    /// device fault. The reader loop keeps going either way but logs faults
    /// at `error` level.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Decode(_))
    }
}

/// A single `KEY:VALUE` field that could not be converted.
///
/// Field errors never abort a line; the offending field is dropped and the
/// remaining fields of the same line are still applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldParseError {
    /// An integer field carried a non-integer value
    #[error("Invalid integer for {key}: {value:?}")]
    InvalidInteger { key: String, value: String },

    /// The segment contained more than one `:` delimiter
    #[error("Ambiguous delimiter in segment {segment:?}")]
    AmbiguousDelimiter { segment: String },
}
