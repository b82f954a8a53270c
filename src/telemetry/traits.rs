//! Traits for device access.

use crate::error::Result;
use std::time::Duration;

/// Line-oriented access to the counter device.
///
/// Implementations own the underlying port exclusively. Both operations must
/// return within a bounded time so the reader loop stays responsive to
/// shutdown.
pub trait DeviceLink: Send {
    /// Whether unread bytes are waiting on the link.
    fn has_data_available(&mut self) -> Result<bool>;

    /// Read the next complete line, waiting at most `timeout`.
    ///
    /// Returns `Ok(None)` when no full line arrived in time. The returned
    /// line has its terminator stripped.
    fn read_line(&mut self, timeout: Duration) -> Result<Option<String>>;

    /// Human-readable identifier of the link (port name).
    fn address(&self) -> &str;
}

impl<D: DeviceLink + ?Sized> DeviceLink for Box<D> {
    fn has_data_available(&mut self) -> Result<bool> {
        (**self).has_data_available()
    }

    fn read_line(&mut self, timeout: Duration) -> Result<Option<String>> {
        (**self).read_line(timeout)
    }

    fn address(&self) -> &str {
        (**self).address()
    }
}
