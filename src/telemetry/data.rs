//! Data structures for counter telemetry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Light state reported before the device has sent anything.
pub const DEFAULT_LIGHT_STATE: &str = "OFF";

/// The latest merged reading from the counter device.
///
/// Serialized with the device's own key names so the API mirrors the wire
/// format: `{"COUNT": 5, "USAGE_S": 10, "LIGHT": "ON", "timestamp": 1700000000}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Monotonic counter value from the device
    #[serde(rename = "COUNT")]
    pub count: u64,
    /// Accumulated usage time in seconds
    #[serde(rename = "USAGE_S")]
    pub usage_seconds: u64,
    /// Light state token (e.g. "ON", "OFF")
    #[serde(rename = "LIGHT")]
    pub light: String,
    /// When the last non-empty update was merged (Unix seconds on the wire)
    #[serde(rename = "timestamp", with = "chrono::serde::ts_seconds")]
    pub observed_at: DateTime<Utc>,
}

impl SensorReading {
    /// Create the zero-valued reading used at process start.
    pub fn new() -> Self {
        Self {
            count: 0,
            usage_seconds: 0,
            light: DEFAULT_LIGHT_STATE.to_string(),
            observed_at: Utc::now(),
        }
    }

    /// Apply every present field of `update`, leaving the others untouched.
    ///
    /// Does not touch `observed_at`; the store owns the timestamp.
    pub(crate) fn apply(&mut self, update: &ParsedUpdate) {
        if let Some(count) = update.count {
            self.count = count;
        }
        if let Some(usage_seconds) = update.usage_seconds {
            self.usage_seconds = usage_seconds;
        }
        if let Some(light) = &update.light {
            self.light.clone_from(light);
        }
    }
}

impl Default for SensorReading {
    fn default() -> Self {
        Self::new()
    }
}

/// A partial reading decoded from one device line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedUpdate {
    #[serde(rename = "COUNT", skip_serializing_if = "Option::is_none", default)]
    pub count: Option<u64>,
    #[serde(rename = "USAGE_S", skip_serializing_if = "Option::is_none", default)]
    pub usage_seconds: Option<u64>,
    #[serde(rename = "LIGHT", skip_serializing_if = "Option::is_none", default)]
    pub light: Option<String>,
}

impl ParsedUpdate {
    /// True when no recognized field was decoded.
    pub fn is_empty(&self) -> bool {
        self.count.is_none() && self.usage_seconds.is_none() && self.light.is_none()
    }

    /// Set the count field.
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Set the usage seconds field.
    pub fn with_usage_seconds(mut self, usage_seconds: u64) -> Self {
        self.usage_seconds = Some(usage_seconds);
        self
    }

    /// Set the light field.
    pub fn with_light(mut self, light: impl Into<String>) -> Self {
        self.light = Some(light.into());
        self
    }
}

/// The keys the device is known to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// `COUNT`: integer counter
    Count,
    /// `USAGE_S`: integer seconds
    UsageSeconds,
    /// `LIGHT`: free-form state token
    Light,
}

impl FieldKey {
    /// The key as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Count => "COUNT",
            FieldKey::UsageSeconds => "USAGE_S",
            FieldKey::Light => "LIGHT",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned for keys outside the recognized set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey(pub String);

impl FromStr for FieldKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "COUNT" => Ok(FieldKey::Count),
            "USAGE_S" => Ok(FieldKey::UsageSeconds),
            "LIGHT" => Ok(FieldKey::Light),
            other => Err(UnknownKey(other.to_string())),
        }
    }
}
