//! Shared latest-reading store.
//!
//! The reader loop is the only writer; HTTP handlers take snapshots. A single
//! `RwLock` guards the whole record, so a snapshot is either entirely before
//! or entirely after any merge.

use crate::telemetry::data::{ParsedUpdate, SensorReading};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Cloneable handle to the canonical [`SensorReading`].
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    reading: RwLock<SensorReading>,
    updates_applied: AtomicU64,
}

impl StateStore {
    /// Create a store holding the zero-valued start reading.
    pub fn new() -> Self {
        Self::with_reading(SensorReading::new())
    }

    /// Create a store seeded with `reading`.
    pub fn with_reading(reading: SensorReading) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                reading: RwLock::new(reading),
                updates_applied: AtomicU64::new(0),
            }),
        }
    }

    /// Consistent point-in-time copy of the current reading.
    pub fn snapshot(&self) -> SensorReading {
        self.inner
            .reading
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merge the present fields of `update` and stamp the observation time.
    ///
    /// Empty updates are ignored entirely, including the timestamp. Returns
    /// whether anything was applied.
    pub fn merge(&self, update: &ParsedUpdate) -> bool {
        if update.is_empty() {
            return false;
        }

        let mut reading = self
            .inner
            .reading
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        reading.apply(update);
        reading.observed_at = Utc::now();
        // Counted under the write lock so a snapshot never runs ahead of it
        self.inner.updates_applied.fetch_add(1, Ordering::Relaxed);
        drop(reading);

        true
    }

    /// Number of non-empty merges since the store was created.
    pub fn updates_applied(&self) -> u64 {
        self.inner.updates_applied.load(Ordering::Relaxed)
    }
}
