//! Reading - one timestamped multi-sensor measurement.

use crate::SensorId;

/// Where a reading's timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TimestampOrigin {
    /// The producer sent a timestamp with the payload.
    #[default]
    Producer,
    /// The payload had no timestamp; the consumer stamped its receipt time.
    Receipt,
}

/// A single timestamped measurement across all sensors.
///
/// Readings are immutable values. Every reading carries exactly one value per
/// [`SensorId`] and exactly one timestamp, so a partially decoded payload can
/// never be represented.
///
/// # Example
///
/// ```rust
/// use gaswatch_types::{Reading, SensorId};
///
/// let reading = Reading::new([12.5, 210.0, 4.0], 1_700_000_000_000);
/// assert_eq!(reading.get(SensorId::Methane), 210.0);
/// assert_eq!(reading.iter().count(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    values: [f64; SensorId::COUNT],
    timestamp_ms: u64,
    origin: TimestampOrigin,
}

impl Reading {
    /// Create a reading stamped by its producer.
    ///
    /// `values` are indexed by [`SensorId::index`].
    pub fn new(values: [f64; SensorId::COUNT], timestamp_ms: u64) -> Self {
        Self {
            values,
            timestamp_ms,
            origin: TimestampOrigin::Producer,
        }
    }

    /// Create a reading with an explicit timestamp origin.
    pub fn with_origin(
        values: [f64; SensorId::COUNT],
        timestamp_ms: u64,
        origin: TimestampOrigin,
    ) -> Self {
        Self {
            values,
            timestamp_ms,
            origin,
        }
    }

    /// Create a reading stamped with the current wall-clock time.
    #[cfg(feature = "std")]
    pub fn received_now(values: [f64; SensorId::COUNT]) -> Self {
        Self::with_origin(values, current_timestamp_ms(), TimestampOrigin::Receipt)
    }

    /// Value measured by one sensor.
    pub fn get(&self, sensor: SensorId) -> f64 {
        self.values[sensor.index()]
    }

    /// All values, indexed by [`SensorId::index`].
    pub fn values(&self) -> &[f64; SensorId::COUNT] {
        &self.values
    }

    /// Unix timestamp in milliseconds.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Whether the timestamp came from the producer or from receipt time.
    pub fn origin(&self) -> TimestampOrigin {
        self.origin
    }

    /// Iterate over `(sensor, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (SensorId, f64)> + '_ {
        SensorId::ALL.iter().map(move |&s| (s, self.values[s.index()]))
    }
}

/// Get current timestamp in milliseconds since Unix epoch.
#[cfg(feature = "std")]
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
