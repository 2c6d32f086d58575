//! Readings annotated with their per-sensor status.

use gaswatch_types::{ProfileTable, Reading, SensorId, Status};

/// A reading together with the status of each sensor value.
///
/// Statuses are computed once, against the profile table in force when the
/// reading arrived, and travel with the reading from then on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedReading {
    pub reading: Reading,
    statuses: [Status; SensorId::COUNT],
}

impl ClassifiedReading {
    /// Classify every sensor value of `reading`.
    pub fn classify(reading: Reading, profiles: &ProfileTable) -> Self {
        Self {
            statuses: profiles.classify_reading(&reading),
            reading,
        }
    }

    /// Status of one sensor.
    pub fn status(&self, sensor: SensorId) -> Status {
        self.statuses[sensor.index()]
    }

    /// Value measured by one sensor.
    pub fn value(&self, sensor: SensorId) -> f64 {
        self.reading.get(sensor)
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.reading.timestamp_ms()
    }

    /// Worst status across all sensors.
    pub fn overall(&self) -> Status {
        self.statuses.iter().copied().max().unwrap_or(Status::Good)
    }

    /// Iterate over `(sensor, value, status)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (SensorId, f64, Status)> + '_ {
        SensorId::ALL
            .iter()
            .map(move |&s| (s, self.reading.get(s), self.statuses[s.index()]))
    }
}
