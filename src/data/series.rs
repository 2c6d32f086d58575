//! Per-sensor series derived from the history, for charts and sparklines.

use gaswatch_types::{SensorId, Status};

use super::ClassifiedReading;

/// One point of a sensor's series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub timestamp_ms: u64,
    pub value: f64,
    pub status: Status,
}

/// The values of one sensor across a history snapshot, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSeries {
    pub sensor: SensorId,
    pub points: Vec<SeriesPoint>,
}

impl SensorSeries {
    /// Extract one sensor's series from a history snapshot.
    pub fn from_history(history: &[ClassifiedReading], sensor: SensorId) -> Self {
        let points = history
            .iter()
            .map(|r| SeriesPoint {
                timestamp_ms: r.timestamp_ms(),
                value: r.value(sensor),
                status: r.status(sensor),
            })
            .collect();
        Self { sensor, points }
    }

    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// Y-axis bounds with 10% headroom: `(floor(min * 0.9), ceil(max * 1.1))`.
    ///
    /// Non-finite values are skipped. Returns None if no finite value exists.
    pub fn axis_bounds(&self) -> Option<(f64, f64)> {
        let (min, max) = self.finite_range()?;
        Some(((min * 0.9).floor(), (max * 1.1).ceil()))
    }

    /// Get sparkline data (normalized to 0-7 for 8 bar levels).
    ///
    /// Returns an empty Vec if there's not enough history. Non-finite values
    /// are drawn at the top level.
    pub fn sparkline(&self) -> Vec<u8> {
        if self.points.len() < 2 {
            return Vec::new();
        }
        let Some((min, max)) = self.finite_range() else {
            return Vec::new();
        };
        let range = max - min;

        self.points
            .iter()
            .map(|p| {
                if !p.value.is_finite() {
                    7
                } else if range <= 0.0 {
                    0
                } else {
                    let normalized = ((p.value - min) / range * 7.0) as u8;
                    normalized.min(7)
                }
            })
            .collect()
    }

    /// Get the rate of change (units per second) between the last two points.
    ///
    /// Returns None if there's not enough history to calculate a rate.
    pub fn rate_per_second(&self) -> Option<f64> {
        let n = self.points.len();
        if n < 2 {
            return None;
        }
        let current = &self.points[n - 1];
        let previous = &self.points[n - 2];

        let elapsed_ms = current.timestamp_ms.checked_sub(previous.timestamp_ms)?;
        if elapsed_ms == 0 {
            return None;
        }
        let elapsed_s = elapsed_ms as f64 / 1000.0;
        Some((current.value - previous.value) / elapsed_s)
    }

    fn finite_range(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .map(|p| p.value)
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
