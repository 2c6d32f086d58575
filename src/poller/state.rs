//! State published by the poller to its subscribers.

use std::sync::Arc;
use std::time::Duration;

use gaswatch_adapters::FetchError;
use gaswatch_types::SensorId;

use crate::data::{format, ClassifiedReading, SensorSeries, DEFAULT_HISTORY_CAPACITY};

/// Polling interval when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

/// Retries per cycle when none is configured.
pub const DEFAULT_RETRIES: u32 = 3;

/// Scheduling parameters for a [`Poller`](super::Poller).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Time between scheduled cycles.
    pub interval: Duration,
    /// Extra attempts after a failed fetch within one cycle.
    pub retries: u32,
    /// Maximum number of readings kept in the history.
    pub history_capacity: usize,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            retries: DEFAULT_RETRIES,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl PollSettings {
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}

/// Lifecycle of a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed, `start()` not yet called.
    Created,
    /// Scheduling cycles.
    Running,
    /// `stop()` was called; state is frozen.
    Stopped,
}

/// Outcome of the current or most recent poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Idle,
    InFlight,
    Succeeded(ClassifiedReading),
    Failed(FetchError),
}

/// What subscribers see after every state change.
///
/// `history` is shared and immutable: holding on to a state never blocks the
/// poller, and a consumer cannot alter the poller's buffer through it.
#[derive(Debug, Clone)]
pub struct SensorState {
    /// A poll cycle is in flight.
    pub is_loading: bool,
    /// Error of the last cycle, cleared by the next successful one.
    pub error: Option<FetchError>,
    /// Most recent successful reading.
    pub current: Option<ClassifiedReading>,
    /// Recent readings, oldest first.
    pub history: Arc<[ClassifiedReading]>,
}

impl Default for SensorState {
    fn default() -> Self {
        Self {
            is_loading: false,
            error: None,
            current: None,
            history: Arc::from(Vec::new()),
        }
    }
}

impl SensorState {
    /// One sensor's series over the history, for charting.
    pub fn series(&self, sensor: SensorId) -> SensorSeries {
        SensorSeries::from_history(&self.history, sensor)
    }

    /// "Last updated" label for the current reading.
    pub fn last_updated(&self) -> String {
        format::last_updated(self.current.as_ref().map(|c| c.timestamp_ms()))
    }
}
