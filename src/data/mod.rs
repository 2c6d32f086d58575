//! Data models and processing for sensor readings.
//!
//! This module turns raw [`Reading`](gaswatch_types::Reading)s into
//! status-annotated data and the derived views a display needs.
//!
//! ## Submodules
//!
//! - [`classified`]: [`ClassifiedReading`], a reading with per-sensor [`Status`](gaswatch_types::Status)
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "5s", "500ms")
//! - [`format`]: Value, clock and "last updated" labels
//! - [`history`]: The bounded [`HistoryBuffer`]
//! - [`series`]: Per-sensor [`SensorSeries`] for charts and sparklines
//!
//! ## Data Flow
//!
//! ```text
//! Reading (decoded payload)
//!        │
//!        ▼
//! ClassifiedReading::classify(reading, &profiles)
//!        │
//!        ├──▶ HistoryBuffer::append() (FIFO, bounded)
//!        │
//!        └──▶ SensorSeries::from_history() (charts)
//! ```

pub mod classified;
pub mod duration;
pub mod format;
pub mod history;
pub mod series;

pub use classified::ClassifiedReading;
pub use history::{HistoryBuffer, DEFAULT_HISTORY_CAPACITY};
pub use series::{SensorSeries, SeriesPoint};
