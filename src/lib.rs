//! # gaswatch
//!
//! Telemetry poller for ammonia, methane and carbon-monoxide sensors.
//!
//! This crate periodically fetches readings from a sensor gateway, classifies
//! every value against per-sensor thresholds, keeps a short rolling history,
//! and publishes the result to any number of subscribers.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Poller                             │
//! │  ┌─────────┐    ┌──────────────┐    ┌──────────────────────┐ │
//! │  │ source  │───▶│ data         │───▶│ watch<SensorState>   │─┼──▶ subscribers
//! │  │ (fetch) │    │ (classify,   │    │ {is_loading, error,  │ │
//! │  └────┬────┘    │  history)    │    │  current, history}   │ │
//! │       │         └──────────────┘    └──────────────────────┘ │
//! │       ▼                                                      │
//! │  HttpSource | FileSource | SimulatedSource                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`poller`]**: The [`Poller`] state machine: scheduling, single-flight
//!   cycles, retries and the published [`SensorState`]
//! - **[`source`]**: Telemetry sources implementing [`TelemetrySource`]
//! - **[`data`]**: Classified readings, the bounded [`HistoryBuffer`], chart
//!   series and display formatting
//! - **[`config`]**: Layered [`Settings`](config::Settings) from file and environment
//!
//! Sensor identity, thresholds and classification live in `gaswatch-types`;
//! the HTTP fetcher and wire decoding live in `gaswatch-adapters`.
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Poll a gateway every 5 seconds
//! gaswatch --url http://192.168.1.40:8080
//!
//! # Fetch one reading and print it as JSON
//! gaswatch --url http://192.168.1.40:8080 --once
//!
//! # Run against simulated readings
//! gaswatch --simulate --interval 1s
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use gaswatch::{PollSettings, Poller, SimulatedSource};
//!
//! # tokio_test::block_on(async {
//! let profiles = Arc::new(gaswatch::ProfileTable::default());
//! let source = SimulatedSource::with_seed(profiles.clone(), 7);
//! let poller = Poller::new(Arc::new(source), profiles, PollSettings::default());
//!
//! let mut updates = poller.subscribe();
//! poller.start().unwrap();
//!
//! let state = updates.wait_for(|s| s.current.is_some()).await.unwrap().clone();
//! assert_eq!(state.history.len(), 1);
//! poller.shutdown().await;
//! # });
//! ```
//!
//! ### Classifying a single value
//!
//! ```
//! use gaswatch::{ProfileTable, SensorId, Status};
//!
//! let profiles = ProfileTable::default();
//! assert_eq!(profiles.classify(SensorId::Methane, 200.0), Status::Good);
//! assert_eq!(profiles.classify(SensorId::Methane, 250.1), Status::Danger);
//! ```

pub mod config;
pub mod data;
pub mod poller;
pub mod source;

// Re-export main types for convenience
pub use config::Settings;
pub use data::{
    ClassifiedReading, HistoryBuffer, SensorSeries, SeriesPoint, DEFAULT_HISTORY_CAPACITY,
};
pub use gaswatch_types::{
    classify, ProfileTable, Reading, SensorId, SensorProfile, Status, Thresholds, TimestampOrigin,
};
pub use poller::{FetchState, Lifecycle, PollSettings, Poller, PollerError, SensorState};
pub use source::{ErrorKind, FetchError, FileSource, HttpSource, SimulatedSource, TelemetrySource};
