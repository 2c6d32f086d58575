//! # gaswatch-types
//!
//! Core types for gas sensor telemetry. This crate defines the data model
//! shared by the gaswatch fetchers, the poller, and any consumer that renders
//! sensor state.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Complete readings**: A [`Reading`] holds exactly one value per [`SensorId`];
//!   a partial reading cannot be constructed
//! - **Validated thresholds**: [`Thresholds`] are strictly increasing by construction
//! - **Pure classification**: [`classify`] maps a value to a [`Status`] with no side effects
//!
//! ## Features
//!
//! - `std` (default): Standard library support (`std::error::Error`, wall clock)
//! - `serde`: Serialization of identifiers, statuses and profiles via serde
//!
//! ## Example
//!
//! ```rust
//! use gaswatch_types::{classify, ProfileTable, Reading, SensorId, Status, Thresholds};
//!
//! let thresholds = Thresholds::new(25.0, 50.0, 100.0).unwrap();
//! assert_eq!(classify(25.0, &thresholds), Status::Good);
//! assert_eq!(classify(26.0, &thresholds), Status::Warning);
//! assert_eq!(classify(51.0, &thresholds), Status::Danger);
//!
//! let profiles = ProfileTable::default();
//! let reading = Reading::new([12.0, 180.0, 3.5], 1_700_000_000_000);
//! assert_eq!(profiles.classify(SensorId::Methane, reading.get(SensorId::Methane)), Status::Good);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod profile;
mod reading;
mod sensor;
mod status;

pub use profile::*;
pub use reading::*;
pub use sensor::*;
pub use status::*;
