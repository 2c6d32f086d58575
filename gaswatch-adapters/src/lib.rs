//! # gaswatch-adapters
//!
//! Telemetry sources for gaswatch.
//!
//! This crate defines the [`TelemetrySource`] contract (one fetch, one
//! attempt, typed errors), the shared JSON wire decoder, and a ready-to-use
//! HTTP fetcher.
//!
//! ## Supported Sources
//!
//! - **HTTP** (`http` feature, on by default) - polls `GET <endpoint>/raw`
//!   on a sensor gateway
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gaswatch_adapters::http::HttpSource;
//! use gaswatch_adapters::TelemetrySource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = HttpSource::builder()
//!         .endpoint("http://localhost:8080")
//!         .build()?;
//!
//!     let reading = source.fetch().await?;
//!     println!("Reading taken at {} ms", reading.timestamp_ms());
//!     Ok(())
//! }
//! ```

pub mod decode;
pub mod error;
mod source;

#[cfg(feature = "http")]
pub mod http;

pub use decode::decode_reading;
pub use error::{ErrorKind, FetchError};
pub use source::TelemetrySource;

// Re-export types for convenience
pub use gaswatch_types::{ProfileTable, Reading, SensorId, SensorProfile, Status, Thresholds};
