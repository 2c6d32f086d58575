//! Telemetry sources available to the poller.
//!
//! Every source implements [`TelemetrySource`]: one fetch, one attempt,
//! typed [`FetchError`]s. The HTTP fetcher lives in `gaswatch-adapters`;
//! this module adds local sources that are useful without a gateway.
//!
//! - [`HttpSource`]: `GET <base-url>/raw` on a sensor gateway
//! - [`FileSource`]: a JSON file in the gateway's wire format
//! - [`SimulatedSource`]: random-walk readings for demos and UI work
//!
//! # Example
//!
//! ```
//! use gaswatch::{FileSource, TelemetrySource};
//!
//! let source = FileSource::new("reading.json", Default::default());
//! assert_eq!(source.description(), "file: reading.json");
//! ```

mod file;
mod simulated;

pub use file::FileSource;
pub use gaswatch_adapters::http::HttpSource;
pub use gaswatch_adapters::{ErrorKind, FetchError, TelemetrySource};
pub use simulated::SimulatedSource;
