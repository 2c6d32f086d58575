//! The fetch contract shared by every telemetry source.

use std::fmt::Debug;

use async_trait::async_trait;

use gaswatch_types::Reading;

use crate::FetchError;

/// A place readings come from.
///
/// Implementations perform exactly one attempt per call and never retry
/// internally; retry policy belongs to the caller. A source must not mutate
/// shared state beyond what it needs to perform the request.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use gaswatch_adapters::{FetchError, TelemetrySource};
/// use gaswatch_types::Reading;
///
/// #[derive(Debug)]
/// struct Constant;
///
/// #[async_trait]
/// impl TelemetrySource for Constant {
///     async fn fetch(&self) -> Result<Reading, FetchError> {
///         Ok(Reading::new([1.0, 2.0, 3.0], 0))
///     }
///
///     fn description(&self) -> &str {
///         "constant"
///     }
/// }
/// ```
#[async_trait]
pub trait TelemetrySource: Send + Sync + Debug {
    /// Fetch the latest reading.
    async fn fetch(&self) -> Result<Reading, FetchError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}
