//! File-based telemetry source.
//!
//! Reads a reading from a JSON file on every fetch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use gaswatch_adapters::{decode_reading, FetchError, TelemetrySource};
use gaswatch_types::{current_timestamp_ms, ProfileTable, Reading};

/// A source that reads the latest reading from a JSON file.
///
/// The file uses the same wire format as the HTTP gateway, which makes it
/// convenient for replaying a captured payload or for a gateway that drops
/// its readings on disk. Readings without a timestamp are stamped with the
/// time the file was read.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    profiles: Arc<ProfileTable>,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P, profiles: Arc<ProfileTable>) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            profiles,
        }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TelemetrySource for FileSource {
    async fn fetch(&self) -> Result<Reading, FetchError> {
        let content = tokio::fs::read(&self.path)
            .await
            .map_err(|e| FetchError::transport(format!("Read error: {}", e)))?;
        decode_reading(&content, &self.profiles, current_timestamp_ms())
    }

    fn description(&self) -> &str {
        &self.description
    }
}
