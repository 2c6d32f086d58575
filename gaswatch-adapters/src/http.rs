//! HTTP fetcher for sensor gateways.
//!
//! Queries `GET <endpoint>/raw` on a gateway (typically the microcontroller
//! bridge in front of the MQ sensors) and decodes the JSON body.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gaswatch_adapters::http::HttpSource;
//! use gaswatch_adapters::TelemetrySource;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = HttpSource::builder()
//!         .endpoint("http://192.168.1.40")
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let reading = source.fetch().await?;
//!     for (sensor, value) in reading.iter() {
//!         println!("{}: {}", sensor, value);
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::debug;

use gaswatch_types::{current_timestamp_ms, ProfileTable, Reading};

use crate::{decode_reading, FetchError, TelemetrySource};

/// Path of the raw-reading resource on the gateway.
pub const RAW_PATH: &str = "/raw";

/// Fetches readings from an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
    profiles: Arc<ProfileTable>,
    description: String,
}

impl HttpSource {
    /// Create a new builder for configuring the source.
    pub fn builder() -> HttpSourceBuilder {
        HttpSourceBuilder::default()
    }

    /// Full URL queried on each fetch.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TelemetrySource for HttpSource {
    async fn fetch(&self) -> Result<Reading, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        debug!("GET {} -> {}", self.url, status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.trim();
            let message = if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            } else {
                body.to_string()
            };
            return Err(FetchError::status(status.as_u16(), message));
        }

        let body = response.bytes().await?;
        decode_reading(&body, &self.profiles, current_timestamp_ms())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for HttpSource.
#[derive(Debug, Default)]
pub struct HttpSourceBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
    profiles: Option<Arc<ProfileTable>>,
}

impl HttpSourceBuilder {
    /// Set the gateway base URL (e.g., "http://192.168.1.40:8080").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the profile table used to map JSON fields to sensors
    /// (default: the reference table).
    pub fn profiles(mut self, profiles: Arc<ProfileTable>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Build the source.
    pub fn build(self) -> Result<HttpSource, FetchError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::transport(format!("failed to build HTTP client: {}", e)))?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:8080".to_string());
        let url = raw_url(&endpoint);

        Ok(HttpSource {
            client,
            description: format!("http: {}", url),
            url,
            profiles: self.profiles.unwrap_or_default(),
        })
    }
}

fn raw_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), RAW_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use gaswatch_types::{SensorId, TimestampOrigin};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response and return the base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut read = 0;
            // Read until the end of the request headers.
            loop {
                let n = socket.read(&mut buf[read..]).await.unwrap();
                if n == 0 {
                    break;
                }
                read += n;
                if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}", addr)
    }

    #[test]
    fn test_builder_defaults() {
        let source = HttpSource::builder().build().unwrap();
        assert_eq!(source.url(), "http://localhost:8080/raw");
        assert_eq!(source.description(), "http: http://localhost:8080/raw");
    }

    #[test]
    fn test_raw_url_trims_trailing_slash() {
        assert_eq!(raw_url("http://gw.local/"), "http://gw.local/raw");
        assert_eq!(raw_url("http://gw.local"), "http://gw.local/raw");
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let base = serve_once(
            "200 OK",
            r#"{"mq137_ppm": 20.0, "mq4_ppm": 260.0, "mq7_ppm": 5.0}"#,
        )
        .await;
        let source = HttpSource::builder().endpoint(base).build().unwrap();

        let reading = source.fetch().await.unwrap();
        assert_eq!(reading.get(SensorId::Ammonia), 20.0);
        assert_eq!(reading.get(SensorId::Methane), 260.0);
        assert_eq!(reading.origin(), TimestampOrigin::Receipt);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let base = serve_once("503 Service Unavailable", "sensor warming up").await;
        let source = HttpSource::builder().endpoint(base).build().unwrap();

        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status_code(), Some(503));
        assert!(err.to_string().contains("sensor warming up"));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let base = serve_once("200 OK", r#"{"mq137_ppm": 20.0}"#).await;
        let source = HttpSource::builder().endpoint(base).build().unwrap();

        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = HttpSource::builder()
            .endpoint(format!("http://{}", addr))
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status_code(), None);
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        // Accept the connection but never answer.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            std::future::pending::<()>().await;
        });

        let source = HttpSource::builder()
            .endpoint(format!("http://{}", addr))
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();

        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status_code(), None);
    }
}
