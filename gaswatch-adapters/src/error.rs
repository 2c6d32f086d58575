//! Error types for telemetry sources.

use thiserror::Error;

/// Errors that can occur when fetching a reading.
///
/// Both variants are recoverable: a poller retries them and reports the last
/// one to its subscribers, but never treats them as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network or status failure. `status` is set when the server answered
    /// with a non-success HTTP status.
    #[error("{}", transport_message(.status, .message))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The payload was not valid JSON or lacked a required field.
    #[error("Failed to decode sensor data: {message}")]
    Decode { message: String },
}

/// Coarse category of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Decode,
}

impl FetchError {
    /// Transport failure without an HTTP status (refused, timed out, ...).
    pub fn transport(message: impl Into<String>) -> Self {
        FetchError::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Transport failure carrying the HTTP status the server returned.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        FetchError::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Payload decoding failure.
    pub fn decode(message: impl Into<String>) -> Self {
        FetchError::Decode {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Transport { .. } => ErrorKind::Transport,
            FetchError::Decode { .. } => ErrorKind::Decode,
        }
    }

    /// HTTP status code, when known.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Transport { status, .. } => *status,
            FetchError::Decode { .. } => None,
        }
    }
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Failed to fetch sensor data (status {}): {}", code, message),
        None => format!("Failed to fetch sensor data: {}", message),
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::transport("request timed out")
        } else if err.is_connect() {
            FetchError::transport(format!("connection failed: {}", err))
        } else if let Some(status) = err.status() {
            FetchError::status(status.as_u16(), err.to_string())
        } else {
            FetchError::transport(err.to_string())
        }
    }
}
