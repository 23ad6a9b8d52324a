use std::time::Duration;

use estrella_core::error::CoreError;

/// Errors from the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// No response within the configured deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// A 2xx response whose body did not have the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// The local file to upload could not be read.
    #[error(transparent)]
    File(#[from] CoreError),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The `error` field of a JSON error body, when the server sent one.
    pub fn server_message(&self) -> Option<String> {
        let Self::Api { body, .. } = self else {
            return None;
        };
        serde_json::from_str::<serde_json::Value>(body)
            .ok()?
            .get("error")?
            .as_str()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Request(e) => e.is_timeout(),
            _ => false,
        }
    }
}
