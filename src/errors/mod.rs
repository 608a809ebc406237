//! Error handling module for the catalog client.
//!
//! Provides a single error type covering transport failures, non-success
//! HTTP statuses and client-side validation, plus decoding of the backend's
//! error envelope.

use serde::Deserialize;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const SERVER_ERROR: &str = "SERVER_ERROR";
    pub const HTTP_ERROR: &str = "HTTP_ERROR";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
}

/// Client error type.
///
/// `Clone` so that one failed request can be handed to every caller that was
/// waiting on it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// No response was received (connection refused, reset, DNS...)
    #[error("transport error: {0}")]
    Transport(String),
    /// The request did not complete within the configured bound
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The backend answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// A client-side precondition failed; nothing was sent
    #[error("validation failed: {0}")]
    Validation(String),
    /// The response body did not match the expected shape
    #[error("decode error: {0}")]
    Decode(String),
    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Get the HTTP status code carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Transport(_) => codes::TRANSPORT_ERROR,
            ClientError::Timeout(_) => codes::TIMEOUT,
            ClientError::Status { status, .. } => match status {
                401 | 403 => codes::UNAUTHORIZED,
                404 => codes::NOT_FOUND,
                400 | 422 => codes::BAD_REQUEST,
                500..=599 => codes::SERVER_ERROR,
                _ => codes::HTTP_ERROR,
            },
            ClientError::Validation(_) => codes::VALIDATION_ERROR,
            ClientError::Decode(_) => codes::DECODE_ERROR,
            ClientError::Config(_) => codes::CONFIG_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            ClientError::Transport(msg) => msg.clone(),
            ClientError::Timeout(msg) => msg.clone(),
            ClientError::Status { message, .. } => message.clone(),
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Decode(msg) => msg.clone(),
            ClientError::Config(msg) => msg.clone(),
        }
    }

    /// Whether repeating the same request may succeed.
    ///
    /// Nothing in this crate retries on its own; views use this to decide
    /// whether to offer a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::Timeout(_) => true,
            ClientError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// True when the error was raised before anything reached the network.
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            tracing::warn!("Request timed out: {}", err);
            return ClientError::Timeout(err.to_string());
        }
        if err.is_decode() {
            tracing::error!("Response decode error: {:?}", err);
            return ClientError::Decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return ClientError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        tracing::error!("Transport error: {:?}", err);
        ClientError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        ClientError::Decode(format!("JSON error: {}", err))
    }
}

/// Error envelope returned by the backend: `{"detail": ...}`.
///
/// `detail` is a plain string for handled errors and a list of field errors
/// for request validation failures.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// Flatten the detail into a single human-readable message.
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.get("msg")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| item.to_string())
                })
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}

/// Build a status error from a response body, falling back to the raw text.
pub fn status_error(status: u16, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message())
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                format!("HTTP status {}", status)
            } else {
                body.trim().to_string()
            }
        });
    ClientError::Status { status, message }
}
