//! Error types for the donation relay.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
/// Error type for all relay operations.
pub enum Error {
    /// Underlying HTTP client error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// IO error when reading configuration or saved bodies.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Parse error with a message.
    #[error("parse error: {0}")]
    Parse(String),
    /// Authentication or token refresh failure.
    #[error("authentication error: {0}")]
    Auth(String),
    /// Configuration is present but invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// HTTP response returned a non-success status with body.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    /// The notification body lacks the expected structure.
    #[error("malformed notification: {0}")]
    MalformedNotification(String),
    /// A required donation field is absent or unparseable.
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, Error>;
