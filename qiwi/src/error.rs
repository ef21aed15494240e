//! Error types returned by the request executor.
//!
//! Every failed call resolves to exactly one [`ApiError`]. The two
//! provider-facing kinds carry enough context to react programmatically:
//!
//! - [`StatusError`] - the response status was outside the accepted set;
//!   the body is kept verbatim so callers can inspect provider error payloads.
//! - [`DecodingError`] - the declared content-type implied a structured
//!   format but parsing failed.

use std::time::Duration;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Opaque error reported by a [`Transport`](crate::transport::Transport).
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for a single API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Response status code is not in the accepted set.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// Response body could not be decoded for its declared content-type.
    #[error(transparent)]
    Decoding(#[from] DecodingError),

    /// The deadline elapsed before the transport completed.
    #[error("request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The transport failed to deliver the request or read the response.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// A header name or value cannot be sent over HTTP.
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader {
        /// Offending header name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ApiError {
    /// Returns the HTTP status code for [`ApiError::Status`].
    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        match self {
            Self::Status(err) => Some(err.status),
            _ => None,
        }
    }

    /// Returns `true` if the call was cancelled by its deadline.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// The API answered with a status code outside the accepted set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("API responded with error response code: {status}")]
pub struct StatusError {
    /// Response status code.
    pub status: u16,
    /// Raw response body, never parsed.
    pub body: String,
}

impl StatusError {
    /// Creates a new status error.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Serializes as `{ "name", "message", "code", "body" }` so the error can be
/// forwarded to logs or other services verbatim.
impl Serialize for StatusError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("StatusError", 4)?;
        state.serialize_field("name", "HttpError")?;
        state.serialize_field("message", &self.to_string())?;
        state.serialize_field("code", &self.status)?;
        state.serialize_field("body", &self.body)?;
        state.end()
    }
}

/// The response body did not match its declared structured format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to decode response: {message}")]
pub struct DecodingError {
    /// Message from the underlying parser.
    pub message: String,
}

impl DecodingError {
    /// Creates a decoding error from a parser message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for DecodingError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}
