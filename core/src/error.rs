//! Error types for the document API client.
//!
//! # Design
//! Three failure kinds reach the caller. `Api` means the server answered with
//! a non-success status; it carries the status code, the server's `message`
//! (or the HTTP reason phrase when the body has none), and any field-level
//! validation errors. `Network` wraps the transport's own error for calls
//! that never received a response and is propagated unchanged. `Decode` and
//! `Serialize` cover JSON conversion on either side of the wire. Input and
//! setup problems (`InvalidHeader`, `InvalidMime`, `Client`) are reported
//! before any call is made. Nothing is retried or suppressed.

use serde::Deserialize;
use thiserror::Error;

/// A per-field validation failure returned by the server alongside the
/// general failure message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    pub message: String,
}

/// Errors returned by the client and transport.
#[derive(Debug, Error)]
pub enum Error {
    /// The server responded with a status outside the success range.
    #[error("{message} (status {status})")]
    Api {
        status: u16,
        message: String,
        errors: Vec<FieldError>,
    },

    /// A success response body could not be decoded as JSON.
    #[error("response body is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    /// A request body or query parameter value could not be serialized.
    #[error("request serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A header name or value is not representable on the wire.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The upload's mime type is not a parseable media type.
    #[error("invalid mime type: {0}")]
    InvalidMime(String),

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The call never received a response (connection, DNS, TLS, ...).
    #[error(transparent)]
    Network(#[from] reqwest::Error),
}

impl Error {
    /// Status code of an `Api` error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_message_and_status() {
        let err = Error::Api {
            status: 404,
            message: "Resource not found".to_string(),
            errors: Vec::new(),
        };
        assert_eq!(err.to_string(), "Resource not found (status 404)");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn field_errors_deserialize_from_server_shape() {
        let errors: Vec<FieldError> =
            serde_json::from_str(r#"[{"message":"title is required"}]"#).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "title is required");
    }

    #[test]
    fn non_api_errors_have_no_status() {
        let err = Error::InvalidHeader("bad\nname".to_string());
        assert_eq!(err.status(), None);
    }
}
