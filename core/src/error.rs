//! Error types for the NeoWs client and paging pipeline.
//!
//! # Design
//! A single enum covers every failure the pipeline reports. `Request` and
//! `Network` come from the client, `MalformedData` and `Render` from the
//! renderer boundary. The enum is `Clone` so the pipeline can hand an error
//! to its observer and still keep it in the page report.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {status_text}")]
    Request { status: u16, status_text: String },

    /// The transport could not complete the round-trip (DNS, connect, I/O).
    #[error("network error: {0}")]
    Network(String),

    /// A 2xx response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A detail record lacks a field the renderer needs.
    #[error("malformed item data: {0}")]
    MalformedData(String),

    /// The renderer accepted the record but could not draw it.
    #[error("render failed: {0}")]
    Render(String),

    /// The configured base URL cannot have endpoint paths appended to it.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// HTTP status for `Request` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_displays_status_text() {
        let err = ApiError::Request {
            status: 429,
            status_text: "Too Many Requests".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 429: Too Many Requests");
        assert_eq!(err.status(), Some(429));
        assert!(!err.is_not_found());
    }

    #[test]
    fn non_request_errors_have_no_status() {
        let err = ApiError::Network("connection refused".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "network error: connection refused");
    }
}
