// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for csp-sentinel
//!
//! Configuration problems are fatal to the construction attempt that hit
//! them. Delivery problems never surface here: they are returned as
//! [`DeliveryFailure`](crate::delivery::DeliveryFailure) values and the
//! report stays queued.

use thiserror::Error;

use crate::delivery::DeliveryFailure;

/// Result type alias for csp-sentinel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for csp-sentinel
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP client construction failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Endpoint rejected at configuration time
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Delivery failure escalated by a caller that chose to treat it as fatal
    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryFailure),

    /// Monitor was destroyed; no further violations are accepted
    #[error("Monitor has been destroyed")]
    MonitorDestroyed,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid endpoint error
    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Error::InvalidEndpoint { .. } | Error::Config(_))
    }

    /// Check if this is recoverable (can retry)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Delivery(failure) => failure.is_retryable(),
            _ => false,
        }
    }

    /// Get HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Delivery(failure) => failure.status_code(),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add operation context to error
    fn context(self, msg: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            match err {
                // Keep configuration errors matchable
                Error::InvalidEndpoint { .. } | Error::Config(_) => err,
                other => Error::Other(format!("{}: {}", msg, other)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint_error() {
        let err = Error::invalid_endpoint("ftp://collector", "unsupported scheme");

        assert!(err.is_config());
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Invalid endpoint 'ftp://collector': unsupported scheme"
        );
    }

    #[test]
    fn test_delivery_error_classification() {
        let err: Error = DeliveryFailure::Status(503).into();
        assert!(err.is_recoverable());
        assert_eq!(err.status_code(), Some(503));

        let err: Error = DeliveryFailure::Status(400).into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_context_keeps_config_errors() {
        let result: std::result::Result<(), Error> = Err(Error::config("maxQueueSize must be at least 1"));
        let err = result.context("loading monitor config").unwrap_err();
        assert!(err.is_config());

        let result: std::result::Result<(), &str> = Err("boom");
        let err = result.context("replaying events").unwrap_err();
        assert_eq!(err.to_string(), "replaying events: boom");
    }
}
