//! Error types for the cat-facts service.

use structured_logger::LoggerError;
use thiserror::Error;

/// Failure fetching a fact.
#[derive(Error, Debug)]
pub enum FactError {
    /// Transport failure or timeout
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Cat Facts API returned status {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase
        status_text: String,
    },

    /// The response body was not a fact
    #[error("Invalid fact payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FactError {
    /// Short label used as the `error_type` metric tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Status { .. } => "status",
            Self::Decode(_) => "decode",
        }
    }
}

/// Startup failure of the service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logger construction failed
    #[error(transparent)]
    Logger(#[from] LoggerError),

    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl ServiceError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = FactError::Status {
            status: 503,
            status_text: "Service Unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Cat Facts API returned status 503");
        assert_eq!(err.kind(), "status");
    }

    #[test]
    fn test_decode_error_kind() {
        let err: FactError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn test_service_error_display() {
        assert_eq!(
            ServiceError::config("bad url").to_string(),
            "Configuration error: bad url"
        );
        assert_eq!(
            ServiceError::from(LoggerError::EmptyContext).to_string(),
            "Logger context label must not be empty"
        );
    }
}
