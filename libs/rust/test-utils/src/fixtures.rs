//! Test fixtures with sample data.

use serde_json::{Value, json};
use thiserror::Error;

/// Leaf error used as the source of [`SampleRequestError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("connection reset by peer")]
pub struct SampleIoError;

/// Structured error with a one-level source chain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Cat Facts API returned status {status}")]
pub struct SampleRequestError {
    /// HTTP status
    pub status: u16,
    #[source]
    source: SampleIoError,
}

impl SampleRequestError {
    /// Create an error for the given status.
    #[must_use]
    pub const fn new(status: u16) -> Self {
        Self {
            status,
            source: SampleIoError,
        }
    }
}

/// Sample fact API response body.
#[must_use]
pub fn sample_fact_body() -> Value {
    json!({
        "fact": "Cats sleep for around thirteen to sixteen hours a day, which is about seventy percent of their lives.",
        "length": 101
    })
}

/// Sample short fact API response body.
#[must_use]
pub fn short_fact_body() -> Value {
    json!({
        "fact": "A group of cats is called a clowder.",
        "length": 36
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_sample_request_error_chain() {
        let err = SampleRequestError::new(503);
        assert_eq!(err.to_string(), "Cat Facts API returned status 503");
        assert_eq!(
            err.source().map(ToString::to_string),
            Some("connection reset by peer".to_string())
        );
    }

    #[test]
    fn test_fact_bodies() {
        assert_eq!(sample_fact_body()["length"], 101);
        assert!(short_fact_body()["fact"].as_str().unwrap().len() < 100);
    }
}
