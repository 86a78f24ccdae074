//! Error types for the structured logger and its collaborators.
//!
//! Only [`LoggerError`] ever reaches a caller, and only from construction or
//! tracing setup. [`SinkError`] and [`MetricsError`] are produced by
//! collaborators and are always contained by the logger.

use thiserror::Error;

/// Errors raised while building a logger or installing tracing.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// The context label was empty or whitespace.
    #[error("Logger context label must not be empty")]
    EmptyContext,

    /// The tracing filter directive could not be parsed.
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    /// A global tracing subscriber was already installed.
    #[error("Tracing already initialized: {0}")]
    TracingInit(String),
}

/// Errors reported by an observability sink.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The sink backend is not reachable.
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    /// The sink refused the event.
    #[error("Sink rejected event: {0}")]
    Rejected(String),
}

/// Errors reported by a metrics capability.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// The backend has no metrics support.
    #[error("Metrics capability unsupported")]
    Unsupported,

    /// The value cannot be recorded for this metric kind.
    #[error("Invalid value {value} for metric {name}")]
    InvalidValue {
        /// Fully qualified metric name
        name: String,
        /// Offending value
        value: f64,
    },

    /// The sample does not fit the metric already registered under its name.
    #[error("Metric conflict: {0}")]
    Conflict(String),

    /// A metrics lock was poisoned by a panicking writer.
    #[error("Metrics registry poisoned")]
    Poisoned,

    /// Any other backend failure.
    #[error("Metrics backend error: {0}")]
    Backend(String),
}

impl SinkError {
    /// Create an unavailable error with the given message.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a rejected error with the given message.
    #[must_use]
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

impl MetricsError {
    /// Create a backend error with the given message.
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a conflict error with the given message.
    #[must_use]
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an invalid value error.
    #[must_use]
    pub fn invalid_value(name: impl Into<String>, value: f64) -> Self {
        Self::InvalidValue {
            name: name.into(),
            value,
        }
    }
}

impl From<prometheus::Error> for MetricsError {
    fn from(err: prometheus::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            LoggerError::EmptyContext.to_string(),
            "Logger context label must not be empty"
        );
        assert_eq!(
            SinkError::unavailable("offline").to_string(),
            "Sink unavailable: offline"
        );
        assert_eq!(
            MetricsError::invalid_value("api.calls", -1.0).to_string(),
            "Invalid value -1 for metric api.calls"
        );
    }

    #[test]
    fn test_metrics_error_equality() {
        assert_eq!(MetricsError::Unsupported, MetricsError::Unsupported);
        assert_ne!(MetricsError::Poisoned, MetricsError::backend("x"));
    }

    #[test]
    fn test_prometheus_error_maps_to_backend() {
        let err = MetricsError::from(prometheus::Error::Msg("bad name".to_string()));
        assert_eq!(err, MetricsError::backend("bad name"));
        assert_eq!(
            MetricsError::conflict("c is a counter").to_string(),
            "Metric conflict: c is a counter"
        );
    }
}
