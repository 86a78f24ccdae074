//! Observability sink boundary and the default tracing-backed sink.
//!
//! The sink receives breadcrumbs, captured messages and exceptions,
//! measurements, tags and span lifecycle events. Every method is best-effort:
//! the logger contains any [`SinkError`] it returns.

use crate::error::SinkError;
use crate::metrics::MetricUnit;
use crate::record::{Attributes, ErrorSummary, Severity};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Tag set attached to captures.
pub type Tags = BTreeMap<String, String>;

/// A lightweight trail entry describing a notable event.
#[derive(Debug, Clone, PartialEq)]
pub struct Breadcrumb {
    /// Lowercased logger context
    pub category: String,
    /// Message text
    pub message: String,
    /// Sink severity
    pub severity: Severity,
    /// Merged record attributes
    pub data: Attributes,
}

/// A discrete reportable message.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedMessage {
    /// `[context] message`
    pub text: String,
    /// Sink severity
    pub severity: Severity,
    /// Tags, always including `logger_context`
    pub tags: Tags,
    /// Merged record attributes
    pub extra: Attributes,
}

/// A discrete reportable structured error.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedException {
    /// Normalized error
    pub error: ErrorSummary,
    /// Tags, always including `logger_context`
    pub tags: Tags,
    /// Merged record attributes
    pub extra: Attributes,
}

/// Identifier of an open timing span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(Uuid);

impl SpanId {
    /// Allocate a fresh span id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SpanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Description of a span being opened.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanDescriptor {
    /// Span id allocated by the logger
    pub id: SpanId,
    /// `{context}.{name}`
    pub name: String,
    /// Operation category, e.g. `http.client`
    pub operation: String,
    /// Span attributes, always including `logger_context`
    pub attributes: Attributes,
}

/// How a span ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStatus {
    /// The wrapped work succeeded
    Ok,
    /// The wrapped work failed
    Error,
}

impl SpanStatus {
    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Receiver of remote observability events.
pub trait ObservabilitySink: Send + Sync {
    /// Record a breadcrumb.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot accept the event.
    fn add_breadcrumb(&self, breadcrumb: &Breadcrumb) -> Result<(), SinkError>;

    /// Capture a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot accept the event.
    fn capture_message(&self, message: &CapturedMessage) -> Result<(), SinkError>;

    /// Capture a structured error.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot accept the event.
    fn capture_exception(&self, exception: &CapturedException) -> Result<(), SinkError>;

    /// Open a timing span.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot open the span.
    fn start_span(&self, span: &SpanDescriptor) -> Result<SpanId, SinkError>;

    /// Close a timing span.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot close the span.
    fn finish_span(
        &self,
        id: SpanId,
        status: SpanStatus,
        elapsed: Duration,
    ) -> Result<(), SinkError>;

    /// Attach a measurement to the current transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot accept the measurement.
    fn set_measurement(&self, name: &str, value: f64, unit: &MetricUnit) -> Result<(), SinkError>;

    /// Set a tag on the current scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot accept the tag.
    fn set_tag(&self, key: &str, value: &str) -> Result<(), SinkError>;
}

/// Sink that emits every event as a `tracing` event under target `observability`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Create a tracing sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn json(attributes: &Attributes) -> String {
    serde_json::to_string(attributes).unwrap_or_default()
}

impl ObservabilitySink for TracingSink {
    fn add_breadcrumb(&self, breadcrumb: &Breadcrumb) -> Result<(), SinkError> {
        debug!(
            target: "observability",
            kind = "breadcrumb",
            category = %breadcrumb.category,
            severity = %breadcrumb.severity,
            data = %json(&breadcrumb.data),
            "{}",
            breadcrumb.message
        );
        Ok(())
    }

    fn capture_message(&self, message: &CapturedMessage) -> Result<(), SinkError> {
        let tags = format!("{:?}", message.tags);
        match message.severity {
            Severity::Error => error!(
                target: "observability",
                kind = "message",
                tags = %tags,
                extra = %json(&message.extra),
                "{}",
                message.text
            ),
            Severity::Warning => warn!(
                target: "observability",
                kind = "message",
                tags = %tags,
                extra = %json(&message.extra),
                "{}",
                message.text
            ),
            Severity::Debug | Severity::Info => info!(
                target: "observability",
                kind = "message",
                tags = %tags,
                extra = %json(&message.extra),
                "{}",
                message.text
            ),
        }
        Ok(())
    }

    fn capture_exception(&self, exception: &CapturedException) -> Result<(), SinkError> {
        error!(
            target: "observability",
            kind = "exception",
            error_name = %exception.error.name,
            stack = %exception.error.stack,
            tags = ?exception.tags,
            "{}",
            exception.error.message
        );
        Ok(())
    }

    fn start_span(&self, span: &SpanDescriptor) -> Result<SpanId, SinkError> {
        debug!(
            target: "observability",
            kind = "span_start",
            span_id = %span.id,
            op = %span.operation,
            attributes = %json(&span.attributes),
            "{}",
            span.name
        );
        Ok(span.id)
    }

    fn finish_span(
        &self,
        id: SpanId,
        status: SpanStatus,
        elapsed: Duration,
    ) -> Result<(), SinkError> {
        debug!(
            target: "observability",
            kind = "span_finish",
            span_id = %id,
            status = status.as_str(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0
        );
        Ok(())
    }

    fn set_measurement(&self, name: &str, value: f64, unit: &MetricUnit) -> Result<(), SinkError> {
        debug!(
            target: "observability",
            kind = "measurement",
            measurement = name,
            value,
            unit = %unit
        );
        Ok(())
    }

    fn set_tag(&self, key: &str, value: &str) -> Result<(), SinkError> {
        debug!(target: "observability", kind = "tag", tag = key, value = value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_ids_unique() {
        assert_ne!(SpanId::new(), SpanId::new());
    }

    #[test]
    fn test_span_status_as_str() {
        assert_eq!(SpanStatus::Ok.as_str(), "ok");
        assert_eq!(SpanStatus::Error.as_str(), "error");
    }

    #[test]
    fn test_tracing_sink_accepts_everything() {
        let sink = TracingSink::new();
        let crumb = Breadcrumb {
            category: "api".to_string(),
            message: "hello".to_string(),
            severity: Severity::Info,
            data: Attributes::new().with("k", "v"),
        };
        assert!(sink.add_breadcrumb(&crumb).is_ok());

        let descriptor = SpanDescriptor {
            id: SpanId::new(),
            name: "API.fetch".to_string(),
            operation: "http.client".to_string(),
            attributes: Attributes::new(),
        };
        let id = sink.start_span(&descriptor).unwrap();
        assert_eq!(id, descriptor.id);
        assert!(sink.finish_span(id, SpanStatus::Ok, Duration::from_millis(3)).is_ok());
        assert!(sink.set_measurement("ttfb", 1.5, &MetricUnit::Millisecond).is_ok());
        assert!(sink.set_tag("k", "v").is_ok());
    }
}
