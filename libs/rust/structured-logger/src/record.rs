//! Log records, levels, attributes and error payloads.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Severity of a log record, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Development-only diagnostics
    Debug,
    /// Normal operation
    Info,
    /// Something unexpected but recoverable
    Warn,
    /// A failure
    Error,
}

impl Level {
    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Map to the sink's severity vocabulary.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Debug => Severity::Debug,
            Self::Info => Severity::Info,
            Self::Warn => Severity::Warning,
            Self::Error => Severity::Error,
        }
    }

    /// Whether records at this level are also captured remotely.
    #[must_use]
    pub const fn is_captured(&self) -> bool {
        matches!(self, Self::Warn | Self::Error)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity as understood by an observability sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Debug
    Debug,
    /// Info
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
}

impl Severity {
    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied key/value attributes attached to a record.
///
/// Insertion order is preserved. Inserting an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    /// Create an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert an attribute in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up an attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Copy every attribute of `other` into `self`, replacing duplicates.
    pub fn extend(&mut self, other: &Self) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Convert into a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Normalized view of a structured error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorSummary {
    /// Short type name of the error
    pub name: String,
    /// Display text of the error
    pub message: String,
    /// Rendered chain of underlying causes, one per line
    pub stack: String,
}

impl ErrorSummary {
    /// Summarize an error value, walking its `source()` chain.
    #[must_use]
    pub fn from_error<E: std::error::Error + ?Sized>(name: &str, error: &E) -> Self {
        let mut stack = String::new();
        let mut source = error.source();
        while let Some(cause) = source {
            if !stack.is_empty() {
                stack.push('\n');
            }
            stack.push_str("caused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }

        Self {
            name: short_type_name(name).to_string(),
            message: error.to_string(),
            stack,
        }
    }
}

/// The error payload given to [`crate::StructuredLogger::error`].
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorValue {
    /// A value that implements `std::error::Error`
    Structured(ErrorSummary),
    /// Any other value, reported as-is
    Raw(Value),
}

impl ErrorValue {
    /// Build a structured error value from any error.
    #[must_use]
    pub fn from_error<E: std::error::Error>(error: &E) -> Self {
        Self::Structured(ErrorSummary::from_error(std::any::type_name::<E>(), error))
    }

    /// Build a raw error value.
    #[must_use]
    pub fn raw(value: impl Into<Value>) -> Self {
        Self::Raw(value.into())
    }

    /// Whether this is a structured error.
    #[must_use]
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// JSON form stored under the `error` attribute.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Structured(summary) => serde_json::json!({
                "name": summary.name,
                "message": summary.message,
                "stack": summary.stack,
            }),
            Self::Raw(value) => value.clone(),
        }
    }
}

/// Errors that can be reported by a failing span.
///
/// Implemented for every `std::error::Error`. Local types that are not errors
/// can implement it to report themselves as raw values.
pub trait ReportableError {
    /// Produce the payload logged when a span fails with this value.
    fn to_error_value(&self) -> ErrorValue;
}

impl<E: std::error::Error> ReportableError for E {
    fn to_error_value(&self) -> ErrorValue {
        ErrorValue::from_error(self)
    }
}

fn short_type_name(name: &str) -> &str {
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}

/// One log call, as seen by the console and the sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// Context label of the emitting logger
    pub context: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Severity
    pub level: Level,
    /// Message text
    pub message: String,
    /// Caller attributes, including the normalized `error` for error records
    pub attributes: Attributes,
}

impl LogRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(
        context: impl Into<String>,
        level: Level,
        message: impl Into<String>,
        attributes: Attributes,
    ) -> Self {
        Self {
            context: context.into(),
            timestamp: Utc::now(),
            level,
            message: message.into(),
            attributes,
        }
    }

    /// Generated fields followed by the caller's attributes.
    ///
    /// A caller key overrides a generated key of the same name.
    #[must_use]
    pub fn merged(&self) -> Attributes {
        let mut merged = Attributes::new()
            .with("context", self.context.clone())
            .with(
                "timestamp",
                self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            );
        merged.extend(&self.attributes);
        merged
    }

    /// Text used for console lines and captured messages.
    #[must_use]
    pub fn prefixed_message(&self) -> String {
        format!("[{}] {}", self.context, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("connection reset")]
    struct ResetError;

    #[derive(Debug, thiserror::Error)]
    #[error("request failed")]
    struct RequestError {
        #[source]
        source: ResetError,
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn test_level_severity_mapping() {
        assert_eq!(Level::Debug.severity(), Severity::Debug);
        assert_eq!(Level::Info.severity(), Severity::Info);
        assert_eq!(Level::Warn.severity(), Severity::Warning);
        assert_eq!(Level::Error.severity(), Severity::Error);
        assert_eq!(Severity::Warning.as_str(), "warning");
    }

    #[test]
    fn test_captured_levels() {
        assert!(!Level::Debug.is_captured());
        assert!(!Level::Info.is_captured());
        assert!(Level::Warn.is_captured());
        assert!(Level::Error.is_captured());
    }

    #[test]
    fn test_merged_caller_overrides_generated() {
        let record = LogRecord::new(
            "API",
            Level::Info,
            "hello",
            Attributes::new().with("context", "override").with("k", 1),
        );
        let merged = record.merged();

        assert_eq!(merged.get("context"), Some(&Value::from("override")));
        assert_eq!(merged.get("k"), Some(&Value::from(1)));
        assert!(merged.get("timestamp").is_some());
    }

    #[test]
    fn test_merged_starts_with_generated_fields() {
        let record = LogRecord::new("UI", Level::Warn, "m", Attributes::new().with("a", true));
        let keys: Vec<_> = record.merged().iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec!["context", "timestamp", "a"]);
    }

    #[test]
    fn test_error_summary_walks_sources() {
        let err = RequestError { source: ResetError };
        let value = ErrorValue::from_error(&err);

        let ErrorValue::Structured(summary) = value else {
            panic!("expected structured error");
        };
        assert_eq!(summary.name, "RequestError");
        assert_eq!(summary.message, "request failed");
        assert_eq!(summary.stack, "caused by: connection reset");
    }

    #[test]
    fn test_raw_error_value_passes_through() {
        let value = ErrorValue::raw("plain string");
        assert!(!value.is_structured());
        assert_eq!(value.to_value(), Value::from("plain string"));
    }

    #[test]
    fn test_reportable_error_blanket_impl() {
        let err = std::io::Error::other("disk full");
        let value = err.to_error_value();
        assert!(value.is_structured());
        assert_eq!(value.to_value()["message"], "disk full");
        assert_eq!(value.to_value()["name"], "Error");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("std::io::error::Error"), "Error");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
