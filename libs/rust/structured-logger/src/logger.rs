//! Context-tagged structured logger.
//!
//! Every record is written to the console first, then forwarded to the sink
//! as a breadcrumb. Warn and error records are also captured as messages, and
//! error records carrying a structured error are captured as exceptions.
//! Collaborator failures are contained here and never reach the caller.

use crate::config::{Environment, LoggerConfig};
use crate::console::{ConsoleOutput, TracingConsole};
use crate::error::LoggerError;
use crate::metrics::{MetricTags, MetricUnit, MetricsCapability, NoopMetrics};
use crate::record::{Attributes, ErrorValue, Level, LogRecord, ReportableError};
use crate::sink::{
    Breadcrumb, CapturedException, CapturedMessage, ObservabilitySink, SpanDescriptor, SpanId,
    SpanStatus, Tags, TracingSink,
};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Tag key carrying the logger context on captures and spans.
pub const CONTEXT_TAG: &str = "logger_context";

/// Error value reported for a span dropped before its work settled.
pub const CANCELLED_REASON: &str = "span cancelled before completion";

/// Structured logger bound to one context label.
///
/// Cloning is cheap; clones share the same collaborators.
#[derive(Clone)]
pub struct StructuredLogger {
    context: Arc<str>,
    category: Arc<str>,
    environment: Environment,
    console: Arc<dyn ConsoleOutput>,
    sink: Arc<dyn ObservabilitySink>,
    metrics: Arc<dyn MetricsCapability>,
}

impl fmt::Debug for StructuredLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredLogger")
            .field("context", &self.context)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

/// Builder for [`StructuredLogger`].
#[must_use]
pub struct LoggerBuilder {
    context: String,
    environment: Option<Environment>,
    console: Option<Arc<dyn ConsoleOutput>>,
    sink: Option<Arc<dyn ObservabilitySink>>,
    metrics: Option<Arc<dyn MetricsCapability>>,
}

impl LoggerBuilder {
    /// Use a custom console.
    pub fn console(mut self, console: Arc<dyn ConsoleOutput>) -> Self {
        self.console = Some(console);
        self
    }

    /// Use a custom observability sink.
    pub fn sink(mut self, sink: Arc<dyn ObservabilitySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Use a metrics backend. Without one, metrics are discarded.
    pub fn metrics(mut self, metrics: Arc<dyn MetricsCapability>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Set the runtime environment explicitly.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Take settings from a loaded configuration.
    pub fn config(self, config: &LoggerConfig) -> Self {
        self.environment(config.environment)
    }

    /// Build the logger.
    ///
    /// The environment defaults to [`LoggerConfig::from_env`] when unset.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::EmptyContext`] if the context label is blank.
    pub fn build(self) -> Result<StructuredLogger, LoggerError> {
        if self.context.trim().is_empty() {
            return Err(LoggerError::EmptyContext);
        }

        let environment = self
            .environment
            .unwrap_or_else(|| LoggerConfig::from_env().environment);

        Ok(StructuredLogger {
            category: Arc::from(self.context.to_lowercase()),
            context: Arc::from(self.context),
            environment,
            console: self.console.unwrap_or_else(|| Arc::new(TracingConsole::new())),
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink::new())),
            metrics: self.metrics.unwrap_or_else(|| Arc::new(NoopMetrics)),
        })
    }
}

fn contain<T, E: fmt::Display>(context: &str, operation: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(
                target: "structured_logger::contained",
                logger_context = context,
                operation,
                error = %e,
                "Observability collaborator failed"
            );
            None
        }
    }
}

/// Closes a span whose future is dropped before the work settles.
///
/// Cancellation (a caller-side timeout, a dropped task) is reported as a
/// failure, so every started span ends exactly once.
struct SpanGuard<'a> {
    logger: &'a StructuredLogger,
    name: &'a str,
    span_id: Option<SpanId>,
    started: Instant,
    settled: bool,
}

impl SpanGuard<'_> {
    fn finish(mut self, status: SpanStatus, elapsed: Duration) {
        self.settled = true;
        self.logger.finish_span(self.span_id.take(), status, elapsed);
    }
}

impl Drop for SpanGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let elapsed = self.started.elapsed();
        self.logger.error(
            format!("Failed {}", self.name),
            Some(ErrorValue::raw(CANCELLED_REASON)),
            Some(timing_attributes(elapsed).with("cancelled", true)),
        );
        self.logger
            .finish_span(self.span_id.take(), SpanStatus::Error, elapsed);
    }
}

fn timing_attributes(elapsed: Duration) -> Attributes {
    let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    Attributes::new()
        .with("duration", format!("{millis}ms"))
        .with("duration_ms", millis)
}

impl StructuredLogger {
    /// Create a logger with the default tracing console and sink, no metrics
    /// backend, and the environment read from the process.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::EmptyContext`] if the context label is blank.
    pub fn new(context: impl Into<String>) -> Result<Self, LoggerError> {
        Self::builder(context).build()
    }

    /// Start building a logger for `context`.
    pub fn builder(context: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder {
            context: context.into(),
            environment: None,
            console: None,
            sink: None,
            metrics: None,
        }
    }

    /// The context label.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// The runtime environment.
    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    fn capture_tags(&self, mut tags: Tags) -> Tags {
        tags.insert(CONTEXT_TAG.to_string(), self.context.to_string());
        tags
    }

    fn log(&self, level: Level, message: String, attributes: Attributes) -> Attributes {
        self.log_tagged(level, message, attributes, Tags::new())
    }

    fn log_tagged(
        &self,
        level: Level,
        message: String,
        attributes: Attributes,
        tags: Tags,
    ) -> Attributes {
        let record = LogRecord::new(self.context.as_ref(), level, message, attributes);
        self.console.write(&record);

        let merged = record.merged();
        let breadcrumb = Breadcrumb {
            category: self.category.to_string(),
            message: record.message.clone(),
            severity: level.severity(),
            data: merged.clone(),
        };
        contain(
            &self.context,
            "add_breadcrumb",
            self.sink.add_breadcrumb(&breadcrumb),
        );

        if level.is_captured() {
            let captured = CapturedMessage {
                text: record.prefixed_message(),
                severity: level.severity(),
                tags: self.capture_tags(tags),
                extra: merged.clone(),
            };
            contain(
                &self.context,
                "capture_message",
                self.sink.capture_message(&captured),
            );
        }

        merged
    }

    /// Log a debug record. Only emitted in the development environment.
    pub fn debug(&self, message: impl Into<String>, attributes: Option<Attributes>) {
        if self.environment.is_development() {
            self.log(Level::Debug, message.into(), attributes.unwrap_or_default());
        }
    }

    /// Log an info record.
    pub fn info(&self, message: impl Into<String>, attributes: Option<Attributes>) {
        self.log(Level::Info, message.into(), attributes.unwrap_or_default());
    }

    /// Log a warning and capture it as a message.
    pub fn warn(&self, message: impl Into<String>, attributes: Option<Attributes>) {
        self.log(Level::Warn, message.into(), attributes.unwrap_or_default());
    }

    /// Log an error and capture it.
    ///
    /// The error value is normalized under the `error` attribute. A structured
    /// error is additionally captured as an exception; a raw value never is.
    pub fn error(
        &self,
        message: impl Into<String>,
        error: Option<ErrorValue>,
        attributes: Option<Attributes>,
    ) {
        self.error_with_tags(message, error, attributes, Tags::new());
    }

    /// Log an error like [`Self::error`], adding `tags` to the captured
    /// message and exception so they can be grouped remotely.
    ///
    /// The logger's own context tag always wins over a caller tag of the
    /// same key.
    pub fn error_with_tags(
        &self,
        message: impl Into<String>,
        error: Option<ErrorValue>,
        attributes: Option<Attributes>,
        tags: Tags,
    ) {
        let mut attributes = attributes.unwrap_or_default();
        if let Some(error) = &error {
            attributes.insert("error", error.to_value());
        }

        let extra = self.log_tagged(Level::Error, message.into(), attributes, tags.clone());

        if let Some(ErrorValue::Structured(summary)) = error {
            let exception = CapturedException {
                error: summary,
                tags: self.capture_tags(tags),
                extra,
            };
            contain(
                &self.context,
                "capture_exception",
                self.sink.capture_exception(&exception),
            );
        }
    }

    /// Run `work` inside a timing span named `{context}.{name}`.
    ///
    /// Logs `Starting {name}` before the work and `Completed {name}` or
    /// `Failed {name}` after it, with the elapsed duration attached. The
    /// work's result is returned unchanged, including its error.
    ///
    /// If the returned future is dropped before the work settles, the span is
    /// still closed: `Failed {name}` is logged with [`CANCELLED_REASON`] and
    /// the sink span finishes with [`SpanStatus::Error`].
    ///
    /// # Errors
    ///
    /// Returns exactly the error produced by `work`.
    pub async fn start_span<T, E, F, Fut>(
        &self,
        name: &str,
        operation: &str,
        work: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ReportableError,
    {
        let descriptor = SpanDescriptor {
            id: SpanId::new(),
            name: format!("{}.{}", self.context, name),
            operation: operation.to_string(),
            attributes: Attributes::new().with(CONTEXT_TAG, self.context.as_ref()),
        };
        let span_id = contain(
            &self.context,
            "start_span",
            self.sink.start_span(&descriptor),
        );
        let guard = SpanGuard {
            logger: self,
            name,
            span_id,
            started: Instant::now(),
            settled: false,
        };

        let tracing_span = tracing::info_span!(
            "span",
            span_name = %descriptor.name,
            op = %descriptor.operation,
            logger_context = %self.context
        );

        async move {
            self.info(format!("Starting {name}"), None);

            let outcome = work().await;
            let elapsed = guard.started.elapsed();

            let status = match &outcome {
                Ok(_) => {
                    self.info(format!("Completed {name}"), Some(timing_attributes(elapsed)));
                    SpanStatus::Ok
                }
                Err(e) => {
                    self.error(
                        format!("Failed {name}"),
                        Some(e.to_error_value()),
                        Some(timing_attributes(elapsed)),
                    );
                    SpanStatus::Error
                }
            };
            guard.finish(status, elapsed);

            outcome
        }
        .instrument(tracing_span)
        .await
    }

    fn finish_span(&self, span_id: Option<SpanId>, status: SpanStatus, elapsed: Duration) {
        if let Some(id) = span_id {
            contain(
                &self.context,
                "finish_span",
                self.sink.finish_span(id, status, elapsed),
            );
        }
    }

    fn metric_name(&self, metric: &str) -> String {
        format!("{}.{}", self.category, metric)
    }

    fn metric_tags(&self, tags: Option<MetricTags>) -> MetricTags {
        let mut tags = tags.unwrap_or_default();
        tags.insert("context".to_string(), self.context.to_string());
        tags
    }

    /// Add `value` to the counter `{context}.{metric}`.
    pub fn track_counter(&self, metric: &str, value: f64, tags: Option<MetricTags>) {
        let name = self.metric_name(metric);
        let tags = self.metric_tags(tags);
        contain(
            &self.context,
            "increment_counter",
            self.metrics.increment_counter(&name, value, &tags),
        );
    }

    /// Add one to the counter `{context}.{metric}`.
    pub fn increment(&self, metric: &str, tags: Option<MetricTags>) {
        self.track_counter(metric, 1.0, tags);
    }

    /// Set the gauge `{context}.{metric}`.
    pub fn track_gauge(&self, metric: &str, value: f64, tags: Option<MetricTags>) {
        let name = self.metric_name(metric);
        let tags = self.metric_tags(tags);
        contain(
            &self.context,
            "set_gauge",
            self.metrics.set_gauge(&name, value, &tags),
        );
    }

    /// Record a sample in the distribution `{context}.{metric}`.
    pub fn track_distribution(
        &self,
        metric: &str,
        value: f64,
        unit: Option<MetricUnit>,
        tags: Option<MetricTags>,
    ) {
        let name = self.metric_name(metric);
        let tags = self.metric_tags(tags);
        let unit = unit.unwrap_or_default();
        contain(
            &self.context,
            "record_distribution",
            self.metrics.record_distribution(&name, value, &unit, &tags),
        );
    }

    /// Attach a measurement to the current transaction.
    pub fn set_measurement(&self, name: &str, value: f64, unit: MetricUnit) {
        contain(
            &self.context,
            "set_measurement",
            self.sink.set_measurement(name, value, &unit),
        );
    }

    /// Set a tag on the current scope.
    pub fn set_tag(&self, key: &str, value: &str) {
        contain(&self.context, "set_tag", self.sink.set_tag(key, value));
    }
}
