//! Recording and failing collaborators for logger tests.
//!
//! [`RecordingConsole`] and [`RecordingSink`] can share one [`Journal`] so
//! tests can assert on the relative order of console writes and sink calls.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use structured_logger::{
    Breadcrumb, CapturedException, CapturedMessage, ConsoleOutput, LogRecord, MetricTags,
    MetricUnit, MetricsCapability, MetricsError, ObservabilitySink, SinkError, SpanDescriptor,
    SpanId, SpanStatus,
};

/// One observed collaborator call.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Console write
    Console(LogRecord),
    /// Breadcrumb forwarded to the sink
    Breadcrumb(Breadcrumb),
    /// Captured message forwarded to the sink
    Message(CapturedMessage),
    /// Captured exception forwarded to the sink
    Exception(CapturedException),
    /// Span opened
    SpanStarted(SpanDescriptor),
    /// Span closed
    SpanFinished {
        /// Span id
        id: SpanId,
        /// Final status
        status: SpanStatus,
        /// Elapsed time
        elapsed: Duration,
    },
    /// Measurement set
    Measurement {
        /// Measurement name
        name: String,
        /// Value
        value: f64,
        /// Unit
        unit: MetricUnit,
    },
    /// Tag set
    Tag {
        /// Tag key
        key: String,
        /// Tag value
        value: String,
    },
}

impl Event {
    /// Short name of the event kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Console(_) => "console",
            Self::Breadcrumb(_) => "breadcrumb",
            Self::Message(_) => "message",
            Self::Exception(_) => "exception",
            Self::SpanStarted(_) => "span_started",
            Self::SpanFinished { .. } => "span_finished",
            Self::Measurement { .. } => "measurement",
            Self::Tag { .. } => "tag",
        }
    }
}

/// Ordered, shareable record of collaborator calls.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    /// Create an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }

    /// Copy all events in order.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Event kinds in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(Event::kind).collect()
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no event was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all events.
    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Console that records every written record.
#[derive(Debug, Clone, Default)]
pub struct RecordingConsole {
    journal: Journal,
}

impl RecordingConsole {
    /// Create a console with its own journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a console writing to a shared journal.
    #[must_use]
    pub const fn with_journal(journal: Journal) -> Self {
        Self { journal }
    }

    /// Records written so far.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.journal
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Console(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Messages written so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }
}

impl ConsoleOutput for RecordingConsole {
    fn write(&self, record: &LogRecord) {
        self.journal.push(Event::Console(record.clone()));
    }
}

/// Sink that records every call and always succeeds.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    journal: Journal,
}

impl RecordingSink {
    /// Create a sink with its own journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink writing to a shared journal.
    #[must_use]
    pub const fn with_journal(journal: Journal) -> Self {
        Self { journal }
    }

    /// Breadcrumbs received so far.
    #[must_use]
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.journal
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Breadcrumb(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    /// Captured messages received so far.
    #[must_use]
    pub fn messages(&self) -> Vec<CapturedMessage> {
        self.journal
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    /// Captured exceptions received so far.
    #[must_use]
    pub fn exceptions(&self) -> Vec<CapturedException> {
        self.journal
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Exception(x) => Some(x),
                _ => None,
            })
            .collect()
    }

    /// Spans opened so far.
    #[must_use]
    pub fn started_spans(&self) -> Vec<SpanDescriptor> {
        self.journal
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::SpanStarted(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// Spans closed so far, as `(id, status, elapsed)`.
    #[must_use]
    pub fn finished_spans(&self) -> Vec<(SpanId, SpanStatus, Duration)> {
        self.journal
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::SpanFinished {
                    id,
                    status,
                    elapsed,
                } => Some((id, status, elapsed)),
                _ => None,
            })
            .collect()
    }
}

impl ObservabilitySink for RecordingSink {
    fn add_breadcrumb(&self, breadcrumb: &Breadcrumb) -> Result<(), SinkError> {
        self.journal.push(Event::Breadcrumb(breadcrumb.clone()));
        Ok(())
    }

    fn capture_message(&self, message: &CapturedMessage) -> Result<(), SinkError> {
        self.journal.push(Event::Message(message.clone()));
        Ok(())
    }

    fn capture_exception(&self, exception: &CapturedException) -> Result<(), SinkError> {
        self.journal.push(Event::Exception(exception.clone()));
        Ok(())
    }

    fn start_span(&self, span: &SpanDescriptor) -> Result<SpanId, SinkError> {
        self.journal.push(Event::SpanStarted(span.clone()));
        Ok(span.id)
    }

    fn finish_span(
        &self,
        id: SpanId,
        status: SpanStatus,
        elapsed: Duration,
    ) -> Result<(), SinkError> {
        self.journal.push(Event::SpanFinished {
            id,
            status,
            elapsed,
        });
        Ok(())
    }

    fn set_measurement(&self, name: &str, value: f64, unit: &MetricUnit) -> Result<(), SinkError> {
        self.journal.push(Event::Measurement {
            name: name.to_string(),
            value,
            unit: unit.clone(),
        });
        Ok(())
    }

    fn set_tag(&self, key: &str, value: &str) -> Result<(), SinkError> {
        self.journal.push(Event::Tag {
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }
}

/// Sink whose every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSink;

impl ObservabilitySink for FailingSink {
    fn add_breadcrumb(&self, _: &Breadcrumb) -> Result<(), SinkError> {
        Err(SinkError::unavailable("breadcrumb endpoint down"))
    }

    fn capture_message(&self, _: &CapturedMessage) -> Result<(), SinkError> {
        Err(SinkError::unavailable("capture endpoint down"))
    }

    fn capture_exception(&self, _: &CapturedException) -> Result<(), SinkError> {
        Err(SinkError::rejected("exception too large"))
    }

    fn start_span(&self, _: &SpanDescriptor) -> Result<SpanId, SinkError> {
        Err(SinkError::unavailable("tracing disabled"))
    }

    fn finish_span(&self, _: SpanId, _: SpanStatus, _: Duration) -> Result<(), SinkError> {
        Err(SinkError::unavailable("tracing disabled"))
    }

    fn set_measurement(&self, _: &str, _: f64, _: &MetricUnit) -> Result<(), SinkError> {
        Err(SinkError::unavailable("no transaction"))
    }

    fn set_tag(&self, _: &str, _: &str) -> Result<(), SinkError> {
        Err(SinkError::unavailable("no scope"))
    }
}

/// Kind of a recorded metric sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Counter increment
    Counter,
    /// Gauge set
    Gauge,
    /// Distribution sample
    Distribution,
}

/// One recorded metric call.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Kind of metric
    pub kind: MetricKind,
    /// Fully qualified name
    pub name: String,
    /// Value
    pub value: f64,
    /// Unit, for distributions
    pub unit: Option<MetricUnit>,
    /// Tags
    pub tags: MetricTags,
}

/// Metrics backend that records every sample.
#[derive(Debug, Clone, Default)]
pub struct RecordingMetrics {
    samples: Arc<Mutex<Vec<MetricSample>>>,
}

impl RecordingMetrics {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples recorded so far.
    #[must_use]
    pub fn samples(&self) -> Vec<MetricSample> {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Samples with the given name.
    #[must_use]
    pub fn named(&self, name: &str) -> Vec<MetricSample> {
        self.samples()
            .into_iter()
            .filter(|s| s.name == name)
            .collect()
    }

    fn push(&self, sample: MetricSample) {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sample);
    }
}

impl MetricsCapability for RecordingMetrics {
    fn increment_counter(
        &self,
        name: &str,
        value: f64,
        tags: &MetricTags,
    ) -> Result<(), MetricsError> {
        self.push(MetricSample {
            kind: MetricKind::Counter,
            name: name.to_string(),
            value,
            unit: None,
            tags: tags.clone(),
        });
        Ok(())
    }

    fn set_gauge(&self, name: &str, value: f64, tags: &MetricTags) -> Result<(), MetricsError> {
        self.push(MetricSample {
            kind: MetricKind::Gauge,
            name: name.to_string(),
            value,
            unit: None,
            tags: tags.clone(),
        });
        Ok(())
    }

    fn record_distribution(
        &self,
        name: &str,
        value: f64,
        unit: &MetricUnit,
        tags: &MetricTags,
    ) -> Result<(), MetricsError> {
        self.push(MetricSample {
            kind: MetricKind::Distribution,
            name: name.to_string(),
            value,
            unit: Some(unit.clone()),
            tags: tags.clone(),
        });
        Ok(())
    }
}

/// Metrics backend whose every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingMetrics;

impl MetricsCapability for FailingMetrics {
    fn increment_counter(&self, _: &str, _: f64, _: &MetricTags) -> Result<(), MetricsError> {
        Err(MetricsError::backend("counter backend exploded"))
    }

    fn set_gauge(&self, _: &str, _: f64, _: &MetricTags) -> Result<(), MetricsError> {
        Err(MetricsError::Unsupported)
    }

    fn record_distribution(
        &self,
        _: &str,
        _: f64,
        _: &MetricUnit,
        _: &MetricTags,
    ) -> Result<(), MetricsError> {
        Err(MetricsError::backend("distribution backend exploded"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use structured_logger::{Attributes, Level, Severity};

    #[test]
    fn test_shared_journal_keeps_order() {
        let journal = Journal::new();
        let console = RecordingConsole::with_journal(journal.clone());
        let sink = RecordingSink::with_journal(journal.clone());

        console.write(&LogRecord::new("API", Level::Info, "hi", Attributes::new()));
        sink.add_breadcrumb(&Breadcrumb {
            category: "api".to_string(),
            message: "hi".to_string(),
            severity: Severity::Info,
            data: Attributes::new(),
        })
        .unwrap();

        assert_eq!(journal.kinds(), vec!["console", "breadcrumb"]);
        assert_eq!(console.messages(), vec!["hi".to_string()]);
        assert_eq!(sink.breadcrumbs().len(), 1);
    }

    #[test]
    fn test_journal_clear() {
        let journal = Journal::new();
        journal.push(Event::Tag {
            key: "k".to_string(),
            value: "v".to_string(),
        });
        assert_eq!(journal.len(), 1);
        journal.clear();
        assert!(journal.is_empty());
    }

    #[test]
    fn test_recording_metrics() {
        let metrics = RecordingMetrics::new();
        metrics
            .increment_counter("api.calls", 1.0, &MetricTags::new())
            .unwrap();
        metrics
            .record_distribution("api.rt", 3.0, &MetricUnit::Millisecond, &MetricTags::new())
            .unwrap();

        assert_eq!(metrics.samples().len(), 2);
        assert_eq!(metrics.named("api.rt")[0].kind, MetricKind::Distribution);
    }

    #[test]
    fn test_failing_collaborators_fail() {
        assert!(FailingMetrics.set_gauge("g", 1.0, &MetricTags::new()).is_err());
        assert!(FailingSink.set_tag("k", "v").is_err());
    }
}
