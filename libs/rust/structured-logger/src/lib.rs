//! Context-tagged structured logging with observability hooks.
//!
//! This crate provides:
//! - A [`StructuredLogger`] bound to one context label
//! - Breadcrumbs and remote captures through an [`ObservabilitySink`]
//! - Timing spans around asynchronous work
//! - Namespaced counters, gauges and distributions through a
//!   [`MetricsCapability`]
//! - Environment configuration and tracing subscriber setup
//!
//! # Example
//!
//! ```
//! use structured_logger::{Attributes, Environment, StructuredLogger};
//!
//! let logger = StructuredLogger::builder("API")
//!     .environment(Environment::Production)
//!     .build()
//!     .expect("non-empty context");
//!
//! logger.info("Fetching fact", Some(Attributes::new().with("method", "GET")));
//! logger.track_counter("api_calls.success", 1.0, None);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod console;
pub mod error;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod sink;
pub mod tracing_config;

pub use config::{Environment, LoggerConfig};
pub use console::{ConsoleOutput, TracingConsole};
pub use error::{LoggerError, MetricsError, SinkError};
pub use logger::{CANCELLED_REASON, CONTEXT_TAG, LoggerBuilder, StructuredLogger};
pub use metrics::{
    DistributionSummary, InMemoryMetrics, MetricTags, MetricUnit, MetricsCapability,
    MetricsSnapshot, NoopMetrics, SeriesKey, prometheus_name,
};
pub use record::{Attributes, ErrorSummary, ErrorValue, Level, LogRecord, ReportableError, Severity};
pub use sink::{
    Breadcrumb, CapturedException, CapturedMessage, ObservabilitySink, SpanDescriptor, SpanId,
    SpanStatus, Tags, TracingSink,
};
pub use tracing_config::{TracingConfig, init_tracing};
