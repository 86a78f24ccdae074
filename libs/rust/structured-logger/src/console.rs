//! Local console output for log records.

use crate::record::{Level, LogRecord};
use tracing::{debug, error, info, warn};

/// Destination for formatted log lines.
///
/// Writing must not fail in a way the caller can observe.
pub trait ConsoleOutput: Send + Sync {
    /// Write one record.
    fn write(&self, record: &LogRecord);
}

/// Console that forwards records to the installed `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConsole;

impl TracingConsole {
    /// Create a tracing console.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ConsoleOutput for TracingConsole {
    fn write(&self, record: &LogRecord) {
        let line = record.prefixed_message();
        let attributes = if record.attributes.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&record.attributes).unwrap_or_default()
        };

        match record.level {
            Level::Debug => debug!(context = %record.context, attributes = %attributes, "{}", line),
            Level::Info => info!(context = %record.context, attributes = %attributes, "{}", line),
            Level::Warn => warn!(context = %record.context, attributes = %attributes, "{}", line),
            Level::Error => error!(context = %record.context, attributes = %attributes, "{}", line),
        }
    }
}
