//! Shared test utilities for the structured logger workspace.
//!
//! This crate provides:
//! - Proptest generators for records, attributes and metrics
//! - Recording and failing console, sink and metrics collaborators
//! - Test fixtures with sample errors and fact payloads

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
pub use mocks::{
    Event, FailingMetrics, FailingSink, Journal, MetricKind, MetricSample, RecordingConsole,
    RecordingMetrics, RecordingSink,
};
