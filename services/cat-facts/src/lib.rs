//! cat-facts service.
//!
//! Fetches a random cat fact over HTTP and renders it, reporting every step
//! through a [`structured_logger::StructuredLogger`] bound to the `API`
//! context.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod page;

pub use client::{CatFact, FALLBACK_FACT, FactClient};
pub use config::{LatencyInjection, ServiceConfig};
pub use error::{FactError, ServiceError};
pub use http::{HttpConfig, build_http_client};
pub use page::{HomePage, render_home};

/// Context label of the service logger.
pub const LOGGER_CONTEXT: &str = "API";
