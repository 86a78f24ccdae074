//! Fact API client instrumented with the structured logger.

use crate::config::{LatencyInjection, ServiceConfig};
use crate::error::{FactError, ServiceError};
use crate::http::build_http_client;
use rand::Rng;
use reqwest::header::{CACHE_CONTROL, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::time::{Duration, Instant};
use structured_logger::{Attributes, ErrorValue, MetricTags, MetricUnit, StructuredLogger};

/// Span name used around every fetch.
pub const FETCH_SPAN: &str = "fetch-cat-fact";

/// Span operation used around every fetch.
pub const FETCH_OPERATION: &str = "http.client";

/// Text shown when no fact could be fetched.
pub const FALLBACK_FACT: &str = "Failed to load cat fact. Please refresh the page to try again.";

/// Facts longer than this are tagged `long`.
pub const LONG_FACT_THRESHOLD: u32 = 100;

const PREVIEW_CHARS: usize = 50;

/// A fact as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatFact {
    /// Fact text
    pub fact: String,
    /// Length reported by the API
    pub length: u32,
}

impl CatFact {
    /// `long` or `short` depending on the reported length.
    #[must_use]
    pub const fn length_category(&self) -> &'static str {
        if self.length > LONG_FACT_THRESHOLD {
            "long"
        } else {
            "short"
        }
    }

    /// First characters of the fact followed by an ellipsis.
    #[must_use]
    pub fn preview(&self) -> String {
        let mut preview: String = self.fact.chars().take(PREVIEW_CHARS).collect();
        preview.push_str("...");
        preview
    }
}

/// Client for the fact API.
#[derive(Debug, Clone)]
pub struct FactClient {
    http: reqwest::Client,
    config: ServiceConfig,
    logger: StructuredLogger,
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn millis_f64(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

fn tags<const N: usize>(pairs: [(&str, String); N]) -> MetricTags {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Pick the artificial delay for one request, if any.
///
/// Kept synchronous so the thread-local RNG is never held across an await.
fn injected_delay(latency: &LatencyInjection) -> Option<Duration> {
    if latency.rate.is_nan() || latency.rate <= 0.0 {
        return None;
    }

    let mut rng = rand::thread_rng();
    if !rng.gen_bool(latency.rate.min(1.0)) {
        return None;
    }

    let (low, high) = if latency.min <= latency.max {
        (millis(latency.min), millis(latency.max))
    } else {
        (millis(latency.max), millis(latency.min))
    };
    Some(Duration::from_millis(rng.gen_range(low..=high)))
}

impl FactClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ServiceConfig, logger: StructuredLogger) -> Result<Self, ServiceError> {
        let http = build_http_client(&config.http)?;
        Ok(Self {
            http,
            config,
            logger,
        })
    }

    /// The logger used for every fetch.
    #[must_use]
    pub const fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        self.config.fact_api_url.path().to_string()
    }

    fn api_host(&self) -> String {
        self.config
            .fact_api_url
            .host_str()
            .unwrap_or_default()
            .to_string()
    }

    /// Fetch one fact inside a `fetch-cat-fact` span.
    ///
    /// # Errors
    ///
    /// Returns the transport, status or decode failure unchanged.
    pub async fn fetch_fact(&self) -> Result<CatFact, FactError> {
        self.logger
            .start_span(FETCH_SPAN, FETCH_OPERATION, || self.request_fact())
            .await
    }

    /// Fetch one fact, answering with [`FALLBACK_FACT`] on any failure.
    ///
    /// The failure is logged and counted as `api_calls.exception` and the
    /// span itself completes normally.
    pub async fn fetch_fact_or_fallback(&self) -> String {
        let outcome: Result<String, Infallible> = self
            .logger
            .start_span(FETCH_SPAN, FETCH_OPERATION, || async {
                let started = Instant::now();
                match self.request_fact().await {
                    Ok(fact) => Ok(fact.fact),
                    Err(e) => {
                        self.record_exception(&e, started.elapsed());
                        Ok(FALLBACK_FACT.to_string())
                    }
                }
            })
            .await;

        match outcome {
            Ok(text) => text,
            Err(never) => match never {},
        }
    }

    fn record_exception(&self, error: &FactError, elapsed: Duration) {
        self.logger.error(
            "Exception during cat fact fetch",
            Some(ErrorValue::from_error(error)),
            Some(
                Attributes::new()
                    .with("duration", format!("{}ms", millis(elapsed)))
                    .with("url", self.config.fact_api_url.as_str()),
            ),
        );
        self.logger.increment(
            "api_calls.exception",
            Some(tags([
                ("endpoint", self.endpoint()),
                ("error_type", error.kind().to_string()),
            ])),
        );
    }

    async fn request_fact(&self) -> Result<CatFact, FactError> {
        let started = Instant::now();
        let url = self.config.fact_api_url.clone();

        self.logger.info(
            "Fetching new cat fact from API",
            Some(
                Attributes::new()
                    .with("url", url.as_str())
                    .with("method", "GET"),
            ),
        );

        let response = self
            .http
            .get(url)
            .header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
            .send()
            .await?;

        if let Some(delay) = injected_delay(&self.config.latency) {
            self.logger.warn(
                "Introducing artificial latency for performance testing",
                Some(
                    Attributes::new()
                        .with("delay_ms", millis(delay))
                        .with("delay_seconds", format!("{:.2}", delay.as_secs_f64())),
                ),
            );
            tokio::time::sleep(delay).await;
        }

        let elapsed = started.elapsed();
        let status = response.status();

        if !status.is_success() {
            let error = FactError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            };
            self.record_failure(&error, elapsed);
            return Err(error);
        }

        let body = response.text().await?;
        let fact: CatFact = serde_json::from_str(&body)?;
        self.record_success(&fact, elapsed);
        Ok(fact)
    }

    fn record_failure(&self, error: &FactError, elapsed: Duration) {
        let (status, status_text) = match error {
            FactError::Status {
                status,
                status_text,
            } => (*status, status_text.as_str()),
            _ => (0, ""),
        };

        self.logger.error_with_tags(
            "API request failed",
            Some(ErrorValue::from_error(error)),
            Some(
                Attributes::new()
                    .with("status", status)
                    .with("status_text", status_text)
                    .with("duration", format!("{}ms", millis(elapsed)))
                    .with(
                        "response",
                        json!({
                            "status": status,
                            "status_text": status_text,
                            "duration": millis(elapsed),
                        }),
                    ),
            ),
            tags([
                ("api", self.api_host()),
                ("endpoint", self.endpoint()),
                ("status_code", status.to_string()),
            ]),
        );
        self.logger.increment(
            "api_calls.failed",
            Some(tags([
                ("endpoint", self.endpoint()),
                ("status_code", status.to_string()),
                ("api", self.api_host()),
            ])),
        );
        self.logger.track_distribution(
            "failed_request_duration",
            millis_f64(elapsed),
            Some(MetricUnit::Millisecond),
            Some(tags([("status_code", status.to_string())])),
        );
    }

    fn record_success(&self, fact: &CatFact, elapsed: Duration) {
        let length = f64::from(fact.length);
        let category = fact.length_category();

        self.logger.info(
            "Successfully fetched cat fact",
            Some(
                Attributes::new()
                    .with("fact_length", fact.length)
                    .with("duration", format!("{}ms", millis(elapsed)))
                    .with("fact_preview", fact.preview()),
            ),
        );

        self.logger
            .set_measurement("api_response_time", millis_f64(elapsed), MetricUnit::Millisecond);
        self.logger
            .set_measurement("fact_length", length, MetricUnit::Character);
        self.logger.set_tag("cat_fact_length", category);

        self.logger.track_distribution(
            "response_time",
            millis_f64(elapsed),
            Some(MetricUnit::Millisecond),
            Some(tags([
                ("endpoint", self.endpoint()),
                ("status", "success".to_string()),
            ])),
        );
        self.logger.track_distribution(
            "fact_length",
            length,
            Some(MetricUnit::Character),
            Some(tags([("category", category.to_string())])),
        );
        self.logger.increment(
            "api_calls.success",
            Some(tags([
                ("endpoint", self.endpoint()),
                ("api", self.api_host()),
            ])),
        );
        self.logger.track_gauge(
            "current_fact_length",
            length,
            Some(tags([("endpoint", self.endpoint())])),
        );
    }
}
