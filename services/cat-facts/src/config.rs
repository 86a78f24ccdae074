//! Configuration for the cat-facts service.
//!
//! All configuration is loaded from environment variables and validated
//! at startup.

use crate::error::ServiceError;
use crate::http::HttpConfig;
use std::env;
use std::time::Duration;
use url::Url;

/// Default fact API endpoint.
pub const DEFAULT_FACT_API_URL: &str = "https://catfact.ninja/fact";

/// Artificial latency added to a share of requests for performance testing.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyInjection {
    /// Probability in `[0, 1]` that a request is delayed
    pub rate: f64,
    /// Shortest injected delay
    pub min: Duration,
    /// Longest injected delay
    pub max: Duration,
}

impl Default for LatencyInjection {
    fn default() -> Self {
        Self {
            rate: 0.0,
            min: Duration::from_millis(1000),
            max: Duration::from_millis(5000),
        }
    }
}

impl LatencyInjection {
    /// Never delay.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Check the rate and bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate is outside `[0, 1]` or `min > max`.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if !(0.0..=1.0).contains(&self.rate) {
            return Err(ServiceError::config(format!(
                "LATENCY_INJECTION_RATE must be within [0, 1], got {}",
                self.rate
            )));
        }
        if self.min > self.max {
            return Err(ServiceError::config(format!(
                "LATENCY_MIN_MS ({}) exceeds LATENCY_MAX_MS ({})",
                self.min.as_millis(),
                self.max.as_millis()
            )));
        }
        Ok(())
    }
}

/// cat-facts service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Fact API endpoint
    pub fact_api_url: Url,
    /// HTTP client settings
    pub http: HttpConfig,
    /// Artificial latency settings
    pub latency: LatencyInjection,
    /// Print the metrics registry after rendering
    pub print_metrics: bool,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is present but invalid.
    pub fn from_env() -> Result<Self, ServiceError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServiceError> {
        let raw_url = lookup("FACT_API_URL").unwrap_or_else(|| DEFAULT_FACT_API_URL.to_string());
        let fact_api_url = Url::parse(&raw_url)
            .map_err(|e| ServiceError::config(format!("Invalid FACT_API_URL: {e}")))?;

        let timeout = Duration::from_secs(parse_var(&lookup, "FACT_TIMEOUT_SECS", 10)?);
        let http = HttpConfig::default().with_timeout(timeout);

        let latency = LatencyInjection {
            rate: parse_var(&lookup, "LATENCY_INJECTION_RATE", 0.0)?,
            min: Duration::from_millis(parse_var(&lookup, "LATENCY_MIN_MS", 1000)?),
            max: Duration::from_millis(parse_var(&lookup, "LATENCY_MAX_MS", 5000)?),
        };
        latency.validate()?;

        Ok(Self {
            fact_api_url,
            http,
            latency,
            print_metrics: parse_var(&lookup, "PRINT_METRICS", false)?,
        })
    }

    /// Configuration pointing at a custom endpoint with defaults elsewhere.
    #[must_use]
    pub fn for_url(fact_api_url: Url) -> Self {
        Self {
            fact_api_url,
            http: HttpConfig::default(),
            latency: LatencyInjection::disabled(),
            print_metrics: false,
        }
    }

    /// Set artificial latency.
    #[must_use]
    pub fn with_latency(mut self, latency: LatencyInjection) -> Self {
        self.latency = latency;
        self
    }
}

/// Parse a variable with a default value.
fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ServiceError>
where
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| ServiceError::config(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}
