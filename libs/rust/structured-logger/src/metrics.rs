//! Metrics capability and an in-process Prometheus registry.
//!
//! The logger talks to metrics through [`MetricsCapability`]. The default is
//! [`NoopMetrics`]. [`InMemoryMetrics`] registers counters, gauges and
//! histograms in a [`prometheus::Registry`] and renders them with the
//! Prometheus text encoder.

use crate::error::MetricsError;
use prometheus::core::Collector;
use prometheus::proto::MetricType;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Tags attached to a metric sample.
pub type MetricTags = BTreeMap<String, String>;

/// Unit of a distribution sample or measurement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum MetricUnit {
    /// Dimensionless
    #[default]
    None,
    /// Milliseconds
    Millisecond,
    /// Seconds
    Second,
    /// Bytes
    Byte,
    /// Characters
    Character,
    /// Any other unit name
    Custom(String),
}

impl MetricUnit {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Millisecond => "millisecond",
            Self::Second => "second",
            Self::Byte => "byte",
            Self::Character => "character",
            Self::Custom(unit) => unit,
        }
    }
}

impl fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend for counters, gauges and distributions.
///
/// Implementations may fail; callers must tolerate every error.
pub trait MetricsCapability: Send + Sync {
    /// Add `value` to an increment-only counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot record the sample.
    fn increment_counter(&self, name: &str, value: f64, tags: &MetricTags)
    -> Result<(), MetricsError>;

    /// Set a last-value gauge.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot record the sample.
    fn set_gauge(&self, name: &str, value: f64, tags: &MetricTags) -> Result<(), MetricsError>;

    /// Record one distribution sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot record the sample.
    fn record_distribution(
        &self,
        name: &str,
        value: f64,
        unit: &MetricUnit,
        tags: &MetricTags,
    ) -> Result<(), MetricsError>;
}

/// Metrics backend that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsCapability for NoopMetrics {
    fn increment_counter(&self, _: &str, _: f64, _: &MetricTags) -> Result<(), MetricsError> {
        Ok(())
    }

    fn set_gauge(&self, _: &str, _: f64, _: &MetricTags) -> Result<(), MetricsError> {
        Ok(())
    }

    fn record_distribution(
        &self,
        _: &str,
        _: f64,
        _: &MetricUnit,
        _: &MetricTags,
    ) -> Result<(), MetricsError> {
        Ok(())
    }
}


/// Rewrite a metric name into the Prometheus metric name alphabet.
///
/// Characters outside `[a-zA-Z0-9_:]` become `_`, so `api.calls` is
/// exported as `api_calls`.
#[must_use]
pub fn prometheus_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn label_name(key: &str) -> String {
    let mut out: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    // `__` prefixes are reserved for Prometheus internals.
    while out.starts_with("__") {
        out.remove(0);
    }
    out
}

fn sorted_labels(tags: &MetricTags) -> Result<Vec<(String, &str)>, MetricsError> {
    let mut labels: Vec<(String, &str)> = tags
        .iter()
        .map(|(k, v)| (label_name(k), v.as_str()))
        .collect();
    labels.sort_by(|a, b| a.0.cmp(&b.0));
    if let Some(pair) = labels.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(MetricsError::conflict(format!(
            "tags collide on label {}",
            pair[0].0
        )));
    }
    Ok(labels)
}

fn buckets(unit: &MetricUnit) -> Vec<f64> {
    match unit {
        MetricUnit::Millisecond => vec![
            5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
        ],
        MetricUnit::Second => prometheus::DEFAULT_BUCKETS.to_vec(),
        _ => vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0],
    }
}

/// Key of one exported time series: Prometheus name plus label set.
///
/// Empty tag values are dropped, matching Prometheus label semantics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesKey {
    /// Exported metric name
    pub name: String,
    /// Labels
    pub tags: MetricTags,
}

impl SeriesKey {
    /// Key under which `name` and `tags` are exported.
    #[must_use]
    pub fn new(name: &str, tags: &MetricTags) -> Self {
        Self {
            name: prometheus_name(name),
            tags: tags
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (label_name(k), v.clone()))
                .collect(),
        }
    }
}

/// Summary of one histogram series.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionSummary {
    /// Unit of the samples
    pub unit: MetricUnit,
    /// Number of samples
    pub count: u64,
    /// Sum of samples
    pub sum: f64,
    /// Upper bound and cumulative count of each bucket
    pub buckets: Vec<(f64, u64)>,
}

impl DistributionSummary {
    /// Mean of the samples, or zero when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Point-in-time view of an [`InMemoryMetrics`] registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// Counter totals
    pub counters: BTreeMap<SeriesKey, f64>,
    /// Gauge values
    pub gauges: BTreeMap<SeriesKey, f64>,
    /// Histogram summaries
    pub distributions: BTreeMap<SeriesKey, DistributionSummary>,
}

impl MetricsSnapshot {
    /// Counter total for `name` and `tags`, if recorded.
    #[must_use]
    pub fn counter(&self, name: &str, tags: &MetricTags) -> Option<f64> {
        self.counters.get(&SeriesKey::new(name, tags)).copied()
    }

    /// Gauge value for `name` and `tags`, if recorded.
    #[must_use]
    pub fn gauge(&self, name: &str, tags: &MetricTags) -> Option<f64> {
        self.gauges.get(&SeriesKey::new(name, tags)).copied()
    }

    /// Distribution summary for `name` and `tags`, if recorded.
    #[must_use]
    pub fn distribution(&self, name: &str, tags: &MetricTags) -> Option<&DistributionSummary> {
        self.distributions.get(&SeriesKey::new(name, tags))
    }
}

#[derive(Clone, Copy)]
enum Sample<'a> {
    Counter(f64),
    Gauge(f64),
    Histogram(f64, &'a MetricUnit),
}

impl Sample<'_> {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Counter(_) => "counter",
            Self::Gauge(_) => "gauge",
            Self::Histogram(..) => "histogram",
        }
    }
}

#[derive(Clone)]
enum FamilyVec {
    Counter(CounterVec),
    Gauge(GaugeVec),
    Histogram(HistogramVec, MetricUnit),
}

impl FamilyVec {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Counter(_) => "counter",
            Self::Gauge(_) => "gauge",
            Self::Histogram(..) => "histogram",
        }
    }

    fn collector(&self) -> Box<dyn Collector> {
        match self {
            Self::Counter(vec) => Box::new(vec.clone()),
            Self::Gauge(vec) => Box::new(vec.clone()),
            Self::Histogram(vec, _) => Box::new(vec.clone()),
        }
    }

    fn register(
        registry: &Registry,
        exported: &str,
        name: &str,
        labels: &[String],
        sample: Sample<'_>,
    ) -> Result<Self, MetricsError> {
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        let vec = match sample {
            Sample::Counter(_) => Self::Counter(CounterVec::new(
                Opts::new(exported, format!("Counter {name}")),
                &labels,
            )?),
            Sample::Gauge(_) => Self::Gauge(GaugeVec::new(
                Opts::new(exported, format!("Gauge {name}")),
                &labels,
            )?),
            Sample::Histogram(_, unit) => Self::Histogram(
                HistogramVec::new(
                    HistogramOpts::new(exported, format!("Distribution {name} in {unit}"))
                        .buckets(buckets(unit)),
                    &labels,
                )?,
                unit.clone(),
            ),
        };
        registry.register(vec.collector())?;
        Ok(vec)
    }
}

/// One registered metric name.
///
/// The first sample fixes the kind and label names. Later samples may omit
/// labels, which are exported empty, but may not add new ones.
struct Family {
    labels: Vec<String>,
    vec: FamilyVec,
}

impl Family {
    fn label_values<'a>(&self, labels: &[(String, &'a str)]) -> Option<Vec<&'a str>> {
        if labels.iter().any(|(k, _)| !self.labels.contains(k)) {
            return None;
        }
        Some(
            self.labels
                .iter()
                .map(|name| {
                    labels
                        .iter()
                        .find(|(k, _)| k == name)
                        .map_or("", |(_, v)| *v)
                })
                .collect(),
        )
    }
}

#[derive(Default)]
struct RegistryState {
    registry: Registry,
    families: HashMap<String, Family>,
}

/// In-process Prometheus registry.
///
/// Metric names are exported through [`prometheus_name`], tags become labels.
#[derive(Default)]
pub struct InMemoryMetrics {
    state: Mutex<RegistryState>,
}

impl fmt::Debug for InMemoryMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryMetrics").finish_non_exhaustive()
    }
}

impl InMemoryMetrics {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, RegistryState>, MetricsError> {
        self.state.lock().map_err(|_| MetricsError::Poisoned)
    }

    fn record(&self, name: &str, tags: &MetricTags, sample: Sample<'_>) -> Result<(), MetricsError> {
        let exported = prometheus_name(name);
        let labels = sorted_labels(tags)?;

        let mut guard = self.lock()?;
        let RegistryState { registry, families } = &mut *guard;

        let family = match families.entry(exported.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let names: Vec<String> = labels.iter().map(|(k, _)| k.clone()).collect();
                let vec = FamilyVec::register(registry, &exported, name, &names, sample)?;
                entry.insert(Family { labels: names, vec })
            }
        };

        let values = family.label_values(&labels).ok_or_else(|| {
            MetricsError::conflict(format!(
                "tags of {name} do not fit the labels {:?} of {exported}",
                family.labels
            ))
        })?;

        match (&family.vec, sample) {
            (FamilyVec::Counter(vec), Sample::Counter(value)) => {
                vec.with_label_values(&values).inc_by(value);
            }
            (FamilyVec::Gauge(vec), Sample::Gauge(value)) => {
                vec.with_label_values(&values).set(value);
            }
            (FamilyVec::Histogram(vec, unit), Sample::Histogram(value, sample_unit))
                if unit == sample_unit =>
            {
                vec.with_label_values(&values).observe(value);
            }
            (FamilyVec::Histogram(_, unit), Sample::Histogram(_, sample_unit)) => {
                return Err(MetricsError::conflict(format!(
                    "{exported} is recorded in {unit}, not {sample_unit}"
                )));
            }
            (vec, sample) => {
                return Err(MetricsError::conflict(format!(
                    "{exported} is registered as a {}, not a {}",
                    vec.kind(),
                    sample.kind()
                )));
            }
        }
        Ok(())
    }

    /// Read every exported series.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Poisoned`] if a writer panicked.
    pub fn snapshot(&self) -> Result<MetricsSnapshot, MetricsError> {
        let guard = self.lock()?;
        let mut snapshot = MetricsSnapshot::default();

        for family in guard.registry.gather() {
            let name = family.get_name();
            let unit = match guard.families.get(name).map(|f| &f.vec) {
                Some(FamilyVec::Histogram(_, unit)) => unit.clone(),
                _ => MetricUnit::None,
            };

            for metric in family.get_metric() {
                let key = SeriesKey {
                    name: name.to_string(),
                    tags: metric
                        .get_label()
                        .iter()
                        .filter(|label| !label.get_value().is_empty())
                        .map(|label| (label.get_name().to_string(), label.get_value().to_string()))
                        .collect(),
                };

                match family.get_field_type() {
                    MetricType::COUNTER => {
                        snapshot.counters.insert(key, metric.get_counter().get_value());
                    }
                    MetricType::GAUGE => {
                        snapshot.gauges.insert(key, metric.get_gauge().get_value());
                    }
                    MetricType::HISTOGRAM => {
                        let histogram = metric.get_histogram();
                        snapshot.distributions.insert(
                            key,
                            DistributionSummary {
                                unit: unit.clone(),
                                count: histogram.get_sample_count(),
                                sum: histogram.get_sample_sum(),
                                buckets: histogram
                                    .get_bucket()
                                    .iter()
                                    .map(|b| (b.get_upper_bound(), b.get_cumulative_count()))
                                    .collect(),
                            },
                        );
                    }
                    _ => {}
                }
            }
        }

        Ok(snapshot)
    }

    /// Drop every registered metric.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Poisoned`] if a writer panicked.
    pub fn reset(&self) -> Result<(), MetricsError> {
        *self.lock()? = RegistryState::default();
        Ok(())
    }

    /// Encode all metrics in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Poisoned`] if a writer panicked, or
    /// [`MetricsError::Backend`] if encoding fails.
    pub fn to_prometheus(&self) -> Result<String, MetricsError> {
        let families = self.lock()?.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| MetricsError::backend(e.to_string()))
    }
}

impl MetricsCapability for InMemoryMetrics {
    fn increment_counter(
        &self,
        name: &str,
        value: f64,
        tags: &MetricTags,
    ) -> Result<(), MetricsError> {
        if !value.is_finite() || value < 0.0 {
            return Err(MetricsError::invalid_value(name, value));
        }
        self.record(name, tags, Sample::Counter(value))
    }

    fn set_gauge(&self, name: &str, value: f64, tags: &MetricTags) -> Result<(), MetricsError> {
        if !value.is_finite() {
            return Err(MetricsError::invalid_value(name, value));
        }
        self.record(name, tags, Sample::Gauge(value))
    }

    fn record_distribution(
        &self,
        name: &str,
        value: f64,
        unit: &MetricUnit,
        tags: &MetricTags,
    ) -> Result<(), MetricsError> {
        if !value.is_finite() {
            return Err(MetricsError::invalid_value(name, value));
        }
        self.record(name, tags, Sample::Histogram(value, unit))
    }
}
