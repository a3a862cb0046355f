//! Polling metrics tracking using OpenTelemetry.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use std::time::Instant;

/// Metrics collector for fetch cycles.
///
/// Every per-resource measurement carries a `url` attribute.
///
/// # Examples
///
/// ```rust,no_run
/// use pollwatch::metrics::PollerMetrics;
/// use opentelemetry::global;
///
/// let metrics = PollerMetrics::new(global::meter("pollwatch"));
///
/// let timer = metrics.start_fetch("https://example.com");
/// // ... perform fetch ...
/// metrics.record_fetch_success("https://example.com", timer);
/// ```
#[derive(Clone)]
pub struct PollerMetrics {
    cycles: Counter<u64>,
    fetch_attempts: Counter<u64>,
    fetch_failures: Counter<u64>,
    fetch_duration: Histogram<f64>,
    changes: Counter<u64>,
}

impl PollerMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let cycles = meter
            .u64_counter("pollwatch.cycles")
            .with_description("Number of fetch cycles started")
            .build();

        let fetch_attempts = meter
            .u64_counter("pollwatch.fetch.attempts")
            .with_description("Total number of fetch attempts")
            .build();

        let fetch_failures = meter
            .u64_counter("pollwatch.fetch.failures")
            .with_description("Number of failed fetches")
            .build();

        let fetch_duration = meter
            .f64_histogram("pollwatch.fetch.duration")
            .with_description("Duration of fetches in seconds")
            .with_unit("s")
            .build();

        let changes = meter
            .u64_counter("pollwatch.changes")
            .with_description("Number of change events emitted")
            .build();

        Self {
            cycles,
            fetch_attempts,
            fetch_failures,
            fetch_duration,
            changes,
        }
    }

    /// Record the start of a fetch cycle.
    pub fn record_cycle(&self) {
        self.cycles.add(1, &[]);
    }

    /// Start a fetch timer.
    ///
    /// Returns an `Instant` that should be passed to `record_fetch_success` or
    /// `record_fetch_failure` when the fetch completes.
    pub fn start_fetch(&self, url: &str) -> Instant {
        self.fetch_attempts.add(1, &[url_attribute(url)]);
        Instant::now()
    }

    /// Record a successful fetch.
    pub fn record_fetch_success(&self, url: &str, start: Instant) {
        self.fetch_duration
            .record(start.elapsed().as_secs_f64(), &[url_attribute(url)]);
    }

    /// Record a failed fetch.
    pub fn record_fetch_failure(&self, url: &str, start: Instant) {
        let attributes = [url_attribute(url)];
        self.fetch_failures.add(1, &attributes);
        self.fetch_duration
            .record(start.elapsed().as_secs_f64(), &attributes);
    }

    /// Record an emitted change event.
    pub fn record_change(&self, url: &str) {
        self.changes.add(1, &[url_attribute(url)]);
    }
}

fn url_attribute(url: &str) -> KeyValue {
    KeyValue::new("url", url.to_string())
}
