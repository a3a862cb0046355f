//! Builder for constructing Scheduler instances.

use crate::core::scheduler::DEFAULT_INTERVAL;
use crate::core::{ChangeTracker, PollerSettings, Scheduler};
use crate::diff::Differ;
use crate::error::{Result, SchedulerError};
use crate::sources::{Fetcher, Resource};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use crate::metrics::PollerMetrics;

/// Builder for constructing a [`Scheduler`].
///
/// Every option has a default: a 60 second interval, no resources, the HTTP
/// fetcher (with the `http` feature) and a fresh [`ChangeTracker`].
///
/// # Examples
///
/// ```rust,no_run
/// use pollwatch::prelude::*;
/// use pollwatch::sources::RequestSpec;
/// use std::time::Duration;
///
/// # fn example() -> Result<()> {
/// let scheduler = Scheduler::builder()
///     .with_interval(Duration::from_secs(30))
///     .with_resource("https://example.com/status")
///     .with_resource(RequestSpec::new("https://example.com/private").with_auth_token("secret"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SchedulerBuilder {
    interval: Duration,
    resources: Vec<Resource>,
    fetcher: Option<Arc<dyn Fetcher>>,
    tracker: Option<ChangeTracker>,
    #[cfg(feature = "metrics")]
    metrics: Option<PollerMetrics>,
}

impl SchedulerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            resources: Vec::new(),
            fetcher: None,
            tracker: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Create a builder pre-filled from loaded settings.
    pub fn from_settings(settings: PollerSettings) -> Self {
        Self::new()
            .with_interval(settings.interval())
            .with_resources(settings.resources)
    }

    /// Set the poll period.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Append a resource to poll.
    pub fn with_resource(mut self, resource: impl Into<Resource>) -> Self {
        self.resources.push(resource.into());
        self
    }

    /// Append several resources, keeping their order.
    pub fn with_resources<I, R>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Resource>,
    {
        self.resources.extend(resources.into_iter().map(Into::into));
        self
    }

    /// Use a custom fetcher instead of the HTTP one.
    pub fn with_fetcher<F: Fetcher + 'static>(mut self, fetcher: F) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Use a fetcher shared with other schedulers.
    pub fn with_shared_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Use an explicitly constructed tracker, e.g. one seeded with snapshots.
    pub fn with_tracker(mut self, tracker: ChangeTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Use a fresh tracker with a custom diff implementation.
    pub fn with_differ<D: Differ + 'static>(mut self, differ: D) -> Self {
        self.tracker = Some(ChangeTracker::with_differ(differ));
        self
    }

    /// Record OpenTelemetry metrics for every cycle and fetch.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(PollerMetrics::new(meter));
        self
    }

    /// Build the scheduler. The scheduler starts idle.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The interval is zero
    /// - No fetcher was given and the default HTTP fetcher cannot be
    ///   constructed (or the `http` feature is disabled)
    pub fn build(self) -> Result<Scheduler> {
        if self.interval.is_zero() {
            return Err(SchedulerError::InvalidInterval);
        }

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => default_fetcher()?,
        };

        Ok(Scheduler::from_parts(
            self.interval,
            self.resources,
            fetcher,
            self.tracker.unwrap_or_default(),
            #[cfg(feature = "metrics")]
            self.metrics,
        ))
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
fn default_fetcher() -> Result<Arc<dyn Fetcher>> {
    Ok(Arc::new(crate::sources::HttpFetcher::new()?))
}

#[cfg(not(feature = "http"))]
fn default_fetcher() -> Result<Arc<dyn Fetcher>> {
    Err(SchedulerError::MissingFetcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{RequestSpec, fetch_fn};

    fn noop_fetcher() -> impl Fetcher {
        fetch_fn(|_: Resource| async { Ok(String::new()) })
    }

    #[test]
    fn test_defaults() {
        let builder = SchedulerBuilder::new();
        assert_eq!(builder.interval, Duration::from_millis(60_000));
        assert!(builder.resources.is_empty());
        assert!(builder.fetcher.is_none());
        assert!(builder.tracker.is_none());
    }

    #[test]
    fn test_builder_accumulates_resources() {
        let builder = SchedulerBuilder::new()
            .with_resource("a")
            .with_resources(["b", "c"])
            .with_resource(RequestSpec::new("d"));

        let urls: Vec<&str> = builder.resources.iter().map(Resource::url).collect();
        assert_eq!(urls, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_build_with_fetcher() {
        let scheduler = SchedulerBuilder::new()
            .with_interval(Duration::from_secs(1))
            .with_resource("a")
            .with_fetcher(noop_fetcher())
            .build()
            .unwrap();

        assert_eq!(scheduler.interval(), Duration::from_secs(1));
        assert_eq!(scheduler.resources().len(), 1);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let result = SchedulerBuilder::new()
            .with_interval(Duration::ZERO)
            .with_resource("a")
            .with_fetcher(noop_fetcher())
            .build();
        assert!(matches!(result, Err(SchedulerError::InvalidInterval)));
    }

    #[test]
    fn test_seeded_tracker() {
        let mut tracker = ChangeTracker::new();
        tracker.insert(Resource::from("a"), "previous");

        let scheduler = SchedulerBuilder::new()
            .with_resource("a")
            .with_fetcher(noop_fetcher())
            .with_tracker(tracker)
            .build()
            .unwrap();

        assert!(scheduler.tracker().has(&Resource::from("a")));
    }

    #[test]
    fn test_from_settings() {
        let settings = PollerSettings {
            interval_ms: 2500,
            resources: vec![Resource::from("x"), Resource::from(RequestSpec::new("y"))],
        };

        let builder = SchedulerBuilder::from_settings(settings);
        assert_eq!(builder.interval, Duration::from_millis(2500));
        assert_eq!(builder.resources.len(), 2);
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_default_fetcher_is_http() {
        assert!(SchedulerBuilder::new().with_resource("a").build().is_ok());
    }
}
