//! The polling scheduler: lifecycle, fetch cycles and event emission.

use crate::core::{ChangeTracker, SchedulerBuilder};
use crate::error::{Result, SchedulerError};
use crate::notify::{ChangeEvent, ErrorEvent, EventStream, SubscriberRegistry, SubscriptionHandle};
use crate::sources::{Fetcher, Resource};
use arc_swap::ArcSwap;
use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

#[cfg(feature = "metrics")]
use crate::metrics::PollerMetrics;

/// Default poll period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(60_000);

/// Observable lifecycle state of a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Never started, or stopped.
    Idle,
    /// Started and the timer is armed.
    Running,
    /// Started, timer cancelled.
    Paused,
}

/// Periodically fetches a list of resources and reports what changed.
///
/// `start()` runs one fetch cycle immediately and then one every `interval`.
/// Each cycle fetches every resource concurrently; a successful fetch is fed
/// through the [`ChangeTracker`] and produces a [`ChangeEvent`] if it is the
/// resource's first observation or its diff adds or removes lines. A failed
/// fetch produces an [`ErrorEvent`]. Resources never affect each other.
///
/// Must be started from within a Tokio runtime. Cloning yields another
/// handle to the same scheduler.
///
/// # Examples
///
/// ```rust,no_run
/// use pollwatch::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<()> {
/// let scheduler = Scheduler::builder()
///     .with_interval(Duration::from_secs(30))
///     .with_resource("https://example.com/status")
///     .build()?;
///
/// let mut changes = scheduler.change_stream();
/// scheduler.start()?;
///
/// while let Some(event) = changes.recv().await {
///     println!("{} changed (+{} -{})", event.url, event.diff.added_lines(), event.diff.removed_lines());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Shared>,
}

struct Shared {
    interval: Duration,
    resources: ArcSwap<Vec<Resource>>,
    fetcher: Arc<dyn Fetcher>,
    tracker: Mutex<ChangeTracker>,
    changes: SubscriberRegistry<ChangeEvent>,
    errors: SubscriberRegistry<ErrorEvent>,
    lifecycle: Mutex<Lifecycle>,
    #[cfg(feature = "metrics")]
    metrics: Option<PollerMetrics>,
}

/// Invariant: `timer.is_some() == (has_started && !is_paused)`.
#[derive(Default)]
struct Lifecycle {
    has_started: bool,
    is_paused: bool,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every arm so a cancelled timer task can tell it is stale.
    generation: u64,
}

impl Lifecycle {
    fn is_running(&self) -> bool {
        self.has_started && !self.is_paused
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.is_paused = true;
    }
}

impl Scheduler {
    /// Create a new builder for constructing a scheduler.
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub(crate) fn from_parts(
        interval: Duration,
        resources: Vec<Resource>,
        fetcher: Arc<dyn Fetcher>,
        tracker: ChangeTracker,
        #[cfg(feature = "metrics")] metrics: Option<PollerMetrics>,
    ) -> Self {
        Self {
            inner: Arc::new(Shared {
                interval,
                resources: ArcSwap::from_pointee(resources),
                fetcher,
                tracker: Mutex::new(tracker),
                changes: SubscriberRegistry::new(),
                errors: SubscriberRegistry::new(),
                lifecycle: Mutex::new(Lifecycle::default()),
                #[cfg(feature = "metrics")]
                metrics,
            }),
        }
    }

    /// Start polling.
    ///
    /// Runs a fetch cycle immediately, then arms a timer that runs one every
    /// `interval`. Also valid from the paused state, where it re-arms.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::AlreadyRunning`] if the scheduler is running
    /// - [`SchedulerError::EmptyResourceList`] if there is nothing to poll
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.inner.lifecycle.lock();
        self.start_locked(&mut lifecycle)
    }

    fn start_locked(&self, lifecycle: &mut Lifecycle) -> Result<()> {
        if lifecycle.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let resources = self.inner.resources.load_full();
        if resources.is_empty() {
            return Err(SchedulerError::EmptyResourceList);
        }

        lifecycle.has_started = true;
        lifecycle.is_paused = false;
        lifecycle.generation += 1;

        info!(
            resources = resources.len(),
            interval_ms = self.inner.interval.as_millis() as u64,
            "scheduler started"
        );

        Shared::fan_out(&self.inner, &resources);
        lifecycle.timer = Some(Shared::arm_timer(&self.inner, lifecycle.generation));
        Ok(())
    }

    /// Cancel the timer. In-flight fetches still complete and publish.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NotStarted`] if `start()` was never called
    /// (or the scheduler was stopped).
    pub fn pause(&self) -> Result<()> {
        let mut lifecycle = self.inner.lifecycle.lock();
        if !lifecycle.has_started {
            return Err(SchedulerError::NotStarted);
        }

        lifecycle.disarm();
        info!("scheduler paused");
        Ok(())
    }

    /// Resume after a pause: runs a cycle immediately and re-arms the timer.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::NotStarted`] if `start()` was never called
    /// - any error `start()` can return
    pub fn resume(&self) -> Result<()> {
        let mut lifecycle = self.inner.lifecycle.lock();
        if !lifecycle.has_started {
            return Err(SchedulerError::NotStarted);
        }

        self.start_locked(&mut lifecycle)
    }

    /// Cancel the timer, forget every snapshot and return to the idle state.
    ///
    /// After `stop()`, `start()` treats every resource as never observed.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NotStarted`] if `start()` was never called
    /// (or the scheduler was already stopped).
    pub fn stop(&self) -> Result<()> {
        let mut lifecycle = self.inner.lifecycle.lock();
        if !lifecycle.has_started {
            return Err(SchedulerError::NotStarted);
        }

        lifecycle.disarm();
        lifecycle.is_paused = false;
        lifecycle.has_started = false;
        self.inner.tracker.lock().clear();

        info!("scheduler stopped, snapshots cleared");
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        let lifecycle = self.inner.lifecycle.lock();
        match (lifecycle.has_started, lifecycle.is_paused) {
            (false, _) => SchedulerState::Idle,
            (true, false) => SchedulerState::Running,
            (true, true) => SchedulerState::Paused,
        }
    }

    /// The poll period.
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// The resources the next cycle will fetch.
    pub fn resources(&self) -> Arc<Vec<Resource>> {
        self.inner.resources.load_full()
    }

    /// Replace the resource list.
    ///
    /// Takes effect from the next cycle. If a timer tick finds the list
    /// empty, the scheduler pauses itself instead of fetching.
    pub fn set_resources<I, R>(&self, resources: I)
    where
        I: IntoIterator<Item = R>,
        R: Into<Resource>,
    {
        let resources: Vec<Resource> = resources.into_iter().map(Into::into).collect();
        debug!(resources = resources.len(), "resource list replaced");
        self.inner.resources.store(Arc::new(resources));
    }

    /// Lock and borrow the change tracker.
    ///
    /// Fetch completions wait while the guard is held.
    pub fn tracker(&self) -> MutexGuard<'_, ChangeTracker> {
        self.inner.tracker.lock()
    }

    /// Subscribe to change events.
    pub fn on_change<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.inner.changes.subscribe(callback)
    }

    /// Subscribe to fetch error events.
    pub fn on_error<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ErrorEvent) + Send + Sync + 'static,
    {
        self.inner.errors.subscribe(callback)
    }

    /// Receive change events through a channel.
    pub fn change_stream(&self) -> EventStream<ChangeEvent> {
        self.inner.changes.subscribe_channel()
    }

    /// Receive fetch error events through a channel.
    pub fn error_stream(&self) -> EventStream<ErrorEvent> {
        self.inner.errors.subscribe_channel()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("interval", &self.inner.interval)
            .field("resources", &self.inner.resources.load().len())
            .field("state", &self.state())
            .finish()
    }
}

impl Shared {
    /// Spawn the repeating timer. It holds only a weak reference, so dropping
    /// every `Scheduler` handle ends it.
    fn arm_timer(this: &Arc<Self>, generation: u64) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(this);
        let period = this.interval;

        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                if !Self::tick(&shared, generation) {
                    break;
                }
            }
        })
    }

    /// One timer-driven cycle. Returns `false` when the timer should exit.
    fn tick(this: &Arc<Self>, generation: u64) -> bool {
        let mut lifecycle = this.lifecycle.lock();
        if lifecycle.generation != generation || !lifecycle.is_running() {
            return false;
        }

        let resources = this.resources.load_full();
        if resources.is_empty() {
            warn!("resource list is empty, pausing scheduler");
            // Dropping the handle detaches this task, which exits below.
            lifecycle.timer = None;
            lifecycle.is_paused = true;
            return false;
        }

        Self::fan_out(this, &resources);
        true
    }

    /// Spawn one independent fetch task per resource.
    fn fan_out(this: &Arc<Self>, resources: &[Resource]) {
        debug!(resources = resources.len(), "starting fetch cycle");

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &this.metrics {
            metrics.record_cycle();
        }

        for resource in resources.iter().cloned() {
            let shared = Arc::clone(this);
            tokio::spawn(async move { shared.poll_resource(resource).await });
        }
    }

    async fn poll_resource(&self, resource: Resource) {
        let url = resource.url().to_string();

        #[cfg(feature = "metrics")]
        let timer = self.metrics.as_ref().map(|m| m.start_fetch(&url));

        let outcome = self.fetcher.fetch(&resource).await;

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            match &outcome {
                Ok(_) => metrics.record_fetch_success(&url, timer),
                Err(_) => metrics.record_fetch_failure(&url, timer),
            }
        }

        match outcome {
            Ok(body) => self.handle_body(resource, url, body),
            Err(error) => {
                warn!(url = %url, error = %error, "fetch failed");
                self.errors.notify_all(&ErrorEvent {
                    resource,
                    url,
                    error: Arc::new(error),
                    observed_at: Utc::now(),
                });
            }
        }
    }

    /// The diff runs with the tracker lock released. Overlapping fetches of
    /// one resource are last-writer-wins.
    fn handle_body(&self, resource: Resource, url: String, body: String) {
        let (previous, differ) = {
            let tracker = self.tracker.lock();
            (tracker.snapshot(&resource), tracker.differ())
        };

        let is_initial_diff = previous.is_none();
        let diff = differ.diff(previous.as_deref().unwrap_or(""), &body);
        self.tracker.lock().insert(resource.clone(), body.as_str());

        if !diff.has_changes() && !is_initial_diff {
            debug!(url = %url, "no changes");
            return;
        }

        debug!(
            url = %url,
            initial = is_initial_diff,
            added = diff.added_lines(),
            removed = diff.removed_lines(),
            "change detected"
        );

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_change(&url);
        }

        self.changes.notify_all(&ChangeEvent {
            resource,
            url,
            diff,
            body,
            is_initial_diff,
            observed_at: Utc::now(),
        });
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(timer) = self.lifecycle.get_mut().timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::sources::fetch_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scheduler_with(resources: &[&str]) -> (Scheduler, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let scheduler = Scheduler::builder()
            .with_interval(Duration::from_millis(5000))
            .with_resources(resources.iter().copied())
            .with_fetcher(fetch_fn(move |resource: Resource| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, FetchError>(format!("the body of {}", resource)) }
            }))
            .build()
            .unwrap();
        (scheduler, calls)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_initial_state() {
        let (scheduler, _) = scheduler_with(&["a"]);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.interval(), Duration::from_millis(5000));
        assert_eq!(scheduler.resources().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_transitions() {
        let (scheduler, _) = scheduler_with(&["a"]);

        scheduler.start().unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert!(scheduler.inner.lifecycle.lock().timer.is_some());

        scheduler.pause().unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Paused);
        assert!(scheduler.inner.lifecycle.lock().timer.is_none());

        scheduler.resume().unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Running);

        scheduler.stop().unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(scheduler.inner.lifecycle.lock().timer.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_start_has_no_side_effect() {
        let (scheduler, calls) = scheduler_with(&[]);
        assert!(matches!(
            scheduler.start(),
            Err(SchedulerError::EmptyResourceList)
        ));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(scheduler.inner.lifecycle.lock().timer.is_none());

        time::advance(Duration::from_millis(20_000)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emptied_list_pauses_on_tick() {
        let (scheduler, calls) = scheduler_with(&["a", "b"]);
        scheduler.start().unwrap();
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        scheduler.set_resources(Vec::<Resource>::new());
        time::advance(Duration::from_millis(5100)).await;
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.state(), SchedulerState::Paused);
        assert!(scheduler.inner.lifecycle.lock().timer.is_none());

        scheduler.set_resources(["c"]);
        scheduler.resume().unwrap();
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_diff_runs_without_tracker_lock() {
        use crate::diff::{Differ, TrimmedLineDiff};
        use std::sync::OnceLock;
        use std::sync::atomic::AtomicBool;

        let shared_cell: Arc<OnceLock<Weak<Shared>>> = Arc::new(OnceLock::new());
        let lock_free = Arc::new(AtomicBool::new(false));

        let cell = Arc::clone(&shared_cell);
        let flag = Arc::clone(&lock_free);
        let scheduler = Scheduler::builder()
            .with_interval(Duration::from_millis(5000))
            .with_resource("a")
            .with_fetcher(fetch_fn(|_: Resource| async { Ok("body\n".to_string()) }))
            .with_differ(move |previous: &str, current: &str| {
                if let Some(shared) = cell.get().and_then(Weak::upgrade) {
                    flag.store(shared.tracker.try_lock().is_some(), Ordering::SeqCst);
                }
                TrimmedLineDiff.diff(previous, current)
            })
            .build()
            .unwrap();
        shared_cell.set(Arc::downgrade(&scheduler.inner)).unwrap();

        scheduler.start().unwrap();
        settle().await;

        assert!(lock_free.load(Ordering::SeqCst));
        assert_eq!(scheduler.tracker().get(&Resource::from("a")), Some("body\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_after_stop_from_other_handle() {
        let (scheduler, calls) = scheduler_with(&["a"]);
        let other = scheduler.clone();

        scheduler.start().unwrap();
        scheduler.pause().unwrap();
        other.stop().unwrap();

        assert!(matches!(scheduler.resume(), Err(SchedulerError::NotStarted)));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(scheduler.inner.lifecycle.lock().timer.is_none());

        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_does_not_fetch() {
        let (scheduler, calls) = scheduler_with(&["a"]);
        scheduler.start().unwrap();
        scheduler.pause().unwrap();
        scheduler.resume().unwrap();
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        time::advance(Duration::from_millis(5100)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
