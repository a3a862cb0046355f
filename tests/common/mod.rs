//! Shared fixtures for integration tests.

#![allow(dead_code)]

use pollwatch::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const INTERVAL: Duration = Duration::from_millis(5000);

/// Advance past one interval.
pub const TICK: Duration = Duration::from_millis(5100);

/// Counts fetches and answers with the body produced by `body`.
pub struct CountingFetcher {
    pub calls: Arc<AtomicUsize>,
}

impl CountingFetcher {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }
}

/// Build a scheduler whose fetcher maps each call to `body(resource, call_index)`.
pub fn scheduler_with<F>(resources: &[&str], body: F) -> (Scheduler, CountingFetcher)
where
    F: Fn(&Resource, usize) -> std::result::Result<String, FetchError> + Send + Sync + 'static,
{
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);
    let body = Arc::new(body);

    let scheduler = Scheduler::builder()
        .with_interval(INTERVAL)
        .with_resources(resources.iter().copied())
        .with_fetcher(fetch_fn(move |resource: Resource| {
            let call = calls_clone.fetch_add(1, Ordering::SeqCst);
            let body = Arc::clone(&body);
            async move { body(&resource, call) }
        }))
        .build()
        .unwrap();

    (scheduler, CountingFetcher { calls })
}

/// Deterministic body: `"the body of " + url`.
pub fn static_body(resource: &Resource, _call: usize) -> std::result::Result<String, FetchError> {
    Ok(format!("the body of {}", resource.url()))
}

/// Body that differs on every call.
pub fn counting_body(resource: &Resource, call: usize) -> std::result::Result<String, FetchError> {
    Ok(format!("the body of {}, call count {}", resource.url(), call))
}

/// Let spawned fetch tasks run to completion.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Advance the paused clock past one interval and let the cycle finish.
pub async fn tick() {
    tokio::time::advance(TICK).await;
    settle().await;
}
