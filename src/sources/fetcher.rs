//! Fetch capability trait.

use super::Resource;
use crate::error::FetchError;
use async_trait::async_trait;
use std::future::Future;

/// Fetches the textual body of a [`Resource`].
///
/// The scheduler calls this once per resource per cycle and passes the
/// descriptor through unmodified, so any field the implementation understands
/// is supported. Timeouts are the implementation's responsibility.
///
/// Implement this trait to plug in a different transport, or wrap a closure
/// with [`fetch_fn`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the current body of `resource`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the resource could not be fetched. The error
    /// is reported to error subscribers as-is.
    async fn fetch(&self, resource: &Resource) -> Result<String, FetchError>;
}

/// A [`Fetcher`] backed by an async closure.
///
/// Created with [`fetch_fn`].
pub struct FnFetcher<F> {
    f: F,
}

/// Wrap an async closure as a [`Fetcher`].
///
/// # Examples
///
/// ```rust
/// use pollwatch::sources::{fetch_fn, Fetcher, Resource};
///
/// # async fn example() {
/// let fetcher = fetch_fn(|resource: Resource| async move {
///     Ok(format!("the body of {}", resource.url()))
/// });
/// let body = fetcher.fetch(&Resource::from("a")).await.unwrap();
/// assert_eq!(body, "the body of a");
/// # }
/// ```
pub fn fetch_fn<F, Fut>(f: F) -> FnFetcher<F>
where
    F: Fn(Resource) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, FetchError>> + Send,
{
    FnFetcher { f }
}

#[async_trait]
impl<F, Fut> Fetcher for FnFetcher<F>
where
    F: Fn(Resource) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, FetchError>> + Send,
{
    async fn fetch(&self, resource: &Resource) -> Result<String, FetchError> {
        (self.f)(resource.clone()).await
    }
}
