//! Resource descriptors and fetch implementations.

mod fetcher;
#[cfg(feature = "http")]
mod http;
mod resource;

pub use fetcher::{FnFetcher, Fetcher, fetch_fn};
#[cfg(feature = "http")]
pub use http::{HttpFetcher, HttpFetcherBuilder};
pub use resource::{HttpAuth, RequestSpec, Resource};
