//! HTTP/HTTPS fetcher backed by `reqwest`.

use super::{Fetcher, HttpAuth, Resource};
use crate::error::{FetchError, Result, SchedulerError};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use std::time::Duration;

/// Default fetcher: performs a real network request per resource.
///
/// Bare addresses are fetched with `GET`. Structured requests carry their own
/// method, headers, authentication and timeout, which are applied on top of
/// the client defaults. Any non-success status is reported as
/// [`FetchError::Status`].
///
/// # Examples
///
/// ```rust,no_run
/// use pollwatch::sources::HttpFetcher;
/// use std::time::Duration;
///
/// # fn example() -> pollwatch::error::Result<()> {
/// let fetcher = HttpFetcher::builder()
///     .with_timeout(Duration::from_secs(10))
///     .with_user_agent("status-page-watch/1.0")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self> {
        HttpFetcherBuilder::new().build()
    }

    /// Create a new builder for constructing an HTTP fetcher.
    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder::new()
    }

    fn request(&self, resource: &Resource) -> std::result::Result<RequestBuilder, FetchError> {
        let spec = match resource {
            Resource::Url(url) => return Ok(self.client.get(url)),
            Resource::Request(spec) => spec,
        };

        let method = Method::from_bytes(spec.method.to_uppercase().as_bytes())
            .map_err(|e| FetchError::InvalidRequest(format!("Invalid method '{}': {}", spec.method, e)))?;
        let mut request = self.client.request(method, &spec.url);

        for (name, value) in &spec.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        request = match &spec.auth {
            None => request,
            Some(HttpAuth::Bearer { token }) => request.bearer_auth(token),
            Some(HttpAuth::Basic { username, password }) => {
                request.basic_auth(username, password.as_ref())
            }
        };

        if let Some(timeout) = spec.timeout() {
            request = request.timeout(timeout);
        }

        Ok(request)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, resource: &Resource) -> std::result::Result<String, FetchError> {
        let response = self.request(resource)?.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Builder for constructing an [`HttpFetcher`].
pub struct HttpFetcherBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl HttpFetcherBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: None,
        }
    }

    /// Set the default request timeout.
    ///
    /// Default is 10 seconds. A [`RequestSpec`](super::RequestSpec) timeout
    /// overrides it for that resource.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `User-Agent` header sent with every request.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the HTTP fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<HttpFetcher> {
        let mut builder = Client::builder().timeout(self.timeout);
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder
            .build()
            .map_err(|e| SchedulerError::FetcherBuild(format!("Failed to create HTTP client: {}", e)))?;

        Ok(HttpFetcher { client })
    }
}

impl Default for HttpFetcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
