//! Error types for pollwatch.

/// Result type alias for pollwatch operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors returned synchronously by the scheduler and its builder.
///
/// Lifecycle errors leave the scheduler untouched: a call that fails has no
/// side effect.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// `start()` was called while the scheduler is already running.
    #[error("Scheduler has already started")]
    AlreadyRunning,

    /// `pause()`, `resume()` or `stop()` was called before `start()`.
    #[error("Scheduler has not been started yet")]
    NotStarted,

    /// `start()` was called with no resources to poll.
    #[error("Resource list is empty")]
    EmptyResourceList,

    /// The poll interval is zero.
    #[error("Poll interval must be greater than zero")]
    InvalidInterval,

    /// No fetcher was configured and the default one is not compiled in.
    #[error("No fetcher configured (enable the `http` feature or call `with_fetcher`)")]
    MissingFetcher,

    /// Failed to load scheduler settings.
    #[error("Failed to load settings: {0}")]
    LoadError(String),

    /// Failed to deserialize scheduler settings.
    #[error("Failed to deserialize settings: {0}")]
    DeserializationError(String),

    /// A fetcher could not be constructed.
    #[error("Failed to build fetcher: {0}")]
    FetcherBuild(String),
}

/// Errors produced by a [`Fetcher`](crate::sources::Fetcher) for a single resource.
///
/// The scheduler never inspects these; they are forwarded as-is inside an
/// [`ErrorEvent`](crate::notify::ErrorEvent).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The transport failed before a response was received.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status code.
    #[error("Request failed with status {status}: {reason}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase, if known
        reason: String,
    },

    /// The request description could not be turned into a request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The response body could not be read as text.
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// Any other failure reported by a custom fetcher.
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Create a free-form fetch error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            FetchError::InvalidRequest(err.to_string())
        } else if err.is_body() || err.is_decode() {
            FetchError::Body(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}
