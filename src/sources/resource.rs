//! Resource descriptors: what the scheduler polls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Authentication method for HTTP requests.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HttpAuth {
    /// Bearer token authentication
    Bearer {
        /// The token sent as `Authorization: Bearer <token>`
        token: String,
    },
    /// Basic authentication (username, optional password)
    Basic {
        /// User name
        username: String,
        /// Password, if any
        #[serde(default)]
        password: Option<String>,
    },
}

impl fmt::Debug for HttpAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// A structured request: an address plus transport options.
///
/// Every field is handed to the fetcher untouched.
///
/// # Examples
///
/// ```rust
/// use pollwatch::sources::RequestSpec;
/// use std::time::Duration;
///
/// let spec = RequestSpec::new("https://example.com/status")
///     .with_basic_auth("user1", "secret")
///     .with_header("Accept", "text/plain")
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(spec.url, "https://example.com/status");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Address to fetch.
    pub url: String,
    /// HTTP method, `GET` unless set.
    #[serde(default = "default_method")]
    pub method: String,
    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<HttpAuth>,
    /// Per-request timeout in milliseconds, overriding the fetcher default.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl RequestSpec {
    /// Create a `GET` request for `url` with no extra options.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: BTreeMap::new(),
            auth: None,
            timeout_ms: None,
        }
    }

    /// Set the HTTP method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Add a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set Bearer token authentication.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(HttpAuth::Bearer {
            token: token.into(),
        });
        self
    }

    /// Set Basic authentication.
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(HttpAuth::Basic {
            username: username.into(),
            password: Some(password.into()),
        });
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// The per-request timeout, if one was set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// A poll target: either a bare address or a structured request.
///
/// Equality and hashing cover the whole descriptor, so the same address
/// requested with different options is tracked as a different resource.
///
/// In settings files a resource is either a plain string or a table with at
/// least a `url` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resource {
    /// A bare address.
    Url(String),
    /// An address plus transport options.
    Request(RequestSpec),
}

impl Resource {
    /// The address this resource resolves to.
    ///
    /// ```rust
    /// use pollwatch::sources::{RequestSpec, Resource};
    ///
    /// assert_eq!(Resource::from("https://a.example").url(), "https://a.example");
    /// let spec = Resource::from(RequestSpec::new("https://b.example").with_auth_token("t"));
    /// assert_eq!(spec.url(), "https://b.example");
    /// ```
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Request(spec) => &spec.url,
        }
    }

    /// The structured request, if this is not a bare address.
    pub fn request(&self) -> Option<&RequestSpec> {
        match self {
            Self::Url(_) => None,
            Self::Request(spec) => Some(spec),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url())
    }
}

impl From<&str> for Resource {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for Resource {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<RequestSpec> for Resource {
    fn from(spec: RequestSpec) -> Self {
        Self::Request(spec)
    }
}
