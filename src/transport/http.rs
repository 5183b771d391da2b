//! HTTP transport backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{PageResult, PageTransport, TransportError};
use crate::error::{CollectionError, Result};

/// Connection settings for [`HttpTransport`].
///
/// The origin is injected here instead of being read from the environment, so the
/// same cursor works against a development server (`http://127.0.0.1:8000`) and a
/// production deployment mounted under `/api`.
///
/// # Examples
///
/// ```ignore
/// let config = HttpConfig::builder()
///     .origin("https://docentes.example.org")
///     .mount_prefix("/api")
///     .timeout(Duration::from_secs(10))
///     .header("X-CSRFToken", token)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    origin: Url,
    mount_prefix: Option<String>,
    timeout: Duration,
    user_agent: String,
    headers: Vec<(String, String)>,
}

impl HttpConfig {
    /// Configuration for `origin` with default settings.
    ///
    /// # Errors
    /// [`CollectionError::Config`] if `origin` is not an absolute http(s) URL.
    pub fn new(origin: impl AsRef<str>) -> Result<Self> {
        let origin = Url::parse(origin.as_ref())
            .map_err(|e| CollectionError::Config(format!("Invalid origin '{}': {}", origin.as_ref(), e)))?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(CollectionError::Config(format!("Unsupported origin scheme '{}'", origin.scheme())));
        }

        Ok(Self {
            origin,
            mount_prefix: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("remote-collection/{}", env!("CARGO_PKG_VERSION")),
            headers: Vec::new(),
        })
    }

    pub fn builder() -> HttpConfigBuilder {
        HttpConfigBuilder::default()
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn mount_prefix(&self) -> Option<&str> {
        self.mount_prefix.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Prefix prepended to every cursor on the wire (the inverse of the
    /// normalizer's API prefix strip).
    pub fn with_mount_prefix(mut self, prefix: impl AsRef<str>) -> Self {
        let trimmed = prefix.as_ref().trim_matches('/');
        self.mount_prefix = (!trimmed.is_empty()).then(|| format!("/{trimmed}"));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Absolute request URL for a normalized cursor. Always on the configured origin.
    pub fn request_url(&self, path: &str) -> std::result::Result<Url, url::ParseError> {
        let mount = self.mount_prefix.as_deref().unwrap_or("");
        self.origin.join(&format!("{mount}/{}", path.trim_start_matches('/')))
    }
}

/// Builder for [`HttpConfig`].
#[derive(Debug, Default)]
pub struct HttpConfigBuilder {
    origin: Option<String>,
    mount_prefix: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    headers: Vec<(String, String)>,
}

impl HttpConfigBuilder {
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn mount_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.mount_prefix = Some(prefix.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// # Errors
    /// [`CollectionError::Config`] if the origin is missing or invalid.
    pub fn build(self) -> Result<HttpConfig> {
        let origin = self
            .origin
            .ok_or_else(|| CollectionError::Config("Origin is required".to_string()))?;

        let mut config = HttpConfig::new(origin)?;
        if let Some(prefix) = self.mount_prefix {
            config = config.with_mount_prefix(prefix);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(agent) = self.user_agent {
            config = config.with_user_agent(agent);
        }
        for (key, value) in self.headers {
            config = config.with_header(key, value);
        }
        Ok(config)
    }
}

/// Fetches pages from a REST list endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: HttpConfig,
}

impl HttpTransport {
    /// # Errors
    /// [`CollectionError::Config`] for invalid header names or values, or if the
    /// HTTP client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in config.headers() {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| CollectionError::Config(format!("Invalid header name '{key}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| CollectionError::Config(format!("Invalid header value for '{key}': {e}")))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent())
            .default_headers(headers)
            .build()
            .map_err(|e| CollectionError::Config(format!("Failed to build HTTP client: {e}")))?;

        debug!(origin = %config.origin(), mount = ?config.mount_prefix(), "HTTP transport initialized");
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn classify(path: &str, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout { path: path.to_string() }
        } else if error.is_decode() {
            TransportError::Decode {
                path: path.to_string(),
                message: error.to_string(),
            }
        } else if let Some(status) = error.status() {
            TransportError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            }
        } else {
            TransportError::Connect {
                path: path.to_string(),
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl<T> PageTransport<T> for HttpTransport
where
    T: DeserializeOwned + Send + 'static,
{
    #[instrument(skip(self), fields(origin = %self.config.origin()))]
    async fn get_page(&self, path: &str) -> std::result::Result<PageResult<T>, TransportError> {
        let url = self.config.request_url(path).map_err(|e| TransportError::Connect {
            path: path.to_string(),
            message: format!("cannot build request URL: {e}"),
        })?;

        debug!(%url, "GET");
        let response = self.client.get(url).send().await.map_err(|e| Self::classify(path, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Non-success response");
            return Err(TransportError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let page: PageResult<T> = response.json().await.map_err(|e| Self::classify(path, e))?;
        page.validate(path)?;
        debug!(total = page.total_count, items = page.items.len(), "Page received");
        Ok(page)
    }
}
