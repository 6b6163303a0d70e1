//! Remote HTTP/HTTPS data source with long-polling.

use crate::error::{ConfigError, Result};
use crate::sources::{ChangeSignal, DataSource};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use reqwest::{Client, RequestBuilder, header::HeaderValue};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Envelope code meaning "content follows".
const CODE_OK: i64 = 200;

/// URL schemes this build can fetch. `https` needs the `remote-tls` feature.
#[cfg(feature = "remote-tls")]
pub(crate) const SCHEMES: &[&str] = &["http", "https"];
#[cfg(not(feature = "remote-tls"))]
pub(crate) const SCHEMES: &[&str] = &["http"];

/// Authentication method for HTTP requests.
#[derive(Clone)]
pub enum HttpAuth {
    /// No authentication
    None,
    /// Bearer token authentication
    Bearer(String),
    /// Basic authentication (username, password)
    Basic(String, String),
}

/// Response body served by a long-poll configuration endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    data: Option<Payload>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct Payload {
    #[serde(default)]
    content: String,
    #[serde(default)]
    revision: i64,
}

struct Shared {
    url: Url,
    client: Client,
    auth: HttpAuth,
    timeout: Duration,
    poll_timeout: Duration,
    backoff: Duration,
    cached: RwLock<Option<Payload>>,
    signal: ChangeSignal,
}

impl Shared {
    fn request_url(&self, watch: bool) -> Url {
        let mut url = self.url.clone();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "watch")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        if pairs.is_empty() && !watch {
            url.set_query(None);
            return url;
        }

        {
            let mut query = url.query_pairs_mut();
            query.clear();
            for (key, value) in &pairs {
                query.append_pair(key, value);
            }
            if watch {
                query.append_pair("watch", "true");
            }
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match &self.auth {
            HttpAuth::None => request,
            HttpAuth::Bearer(token) => {
                let header_value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| ConfigError::SourceError(format!("Invalid bearer token: {}", e)))?;
                request.header("Authorization", header_value)
            }
            HttpAuth::Basic(username, password) => request.basic_auth(username, Some(password)),
        })
    }

    async fn fetch(&self, watch: bool) -> Result<Envelope> {
        let timeout = if watch { self.poll_timeout } else { self.timeout };
        let request = self
            .client
            .get(self.request_url(watch))
            .timeout(timeout);

        let response = self
            .authorize(request)?
            .send()
            .await
            .map_err(|e| ConfigError::SourceError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigError::SourceError(format!(
                "HTTP request failed with status {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<Envelope>()
            .await
            .map_err(|e| ConfigError::SourceError(format!("Malformed response envelope: {}", e)))
    }

    /// Cache `payload`; returns whether it differs from what was cached.
    fn remember(&self, payload: Payload) -> bool {
        let mut cached = self.cached.write();
        if cached.as_ref() == Some(&payload) {
            return false;
        }
        *cached = Some(payload);
        true
    }
}

async fn poll(shared: Arc<Shared>) {
    loop {
        let started = tokio::time::Instant::now();
        match shared.fetch(true).await {
            Ok(Envelope {
                code: CODE_OK,
                data,
            }) => {
                let payload = data.unwrap_or_default();
                let revision = payload.revision;
                if shared.remember(payload) {
                    debug!(url = %shared.url, revision, "remote configuration changed");
                    shared.signal.notify();
                }
            }
            Ok(Envelope { code, .. }) => {
                debug!(url = %shared.url, code, "no change reported, polling again");
                // Polls the server answers without holding are spaced by `backoff`.
                tokio::time::sleep(shared.backoff.saturating_sub(started.elapsed())).await;
            }
            Err(e) => {
                warn!(url = %shared.url, error = %e, "long-poll failed, retrying");
                tokio::time::sleep(shared.backoff).await;
            }
        }
    }
}

/// HTTP-based data source.
///
/// Reads configuration from an endpoint answering with a
/// `{"code": 200, "data": {"content": "...", "revision": 1}}` envelope. A
/// background task long-polls the same endpoint with `watch=true`; the server
/// is expected to hold the request until the content changes or its own timeout
/// elapses. Envelope codes other than 200 mean "no change"; when such an
/// answer comes back sooner than the backoff, the next poll waits out the rest
/// of it. Transport errors and non-success statuses are retried after a fixed
/// backoff, forever, until the source is closed.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_store::sources::HttpSource;
/// use std::time::Duration;
///
/// # async fn example() -> hotswap_store::error::Result<()> {
/// let source = HttpSource::builder()
///     .with_url("https://config.example.com/api/config")
///     .with_auth_token("secret-token")
///     .with_timeout(Duration::from_secs(10))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct HttpSource {
    shared: Arc<Shared>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl HttpSource {
    /// Create a new builder for constructing an HTTP source.
    pub fn builder() -> HttpSourceBuilder {
        HttpSourceBuilder::new()
    }

    /// The configured endpoint.
    pub fn url(&self) -> &Url {
        &self.shared.url
    }

    /// Revision of the cached content, if any has been fetched.
    pub fn revision(&self) -> Option<i64> {
        self.shared.cached.read().as_ref().map(|p| p.revision)
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn read_config(&self) -> Result<Vec<u8>> {
        let cached = self
            .shared
            .cached
            .read()
            .as_ref()
            .map(|payload| payload.content.clone().into_bytes());
        if let Some(content) = cached {
            return Ok(content);
        }

        let envelope = self.shared.fetch(false).await?;
        if envelope.code != CODE_OK {
            return Err(ConfigError::SourceError(format!(
                "{} answered with code {}",
                self.shared.url, envelope.code
            )));
        }

        let payload = envelope.data.unwrap_or_default();
        let content = payload.content.clone().into_bytes();
        self.shared.remember(payload);
        Ok(content)
    }

    fn is_config_changed(&self) -> watch::Receiver<u64> {
        self.shared.signal.subscribe()
    }

    fn close(&self) -> Result<()> {
        if let Some(poller) = self.poller.lock().take() {
            poller.abort();
        }
        if self.shared.signal.close() {
            info!(url = %self.shared.url, "stopped polling remote configuration");
        }
        Ok(())
    }

    fn name(&self) -> String {
        format!("http:{}", self.shared.url)
    }
}

impl Drop for HttpSource {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.get_mut().take() {
            poller.abort();
        }
    }
}

/// Builder for constructing an [`HttpSource`].
pub struct HttpSourceBuilder {
    url: Option<String>,
    auth: HttpAuth,
    timeout: Duration,
    poll_timeout: Duration,
    backoff: Duration,
}

impl HttpSourceBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: None,
            auth: HttpAuth::None,
            timeout: Duration::from_secs(10),
            poll_timeout: Duration::from_secs(90),
            backoff: Duration::from_secs(1),
        }
    }

    /// Set the endpoint to read configuration from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set Bearer token authentication.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth = HttpAuth::Bearer(token.into());
        self
    }

    /// Set Basic authentication.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = HttpAuth::Basic(username.into(), password.into());
        self
    }

    /// Set the timeout of plain reads.
    ///
    /// Default is 10 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how long a long-poll request may stay open.
    ///
    /// Must exceed the server's hold time. Default is 90 seconds.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Set the pause after a failed poll, which is also the shortest interval
    /// between two "no change" polls.
    ///
    /// Default is 1 second.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Build the source and start its polling task.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No URL is provided, or it is not an http(s) URL
    /// - The URL is https and the `remote-tls` feature is off
    /// - The HTTP client cannot be constructed
    /// - No tokio runtime is running
    pub fn build(self) -> Result<HttpSource> {
        let raw = self.url.ok_or_else(|| {
            ConfigError::SourceError("URL is required for HttpSource".to_string())
        })?;
        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::SourceError(format!("Invalid URL {}: {}", raw, e)))?;
        if url.scheme() == "https" && !SCHEMES.contains(&"https") {
            return Err(ConfigError::SourceError(format!(
                "{} needs TLS support, enable the remote-tls feature",
                raw
            )));
        }
        if !SCHEMES.contains(&url.scheme()) {
            return Err(ConfigError::SourceError(format!(
                "HttpSource needs an http(s) URL, got {}",
                raw
            )));
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            ConfigError::SourceError("HttpSource requires a running tokio runtime".to_string())
        })?;

        let client = Client::builder()
            .build()
            .map_err(|e| ConfigError::SourceError(format!("Failed to create HTTP client: {}", e)))?;

        let shared = Arc::new(Shared {
            url,
            client,
            auth: self.auth,
            timeout: self.timeout,
            poll_timeout: self.poll_timeout,
            backoff: self.backoff,
            cached: RwLock::new(None),
            signal: ChangeSignal::new(),
        });

        let poller = runtime.spawn(poll(Arc::clone(&shared)));
        info!(url = %shared.url, "polling remote configuration");

        Ok(HttpSource {
            shared,
            poller: Mutex::new(Some(poller)),
        })
    }
}

impl Default for HttpSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
