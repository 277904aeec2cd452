//! HTTP fetch pipeline.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Requests
//! - `HEAD` first to learn the content type, with its own short timeout.
//! - `GET` for the body, bounded by the request timeout and `max_bytes`.
//! - Max redirects: 5 (configurable)
//! - Any non-2xx status is an error; nothing partial is returned.

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
pub use reqwest::{StatusCode, Url};
use reqwest::{Client, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, canonicalize, path_extension};

use lessonlens_core::{AppConfig, Error};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "lessonlens/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Timeout of the content-type probe (default: 5s)
    pub head_timeout: Duration,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "lessonlens/0.1".to_string(),
            max_bytes: 10 * 1024 * 1024,
            head_timeout: Duration::from_millis(5000),
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            head_timeout: config.head_timeout(),
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// Network access used by the content store.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Probe the content type of `url`.
    ///
    /// `Ok(None)` means the server answered without a `Content-Type`.
    async fn head(&self, url: &Url) -> Result<Option<String>, Error>;

    /// Download `url`.
    async fn get(&self, url: &Url) -> Result<FetchResponse, Error>;
}

/// reqwest-backed fetch client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

fn header_content_type(headers: &header::HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn request_error(url: &Url, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(url.to_string())
    } else {
        Error::HttpError(format!("network error for {url}: {err}"))
    }
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn check_size(&self, len: usize) -> Result<(), Error> {
        if len > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }
        Ok(())
    }
}

#[async_trait]
impl HttpFetcher for FetchClient {
    async fn head(&self, url: &Url) -> Result<Option<String>, Error> {
        let response = self
            .http
            .head(url.as_str())
            .timeout(self.config.head_timeout)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("HEAD {url}: status {}", status.as_u16())));
        }

        Ok(header_content_type(response.headers()))
    }

    async fn get(&self, url: &Url) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(url.as_str())
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/pdf,application/vnd.openxmlformats-officedocument.wordprocessingml.document;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("GET {url}: status {}", status.as_u16())));
        }

        if let Some(len) = response.content_length() {
            self.check_size(len as usize)?;
        }

        let final_url = response.url().clone();
        let content_type = header_content_type(response.headers());

        let bytes = response.bytes().await.map_err(|e| request_error(url, e))?;
        self.check_size(bytes.len())?;

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            url,
            final_url,
            fetch_ms,
            bytes.len()
        );

        Ok(FetchResponse { url: url.clone(), final_url, status, content_type, bytes, fetch_ms })
    }
}
