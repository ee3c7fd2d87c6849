//! HTTP client abstraction for testability

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_LENGTH;

use super::types::{HeadResponse, TransportError};

/// Repository used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://rubygems.org";

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for HTTP client operations.
///
/// Paths are resolved against the client's repository base URL, so callers
/// pass `specs.4.8.gz` or `gems/rake-13.0.6.gem` rather than absolute URLs.
/// Implementations own their retry, auth and connection policy.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the full response body.
    fn get(&self, path: &str) -> Result<Vec<u8>, TransportError>;

    /// Performs an HTTP HEAD request.
    ///
    /// Non-success statuses are reported as errors.
    fn head(&self, path: &str) -> Result<HeadResponse, TransportError>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ReqwestClient {
    /// Creates a client for the given repository with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client for the given repository with a custom timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gempreload/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// The repository base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a repository-relative path to an absolute URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn map_error(&self, url: &str, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            TransportError::Request {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    fn check_status(url: &str, response: Response) -> Result<Response, TransportError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(TransportError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            })
        }
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.map_error(&url, e))?;
        let response = Self::check_status(&url, response)?;

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| self.map_error(&url, e))
    }

    fn head(&self, path: &str) -> Result<HeadResponse, TransportError> {
        let url = self.url(path);
        let response = self
            .client
            .head(&url)
            .send()
            .map_err(|e| self.map_error(&url, e))?;
        let response = Self::check_status(&url, response)?;

        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        Ok(HeadResponse {
            status: response.status().as_u16(),
            content_length,
        })
    }
}
