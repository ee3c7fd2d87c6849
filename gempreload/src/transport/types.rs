//! Transport value and error types.

use thiserror::Error;

/// Metadata returned by a successful HEAD request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadResponse {
    /// HTTP status code (always 2xx for a successful probe).
    pub status: u16,
    /// Value of the `Content-Length` header, when present.
    pub content_length: Option<u64>,
}

impl HeadResponse {
    /// Create a response with the given status and no content length.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            content_length: None,
        }
    }

    /// Attach a content length.
    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }
}

/// Errors raised by an [`HttpClient`](super::HttpClient).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The underlying HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// Connection, protocol or body read failure.
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
}

impl TransportError {
    /// The URL the failing request targeted, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::ClientBuild(_) => None,
            Self::Status { url, .. } | Self::Timeout { url, .. } | Self::Request { url, .. } => {
                Some(url)
            }
        }
    }
}
