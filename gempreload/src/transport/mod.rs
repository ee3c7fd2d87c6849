//! HTTP transport abstraction for talking to a gem repository.
//!
//! Everything in this crate reaches the network through the [`HttpClient`]
//! trait, so the index fetcher and the preload runner can be exercised with
//! a mock in tests and backed by [`ReqwestClient`] in production.
//!
//! # Example
//!
//! ```ignore
//! use gempreload::transport::{HttpClient, ReqwestClient};
//!
//! let client = ReqwestClient::new("https://rubygems.org")?;
//! let response = client.head("gems/rake-13.0.6.gem")?;
//! println!("status {}", response.status);
//! ```

mod http;
mod types;

pub use http::{HttpClient, ReqwestClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use types::{HeadResponse, TransportError};

#[cfg(test)]
pub use http::tests::MockHttpClient;
