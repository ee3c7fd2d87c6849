//! gempreload - warm a gem mirror from its specs index
//!
//! This library downloads a repository's gzipped Marshal specs index,
//! decodes it into gem name/version pairs, and issues a HEAD request for
//! every gem (or a skip/limit slice of them) across a bounded worker pool.
//! Pointed at a caching mirror, this pulls every `.gem` into the mirror's
//! cache without transferring the bodies to the caller.
//!
//! # Modules
//!
//! - [`transport`]: the injected [`HttpClient`](transport::HttpClient) and
//!   its reqwest implementation
//! - [`index`]: specs index download, gunzip and Marshal decoding
//! - [`preload`]: selection and fault-tolerant concurrent probing
//! - [`config`]: INI configuration file
//! - [`logging`]: tracing subscriber setup

pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod preload;
pub mod transport;

pub use error::{PreloadError, PreloadResult};
pub use index::{DecodedIndex, IndexFetcher, IndexSource, PackageIdentifier};
pub use preload::{ItemProbeError, PreloadRunner, RunConfig};
pub use transport::{HttpClient, ReqwestClient, TransportError};
