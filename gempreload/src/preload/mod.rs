//! Preloading a repository by probing every gem in its specs index.
//!
//! ```text
//! PreloadRunner::run
//!     │
//!     ├── limit <= 0? ──► return (nothing fetched)
//!     ├── IndexFetcher::fetch (cached after first success)
//!     ├── RunConfig::selection ──► empty? ──► return
//!     └── worker pool ──► HttpClient::head("gems/{name}-{version}.gem")
//!                            └── failure ──► warn! + FailureCallback
//! ```

mod config;
mod error;
mod runner;

pub use config::{RunConfig, DEFAULT_WORKERS};
pub use error::ItemProbeError;
pub use runner::{FailureCallback, PreloadRunner, ProgressCallback};
