//! Specs index download and decoding.
//!
//! A gem repository publishes `specs.4.8.gz` (every version of every gem)
//! and `latest_specs.4.8.gz` (newest versions only). Both are gzipped Ruby
//! Marshal dumps of `[name, version, platform]` tuples.
//!
//! ```text
//! HttpClient::get ──► gunzip ──► marshal::load ──► [PackageIdentifier]
//! ```
//!
//! [`IndexFetcher`] runs that pipeline once and caches the result.

mod decode;
mod error;
mod fetcher;
pub mod marshal;
mod types;

pub use decode::{decode_index, decode_payload, gunzip};
pub use error::FormatError;
pub use fetcher::IndexFetcher;
pub use types::{
    DecodedIndex, IndexSource, PackageIdentifier, FULL_SPECS_RESOURCE, LATEST_SPECS_RESOURCE,
};
