//! Per-item probe failures.

use thiserror::Error;

use crate::index::PackageIdentifier;
use crate::transport::TransportError;

/// A HEAD probe for one gem failed.
///
/// These are reported and counted but never abort a run.
#[derive(Debug, Clone, Error)]
#[error("error while processing gem {identifier}: {source}")]
pub struct ItemProbeError {
    /// The gem whose probe failed.
    pub identifier: PackageIdentifier,
    /// The repository path that was requested.
    pub path: String,
    /// The transport failure.
    pub source: TransportError,
}
