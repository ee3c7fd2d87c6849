//! Crate-level error type for fatal preload failures.

use thiserror::Error;

use crate::index::FormatError;
use crate::transport::TransportError;

/// Result type for fetch and preload operations.
pub type PreloadResult<T> = Result<T, PreloadError>;

/// Errors that abort a fetch or a whole preload run.
///
/// Failures of individual probes are never reported through this type; see
/// [`ItemProbeError`](crate::preload::ItemProbeError).
#[derive(Debug, Error)]
pub enum PreloadError {
    /// The specs index could not be downloaded.
    #[error("failed to download specs index: {0}")]
    Transport(#[from] TransportError),

    /// The specs index could not be decompressed or decoded.
    #[error("failed to decode specs index: {0}")]
    Format(#[from] FormatError),

    /// The probe worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}
