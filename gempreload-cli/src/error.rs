//! CLI error type.

use gempreload::config::ConfigError;
use gempreload::logging::LoggingError;
use gempreload::{PreloadError, TransportError};
use thiserror::Error;

/// Errors that end the CLI with a non-zero exit status.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] TransportError),

    #[error("{0}")]
    Preload(#[from] PreloadError),
}

impl CliError {
    /// Print the error to stderr and exit with status 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        std::process::exit(1);
    }
}
