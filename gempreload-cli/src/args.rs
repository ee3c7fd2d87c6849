//! Command-line arguments and their resolution against the config file.

use std::path::PathBuf;

use clap::Parser;
use gempreload::config::{ConfigError, ConfigFile};
use gempreload::logging::LoggingConfig;
use gempreload::{IndexSource, RunConfig};

/// Preload a gem mirror by issuing a HEAD request for every gem in its
/// specs index.
#[derive(Debug, Parser)]
#[command(name = "gempreload", version, about)]
pub struct Cli {
    /// Config file (defaults to ~/.gempreload/config.ini)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Repository or mirror base URL
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Use latest_specs.4.8.gz instead of the full specs index
    #[arg(long)]
    pub latest: bool,

    /// Number of concurrent HEAD requests
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Number of gems to skip from the start of the index
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub skip: Option<i64>,

    /// Maximum number of gems to probe (zero or less probes nothing)
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub url: String,
    pub timeout: u64,
    pub source: IndexSource,
    pub run: RunConfig,
    pub logging: LoggingConfig,
    pub progress: bool,
}

impl Cli {
    /// Load the file named by `--config`, or the default location.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load_config(&self) -> Result<ConfigFile, ConfigError> {
        match self.config {
            Some(ref path) => ConfigFile::load_from(path),
            None => ConfigFile::load(),
        }
    }

    /// Merge CLI arguments over the config file. CLI takes precedence,
    /// then config, then built-in defaults (already applied by the config).
    pub fn resolve(&self, config: &ConfigFile) -> Settings {
        let url = self
            .url
            .clone()
            .unwrap_or_else(|| config.remote.url.clone());
        let timeout = self.timeout.unwrap_or(config.remote.timeout);
        let source = IndexSource::from_latest(self.latest || config.preload.latest);

        let mut run = config.run_config();
        if let Some(threads) = self.threads {
            run = run.with_workers(threads);
        }
        if let Some(skip) = self.skip {
            run = run.with_skip(skip);
        }
        if let Some(limit) = self.limit {
            run = run.with_limit(limit);
        }

        let mut logging = config.logging_config();
        if self.verbose {
            logging.level = "debug".to_string();
        }
        if let Some(ref path) = self.log_file {
            logging.log_file = Some(path.clone());
        }

        Settings {
            url,
            timeout,
            source,
            run,
            logging,
            progress: !self.no_progress,
        }
    }
}
