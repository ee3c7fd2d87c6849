//! Configuration file support.
//!
//! Settings are read from an INI file, by default
//! `~/.gempreload/config.ini`. Every key is optional; a missing file yields
//! the built-in defaults.
//!
//! ```text
//! [remote]
//! url = https://rubygems.org
//! timeout = 30
//!
//! [preload]
//! threads = 20
//! skip = 0
//! limit =
//! latest = false
//!
//! [logging]
//! level = info
//! file = /var/log/gempreload.log
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use thiserror::Error;
use tracing::debug;

use crate::index::IndexSource;
use crate::logging::{LoggingConfig, DEFAULT_LOG_LEVEL};
use crate::preload::{RunConfig, DEFAULT_WORKERS};
use crate::transport::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

/// Directory under the home directory holding the config file.
pub const CONFIG_DIR_NAME: &str = ".gempreload";

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    /// The file is not valid INI.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A key has a value of the wrong type.
    #[error("invalid value '{value}' for [{section}] {key}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
    },
}

/// `[remote]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    /// Repository base URL.
    pub url: String,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `[preload]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadSettings {
    pub threads: usize,
    pub skip: i64,
    pub limit: Option<i64>,
    /// Use `latest_specs.4.8.gz` instead of the full index.
    pub latest: bool,
}

impl Default for PreloadSettings {
    fn default() -> Self {
        Self {
            threads: DEFAULT_WORKERS,
            skip: 0,
            limit: None,
            latest: false,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub remote: RemoteSettings,
    pub preload: PreloadSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Default config location, `~/.gempreload/config.ini`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults when the
    /// file (or the home directory) does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        content.parse()
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("remote")) {
            if let Some(url) = non_empty(section, "url") {
                config.remote.url = url.to_string();
            }
            if let Some(timeout) = parse_key(section, "remote", "timeout")? {
                config.remote.timeout = timeout;
            }
        }

        if let Some(section) = ini.section(Some("preload")) {
            if let Some(threads) = parse_key(section, "preload", "threads")? {
                config.preload.threads = threads;
            }
            if let Some(skip) = parse_key(section, "preload", "skip")? {
                config.preload.skip = skip;
            }
            config.preload.limit = parse_key(section, "preload", "limit")?;
            if let Some(raw) = non_empty(section, "latest") {
                config.preload.latest = parse_bool(raw).ok_or_else(|| ConfigError::InvalidValue {
                    section: "preload",
                    key: "latest",
                    value: raw.to_string(),
                })?;
            }
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(level) = non_empty(section, "level") {
                config.logging.level = level.to_string();
            }
            config.logging.file = non_empty(section, "file").map(PathBuf::from);
        }

        Ok(config)
    }

    /// Index selected by the `latest` flag.
    pub fn index_source(&self) -> IndexSource {
        IndexSource::from_latest(self.preload.latest)
    }

    /// Run configuration from the `[preload]` section.
    pub fn run_config(&self) -> RunConfig {
        let config = RunConfig::new()
            .with_workers(self.preload.threads)
            .with_skip(self.preload.skip);
        match self.preload.limit {
            Some(limit) => config.with_limit(limit),
            None => config,
        }
    }

    /// Logging configuration from the `[logging]` section.
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.logging.level.clone(),
            log_file: self.logging.file.clone(),
        }
    }
}

impl FromStr for ConfigFile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ini = Ini::load_from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_key<T: FromStr>(
    section: &Properties,
    section_name: &'static str,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    non_empty(section, key)
        .map(|raw| {
            raw.parse().map_err(|_| ConfigError::InvalidValue {
                section: section_name,
                key,
                value: raw.to_string(),
            })
        })
        .transpose()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
