use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::matching::DEFAULT_LINE_TOLERANCE;
use crate::retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY_SECS, RetryPolicy};

/// Retry tuning for bulk findings fetches.
///
/// The findings listing intermittently errors while the platform is
/// recomputing a result set, so fetches retry on a fixed cadence before
/// giving up.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of fetch attempts, including the first.
    #[serde(default = "default_retry_attempts")]
    pub attempts: u32,

    /// Delay between attempts, in seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_retry_attempts(),
            delay_secs: default_retry_delay_secs(),
        }
    }
}

impl RetryConfig {
    /// Converts this section into an engine retry policy.
    #[must_use]
    pub const fn to_policy(self) -> RetryPolicy {
        RetryPolicy::fixed(self.attempts, Duration::from_secs(self.delay_secs))
    }
}

/// Project-level configuration loaded from `mitsync.toml`.
///
/// Every field is optional and defaults to the values the tool ships
/// with, so an absent or empty file behaves identically to no file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Maximum line distance accepted by a fuzzy static match.
    #[serde(default = "default_line_tolerance")]
    pub line_tolerance: u32,

    /// API host override, e.g. for a regional platform instance.
    #[serde(default)]
    pub api_host: Option<String>,

    /// Retry tuning for bulk findings fetches.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            line_tolerance: default_line_tolerance(),
            api_host: None,
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Creates a default configuration with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a `mitsync.toml` file.
    ///
    /// Returns the default configuration if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = read_file(path)?;
        parse_toml(path, &content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_toml(path: &Path, content: &str) -> Result<Config, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn default_line_tolerance() -> u32 {
    DEFAULT_LINE_TOLERANCE
}

fn default_retry_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_delay_secs() -> u64 {
    DEFAULT_RETRY_DELAY_SECS
}

/// Errors that can occur when reading or parsing a `mitsync.toml`
/// configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read from disk.
    #[error("failed to read config '{path}': {source}")]
    Read {
        /// Path to the config file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file contained invalid TOML or unexpected values.
    #[error("failed to parse config '{path}': {source}")]
    Parse {
        /// Path to the config file that could not be parsed.
        path: PathBuf,
        /// The underlying TOML deserialization error.
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Returns the file path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}
