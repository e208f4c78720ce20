//! Client configuration with TOML file support.

use std::path::{Path, PathBuf};
use std::time::Duration;

use saltpow_protocol::SessionConfig;
use saltpow_utils::LogFormat;
use saltpow_work::{SearchConfig, SearchStrategy, SuffixAlphabet, SuffixLength, WorkError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to serialize config: {0}")]
    Serialize(String),
}

/// Configuration for the client.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`];
/// command-line flags are applied on top.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server address, `host[:port]`. Port defaults to 443.
    #[serde(default)]
    pub connect: Option<String>,

    /// JSON contact profile used for field replies.
    #[serde(default)]
    pub profile: Option<PathBuf>,

    /// Concurrent search workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub strategy: SearchStrategy,

    #[serde(default)]
    pub alphabet: SuffixAlphabet,

    #[serde(default = "default_min_suffix_len")]
    pub min_suffix_len: usize,

    #[serde(default = "default_max_suffix_len")]
    pub max_suffix_len: usize,

    /// Upper bound on one proof-of-work round.
    #[serde(default = "default_round_timeout_secs")]
    pub round_timeout_secs: u64,

    /// How long to wait for each server command.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Reconnects allowed after transient connection errors.
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,

    /// Hash-rate logging interval.
    #[serde(default = "default_rate_interval_secs")]
    pub rate_interval_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_min_suffix_len() -> usize {
    SuffixLength::default().min()
}

fn default_max_suffix_len() -> usize {
    SuffixLength::default().max()
}

fn default_round_timeout_secs() -> u64 {
    2 * 60 * 60
}

fn default_command_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_reconnect_attempts() -> u32 {
    3
}

fn default_rate_interval_secs() -> u64 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn search_config(&self) -> Result<SearchConfig, WorkError> {
        Ok(SearchConfig {
            workers: self.workers,
            strategy: self.strategy,
            alphabet: self.alphabet,
            suffix_length: SuffixLength::range(self.min_suffix_len, self.max_suffix_len)?,
            round_timeout: Duration::from_secs(self.round_timeout_secs),
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            command_timeout: Duration::from_secs(self.command_timeout_secs),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn rate_interval(&self) -> Duration {
        Duration::from_secs(self.rate_interval_secs.max(1))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect: None,
            profile: None,
            workers: default_workers(),
            strategy: SearchStrategy::default(),
            alphabet: SuffixAlphabet::default(),
            min_suffix_len: default_min_suffix_len(),
            max_suffix_len: default_max_suffix_len(),
            round_timeout_secs: default_round_timeout_secs(),
            command_timeout_secs: default_command_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            reconnect_attempts: default_reconnect_attempts(),
            rate_interval_secs: default_rate_interval_secs(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
