//! Command-line interface.
//!
//! Every flag is optional so that a config file can supply it; flags that
//! are given (directly or through their environment variable) win.

use std::path::PathBuf;

use clap::Parser;
use saltpow_utils::LogFormat;
use saltpow_work::{SearchStrategy, SuffixAlphabet};

use crate::config::ClientConfig;

#[derive(Debug, Parser)]
#[command(name = "saltpow", version, about = "Proof-of-work client for salted SHA1 challenges")]
pub struct Cli {
    /// Server address, `host[:port]`; port defaults to 443.
    #[arg(long, env = "SALTPOW_CONNECT")]
    pub connect: Option<String>,

    /// Concurrent search workers (defaults to available CPUs).
    #[arg(long, env = "SALTPOW_WORKERS")]
    pub workers: Option<usize>,

    /// JSON contact profile used to answer field requests.
    #[arg(long, env = "SALTPOW_PROFILE")]
    pub profile: Option<PathBuf>,

    /// Search strategy: "bulk" or "streaming".
    #[arg(long, env = "SALTPOW_STRATEGY")]
    pub strategy: Option<SearchStrategy>,

    /// Suffix alphabet: "alphanumeric" or "printable".
    #[arg(long, env = "SALTPOW_ALPHABET")]
    pub alphabet: Option<SuffixAlphabet>,

    #[arg(long, env = "SALTPOW_MIN_SUFFIX_LEN")]
    pub min_suffix_len: Option<usize>,

    #[arg(long, env = "SALTPOW_MAX_SUFFIX_LEN")]
    pub max_suffix_len: Option<usize>,

    /// Give up on a proof-of-work round after this many seconds.
    #[arg(long, env = "SALTPOW_ROUND_TIMEOUT_SECS")]
    pub round_timeout_secs: Option<u64>,

    /// Fail the session if no command arrives within this many seconds.
    #[arg(long, env = "SALTPOW_COMMAND_TIMEOUT_SECS")]
    pub command_timeout_secs: Option<u64>,

    #[arg(long, env = "SALTPOW_CONNECT_TIMEOUT_SECS")]
    pub connect_timeout_secs: Option<u64>,

    /// Reconnects allowed after a dropped connection.
    #[arg(long, env = "SALTPOW_RECONNECT_ATTEMPTS")]
    pub reconnect_attempts: Option<u32>,

    /// Hash-rate logging interval in seconds.
    #[arg(long, env = "SALTPOW_RATE_INTERVAL_SECS")]
    pub rate_interval_secs: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SALTPOW_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SALTPOW_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "SALTPOW_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Overlay the flags that were given onto `base`.
    pub fn apply(self, base: ClientConfig) -> ClientConfig {
        ClientConfig {
            connect: self.connect.or(base.connect),
            profile: self.profile.or(base.profile),
            workers: self.workers.unwrap_or(base.workers),
            strategy: self.strategy.unwrap_or(base.strategy),
            alphabet: self.alphabet.unwrap_or(base.alphabet),
            min_suffix_len: self.min_suffix_len.unwrap_or(base.min_suffix_len),
            max_suffix_len: self.max_suffix_len.unwrap_or(base.max_suffix_len),
            round_timeout_secs: self.round_timeout_secs.unwrap_or(base.round_timeout_secs),
            command_timeout_secs: self.command_timeout_secs.unwrap_or(base.command_timeout_secs),
            connect_timeout_secs: self.connect_timeout_secs.unwrap_or(base.connect_timeout_secs),
            reconnect_attempts: self.reconnect_attempts.unwrap_or(base.reconnect_attempts),
            rate_interval_secs: self.rate_interval_secs.unwrap_or(base.rate_interval_secs),
            log_format: self.log_format.unwrap_or(base.log_format),
            log_level: self.log_level.unwrap_or(base.log_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("saltpow").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_file_values() {
        let base = ClientConfig {
            connect: Some("file.example.com".into()),
            workers: 8,
            reconnect_attempts: 5,
            ..ClientConfig::default()
        };
        let cli = parse(&["--connect", "cli.example.com:3336", "--workers", "2", "--strategy", "streaming"]);
        let config = cli.apply(base);
        assert_eq!(config.connect.as_deref(), Some("cli.example.com:3336"));
        assert_eq!(config.workers, 2);
        assert_eq!(config.strategy, SearchStrategy::Streaming);
        assert_eq!(config.reconnect_attempts, 5);
    }

    #[test]
    fn no_flags_keeps_base() {
        let base = ClientConfig::default();
        let config = parse(&[]).apply(base.clone());
        assert_eq!(config, base);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let args = ["saltpow", "--alphabet", "emoji"];
        assert!(Cli::try_parse_from(args).is_err());
        let args = ["saltpow", "--log-format", "xml"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
