//! saltpow: proof-of-work client.
//!
//! Connects to the server, answers its commands, solves `POW` challenges
//! with the local worker pool, and exits once the server sends `END`.

mod cli;
mod config;
mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use saltpow_network::{Connection, Connector};
use saltpow_protocol::{load_or_default, ProtocolError, Session, SessionOutcome};
use saltpow_types::Profile;
use saltpow_utils::{format_hash_rate, init_logging};
use saltpow_work::{HashCounter, RateMonitor, SearchCoordinator};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cli::Cli;
use crate::config::ClientConfig;
use crate::shutdown::ShutdownController;

/// Pause between reconnect attempts.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging is configured from the merged config, so problems with the
    // file are reported once the subscriber exists.
    let (file_config, file_error) = match cli.config.as_deref() {
        Some(path) => match ClientConfig::from_toml_file(path) {
            Ok(config) => (Some(config), None),
            Err(e) => (None, Some(e)),
        },
        None => (None, None),
    };
    let config_path = cli.config.clone();
    let config = cli.apply(file_config.unwrap_or_default());

    init_logging(config.log_format, &config.log_level);
    match (config_path, file_error) {
        (Some(path), None) => info!(path = %path.display(), "loaded config"),
        (Some(_), Some(e)) => warn!(error = %e, "ignoring config file, using CLI values and defaults"),
        _ => {}
    }
    if let Ok(rendered) = config.to_toml_string() {
        debug!(config = %rendered, "effective configuration");
    }

    let endpoint = config
        .connect
        .clone()
        .context("no server endpoint configured (use --connect or SALTPOW_CONNECT)")?;
    let search = config.search_config().context("invalid search settings")?;
    let profile = load_or_default(config.profile.as_deref());
    let connector = Connector::new(&endpoint, config.connect_timeout())?;

    info!(
        endpoint = connector.endpoint(),
        workers = search.workers,
        strategy = search.strategy.as_str(),
        alphabet = search.alphabet.as_str(),
        "starting saltpow"
    );

    let shutdown = ShutdownController::new();
    let token = shutdown.token();
    let signals = tokio::spawn(async move { shutdown.wait_for_signal().await });

    let counter = HashCounter::new();
    let monitor = RateMonitor::spawn(counter.clone(), config.rate_interval(), token.clone());
    let coordinator = Arc::new(SearchCoordinator::with_counter(search, counter));

    let result = run_client(&connector, &coordinator, &profile, &config, &token).await;

    token.cancel();
    signals.abort();
    match monitor.await {
        Ok(summary) => info!(
            attempts = summary.attempts,
            rate = %format_hash_rate(summary.hashes_per_sec),
            "hashing summary"
        ),
        Err(e) => warn!(error = %e, "rate monitor failed"),
    }

    match &result {
        Ok(()) => info!("saltpow exited cleanly"),
        Err(e) => error!(error = %e, "saltpow failed"),
    }
    result
}

/// Run sessions until the server ends one, shutdown is requested, or a
/// non-transient error occurs. Transient failures are retried on a fresh
/// connection up to `reconnect_attempts` times.
async fn run_client(
    connector: &Connector,
    coordinator: &Arc<SearchCoordinator>,
    profile: &Profile,
    config: &ClientConfig,
    token: &CancellationToken,
) -> anyhow::Result<()> {
    let mut connection = tokio::select! {
        _ = token.cancelled() => return Ok(()),
        connection = connector.connect() => connection?,
    };
    let mut retries = 0u32;

    loop {
        let result = run_session(&mut connection, coordinator, profile, config, token).await;
        match result {
            Ok(SessionOutcome::Completed { rounds }) => {
                info!(rounds, "server ended the session");
                if let Err(e) = connection.close().await {
                    warn!(error = %e, "error closing connection");
                }
                return Ok(());
            }
            Err(e) if e.is_shutdown() || token.is_cancelled() => {
                info!("shutdown requested, leaving session");
                return Ok(());
            }
            Err(e) if e.is_transient() => {
                warn!(error = %e, "session interrupted");
                reconnect(&mut connection, config.reconnect_attempts, &mut retries, token).await?;
            }
            Err(e) => return Err(e).context("session failed"),
        }
    }
}

async fn run_session(
    connection: &mut Connection,
    coordinator: &Arc<SearchCoordinator>,
    profile: &Profile,
    config: &ClientConfig,
    token: &CancellationToken,
) -> Result<SessionOutcome, ProtocolError> {
    let (reader, writer) = connection.split();
    let mut session = Session::new(
        reader,
        writer,
        profile.clone(),
        Arc::clone(coordinator),
        config.session_config(),
    );
    session.run(token).await
}

async fn reconnect(
    connection: &mut Connection,
    max_attempts: u32,
    retries: &mut u32,
    token: &CancellationToken,
) -> anyhow::Result<()> {
    loop {
        if *retries >= max_attempts {
            anyhow::bail!("giving up after {max_attempts} reconnect attempts");
        }
        *retries += 1;
        info!(attempt = *retries, max = max_attempts, "reconnecting");

        tokio::select! {
            _ = token.cancelled() => return Ok(()),
            _ = tokio::time::sleep(RECONNECT_BACKOFF) => {}
        }
        match connection.reconnect().await {
            Ok(()) => return Ok(()),
            Err(e) => warn!(error = %e, attempt = *retries, "reconnect failed"),
        }
    }
}
