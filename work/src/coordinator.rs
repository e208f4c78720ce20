//! Search coordination: runs one proof-of-work round per challenge.
//!
//! Two strategies feed the [`WorkerPool`]:
//! - **Bulk**: one long-running [`SearchJob`] per worker, sent up front.
//!   Workers generate, hash and check candidates themselves.
//! - **Streaming**: a producer task sends one [`HashJob`] per candidate while
//!   the coordinator checks every returned digest itself.
//!
//! Either way the first candidate that passes an independent re-check wins,
//! the round's context is cancelled, and the pool is awaited before
//! returning. A round is bounded by `round_timeout`.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use saltpow_crypto::{sha1_multi, PrefixHasher};
use saltpow_types::{Challenge, Difficulty};
use saltpow_utils::format_duration;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::difficulty::{meets_difficulty_hex, DifficultyChecker};
use crate::job::{HashJob, PowJob, PowOutput, SearchJob, Solution};
use crate::pool::{Job, JobResult, ResultStream, WorkerPool};
use crate::rate::HashCounter;
use crate::suffix::{SuffixAlphabet, SuffixGenerator, SuffixLength, FORBIDDEN_BYTES};
use crate::{WorkContext, WorkError};

/// Default bound on a single round.
pub const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    #[default]
    Bulk,
    Streaming,
}

impl SearchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bulk => "bulk",
            Self::Streaming => "streaming",
        }
    }
}

impl FromStr for SearchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bulk" => Ok(Self::Bulk),
            "streaming" => Ok(Self::Streaming),
            other => Err(format!("unknown search strategy: {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub workers: usize,
    pub strategy: SearchStrategy,
    pub alphabet: SuffixAlphabet,
    pub suffix_length: SuffixLength,
    pub round_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            strategy: SearchStrategy::default(),
            alphabet: SuffixAlphabet::default(),
            suffix_length: SuffixLength::default(),
            round_timeout: DEFAULT_ROUND_TIMEOUT,
        }
    }
}

/// Something that can produce a verified suffix for a challenge.
///
/// The protocol session only depends on this, so tests can swap in a
/// scripted solver.
pub trait Solver: Send + Sync {
    fn solve(
        &self,
        challenge: &Challenge,
        shutdown: &CancellationToken,
    ) -> impl Future<Output = Result<Solution, WorkError>> + Send;
}

impl<S: Solver> Solver for Arc<S> {
    fn solve(
        &self,
        challenge: &Challenge,
        shutdown: &CancellationToken,
    ) -> impl Future<Output = Result<Solution, WorkError>> + Send {
        (**self).solve(challenge, shutdown)
    }
}

/// Recompute the digest from scratch and check it against the difficulty.
///
/// Rejects empty suffixes and any suffix containing newline, carriage
/// return, tab or space.
pub fn verify_suffix(prefix: &str, suffix: &str, difficulty: Difficulty) -> bool {
    if suffix.is_empty() || suffix.bytes().any(|b| FORBIDDEN_BYTES.contains(&b)) {
        return false;
    }
    let digest = sha1_multi(&[prefix.as_bytes(), suffix.as_bytes()]);
    meets_difficulty_hex(&digest, difficulty)
}

pub struct SearchCoordinator {
    config: SearchConfig,
    counter: HashCounter,
}

impl SearchCoordinator {
    pub fn new(config: SearchConfig) -> Self {
        Self::with_counter(config, HashCounter::new())
    }

    /// Share an existing counter, e.g. one a [`RateMonitor`](crate::RateMonitor) is sampling.
    pub fn with_counter(config: SearchConfig, counter: HashCounter) -> Self {
        Self { config, counter }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn counter(&self) -> &HashCounter {
        &self.counter
    }

    pub fn verify(&self, challenge: &Challenge, suffix: &str) -> bool {
        verify_suffix(&challenge.prefix, suffix, challenge.difficulty)
    }

    /// Run one round. Returns the first verified solution, or
    /// [`WorkError::DeadlineExceeded`] / [`WorkError::Cancelled`] when the
    /// round timeout passes or `shutdown` fires first.
    pub async fn solve(
        &self,
        challenge: &Challenge,
        shutdown: &CancellationToken,
    ) -> Result<Solution, WorkError> {
        let ctx = WorkContext::child_of(shutdown).with_timeout(self.config.round_timeout);
        let started = Instant::now();
        let attempts_before = self.counter.total();
        info!(
            difficulty = %challenge.difficulty,
            workers = self.config.workers,
            strategy = self.config.strategy.as_str(),
            timeout = %format_duration(self.config.round_timeout.as_secs()),
            "starting proof-of-work round"
        );

        let outcome = match self.config.strategy {
            SearchStrategy::Bulk => self.solve_bulk(challenge, &ctx).await,
            SearchStrategy::Streaming => self.solve_streaming(challenge, &ctx).await,
        };

        let attempts = self.counter.total().saturating_sub(attempts_before);
        let elapsed = started.elapsed();
        match &outcome {
            Ok(solution) => info!(
                suffix = %solution.suffix,
                digest = %solution.digest,
                attempts,
                elapsed = %format_duration(elapsed.as_secs()),
                "proof-of-work solved"
            ),
            Err(e) => warn!(
                error = %e,
                attempts,
                elapsed = %format_duration(elapsed.as_secs()),
                "proof-of-work round ended without a solution"
            ),
        }
        outcome
    }

    async fn solve_bulk(
        &self,
        challenge: &Challenge,
        ctx: &WorkContext,
    ) -> Result<Solution, WorkError> {
        let (pool, runner) = spawn_pool(self.config.workers, ctx);
        let mut results = pool.results()?;

        let hasher = PrefixHasher::new(challenge.prefix.as_bytes());
        let jobs = (0..pool.worker_count()).map(|i| {
            Job::new(
                format!("search-{i}"),
                PowJob::Search(SearchJob {
                    hasher: hasher.clone(),
                    difficulty: challenge.difficulty,
                    alphabet: self.config.alphabet,
                    length: self.config.suffix_length,
                    seed: None,
                    max_attempts: None,
                    counter: self.counter.clone(),
                }),
            )
        });

        let outcome = match pool.send_bulk(jobs).await {
            Ok(()) => {
                let mut running = pool.worker_count();
                await_winner(challenge, ctx, &mut results, |result| {
                    match result.outcome {
                        Ok(PowOutput::Found(solution)) => Some(Ok(solution)),
                        Err(e) if e.is_cancellation() => Some(Err(e)),
                        Ok(PowOutput::Exhausted) | Ok(PowOutput::Hashed { .. }) => {
                            running -= 1;
                            (running == 0).then_some(Err(WorkError::Exhausted))
                        }
                        Err(e) => {
                            running -= 1;
                            warn!(job = ?result.job_id, error = %e, "search job failed");
                            (running == 0).then_some(Err(e))
                        }
                    }
                })
                .await
            }
            Err(e) => Err(ctx.error().unwrap_or(e)),
        };

        finish_round(ctx, &pool, results, runner).await;
        outcome
    }

    async fn solve_streaming(
        &self,
        challenge: &Challenge,
        ctx: &WorkContext,
    ) -> Result<Solution, WorkError> {
        let generator = SuffixGenerator::from_entropy(self.config.alphabet, self.config.suffix_length)?;
        let (pool, runner) = spawn_pool(self.config.workers, ctx);
        let mut results = pool.results()?;

        let hasher = Arc::new(PrefixHasher::new(challenge.prefix.as_bytes()));
        let producer = tokio::spawn(produce_candidates(
            Arc::clone(&pool),
            ctx.clone(),
            generator,
            hasher,
            self.counter.clone(),
        ));

        let checker = DifficultyChecker::new(challenge.difficulty);
        let outcome = await_winner(challenge, ctx, &mut results, |result| match result.outcome {
            Ok(PowOutput::Hashed { candidate, digest }) => checker
                .check(&digest)
                .then(|| Ok(Solution::new(&candidate, digest))),
            Ok(PowOutput::Found(solution)) => Some(Ok(solution)),
            Ok(PowOutput::Exhausted) => None,
            Err(e) if e.is_cancellation() => Some(Err(e)),
            Err(e) => {
                warn!(job = ?result.job_id, error = %e, "hash job failed");
                None
            }
        })
        .await;

        ctx.cancel();
        if let Err(e) = producer.await {
            warn!(error = %e, "candidate producer failed");
        }
        finish_round(ctx, &pool, results, runner).await;
        outcome
    }
}

impl Solver for SearchCoordinator {
    fn solve(
        &self,
        challenge: &Challenge,
        shutdown: &CancellationToken,
    ) -> impl Future<Output = Result<Solution, WorkError>> + Send {
        SearchCoordinator::solve(self, challenge, shutdown)
    }
}

type PoolRunner = JoinHandle<Result<(), WorkError>>;

fn spawn_pool(workers: usize, ctx: &WorkContext) -> (Arc<WorkerPool<PowJob>>, PoolRunner) {
    let pool = Arc::new(WorkerPool::new(workers));
    let runner = {
        let pool = Arc::clone(&pool);
        let ctx = ctx.clone();
        tokio::spawn(async move { pool.run(ctx).await })
    };
    (pool, runner)
}

/// Drain results until `decide` yields an outcome. Winners are re-verified
/// before being accepted; a rejected candidate is logged and skipped.
async fn await_winner<F>(
    challenge: &Challenge,
    ctx: &WorkContext,
    results: &mut ResultStream<PowOutput>,
    mut decide: F,
) -> Result<Solution, WorkError>
where
    F: FnMut(JobResult<PowOutput>) -> Option<Result<Solution, WorkError>>,
{
    loop {
        let result = tokio::select! {
            result = results.next() => result,
            _ = ctx.done() => return Err(ctx.error().unwrap_or(WorkError::Cancelled)),
        };

        let Some(result) = result else {
            return Err(ctx.error().unwrap_or(WorkError::Exhausted));
        };

        match decide(result) {
            Some(Ok(solution)) => {
                if verify_suffix(&challenge.prefix, &solution.suffix, challenge.difficulty) {
                    return Ok(solution);
                }
                warn!(suffix = %solution.suffix, "candidate failed verification, ignoring");
            }
            Some(Err(e)) if e.is_cancellation() => {
                return Err(ctx.error().unwrap_or(e));
            }
            Some(Err(e)) => return Err(e),
            None => {}
        }
    }
}

/// Stop every worker and wait for the pool to wind down.
async fn finish_round(
    ctx: &WorkContext,
    pool: &WorkerPool<PowJob>,
    results: ResultStream<PowOutput>,
    runner: PoolRunner,
) {
    ctx.cancel();
    pool.close();
    drop(results);
    match runner.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "worker pool exited with error"),
        Err(e) => warn!(error = %e, "worker pool task failed"),
    }
    debug!("proof-of-work round finished");
}

async fn produce_candidates(
    pool: Arc<WorkerPool<PowJob>>,
    ctx: WorkContext,
    mut generator: SuffixGenerator,
    hasher: Arc<PrefixHasher>,
    counter: HashCounter,
) {
    let mut sequence = 0u64;
    loop {
        let job = Job::new(
            sequence.to_string(),
            PowJob::Hash(HashJob {
                hasher: Arc::clone(&hasher),
                candidate: generator.next_suffix(),
                counter: counter.clone(),
            }),
        );
        let sent = tokio::select! {
            biased;
            _ = ctx.done() => break,
            sent = pool.send(job) => sent,
        };
        if sent.is_err() {
            break;
        }
        sequence += 1;
    }
    debug!(sent = sequence, "candidate producer stopped");
    pool.close();
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID_SUFFIX: &str = "543935c4-59e1-4b85-b062-4f9b01914336";

    fn challenge(prefix: &str, difficulty: u64) -> Challenge {
        Challenge::new(prefix, Difficulty::new(difficulty).unwrap())
    }

    fn coordinator(strategy: SearchStrategy, timeout: Duration) -> SearchCoordinator {
        SearchCoordinator::new(SearchConfig {
            workers: 2,
            strategy,
            alphabet: SuffixAlphabet::Alphanumeric,
            suffix_length: SuffixLength::range(5, 16).unwrap(),
            round_timeout: timeout,
        })
    }

    #[test]
    fn known_suffixes_verify() {
        assert!(verify_suffix("", "l", Difficulty::new(1).unwrap()));
        assert!(!verify_suffix("", "l", Difficulty::new(2).unwrap()));
        assert!(verify_suffix("", UUID_SUFFIX, Difficulty::new(2).unwrap()));
    }

    #[test]
    fn forbidden_or_empty_suffix_rejected() {
        assert!(!verify_suffix("", "", Difficulty::ZERO));
        assert!(!verify_suffix("", "a b", Difficulty::ZERO));
        assert!(!verify_suffix("", "ab\n", Difficulty::ZERO));
        assert!(verify_suffix("", "ab", Difficulty::ZERO));
    }

    #[test]
    fn strategy_from_str() {
        assert_eq!("Streaming".parse::<SearchStrategy>().unwrap(), SearchStrategy::Streaming);
        assert_eq!(SearchStrategy::Bulk.as_str(), "bulk");
        assert!("random".parse::<SearchStrategy>().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn bulk_finds_verified_suffix() {
        let coordinator = coordinator(SearchStrategy::Bulk, Duration::from_secs(60));
        let challenge = challenge("abc123", 3);
        let solution = coordinator
            .solve(&challenge, &CancellationToken::new())
            .await
            .unwrap();
        assert!(coordinator.verify(&challenge, &solution.suffix));
        assert!(solution.digest.to_hex().starts_with("000"));
        assert!(coordinator.counter().total() > 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn streaming_finds_verified_suffix() {
        let coordinator = coordinator(SearchStrategy::Streaming, Duration::from_secs(60));
        let challenge = challenge("", 1);
        let solution = coordinator
            .solve(&challenge, &CancellationToken::new())
            .await
            .unwrap();
        assert!(verify_suffix("", &solution.suffix, challenge.difficulty));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn zero_difficulty_accepts_first_candidate() {
        for strategy in [SearchStrategy::Bulk, SearchStrategy::Streaming] {
            let coordinator = coordinator(strategy, Duration::from_secs(60));
            let solution = coordinator
                .solve(&challenge("prefix", 0), &CancellationToken::new())
                .await
                .unwrap();
            assert!(!solution.suffix.is_empty());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unreachable_difficulty_hits_deadline() {
        for strategy in [SearchStrategy::Bulk, SearchStrategy::Streaming] {
            let coordinator = coordinator(strategy, Duration::from_millis(50));
            let result = coordinator
                .solve(&challenge("abc123", 40), &CancellationToken::new())
                .await;
            assert_eq!(result, Err(WorkError::DeadlineExceeded));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_cancels_round() {
        let coordinator = coordinator(SearchStrategy::Bulk, Duration::from_secs(60));
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let result = coordinator.solve(&challenge("abc123", 40), &shutdown).await;
        assert_eq!(result, Err(WorkError::Cancelled));
    }
}
