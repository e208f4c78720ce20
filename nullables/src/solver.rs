//! Nullable solver: scripted proof-of-work outcomes.

use std::future::Future;
use std::sync::Mutex;

use saltpow_crypto::sha1_multi;
use saltpow_types::Challenge;
use saltpow_work::{Solution, Solver, WorkError};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug)]
enum Outcome {
    Suffix(String),
    Fail(WorkError),
    /// Block until shutdown, then report cancellation.
    UntilShutdown,
}

/// A solver for testing.
///
/// Returns pre-configured outcomes in order, repeating the last one once the
/// script runs out, and records every challenge it was given.
pub struct NullSolver {
    outcomes: Vec<Outcome>,
    challenges: Mutex<Vec<Challenge>>,
}

impl NullSolver {
    fn new(outcomes: Vec<Outcome>) -> Self {
        Self {
            outcomes,
            challenges: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `suffix`. Its digest is computed honestly, so the
    /// caller's own verification decides whether it is accepted.
    pub fn returning(suffix: impl Into<String>) -> Self {
        Self::new(vec![Outcome::Suffix(suffix.into())])
    }

    /// Answer with each suffix in turn.
    pub fn sequence<I, T>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(suffixes.into_iter().map(|s| Outcome::Suffix(s.into())).collect())
    }

    pub fn failing(error: WorkError) -> Self {
        Self::new(vec![Outcome::Fail(error)])
    }

    /// Never finish on its own; resolves with `Cancelled` on shutdown.
    pub fn until_shutdown() -> Self {
        Self::new(vec![Outcome::UntilShutdown])
    }

    /// Challenges received so far (for assertions).
    pub fn challenges(&self) -> Vec<Challenge> {
        self.challenges.lock().unwrap().clone()
    }

    fn next_outcome(&self, challenge: &Challenge) -> Outcome {
        let mut seen = self.challenges.lock().unwrap();
        let index = seen.len().min(self.outcomes.len().saturating_sub(1));
        seen.push(challenge.clone());
        self.outcomes
            .get(index)
            .cloned()
            .unwrap_or(Outcome::Fail(WorkError::Exhausted))
    }
}

impl Solver for NullSolver {
    fn solve(
        &self,
        challenge: &Challenge,
        shutdown: &CancellationToken,
    ) -> impl Future<Output = Result<Solution, WorkError>> + Send {
        let outcome = self.next_outcome(challenge);
        let prefix = challenge.prefix.clone();
        let shutdown = shutdown.clone();
        async move {
            match outcome {
                Outcome::Suffix(suffix) => {
                    let digest = sha1_multi(&[prefix.as_bytes(), suffix.as_bytes()]);
                    Ok(Solution { suffix, digest })
                }
                Outcome::Fail(error) => Err(error),
                Outcome::UntilShutdown => {
                    shutdown.cancelled().await;
                    Err(WorkError::Cancelled)
                }
            }
        }
    }
}
