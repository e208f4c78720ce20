//! Proof-of-work job kinds run by the worker pool.
//!
//! - [`SearchJob`]: a long-running loop that generates, hashes and checks
//!   candidates until one meets the difficulty, its attempt budget runs out,
//!   or the context ends. One per worker in bulk mode.
//! - [`HashJob`]: hashes a single candidate and leaves the difficulty check
//!   to the consumer. Used in streaming mode.

use std::sync::Arc;

use saltpow_crypto::PrefixHasher;
use saltpow_types::{Difficulty, Digest};

use crate::difficulty::DifficultyChecker;
use crate::pool::Executable;
use crate::rate::HashCounter;
use crate::suffix::{SuffixAlphabet, SuffixGenerator, SuffixLength};
use crate::{WorkContext, WorkError};

/// Attempts between context checks and counter updates.
const BATCH_SIZE: u64 = 4096;

/// A suffix that satisfied the difficulty, with its digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    pub suffix: String,
    pub digest: Digest,
}

impl Solution {
    /// Suffix bytes come from ASCII alphabets, so the conversion is lossless.
    pub fn new(suffix: &[u8], digest: Digest) -> Self {
        Self {
            suffix: String::from_utf8_lossy(suffix).into_owned(),
            digest,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SearchJob {
    pub hasher: PrefixHasher,
    pub difficulty: Difficulty,
    pub alphabet: SuffixAlphabet,
    pub length: SuffixLength,
    /// `None` seeds from the OS entropy source inside the job, so an entropy
    /// failure only fails this job.
    pub seed: Option<u64>,
    /// Stop with [`PowOutput::Exhausted`] after this many attempts.
    pub max_attempts: Option<u64>,
    pub counter: HashCounter,
}

#[derive(Clone, Debug)]
pub struct HashJob {
    pub hasher: Arc<PrefixHasher>,
    pub candidate: Vec<u8>,
    pub counter: HashCounter,
}

#[derive(Clone, Debug)]
pub enum PowJob {
    Search(SearchJob),
    Hash(HashJob),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PowOutput {
    Found(Solution),
    /// The job spent its attempt budget without a match.
    Exhausted,
    /// Digest of a single candidate; not yet checked against the difficulty.
    Hashed { candidate: Vec<u8>, digest: Digest },
}

impl Executable for PowJob {
    type Output = PowOutput;

    fn execute(self, ctx: &WorkContext) -> Result<PowOutput, WorkError> {
        match self {
            PowJob::Search(job) => job.run(ctx),
            PowJob::Hash(job) => Ok(job.run()),
        }
    }
}

impl SearchJob {
    fn run(self, ctx: &WorkContext) -> Result<PowOutput, WorkError> {
        let mut generator = match self.seed {
            Some(seed) => SuffixGenerator::from_seed(seed, self.alphabet, self.length),
            None => SuffixGenerator::from_entropy(self.alphabet, self.length)?,
        };
        let checker = DifficultyChecker::new(self.difficulty);
        let mut candidate = Vec::with_capacity(self.length.max());
        let mut attempts = 0u64;

        loop {
            if let Some(reason) = ctx.error() {
                return Err(reason);
            }

            let batch = match self.max_attempts {
                Some(max) if attempts >= max => return Ok(PowOutput::Exhausted),
                Some(max) => BATCH_SIZE.min(max - attempts),
                None => BATCH_SIZE,
            };

            for done in 1..=batch {
                generator.next_into(&mut candidate);
                let digest = self.hasher.digest(&candidate);
                if checker.check(&digest) {
                    self.counter.add(done);
                    return Ok(PowOutput::Found(Solution::new(&candidate, digest)));
                }
            }
            attempts += batch;
            self.counter.add(batch);
        }
    }
}

impl HashJob {
    fn run(self) -> PowOutput {
        let digest = self.hasher.digest(&self.candidate);
        self.counter.incr();
        PowOutput::Hashed {
            candidate: self.candidate,
            digest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saltpow_crypto::sha1_multi;

    use crate::difficulty::meets_difficulty_hex;

    fn search_job(prefix: &str, difficulty: u64) -> SearchJob {
        SearchJob {
            hasher: PrefixHasher::new(prefix.as_bytes()),
            difficulty: Difficulty::new(difficulty).unwrap(),
            alphabet: SuffixAlphabet::Alphanumeric,
            length: SuffixLength::range(5, 12).unwrap(),
            seed: Some(1),
            max_attempts: None,
            counter: HashCounter::new(),
        }
    }

    #[test]
    fn search_finds_valid_suffix() {
        let job = search_job("abc123", 3);
        let counter = job.counter.clone();
        let output = PowJob::Search(job).execute(&WorkContext::new()).unwrap();

        let PowOutput::Found(solution) = output else {
            panic!("expected a solution, got {output:?}");
        };
        let digest = sha1_multi(&[b"abc123".as_slice(), solution.suffix.as_bytes()]);
        assert_eq!(digest, solution.digest);
        assert!(meets_difficulty_hex(&digest, Difficulty::new(3).unwrap()));
        assert!(counter.total() >= 1);
    }

    #[test]
    fn zero_difficulty_wins_on_first_attempt() {
        let job = search_job("", 0);
        let counter = job.counter.clone();
        let output = PowJob::Search(job).execute(&WorkContext::new()).unwrap();
        assert!(matches!(output, PowOutput::Found(_)));
        assert_eq!(counter.total(), 1);
    }

    #[test]
    fn search_respects_attempt_budget() {
        let mut job = search_job("abc123", 40);
        job.max_attempts = Some(10_000);
        let counter = job.counter.clone();
        let output = PowJob::Search(job).execute(&WorkContext::new()).unwrap();
        assert_eq!(output, PowOutput::Exhausted);
        assert_eq!(counter.total(), 10_000);
    }

    #[test]
    fn search_stops_on_cancelled_context() {
        let ctx = WorkContext::new();
        ctx.cancel();
        let result = PowJob::Search(search_job("abc123", 40)).execute(&ctx);
        assert_eq!(result, Err(WorkError::Cancelled));
    }

    #[test]
    fn hash_job_only_hashes() {
        let counter = HashCounter::new();
        let job = HashJob {
            hasher: Arc::new(PrefixHasher::new(b"")),
            candidate: b"l".to_vec(),
            counter: counter.clone(),
        };
        let output = PowJob::Hash(job).execute(&WorkContext::new()).unwrap();
        let PowOutput::Hashed { candidate, digest } = output else {
            panic!("expected a digest");
        };
        assert_eq!(candidate, b"l");
        assert!(digest.to_hex().starts_with("07c342be"));
        assert_eq!(counter.total(), 1);
    }
}
