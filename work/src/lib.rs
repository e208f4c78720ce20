//! Proof-of-work search engine.
//!
//! Finds a suffix such that `SHA1(prefix ‖ suffix)` starts with a required
//! number of zero hex digits. Candidates are generated randomly and checked
//! by a fixed-size pool of workers; the first verified candidate wins and
//! every other worker is cancelled.

pub mod context;
pub mod coordinator;
pub mod difficulty;
pub mod error;
pub mod job;
pub mod pool;
pub mod rate;
pub mod suffix;

pub use context::WorkContext;
pub use coordinator::{verify_suffix, SearchConfig, SearchCoordinator, SearchStrategy, Solver};
pub use difficulty::{
    leading_zero_nibbles, meets_difficulty, meets_difficulty_hex, DifficultyChecker, NibbleMask,
};
pub use error::WorkError;
pub use job::{HashJob, PowJob, PowOutput, SearchJob, Solution};
pub use pool::{Executable, Job, JobId, JobResult, PoolState, ResultStream, WorkerPool};
pub use rate::{HashCounter, RateMonitor, RateSample, RateWindow};
pub use suffix::{SuffixAlphabet, SuffixGenerator, SuffixLength};
