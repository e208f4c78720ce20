use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkError {
    #[error("work cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("random source failure: {0}")]
    RandomSource(String),

    #[error("invalid suffix length range {min}..={max}")]
    InvalidSuffixLength { min: usize, max: usize },

    #[error("job {job_id} panicked: {reason}")]
    JobPanicked { job_id: String, reason: String },

    #[error("worker pool is not accepting jobs")]
    PoolClosed,

    #[error("worker pool already started")]
    PoolAlreadyStarted,

    #[error("result stream already taken")]
    ResultsTaken,

    #[error("search ended without a solution")]
    Exhausted,
}

impl WorkError {
    /// Cancellation and deadline expiry are expected ways for work to stop,
    /// not failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}
