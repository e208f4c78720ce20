//! Fixed-size worker pool fed by a bounded job queue.
//!
//! The pool owns a job queue and a result queue, both bounded to the worker
//! count. [`WorkerPool::run`] starts the workers and only returns once every
//! one of them has exited, so it must be spawned as a background task while
//! the caller sends jobs and drains [`ResultStream`]. Awaiting `run` inline
//! before sending anything would deadlock.
//!
//! Worker lifecycle: `Idle → Executing → Idle` per job, `Idle → Cancelled`
//! once the context ends. A cancelled worker reports one result carrying
//! [`WorkError::Cancelled`] or [`WorkError::DeadlineExceeded`] and exits.
//! Job failures are forwarded verbatim and never retried.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

use crate::{WorkContext, WorkError};

pub type JobId = String;

/// A job payload the pool knows how to run.
///
/// `execute` runs on a blocking thread, so it may loop on CPU-bound work,
/// but it should poll `ctx` regularly and return once it is done.
pub trait Executable: Send + 'static {
    type Output: Send + 'static;

    fn execute(self, ctx: &WorkContext) -> Result<Self::Output, WorkError>;
}

#[derive(Debug)]
pub struct Job<P> {
    pub id: JobId,
    pub payload: P,
}

impl<P> Job<P> {
    pub fn new(id: impl Into<JobId>, payload: P) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

/// Outcome of one job, or of one worker observing cancellation (`job_id` is
/// `None` in that case).
#[derive(Debug)]
pub struct JobResult<T> {
    pub job_id: Option<JobId>,
    pub outcome: Result<T, WorkError>,
}

impl<T> JobResult<T> {
    fn interrupted(reason: WorkError) -> Self {
        Self {
            job_id: None,
            outcome: Err(reason),
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(&self.outcome, Err(e) if e.is_cancellation())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolState {
    Created,
    Running,
    /// Cancelled or closed for input; workers are finishing.
    Draining,
    /// Every worker has exited and the result stream is closed.
    Done,
}

impl PoolState {
    fn accepts_jobs(self) -> bool {
        matches!(self, Self::Created | Self::Running)
    }
}

/// Results produced by the pool, in completion order. Ends once the pool is done.
#[derive(Debug)]
pub struct ResultStream<T> {
    rx: mpsc::Receiver<JobResult<T>>,
}

impl<T> ResultStream<T> {
    pub async fn next(&mut self) -> Option<JobResult<T>> {
        self.rx.recv().await
    }
}

pub struct WorkerPool<P: Executable> {
    worker_count: usize,
    jobs_tx: StdMutex<Option<mpsc::Sender<Job<P>>>>,
    jobs_rx: Arc<Mutex<mpsc::Receiver<Job<P>>>>,
    results_tx: StdMutex<Option<mpsc::Sender<JobResult<P::Output>>>>,
    results_rx: StdMutex<Option<mpsc::Receiver<JobResult<P::Output>>>>,
    state: watch::Sender<PoolState>,
}

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<P: Executable> WorkerPool<P> {
    /// Allocate the queues. No workers run until [`run`](Self::run).
    ///
    /// A worker count of zero is raised to one.
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (jobs_tx, jobs_rx) = mpsc::channel(worker_count);
        let (results_tx, results_rx) = mpsc::channel(worker_count);
        let (state, _) = watch::channel(PoolState::Created);
        Self {
            worker_count,
            jobs_tx: StdMutex::new(Some(jobs_tx)),
            jobs_rx: Arc::new(Mutex::new(jobs_rx)),
            results_tx: StdMutex::new(Some(results_tx)),
            results_rx: StdMutex::new(Some(results_rx)),
            state,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn state(&self) -> PoolState {
        *self.state.borrow()
    }

    /// Start the workers and wait until all of them have exited.
    ///
    /// Can only be called once per pool.
    pub async fn run(&self, ctx: WorkContext) -> Result<(), WorkError> {
        let results_tx = lock(&self.results_tx)
            .take()
            .ok_or(WorkError::PoolAlreadyStarted)?;
        self.state.send_if_modified(|state| {
            if *state == PoolState::Created {
                *state = PoolState::Running;
                true
            } else {
                false
            }
        });
        debug!(workers = self.worker_count, "worker pool running");

        let mut workers = JoinSet::new();
        for index in 0..self.worker_count {
            workers.spawn(worker_loop(
                index,
                ctx.clone(),
                Arc::clone(&self.jobs_rx),
                results_tx.clone(),
            ));
        }
        drop(results_tx);

        let mut draining = false;
        loop {
            tokio::select! {
                joined = workers.join_next() => match joined {
                    Some(Ok(())) => {}
                    Some(Err(e)) => warn!(error = %e, "worker task failed"),
                    None => break,
                },
                _ = ctx.done(), if !draining => {
                    draining = true;
                    self.state.send_replace(PoolState::Draining);
                }
            }
        }

        self.state.send_replace(PoolState::Done);
        debug!("worker pool done");
        Ok(())
    }

    /// Queue one job, waiting for a free slot.
    ///
    /// Fails with [`WorkError::PoolClosed`] once input is closed or the pool
    /// is draining.
    pub async fn send(&self, job: Job<P>) -> Result<(), WorkError> {
        let tx = lock(&self.jobs_tx).clone().ok_or(WorkError::PoolClosed)?;
        tokio::select! {
            biased;
            _ = wait_for_state(self.state.subscribe(), |s| !s.accepts_jobs()) => {
                Err(WorkError::PoolClosed)
            }
            sent = tx.send(job) => sent.map_err(|_| WorkError::PoolClosed),
        }
    }

    /// Queue a known set of jobs, then close the input side.
    ///
    /// Do not mix with concurrent [`send`](Self::send) calls.
    pub async fn send_bulk(&self, jobs: impl IntoIterator<Item = Job<P>>) -> Result<(), WorkError> {
        let mut outcome = Ok(());
        for job in jobs {
            if let Err(e) = self.send(job).await {
                outcome = Err(e);
                break;
            }
        }
        self.close();
        outcome
    }

    /// Stop accepting jobs. Workers exit after draining what is queued.
    pub fn close(&self) {
        if lock(&self.jobs_tx).take().is_some() {
            trace!("job queue closed");
        }
        self.state.send_if_modified(|state| {
            if *state == PoolState::Running {
                *state = PoolState::Draining;
                true
            } else {
                false
            }
        });
    }

    /// Take the result stream. Available once per pool.
    pub fn results(&self) -> Result<ResultStream<P::Output>, WorkError> {
        lock(&self.results_rx)
            .take()
            .map(|rx| ResultStream { rx })
            .ok_or(WorkError::ResultsTaken)
    }

    /// Resolves once every worker has exited.
    pub async fn done(&self) {
        wait_for_state(self.state.subscribe(), |s| s == PoolState::Done).await;
    }
}

async fn wait_for_state(
    mut state: watch::Receiver<PoolState>,
    predicate: impl Fn(PoolState) -> bool,
) {
    let _ = state.wait_for(|s| predicate(*s)).await;
}

async fn next_job<P>(jobs: &Mutex<mpsc::Receiver<Job<P>>>) -> Option<Job<P>> {
    jobs.lock().await.recv().await
}

async fn worker_loop<P: Executable>(
    index: usize,
    ctx: WorkContext,
    jobs: Arc<Mutex<mpsc::Receiver<Job<P>>>>,
    results: mpsc::Sender<JobResult<P::Output>>,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = ctx.done() => None,
            job = next_job(&jobs) => Some(job),
        };

        let job = match next {
            None => {
                let reason = ctx.error().unwrap_or(WorkError::Cancelled);
                debug!(worker = index, %reason, "worker cancelled");
                let _ = results.send(JobResult::interrupted(reason)).await;
                return;
            }
            Some(None) => {
                trace!(worker = index, "job queue drained");
                return;
            }
            Some(Some(job)) => job,
        };

        let result = execute(job, &ctx).await;
        if results.send(result).await.is_err() {
            trace!(worker = index, "result stream dropped");
            return;
        }
    }
}

async fn execute<P: Executable>(job: Job<P>, ctx: &WorkContext) -> JobResult<P::Output> {
    let Job { id, payload } = job;
    let job_ctx = ctx.clone();
    let outcome = match tokio::task::spawn_blocking(move || payload.execute(&job_ctx)).await {
        Ok(outcome) => outcome,
        Err(e) => Err(WorkError::JobPanicked {
            job_id: id.clone(),
            reason: e.to_string(),
        }),
    };
    JobResult {
        job_id: Some(id),
        outcome,
    }
}
