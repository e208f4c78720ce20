//! Hash-rate accounting.
//!
//! Workers add to a shared [`HashCounter`]; a [`RateMonitor`] samples it on
//! an interval and logs the rate over a sliding window of recent samples.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use saltpow_utils::format_hash_rate;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Samples kept in the sliding window.
const WINDOW_SAMPLES: usize = 10;

/// Total attempts since start, shared across workers.
#[derive(Clone, Debug, Default)]
pub struct HashCounter(Arc<AtomicU64>);

impl HashCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, attempts: u64) {
        self.0.fetch_add(attempts, Ordering::Relaxed);
    }

    pub fn incr(&self) {
        self.add(1);
    }

    pub fn total(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateSample {
    /// Attempts made within `window`.
    pub attempts: u64,
    pub window: Duration,
    pub hashes_per_sec: f64,
}

impl RateSample {
    pub fn megahashes(&self) -> f64 {
        self.hashes_per_sec / 1_000_000.0
    }
}

/// Sliding window over `(time, total)` observations.
#[derive(Debug)]
pub struct RateWindow {
    samples: VecDeque<(Instant, u64)>,
    capacity: usize,
}

impl RateWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record the counter total at `now` and return the rate across the window.
    pub fn observe(&mut self, now: Instant, total: u64) -> RateSample {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back((now, total));

        let (start, first) = self.samples.front().copied().unwrap_or((now, total));
        let window = now.saturating_duration_since(start);
        let attempts = total.saturating_sub(first);
        let hashes_per_sec = if window.is_zero() {
            0.0
        } else {
            attempts as f64 / window.as_secs_f64()
        };
        RateSample {
            attempts,
            window,
            hashes_per_sec,
        }
    }
}

impl Default for RateWindow {
    fn default() -> Self {
        Self::new(WINDOW_SAMPLES)
    }
}

/// Background task that periodically logs the hash rate.
pub struct RateMonitor;

impl RateMonitor {
    /// Spawn the monitor. It stops when `shutdown` is cancelled and returns
    /// the overall rate since this call.
    pub fn spawn(
        counter: HashCounter,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<RateSample> {
        let started = Instant::now();
        let initial = counter.total();
        tokio::spawn(async move {
            let mut window = RateWindow::default();
            window.observe(started, initial);

            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let sample = window.observe(Instant::now(), counter.total());
                        if sample.attempts > 0 {
                            info!(
                                rate = %format_hash_rate(sample.hashes_per_sec),
                                total = counter.total(),
                                "hash rate"
                            );
                        }
                    }
                }
            }

            let mut overall = RateWindow::new(2);
            overall.observe(started, initial);
            let summary = overall.observe(Instant::now(), counter.total());
            debug!(
                attempts = summary.attempts,
                elapsed = ?summary.window,
                "rate monitor stopped"
            );
            summary
        })
    }
}
