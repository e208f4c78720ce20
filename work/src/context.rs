//! Cancellable work context with an optional deadline.
//!
//! Every operation that can block on the search path takes a [`WorkContext`]
//! and checks it at its suspension points. Cancellation is cooperative: a
//! hash already being computed finishes before the worker notices.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::WorkError;

#[derive(Clone, Debug)]
pub struct WorkContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl WorkContext {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// A context cancelled whenever `parent` is, but which can also be
    /// cancelled on its own without affecting the parent.
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            deadline: None,
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Set the deadline; an earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.is_expired()
    }

    /// Why the context ended, or `None` while it is still live.
    pub fn error(&self) -> Option<WorkError> {
        if self.is_expired() {
            Some(WorkError::DeadlineExceeded)
        } else if self.token.is_cancelled() {
            Some(WorkError::Cancelled)
        } else {
            None
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

impl Default for WorkContext {
    fn default() -> Self {
        Self::new()
    }
}
