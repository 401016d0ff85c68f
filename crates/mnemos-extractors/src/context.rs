//! Cancellation and deadline scope for a single extractor run.

use crate::error::ExtractorError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Cancellation signal and optional deadline governing an extractor run.
///
/// Clones share the same cancellation token.
#[derive(Debug, Clone, Default)]
pub struct ExtractContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl ExtractContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context driven by an externally owned token.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Set a deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fail if the context is already cancelled or past its deadline.
    pub fn check(&self, stage: &str) -> Result<(), ExtractorError> {
        if self.cancel.is_cancelled() {
            return Err(cancelled(stage));
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(deadline_exceeded(stage));
        }
        Ok(())
    }

    /// Drive `future` unless the context is cancelled or expires first.
    ///
    /// The future is dropped on cancellation, so no work it would have done
    /// after its current suspension point happens.
    pub async fn run<F>(&self, stage: &str, future: F) -> Result<F::Output, ExtractorError>
    where
        F: Future,
    {
        self.check(stage)?;
        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(cancelled(stage)),
            _ = expired => Err(deadline_exceeded(stage)),
            output = future => Ok(output),
        }
    }
}

fn cancelled(stage: &str) -> ExtractorError {
    ExtractorError::new(format!("extraction cancelled while {stage}"))
}

fn deadline_exceeded(stage: &str) -> ExtractorError {
    ExtractorError::new(format!("extraction deadline exceeded while {stage}"))
}
