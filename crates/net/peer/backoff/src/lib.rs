//! Cancellable exponential backoff for outbound peer calls.
//!
//! [`Backoff::retry`] wraps any fallible async operation. Failures the error
//! type marks as [`Retryable`] are retried on an exponential schedule until the
//! attempt budget is spent; other failures return immediately. Cancelling the
//! token aborts both in-flight attempts and pending delays.

mod config;

pub use config::{
    BackoffConfig, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
    DEFAULT_MULTIPLIER,
};

use std::fmt;
use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Classifies errors as worth retrying or not.
///
/// Transport failures are usually transient. Deliberate remote decisions
/// (rejections, rate limits) are not and must return on the first attempt.
pub trait Retryable {
    fn is_retryable(&self) -> bool {
        true
    }
}

/// Error returned by [`Backoff::retry`].
#[derive(Debug, thiserror::Error)]
pub enum BackoffError<E> {
    /// The cancellation token fired before the operation succeeded.
    #[error("operation cancelled")]
    Cancelled,
    /// The operation failed; `source` is the last observed error.
    #[error("operation failed after {attempts} attempt(s): {source}")]
    Failed { attempts: u32, source: E },
}

impl<E> BackoffError<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The last operation error, if the failure was not a cancellation.
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::Cancelled => None,
            Self::Failed { source, .. } => Some(source),
        }
    }

    /// Collapse into the operation's error type.
    pub fn unwrap_or_else(self, cancelled: impl FnOnce() -> E) -> E {
        match self {
            Self::Cancelled => cancelled(),
            Self::Failed { source, .. } => source,
        }
    }
}

/// Retry policy shared by all outbound calls of a client.
#[derive(Debug, Clone, Default)]
pub struct Backoff {
    config: BackoffConfig,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, runs out
    /// of attempts, or `cancel` fires.
    pub async fn retry<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, BackoffError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + fmt::Display,
    {
        let max_attempts = self.config.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            if cancel.is_cancelled() {
                return Err(BackoffError::Cancelled);
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BackoffError::Cancelled),
                result = op() => result,
            };

            let error = match result {
                Ok(value) => {
                    trace!(attempt, "operation succeeded");
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                debug!(attempt, %error, "operation failed with non-retryable error");
                return Err(BackoffError::Failed {
                    attempts: attempt,
                    source: error,
                });
            }

            if attempt >= max_attempts {
                debug!(attempt, %error, "retry budget exhausted");
                return Err(BackoffError::Failed {
                    attempts: attempt,
                    source: error,
                });
            }

            let delay = self.config.delay(attempt);
            debug!(attempt, max_attempts, ?delay, %error, "operation failed, backing off");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BackoffError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
