//! Retry loop over a caller-supplied async operation.

use super::clock::{Clock, TokioClock};
use super::config::RetryConfig;
use crate::classify::classify;
use crate::error::RetryError;
use crate::failure::Failure;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Callback invoked before each retry with `(attempt_number, max_attempts)`.
pub type OnRetry = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// Per-call options for [`RetryExecutor::execute_with`].
#[derive(Clone, Default)]
pub struct RetryOptions {
    max_attempts: Option<u32>,
    on_retry: Option<OnRetry>,
    cancel: Option<CancellationToken>,
}

impl RetryOptions {
    /// Options that use the executor's defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the number of attempts for this call. Zero is treated as one.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Run `callback(attempt, max_attempts)` after each backoff wait, just
    /// before the next attempt starts.
    pub fn on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    /// Stop retrying once `token` is cancelled.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_attempts", &self.max_attempts)
            .field("on_retry", &self.on_retry.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}

/// State owned by one execution; dropped when it returns.
#[derive(Debug, Default)]
struct AttemptState {
    attempt: u32,
    last_failure: Option<Failure>,
}

impl AttemptState {
    fn cancelled(self) -> RetryError {
        RetryError::Cancelled {
            attempts: self.attempt,
            last_failure: self.last_failure,
        }
    }
}

/// Runs operations with classification-driven retries.
///
/// The executor holds no per-call state, so one instance can be cloned or
/// shared across any number of concurrent calls.
///
/// # Examples
///
/// ```rust
/// use apiguard_core::prelude::*;
///
/// # async fn example() -> Result<(), RetryError> {
/// let executor = RetryExecutor::new(RetryConfig::default());
///
/// let value = executor
///     .execute(|| async { Ok::<_, Failure>(42) })
///     .await?;
/// assert_eq!(value, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
    clock: Arc<dyn Clock>,
}

impl RetryExecutor {
    /// Executor that sleeps on the tokio timer.
    pub fn new(config: RetryConfig) -> Self {
        Self::with_clock(config, TokioClock)
    }

    /// Executor with a custom clock.
    pub fn with_clock(config: RetryConfig, clock: impl Clock + 'static) -> Self {
        Self {
            config,
            clock: Arc::new(clock),
        }
    }

    /// Configuration this executor was built with.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` with the configured defaults.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Failure>,
    {
        self.execute_with(operation, RetryOptions::default()).await
    }

    /// Run `operation` until it succeeds, hits a terminal failure, runs out
    /// of attempts, or is cancelled.
    ///
    /// The returned failure is always the last one observed, unchanged.
    pub async fn execute_with<F, Fut, T, E>(
        &self,
        mut operation: F,
        options: RetryOptions,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Failure>,
    {
        let max_attempts = options
            .max_attempts
            .unwrap_or(self.config.max_retries)
            .max(1);
        let mut state = AttemptState::default();

        loop {
            if is_cancelled(options.cancel.as_ref()) {
                return Err(state.cancelled());
            }

            let failure = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err.into(),
            };

            let verdict = classify(&failure);
            if !verdict.retryable || state.attempt + 1 >= max_attempts {
                tracing::debug!(
                    attempt = state.attempt + 1,
                    max_attempts,
                    kind = %verdict.reason,
                    retryable = verdict.retryable,
                    "Giving up on API call"
                );
                return Err(RetryError::Failed(failure));
            }
            state.last_failure = Some(failure);

            let delay = self.config.backoff_schedule.delay_for(state.attempt);
            match options.cancel.as_ref() {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(state.cancelled()),
                        _ = self.clock.sleep(delay) => {}
                    }
                }
                None => self.clock.sleep(delay).await,
            }

            if is_cancelled(options.cancel.as_ref()) {
                return Err(state.cancelled());
            }

            state.attempt += 1;
            if let Some(on_retry) = &options.on_retry {
                on_retry(state.attempt, max_attempts);
            }

            tracing::info!(
                attempt = state.attempt,
                max_attempts,
                kind = %verdict.reason,
                delay_ms = delay.as_millis() as u64,
                "Retrying API call"
            );
        }
    }
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

fn is_cancelled(token: Option<&CancellationToken>) -> bool {
    token.is_some_and(CancellationToken::is_cancelled)
}
