//! Error types for the retry core.

use crate::failure::Failure;
use thiserror::Error;

/// Outcome of a retry execution that did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError {
    /// The operation failed with a terminal kind, or retries ran out.
    /// Carries the last failure observed, unchanged.
    #[error(transparent)]
    Failed(#[from] Failure),

    /// The enclosing task cancelled the execution between attempts.
    #[error("retry cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// Attempts made before cancellation.
        attempts: u32,
        /// Failure of the last attempt, if any attempt ran.
        last_failure: Option<Failure>,
    },
}

impl RetryError {
    /// The failure that ended the execution, if there was one.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            RetryError::Failed(failure) => Some(failure),
            RetryError::Cancelled { last_failure, .. } => last_failure.as_ref(),
        }
    }

    /// Take ownership of the failure, if there was one.
    pub fn into_failure(self) -> Option<Failure> {
        match self {
            RetryError::Failed(failure) => Some(failure),
            RetryError::Cancelled { last_failure, .. } => last_failure,
        }
    }

    /// Whether this execution was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }
}

/// Invalid retry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A backoff schedule needs at least one entry.
    #[error("backoff schedule must contain at least one delay")]
    EmptySchedule,

    /// A schedule entry could not be parsed.
    #[error("invalid backoff delay '{0}': expected milliseconds")]
    InvalidDelay(String),
}
