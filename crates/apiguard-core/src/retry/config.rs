//! Retry configuration table.

use super::schedule::BackoffSchedule;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of attempts (including the first).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Retry settings fixed at startup.
///
/// `max_retries` bounds the *total* number of attempts, first call
/// included: with the default of 3 an always-failing operation runs three
/// times and waits twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per execution, first call included.
    pub max_retries: u32,
    /// Wait before each retry, in milliseconds when serialized.
    pub backoff_schedule: BackoffSchedule,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_schedule: BackoffSchedule::default(),
        }
    }
}

impl RetryConfig {
    /// Create a new builder for configuring retries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use apiguard_core::retry::RetryConfig;
    ///
    /// let config = RetryConfig::builder()
    ///     .max_retries(5)
    ///     .backoff_millis([0, 100, 250])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.max_retries, 5);
    /// ```
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    /// Attempts to make, never less than one.
    pub fn effective_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// Builder for [`RetryConfig`].
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    max_retries: Option<u32>,
    delays: Option<Vec<Duration>>,
}

impl RetryConfigBuilder {
    /// Set the number of attempts, first call included.
    ///
    /// Default: 3
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the backoff schedule from durations.
    ///
    /// Default: `[0ms, 2000ms, 5000ms]`
    pub fn backoff(mut self, delays: impl IntoIterator<Item = Duration>) -> Self {
        self.delays = Some(delays.into_iter().collect());
        self
    }

    /// Set the backoff schedule from milliseconds.
    pub fn backoff_millis(self, millis: impl IntoIterator<Item = u64>) -> Self {
        self.backoff(millis.into_iter().map(Duration::from_millis))
    }

    /// Build the configuration, using defaults for unset values.
    pub fn build(self) -> Result<RetryConfig, ConfigError> {
        let backoff_schedule = match self.delays {
            Some(delays) => BackoffSchedule::new(delays)?,
            None => BackoffSchedule::default(),
        };

        Ok(RetryConfig {
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            backoff_schedule,
        })
    }
}

/// Parse a comma separated list of millisecond delays, e.g. `"0, 2000, 5000"`.
pub fn parse_backoff_millis(input: &str) -> Result<BackoffSchedule, ConfigError> {
    let millis = input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| ConfigError::InvalidDelay(part.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    BackoffSchedule::from_millis(millis)
}
