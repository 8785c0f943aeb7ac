//! Explicit backoff schedule.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default wait before each retry, in milliseconds: immediate, 2s, 5s.
pub const DEFAULT_BACKOFF_MS: [u64; 3] = [0, 2000, 5000];

/// Ordered wait durations indexed by 0-based attempt.
///
/// Entries are taken as given; the schedule is not required to grow.
/// Asking for an attempt past the end yields the last entry, so lookup is
/// total and never panics.
///
/// # Examples
///
/// ```rust
/// use apiguard_core::retry::BackoffSchedule;
/// use std::time::Duration;
///
/// let schedule = BackoffSchedule::from_millis([0, 2000, 5000]).unwrap();
/// assert_eq!(schedule.delay_for(1), Duration::from_secs(2));
/// assert_eq!(schedule.delay_for(42), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct BackoffSchedule {
    delays: Arc<[Duration]>,
}

impl BackoffSchedule {
    /// Build a schedule from explicit durations.
    ///
    /// Fails on an empty list, since there would be no last entry to repeat.
    pub fn new(delays: impl Into<Vec<Duration>>) -> Result<Self, ConfigError> {
        let delays = delays.into();
        if delays.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }
        Ok(Self {
            delays: delays.into(),
        })
    }

    /// Build a schedule from millisecond values.
    pub fn from_millis(millis: impl IntoIterator<Item = u64>) -> Result<Self, ConfigError> {
        Self::new(
            millis
                .into_iter()
                .map(Duration::from_millis)
                .collect::<Vec<_>>(),
        )
    }

    /// Wait before the retry that follows failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let last = self.delays.len() - 1;
        let index = (attempt as usize).min(last);
        self.delays[index]
    }

    /// Number of explicit entries.
    pub fn len(&self) -> usize {
        self.delays.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    /// The explicit entries.
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self {
            delays: DEFAULT_BACKOFF_MS
                .iter()
                .copied()
                .map(Duration::from_millis)
                .collect(),
        }
    }
}

impl TryFrom<Vec<u64>> for BackoffSchedule {
    type Error = ConfigError;

    fn try_from(millis: Vec<u64>) -> Result<Self, Self::Error> {
        Self::from_millis(millis)
    }
}

impl From<BackoffSchedule> for Vec<u64> {
    fn from(schedule: BackoffSchedule) -> Self {
        schedule
            .delays
            .iter()
            .map(|d| d.as_millis().min(u64::MAX as u128) as u64)
            .collect()
    }
}
