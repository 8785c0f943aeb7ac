//! Retry execution with an explicit backoff schedule.
//!
//! # Key Types
//!
//! - [`RetryExecutor`] - runs an async operation with classification-driven retries
//! - [`BackoffSchedule`] - attempt index to wait duration, last entry repeats
//! - [`RetryConfig`] - attempts and schedule, fixed at startup
//! - [`Clock`] - sleep capability, [`TokioClock`] in production
//!
//! # Examples
//!
//! ```rust
//! use apiguard_core::retry::{RetryConfig, RetryExecutor, RetryOptions};
//! use apiguard_core::Failure;
//!
//! # async fn example() -> Result<(), apiguard_core::RetryError> {
//! let executor = RetryExecutor::new(RetryConfig::default());
//!
//! let body = executor
//!     .execute_with(
//!         || async { Ok::<_, Failure>("pong") },
//!         RetryOptions::new()
//!             .max_attempts(2)
//!             .on_retry(|attempt, max| println!("retry {attempt}/{max}")),
//!     )
//!     .await?;
//! # let _ = body;
//! # Ok(())
//! # }
//! ```

mod clock;
mod config;
mod executor;
mod schedule;

pub use clock::{Clock, TokioClock};
pub use config::{DEFAULT_MAX_RETRIES, RetryConfig, RetryConfigBuilder, parse_backoff_millis};
pub use executor::{OnRetry, RetryExecutor, RetryOptions};
pub use schedule::{BackoffSchedule, DEFAULT_BACKOFF_MS};
