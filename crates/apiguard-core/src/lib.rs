#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Core decision logic for apiguard.
//!
//! This crate holds everything that decides what happens to a failed API
//! call, with no dependency on a concrete HTTP client, UI or router:
//!
//! - **Failure model** via [`Failure`], [`TransportCode`] and [`RequestContext`]
//! - **Classification** via [`classify`], yielding a [`FailureKind`] and a [`RetryVerdict`]
//! - **Backoff** via [`retry::BackoffSchedule`]
//! - **Retry execution** via [`retry::RetryExecutor`], with an injectable [`retry::Clock`]
//!   and cooperative cancellation
//!
//! # Examples
//!
//! ```rust
//! use apiguard_core::prelude::*;
//!
//! let verdict = classify(&Failure::http(503, "Service Unavailable"));
//! assert_eq!(verdict.reason, FailureKind::ServerError);
//! assert!(verdict.retryable);
//!
//! let verdict = classify(&Failure::http(400, "bad field"));
//! assert!(!verdict.retryable);
//! ```

pub mod classify;
pub mod error;
pub mod failure;
pub mod retry;

pub use classify::{FailureKind, RetryVerdict, classify, kind_of};
pub use error::{ConfigError, RetryError};
pub use failure::{Failure, RequestContext, TransportCode};

// Re-exported so callers can build cancellation tokens without a direct dependency.
pub use tokio_util::sync::CancellationToken;

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use apiguard_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::classify::{FailureKind, RetryVerdict, classify};
    pub use crate::error::RetryError;
    pub use crate::failure::{Failure, RequestContext, TransportCode};
    pub use crate::retry::{BackoffSchedule, Clock, RetryConfig, RetryExecutor, RetryOptions};
}
