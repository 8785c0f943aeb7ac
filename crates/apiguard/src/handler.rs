//! Error handler facade.
//!
//! [`ErrorHandler`] is what application code talks to: it runs calls through
//! the retry executor and, once a failure is final, logs it, tells the user,
//! and recovers the session when needed.

use crate::config::GuardConfig;
use crate::credentials::CredentialStore;
use crate::error::{Error, Result};
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::observability::FailureLog;
use crate::session::{Navigator, SessionEpoch, SessionRecovery};
use apiguard_core::retry::{Clock, RetryExecutor, RetryOptions, TokioClock};
use apiguard_core::{Failure, FailureKind, RetryError, classify};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Retries, notifies and recovers sessions for API calls.
///
/// # Examples
///
/// ```rust
/// use apiguard::prelude::*;
/// use std::sync::Arc;
///
/// # async fn example() -> apiguard::Result<()> {
/// let (navigator, _routes) = ChannelNavigator::new("/");
/// let handler = ErrorHandler::builder()
///     .config(GuardConfig::mock())
///     .credentials(Arc::new(InMemoryCredentialStore::new()))
///     .navigator(Arc::new(navigator))
///     .build()?;
///
/// let answer = handler
///     .with_retry(|| async { Ok::<_, Failure>(42) }, RetryOptions::new())
///     .await?;
/// assert_eq!(answer, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ErrorHandler {
    executor: RetryExecutor,
    session: Arc<SessionRecovery>,
    notifier: Arc<dyn Notifier>,
}

impl ErrorHandler {
    /// Start building a handler.
    pub fn builder() -> ErrorHandlerBuilder {
        ErrorHandlerBuilder::default()
    }

    /// The retry executor used by [`with_retry`](Self::with_retry).
    pub fn executor(&self) -> &RetryExecutor {
        &self.executor
    }

    /// Session recovery, e.g. to read the current [`SessionEpoch`].
    pub fn session(&self) -> &SessionRecovery {
        &self.session
    }

    /// React to a final failure and return its classification.
    ///
    /// `Unauthorized` recovers the session, `Forbidden` warns about missing
    /// permission, and every other kind is shown to the user with the
    /// server's message where that kind allows one.
    ///
    /// The failure is treated as belonging to the current session, so an
    /// `Unauthorized` is always handled in full.
    pub fn handle_error(&self, failure: &Failure) -> FailureKind {
        self.dispatch(failure, self.session.epoch())
    }

    fn dispatch(&self, failure: &Failure, started: SessionEpoch) -> FailureKind {
        let kind = classify(failure).reason;
        FailureLog::new(failure, kind).log();

        match kind {
            FailureKind::Unauthorized => {
                self.session.on_unauthorized(started);
            }
            FailureKind::Forbidden => self.session.on_forbidden(),
            _ => self
                .notifier
                .notify(&Notification::for_failure(kind, Some(failure.message()))),
        }
        kind
    }

    /// Run `operation` with retries and handle the final failure.
    ///
    /// The failure is still returned to the caller after it was handled.
    /// A cancelled call returns [`Error::Cancelled`] and triggers nothing.
    /// An `Unauthorized` from a call that was in flight while another call
    /// already recovered the session is only returned, not handled again.
    pub async fn with_retry<F, Fut, T, E>(&self, operation: F, options: RetryOptions) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<Failure>,
    {
        let started = self.session.epoch();
        match self.executor.execute_with(operation, options).await {
            Ok(value) => Ok(value),
            Err(RetryError::Failed(failure)) => {
                self.dispatch(&failure, started);
                Err(Error::Failure(failure))
            }
            Err(err @ RetryError::Cancelled { .. }) => {
                tracing::debug!(error = %err, "API call cancelled");
                Err(err.into())
            }
        }
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("executor", &self.executor)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ErrorHandler`].
#[derive(Default)]
pub struct ErrorHandlerBuilder {
    config: Option<GuardConfig>,
    credentials: Option<Arc<dyn CredentialStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ErrorHandlerBuilder {
    /// Configuration to take retry settings from. Defaults to [`GuardConfig::default`].
    pub fn config(mut self, config: GuardConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Store holding the session tokens (required).
    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Where to send the user when the session is lost (required).
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Where user notifications go. Defaults to [`TracingNotifier`].
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Clock for backoff waits. Defaults to [`TokioClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the handler.
    pub fn build(self) -> Result<ErrorHandler> {
        let config = self.config.unwrap_or_default();
        let credentials = self
            .credentials
            .ok_or_else(|| Error::InvalidConfig("credential store is required".to_string()))?;
        let navigator = self
            .navigator
            .ok_or_else(|| Error::InvalidConfig("navigator is required".to_string()))?;
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));
        let clock = self.clock.unwrap_or_else(|| Arc::new(TokioClock));

        Ok(ErrorHandler {
            executor: RetryExecutor::with_clock(config.retry, clock),
            session: Arc::new(SessionRecovery::new(
                credentials,
                navigator,
                Arc::clone(&notifier),
            )),
            notifier,
        })
    }
}
