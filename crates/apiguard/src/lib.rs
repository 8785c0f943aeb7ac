//! # apiguard
//!
//! Resilience layer between application code and a remote HTTP API:
//! - Classifies every failure into a [`FailureKind`]
//! - Retries timeouts, server errors and network errors with a fixed backoff schedule
//! - Clears credentials and redirects when the session is no longer valid
//! - Tells the user what went wrong, through an injected [`Notifier`]
//!
//! The decision logic lives in [`apiguard_core`]; this crate adds
//! configuration, the collaborators it talks to, and a `reqwest` adapter.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use apiguard::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> apiguard::Result<()> {
//!     let config = GuardConfig::from_env()?;
//!     let credentials: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new());
//!     let (navigator, _routes) = ChannelNavigator::new(config.unauthenticated_route.clone());
//!     let (notifier, _notifications) = ChannelNotifier::new(config.notification_buffer);
//!
//!     let client = ApiClient::new(&config, credentials.clone())?;
//!     let handler = ErrorHandler::builder()
//!         .config(config)
//!         .credentials(credentials)
//!         .navigator(Arc::new(navigator))
//!         .notifier(Arc::new(notifier))
//!         .build()?;
//!
//!     let items = handler
//!         .with_retry(|| client.get("/items"), RetryOptions::new())
//!         .await?;
//!     println!("{items}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub use apiguard_core::{
    CancellationToken, Failure, FailureKind, RequestContext, RetryError, RetryVerdict,
    TransportCode, classify,
};
pub use config::{ApiTimeouts, Environment, GuardConfig, TimeoutClass};
pub use credentials::{CredentialKey, CredentialStore, InMemoryCredentialStore};
pub use error::{Error, Result};
pub use handler::{ErrorHandler, ErrorHandlerBuilder};
pub use notify::{ChannelNotifier, Notification, Notifier, Severity, TracingNotifier};
pub use session::{ChannelNavigator, NavigationCommand, Navigator, SessionEpoch, SessionRecovery};
pub use transport::ApiClient;

pub mod config;
pub mod credentials;
pub mod error;
pub mod handler;
pub mod notify;
pub mod observability;
pub mod session;
pub mod transport;

/// Retry building blocks, re-exported from [`apiguard_core::retry`].
pub mod retry {
    pub use apiguard_core::retry::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{Environment, GuardConfig};
    pub use crate::credentials::{CredentialKey, CredentialStore, InMemoryCredentialStore};
    pub use crate::error::{Error, Result};
    pub use crate::handler::ErrorHandler;
    pub use crate::notify::{ChannelNotifier, Notification, Notifier, Severity};
    pub use crate::session::{ChannelNavigator, Navigator};
    pub use crate::transport::ApiClient;
    pub use apiguard_core::retry::{RetryConfig, RetryOptions};
    pub use apiguard_core::{Failure, FailureKind, classify};
}
