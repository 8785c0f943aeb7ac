//! Session recovery for authentication and authorization failures.

use crate::credentials::{CredentialKey, CredentialStore};
use crate::notify::{Notification, Notifier};
use apiguard_core::FailureKind;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Default route for users without a session.
pub const DEFAULT_UNAUTHENTICATED_ROUTE: &str = "/";

/// Navigation capability used when the session is lost.
pub trait Navigator: Send + Sync {
    /// Send the user to the unauthenticated landing route.
    fn navigate_to_unauthenticated(&self);
}

/// Navigation command emitted by [`ChannelNavigator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationCommand {
    /// Go to the landing route for users without a session.
    Unauthenticated {
        /// Route path.
        route: String,
    },
}

/// Navigator that hands commands to the routing layer over a channel.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    route: String,
    tx: mpsc::UnboundedSender<NavigationCommand>,
}

impl ChannelNavigator {
    /// Create a navigator targeting `route` and the receiving end for the router.
    pub fn new(
        route: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<NavigationCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                route: route.into(),
                tx,
            },
            rx,
        )
    }
}

impl Navigator for ChannelNavigator {
    fn navigate_to_unauthenticated(&self) {
        let command = NavigationCommand::Unauthenticated {
            route: self.route.clone(),
        };
        if self.tx.send(command).is_err() {
            tracing::debug!(route = %self.route, "Router is gone, navigation dropped");
        }
    }
}

/// Generation of the session, bumped every time a recovery runs.
///
/// Read it with [`SessionRecovery::epoch`] before issuing a call and hand it
/// back to [`SessionRecovery::on_unauthorized`] if the call comes back
/// `Unauthorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SessionEpoch(u64);

/// Reacts to `Unauthorized` and `Forbidden` failures.
///
/// Several in-flight calls commonly observe the same expired session. Each
/// call carries the [`SessionEpoch`] it started in; only a call from the
/// current epoch recovers the session, and calls that were already in flight
/// when that recovery ran are coalesced into it. A later call, started after
/// the recovery, is handled in full again.
pub struct SessionRecovery {
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    epoch: Mutex<SessionEpoch>,
}

impl SessionRecovery {
    /// Create session recovery over the given collaborators.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            credentials,
            navigator,
            notifier,
            epoch: Mutex::new(SessionEpoch::default()),
        }
    }

    /// Current session epoch.
    pub fn epoch(&self) -> SessionEpoch {
        *self.epoch.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Handle an `Unauthorized` failure from a call started in `observed`.
    ///
    /// Clears both tokens, warns the user and navigates to the
    /// unauthenticated route. Returns `false` when a recovery already ran
    /// since `observed`, in which case nothing happens.
    pub fn on_unauthorized(&self, observed: SessionEpoch) -> bool {
        {
            let mut epoch = self.epoch.lock().unwrap_or_else(|e| e.into_inner());
            if *epoch != observed {
                tracing::debug!(
                    observed = observed.0,
                    current = epoch.0,
                    "Session already recovered, skipping"
                );
                return false;
            }
            epoch.0 += 1;
            for key in CredentialKey::ALL {
                self.credentials.clear(key);
            }
        }

        tracing::info!("Session expired, credentials cleared");
        self.notifier
            .notify(&Notification::for_failure(FailureKind::Unauthorized, None));
        self.navigator.navigate_to_unauthenticated();
        true
    }

    /// Handle a `Forbidden` failure: notify only. The session is still
    /// valid, it just lacks privilege.
    pub fn on_forbidden(&self) {
        self.notifier
            .notify(&Notification::for_failure(FailureKind::Forbidden, None));
    }
}

impl fmt::Debug for SessionRecovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecovery")
            .field("epoch", &self.epoch())
            .finish_non_exhaustive()
    }
}
