//! User-facing notifications.
//!
//! [`Notification::for_failure`] is the pure mapping from a failure kind to
//! what the user sees. Delivering it is a side effect behind the
//! [`Notifier`] trait and can never fail or block the caller.

use apiguard_core::FailureKind;
use std::fmt;
use tokio::sync::mpsc;

/// How prominently a notification is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Recoverable or expected situations.
    Warning,
    /// The action the user attempted did not happen.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Message shown when the session is no longer valid.
pub const SESSION_EXPIRED: &str = "Session expired. Please log in again.";
/// Message shown when the session lacks privilege.
pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action";

/// One message to surface to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Display severity.
    pub severity: Severity,
    /// Kind of failure that triggered it.
    pub kind: FailureKind,
    /// Text shown to the user.
    pub message: String,
}

impl Notification {
    /// Build the notification for a failure kind.
    ///
    /// `explicit` is the server-supplied message, if any. It only replaces
    /// the default text for kinds where the server knows better than we do
    /// (`BadRequest` and `Unknown`); everywhere else the canned text wins.
    pub fn for_failure(kind: FailureKind, explicit: Option<&str>) -> Self {
        let (severity, default) = match kind {
            FailureKind::BadRequest => (Severity::Error, "Invalid request"),
            FailureKind::Unauthorized => (Severity::Warning, SESSION_EXPIRED),
            FailureKind::Forbidden => (Severity::Error, PERMISSION_DENIED),
            FailureKind::NotFound => (Severity::Warning, "Resource not found"),
            FailureKind::Timeout => (Severity::Error, "Request timed out. Please try again."),
            FailureKind::ServerError => (Severity::Error, "Server error. Please try again later."),
            FailureKind::NetworkError => (
                Severity::Error,
                "Network error. Please check your connection.",
            ),
            FailureKind::Unknown => (Severity::Error, "An unexpected error occurred"),
        };

        let overridable = matches!(kind, FailureKind::BadRequest | FailureKind::Unknown);
        let message = match explicit.map(str::trim) {
            Some(text) if overridable && !text.is_empty() => text.to_string(),
            _ => default.to_string(),
        };

        Self {
            severity,
            kind,
            message,
        }
    }
}

/// Sink for user-facing notifications.
///
/// Implementations must return promptly and must not panic: notification
/// is purely observational and has no say in control flow.
pub trait Notifier: Send + Sync {
    /// Surface a notification.
    fn notify(&self, notification: &Notification);
}

/// Notifier that writes notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.severity {
            Severity::Warning => tracing::warn!(
                kind = %notification.kind,
                message = %notification.message,
                "User notification"
            ),
            Severity::Error => tracing::error!(
                kind = %notification.kind,
                message = %notification.message,
                "User notification"
            ),
        }
    }
}

/// Notifier that forwards notifications to a UI task over a bounded channel.
///
/// Uses `try_send`, so a slow or gone receiver drops notifications instead
/// of stalling the request path.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end for the UI layer.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: &Notification) {
        if let Err(err) = self.tx.try_send(notification.clone()) {
            tracing::debug!(error = %err, "Dropping user notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FailureKind::BadRequest, Severity::Error, "Invalid request")]
    #[case(FailureKind::Unauthorized, Severity::Warning, SESSION_EXPIRED)]
    #[case(FailureKind::Forbidden, Severity::Error, PERMISSION_DENIED)]
    #[case(FailureKind::NotFound, Severity::Warning, "Resource not found")]
    #[case(FailureKind::Timeout, Severity::Error, "Request timed out. Please try again.")]
    #[case(FailureKind::ServerError, Severity::Error, "Server error. Please try again later.")]
    #[case(
        FailureKind::NetworkError,
        Severity::Error,
        "Network error. Please check your connection."
    )]
    #[case(FailureKind::Unknown, Severity::Error, "An unexpected error occurred")]
    fn test_default_notifications(
        #[case] kind: FailureKind,
        #[case] severity: Severity,
        #[case] message: &str,
    ) {
        let notification = Notification::for_failure(kind, None);
        assert_eq!(notification.severity, severity);
        assert_eq!(notification.message, message);
        assert_eq!(notification.kind, kind);
    }

    #[test]
    fn test_explicit_message_overrides_where_allowed() {
        assert_eq!(
            Notification::for_failure(FailureKind::BadRequest, Some("bad field")).message,
            "bad field"
        );
        assert_eq!(
            Notification::for_failure(FailureKind::Unknown, Some("teapot")).message,
            "teapot"
        );
        assert_eq!(
            Notification::for_failure(FailureKind::ServerError, Some("stack trace")).message,
            "Server error. Please try again later."
        );
    }

    #[test]
    fn test_blank_explicit_message_ignored() {
        assert_eq!(
            Notification::for_failure(FailureKind::BadRequest, Some("   ")).message,
            "Invalid request"
        );
    }

    #[tokio::test]
    async fn test_channel_notifier_delivers() {
        let (notifier, mut rx) = ChannelNotifier::new(4);
        notifier.notify(&Notification::for_failure(FailureKind::NotFound, None));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, FailureKind::NotFound);
    }

    #[test]
    fn test_channel_notifier_never_blocks_when_full_or_closed() {
        let (notifier, rx) = ChannelNotifier::new(1);
        let notification = Notification::for_failure(FailureKind::Timeout, None);

        notifier.notify(&notification);
        notifier.notify(&notification);

        drop(rx);
        notifier.notify(&notification);
    }
}
