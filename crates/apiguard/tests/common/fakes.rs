//! Recording fakes

use apiguard::credentials::secret;
use apiguard::retry::Clock;
use apiguard::{
    CredentialKey, CredentialStore, ErrorHandler, GuardConfig, InMemoryCredentialStore,
    Navigator, Notification, Notifier,
};
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Clock that records requested waits and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingClock {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

/// Notifier that keeps everything it was asked to show.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.notifications.lock().unwrap().push(notification.clone());
    }
}

/// Navigator that counts redirects.
#[derive(Debug, Default)]
pub struct CountingNavigator {
    count: AtomicUsize,
}

impl CountingNavigator {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Navigator for CountingNavigator {
    fn navigate_to_unauthenticated(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Credential store that counts how often each key is cleared.
#[derive(Debug, Default)]
pub struct CountingCredentialStore {
    inner: InMemoryCredentialStore,
    access_clears: AtomicUsize,
    refresh_clears: AtomicUsize,
}

impl CountingCredentialStore {
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let store = Self::default();
        store.set(CredentialKey::AccessToken, secret(access));
        store.set(CredentialKey::RefreshToken, secret(refresh));
        store
    }

    pub fn clears(&self, key: CredentialKey) -> usize {
        match key {
            CredentialKey::AccessToken => self.access_clears.load(Ordering::SeqCst),
            CredentialKey::RefreshToken => self.refresh_clears.load(Ordering::SeqCst),
        }
    }
}

impl CredentialStore for CountingCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<SecretString> {
        self.inner.get(key)
    }

    fn set(&self, key: CredentialKey, value: SecretString) {
        self.inner.set(key, value);
    }

    fn clear(&self, key: CredentialKey) {
        match key {
            CredentialKey::AccessToken => self.access_clears.fetch_add(1, Ordering::SeqCst),
            CredentialKey::RefreshToken => self.refresh_clears.fetch_add(1, Ordering::SeqCst),
        };
        self.inner.clear(key);
    }
}

/// Handler wired to recording fakes.
pub fn handler_with(
    config: GuardConfig,
    store: Arc<CountingCredentialStore>,
    navigator: Arc<CountingNavigator>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<RecordingClock>,
) -> ErrorHandler {
    ErrorHandler::builder()
        .config(config)
        .credentials(store)
        .navigator(navigator)
        .notifier(notifier)
        .clock(clock)
        .build()
        .expect("Failed to build test handler")
}
