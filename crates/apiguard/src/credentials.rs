//! Session credential storage capability.
//!
//! Session recovery only ever clears tokens; storing them is the job of
//! whatever performs the login. The store is injected rather than global so
//! each application (and each test) decides where tokens live.

use secrecy::SecretString;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Keys of the two session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    /// Short-lived bearer token sent with every request.
    AccessToken,
    /// Long-lived token used to obtain a new access token.
    RefreshToken,
}

impl CredentialKey {
    /// Every key, in clearing order.
    pub const ALL: [CredentialKey; 2] = [CredentialKey::AccessToken, CredentialKey::RefreshToken];

    /// Storage key name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKey::AccessToken => "access_token",
            CredentialKey::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value store holding session tokens.
///
/// Implementations must be idempotent: clearing an absent key is a no-op.
pub trait CredentialStore: Send + Sync {
    /// Read a token.
    fn get(&self, key: CredentialKey) -> Option<SecretString>;

    /// Store a token, replacing any previous value.
    fn set(&self, key: CredentialKey, value: SecretString);

    /// Delete a token.
    fn clear(&self, key: CredentialKey);

    /// Whether a token is stored under `key`.
    fn contains(&self, key: CredentialKey) -> bool {
        self.get(key).is_some()
    }
}

/// Process-local credential store.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    tokens: RwLock<HashMap<CredentialKey, SecretString>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding both tokens.
    pub fn with_tokens(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(CredentialKey::AccessToken, secret(access));
        store.set(CredentialKey::RefreshToken, secret(refresh));
        store
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<SecretString> {
        let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
        tokens.get(&key).cloned()
    }

    fn set(&self, key: CredentialKey, value: SecretString) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.insert(key, value);
    }

    fn clear(&self, key: CredentialKey) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.remove(&key);
    }
}

impl fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<_> = tokens.keys().map(CredentialKey::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("InMemoryCredentialStore")
            .field("keys", &keys)
            .finish()
    }
}

/// Wrap a raw token.
pub fn secret(value: impl Into<String>) -> SecretString {
    SecretString::new(value.into().into_boxed_str())
}
