//! Access-token storage.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Default storage key for the access token.
pub const DEFAULT_CREDENTIAL_KEY: &str = "accessToken";

/// An opaque bearer token.
///
/// `Debug` never prints the token itself, so a credential can sit inside
/// structs that get logged.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// A string key-value store scoped to one client instance.
///
/// Stands in for whatever the host offers: browser local storage, a file,
/// an OS keychain. Implementations must be cheap and non-blocking; the
/// coordinator calls them while holding no locks of its own.
pub trait KeyValueStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-process [`KeyValueStore`]. Used for tab-scoped caches and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Owns the persisted access token. Pure get/set/remove.
///
/// Cheap to clone; clones share the same backing store.
#[derive(Clone)]
pub struct CredentialCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl CredentialCache {
    /// Wraps `store`, keeping the token under [`DEFAULT_CREDENTIAL_KEY`].
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DEFAULT_CREDENTIAL_KEY)
    }

    /// Wraps `store`, keeping the token under `key`.
    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// A cache over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The stored credential. An empty stored value reads as `None`.
    pub fn get(&self) -> Option<Credential> {
        self.store
            .get(&self.key)
            .filter(|token| !token.is_empty())
            .map(Credential)
    }

    pub fn set(&self, credential: &Credential) {
        self.store.set(&self.key, credential.as_str());
    }

    pub fn remove(&self) {
        self.store.remove(&self.key);
    }
}

impl fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCache")
            .field("key", &self.key)
            .field("present", &self.get().is_some())
            .finish()
    }
}
