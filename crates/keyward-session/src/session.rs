//! The observable auth state.
//!
//! [`SessionStore`] is the single source of truth for "is this client
//! signed in?". Everything else (the refresh coordinator, the
//! reconciliation loop, logout) writes through its setters, and anything
//! that cares about transitions subscribes.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{KeyValueStore, MemoryStore};

/// Ephemeral-cache key mirroring the root-wallet flag.
pub const WALLET_CACHE_KEY: &str = "isRootWalletInitialized";

// ---------------------------------------------------------------------------
// AuthState
// ---------------------------------------------------------------------------

/// Snapshot of the client's authentication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthState {
    /// Whether the backend currently accepts this client.
    pub is_authenticated: bool,

    /// Whether the user's root wallet has been set up. Only meaningful
    /// while authenticated.
    pub is_root_wallet_initialized: bool,
}

/// A committed state change, delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthChange {
    pub current: AuthState,
    pub previous: AuthState,
}

impl AuthChange {
    /// `true` if this change flipped the client to signed out.
    pub fn signed_out(&self) -> bool {
        self.previous.is_authenticated && !self.current.is_authenticated
    }
}

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&AuthChange) + Send + Sync>;

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

struct Inner {
    state: AuthState,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
    /// Committed changes not yet delivered, in commit order.
    pending: VecDeque<AuthChange>,
    /// Set while some caller is draining `pending`.
    delivering: bool,
}

/// Process-wide auth state with synchronous, ordered change delivery.
///
/// Setters short-circuit when the value is unchanged, so subscribers only
/// ever see real transitions. Subscribers run after the internal lock is
/// released, in registration order; they may read the store (or even
/// write to it) without deadlocking.
///
/// Every subscriber sees changes in commit order. Commits queue up, and
/// whichever caller finds nobody delivering drains the queue on its own
/// thread. A write made from inside a subscriber, or one racing in from
/// another thread, is therefore delivered after the change in progress
/// has reached every subscriber, and that setter may return before its
/// change is delivered.
///
/// Share it behind an `Arc`; every layer above holds a clone.
pub struct SessionStore {
    inner: Mutex<Inner>,
    ephemeral: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Creates a signed-out store with a private in-memory ephemeral cache.
    pub fn new() -> Self {
        Self::with_ephemeral_cache(Arc::new(MemoryStore::new()))
    }

    /// Creates a store whose wallet flag is mirrored into `cache`.
    ///
    /// The flag is read back from `cache` immediately, so a UI restarting
    /// within the same tab can render the wallet state before the first
    /// server round trip. The authenticated flag always starts `false`.
    pub fn with_ephemeral_cache(cache: Arc<dyn KeyValueStore>) -> Self {
        let wallet = cache.get(WALLET_CACHE_KEY).as_deref() == Some("true");
        Self {
            inner: Mutex::new(Inner {
                state: AuthState {
                    is_authenticated: false,
                    is_root_wallet_initialized: wallet,
                },
                subscribers: Vec::new(),
                next_id: 1,
                pending: VecDeque::new(),
                delivering: false,
            }),
            ephemeral: cache,
        }
    }

    /// Returns the current snapshot.
    pub fn get(&self) -> AuthState {
        self.lock().state
    }

    /// Shorthand for `get().is_authenticated`.
    pub fn is_authenticated(&self) -> bool {
        self.get().is_authenticated
    }

    /// Sets the authenticated flag.
    ///
    /// Returns `true` if the value changed (and subscribers were notified).
    pub fn set_authenticated(&self, authenticated: bool) -> bool {
        self.update(|state| state.is_authenticated = authenticated)
    }

    /// Sets the root-wallet flag and mirrors it into the ephemeral cache.
    ///
    /// Returns `true` if the value changed (and subscribers were notified).
    pub fn set_root_wallet_initialized(&self, initialized: bool) -> bool {
        let changed =
            self.update(|state| state.is_root_wallet_initialized = initialized);
        if changed {
            self.ephemeral
                .set(WALLET_CACHE_KEY, if initialized { "true" } else { "false" });
        }
        changed
    }

    /// Registers an observer for committed changes.
    pub fn subscribe(
        &self,
        callback: impl Fn(&AuthChange) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));
        id
    }

    /// Removes an observer. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sid, _)| *sid != id);
        inner.subscribers.len() != before
    }

    /// Number of registered observers.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn update(&self, mutate: impl FnOnce(&mut AuthState)) -> bool {
        {
            let mut inner = self.lock();
            let previous = inner.state;
            let mut next = previous;
            mutate(&mut next);
            if next == previous {
                return false;
            }
            inner.state = next;
            inner.pending.push_back(AuthChange {
                current: next,
                previous,
            });
            if inner.delivering {
                return true;
            }
            inner.delivering = true;
        }

        let _delivery = Delivery { store: self };
        loop {
            let (change, subscribers) = {
                let mut inner = self.lock();
                let Some(change) = inner.pending.pop_front() else {
                    inner.delivering = false;
                    break;
                };
                let subscribers: Vec<Subscriber> =
                    inner.subscribers.iter().map(|(_, s)| Arc::clone(s)).collect();
                (change, subscribers)
            };

            tracing::debug!(
                authenticated = change.current.is_authenticated,
                wallet = change.current.is_root_wallet_initialized,
                subscribers = subscribers.len(),
                "auth state changed"
            );

            for subscriber in subscribers {
                subscriber(&change);
            }
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the delivery role if a subscriber panics mid-drain, so later
/// commits are not queued forever.
struct Delivery<'a> {
    store: &'a SessionStore,
}

impl Drop for Delivery<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut inner = self.store.lock();
            inner.delivering = false;
            inner.pending.clear();
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SessionStore")
            .field("state", &inner.state)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}
