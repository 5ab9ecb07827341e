//! Single-flight refresh of the access credential.
//!
//! # Concurrency note
//!
//! The in-flight flag and the waiter queue live together behind one
//! `std::sync::Mutex`. Every check-and-set happens inside a single critical
//! section that never spans an `.await`, so the coordinator is correct on a
//! multi-threaded runtime and not just on a single-threaded event loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use keyward_session::{AuthBackend, Credential, CredentialCache, SessionStore};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::RefreshConfig;

type Waiter = oneshot::Sender<Option<Credential>>;

#[derive(Default)]
struct Flight {
    in_flight: bool,
    /// Callers that arrived while a refresh was running, in arrival order.
    waiters: Vec<Waiter>,
}

/// Guarantees at most one refresh call is in flight.
///
/// ## Lifecycle of one refresh
///
/// ```text
/// request_refresh() ──→ [idle] ──(leader)──→ [in flight] ──→ access()
///                           ↑                   │   ↑            │
///                           │      request_refresh() (joins)      │
///                           │                                    ▼
///                           └──── drain waiters ←── store / invalidate
/// ```
///
/// The leader's outcome is delivered to every waiter exactly once, in the
/// order they joined. A failed refresh is not retried here; callers decide
/// what to do with `None`.
pub struct RefreshCoordinator<B: AuthBackend> {
    backend: Arc<B>,
    credentials: CredentialCache,
    session: Arc<SessionStore>,
    config: RefreshConfig,
    flight: Mutex<Flight>,
    calls: AtomicU64,
}

impl<B: AuthBackend> RefreshCoordinator<B> {
    /// Creates a coordinator with the default config (no timeout).
    pub fn new(
        backend: Arc<B>,
        credentials: CredentialCache,
        session: Arc<SessionStore>,
    ) -> Self {
        Self::with_config(backend, credentials, session, RefreshConfig::default())
    }

    /// Creates a coordinator with an explicit config.
    pub fn with_config(
        backend: Arc<B>,
        credentials: CredentialCache,
        session: Arc<SessionStore>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            backend,
            credentials,
            session,
            config,
            flight: Mutex::new(Flight::default()),
            calls: AtomicU64::new(0),
        }
    }

    /// Refreshes the access credential, or joins the refresh already
    /// running.
    ///
    /// Returns the new credential, or `None` if the refresh failed. On
    /// success the credential is stored and the session is marked
    /// authenticated before any waiter resumes; on failure the stored
    /// credential is removed and the session is marked unauthenticated.
    pub async fn request_refresh(&self) -> Option<Credential> {
        let joined = {
            let mut flight = self.flight();
            if flight.in_flight {
                let (tx, rx) = oneshot::channel();
                flight.waiters.push(tx);
                debug!(waiters = flight.waiters.len(), "refresh in flight, joining");
                Some(rx)
            } else {
                flight.in_flight = true;
                None
            }
        };

        if let Some(rx) = joined {
            // A dropped sender means the leader vanished without settling.
            return rx.await.unwrap_or(None);
        }

        let mut settle = Settle {
            flight: &self.flight,
            outcome: None,
        };
        let outcome = self.perform().await;
        settle.outcome = Some(outcome.clone());
        drop(settle);
        outcome
    }

    /// Whether a refresh call is currently running.
    pub fn is_in_flight(&self) -> bool {
        self.flight().in_flight
    }

    /// How many callers are waiting on the running refresh.
    pub fn waiter_count(&self) -> usize {
        self.flight().waiters.len()
    }

    /// Total refresh calls issued to the backend since creation.
    pub fn refresh_calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// The backend this coordinator refreshes against.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    async fn perform(&self) -> Option<Credential> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(call, "refreshing access credential");

        let result = match self.config.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.backend.access()).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            call,
                            timeout_ms = limit.as_millis() as u64,
                            "refresh timed out"
                        );
                        return self.invalidate();
                    }
                }
            }
            None => self.backend.access().await,
        };

        match result {
            Ok(grant) => match grant.into_token() {
                Some(token) => {
                    let credential = Credential::new(token);
                    self.credentials.set(&credential);
                    self.session.set_authenticated(true);
                    info!(call, "access credential refreshed");
                    Some(credential)
                }
                None => {
                    warn!(call, "refresh succeeded without a token");
                    self.invalidate()
                }
            },
            Err(e) => {
                warn!(call, error = %e, "refresh failed");
                self.invalidate()
            }
        }
    }

    fn invalidate(&self) -> Option<Credential> {
        self.credentials.remove();
        self.session.set_authenticated(false);
        None
    }

    fn flight(&self) -> MutexGuard<'_, Flight> {
        self.flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight flag and drains the waiters when the leader
/// finishes, including when the leader's future is dropped mid-call.
struct Settle<'a> {
    flight: &'a Mutex<Flight>,
    outcome: Option<Option<Credential>>,
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        let waiters = {
            let mut flight = self.flight.lock().unwrap_or_else(PoisonError::into_inner);
            flight.in_flight = false;
            std::mem::take(&mut flight.waiters)
        };

        let outcome = match self.outcome.take() {
            Some(outcome) => outcome,
            None => {
                warn!(waiters = waiters.len(), "refresh abandoned before settling");
                None
            }
        };

        for waiter in waiters {
            // The receiver may already be gone; nothing to deliver then.
            let _ = waiter.send(outcome.clone());
        }
    }
}
