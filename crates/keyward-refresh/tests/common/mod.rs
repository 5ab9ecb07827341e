//! Shared fakes for the refresh integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use keyward_protocol::{AccessGrant, Request, Response, StatusCode, WalletStatus, endpoints};
use keyward_refresh::{LockoutHandler, RefreshCoordinator};
use keyward_session::{AuthBackend, CredentialCache, SessionError, SessionStore};
use keyward_transport::{Transport, TransportError};

// =========================================================================
// Scripted auth backend
// =========================================================================

/// What the next `access()` call yields.
#[derive(Clone, Debug)]
pub enum AccessReply {
    Token(String),
    Tokenless,
    Fail,
}

/// Backend whose `access()` sleeps for `delay` and then answers from a
/// script. The last scripted reply repeats.
pub struct ScriptedBackend {
    replies: Mutex<Vec<AccessReply>>,
    delay: Duration,
    access_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(delay: Duration, replies: Vec<AccessReply>) -> Self {
        Self {
            replies: Mutex::new(replies),
            delay,
            access_calls: AtomicUsize::new(0),
        }
    }

    pub fn granting(token: &str, delay: Duration) -> Self {
        Self::new(delay, vec![AccessReply::Token(token.to_string())])
    }

    pub fn failing(delay: Duration) -> Self {
        Self::new(delay, vec![AccessReply::Fail])
    }

    pub fn access_calls(&self) -> usize {
        self.access_calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> AccessReply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies.first().cloned().unwrap_or(AccessReply::Fail)
        }
    }
}

impl AuthBackend for ScriptedBackend {
    async fn check(&self) -> Result<bool, SessionError> {
        Ok(true)
    }

    async fn access(&self) -> Result<AccessGrant, SessionError> {
        self.access_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match self.next_reply() {
            AccessReply::Token(token) => Ok(AccessGrant::new(token)),
            AccessReply::Tokenless => Ok(AccessGrant::default()),
            AccessReply::Fail => Err(SessionError::UnexpectedStatus {
                endpoint: endpoints::ACCESS,
                status: StatusCode::UNAUTHORIZED,
            }),
        }
    }

    async fn logout(&self) -> Result<(), SessionError> {
        Ok(())
    }

    async fn wallet_status(&self) -> Result<WalletStatus, SessionError> {
        Ok(WalletStatus::default())
    }
}

/// A coordinator over `backend` with fresh cache and store.
pub fn coordinator(
    backend: ScriptedBackend,
) -> (
    Arc<RefreshCoordinator<ScriptedBackend>>,
    Arc<ScriptedBackend>,
    CredentialCache,
    Arc<SessionStore>,
) {
    let backend = Arc::new(backend);
    let cache = CredentialCache::in_memory();
    let session = Arc::new(SessionStore::new());
    let coordinator = Arc::new(RefreshCoordinator::new(
        Arc::clone(&backend),
        cache.clone(),
        Arc::clone(&session),
    ));
    (coordinator, backend, cache, session)
}

// =========================================================================
// Token-gated transport
// =========================================================================

/// Answers 200 when the bearer matches the valid token, 401 otherwise.
/// Paths listed as forbidden always answer 403.
#[derive(Default)]
pub struct TokenGate {
    valid: Mutex<Option<String>>,
    forbidden: Mutex<Vec<String>>,
    failing: Mutex<Vec<String>>,
    seen: Mutex<Vec<Request>>,
}

impl TokenGate {
    pub fn accepting(token: &str) -> Self {
        let gate = Self::default();
        *gate.valid.lock().unwrap() = Some(token.to_string());
        gate
    }

    pub fn forbid(&self, path: &str) {
        self.forbidden.lock().unwrap().push(path.to_string());
    }

    pub fn fail(&self, path: &str) {
        self.failing.lock().unwrap().push(path.to_string());
    }

    pub fn seen(&self) -> Vec<Request> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for TokenGate {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.seen.lock().unwrap().push(request.clone());

        if self.failing.lock().unwrap().contains(&request.path) {
            return Err(TransportError::Network("connection reset".into()));
        }
        if self.forbidden.lock().unwrap().contains(&request.path) {
            return Ok(Response::new(StatusCode::FORBIDDEN));
        }
        let valid = self.valid.lock().unwrap().clone();
        match (valid, request.bearer()) {
            (Some(valid), Some(bearer)) if valid == bearer => {
                Ok(Response::ok().with_body(r#"{"ok":true}"#))
            }
            _ => Ok(Response::new(StatusCode::UNAUTHORIZED)),
        }
    }
}

// =========================================================================
// Lockout recorder
// =========================================================================

#[derive(Default)]
pub struct RecordingLockout {
    pub paths: Mutex<Vec<String>>,
}

impl LockoutHandler for RecordingLockout {
    fn lockout(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}
