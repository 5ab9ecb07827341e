//! Shared fakes for the Keyward integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use keyward::prelude::*;

// =========================================================================
// Backend
// =========================================================================

/// One scripted answer to `check()`.
#[derive(Clone, Copy, Debug)]
pub enum Check {
    Yes,
    No,
    Fail,
}

/// Backend with scripted `check()` answers (the last one repeats), a fixed
/// refresh token, and switchable wallet/logout failures.
pub struct FakeBackend {
    checks: Mutex<VecDeque<Check>>,
    token: Mutex<Option<String>>,
    refresh_delay: Duration,
    wallet: Mutex<Option<bool>>,
    logout_ok: Mutex<bool>,
    check_calls: AtomicUsize,
    access_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new(check: Check) -> Self {
        Self {
            checks: Mutex::new(VecDeque::from([check])),
            token: Mutex::new(Some("T1".to_string())),
            refresh_delay: Duration::from_millis(50),
            wallet: Mutex::new(Some(false)),
            logout_ok: Mutex::new(true),
            check_calls: AtomicUsize::new(0),
            access_calls: AtomicUsize::new(0),
        }
    }

    pub fn script_checks(&self, checks: &[Check]) {
        *self.checks.lock().unwrap() = checks.iter().copied().collect();
    }

    /// `None` makes the wallet call fail.
    pub fn set_wallet(&self, initialized: Option<bool>) {
        *self.wallet.lock().unwrap() = initialized;
    }

    pub fn set_logout_ok(&self, ok: bool) {
        *self.logout_ok.lock().unwrap() = ok;
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn access_calls(&self) -> usize {
        self.access_calls.load(Ordering::SeqCst)
    }
}

impl AuthBackend for FakeBackend {
    async fn check(&self) -> Result<bool, SessionError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        let next = {
            let mut checks = self.checks.lock().unwrap();
            if checks.len() > 1 {
                checks.pop_front()
            } else {
                checks.front().copied()
            }
        };
        match next.unwrap_or(Check::Fail) {
            Check::Yes => Ok(true),
            Check::No => Ok(false),
            Check::Fail => Err(SessionError::Transport(TransportError::Network(
                "unreachable".into(),
            ))),
        }
    }

    async fn access(&self) -> Result<AccessGrant, SessionError> {
        self.access_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.refresh_delay).await;
        match self.token.lock().unwrap().clone() {
            Some(token) => Ok(AccessGrant::new(token)),
            None => Err(SessionError::UnexpectedStatus {
                endpoint: endpoints::ACCESS,
                status: StatusCode::UNAUTHORIZED,
            }),
        }
    }

    async fn logout(&self) -> Result<(), SessionError> {
        if *self.logout_ok.lock().unwrap() {
            Ok(())
        } else {
            Err(SessionError::UnexpectedStatus {
                endpoint: endpoints::LOGOUT,
                status: StatusCode(502),
            })
        }
    }

    async fn wallet_status(&self) -> Result<WalletStatus, SessionError> {
        match *self.wallet.lock().unwrap() {
            Some(initialized) => Ok(WalletStatus {
                is_root_wallet_initialized: initialized,
            }),
            None => Err(SessionError::UnexpectedStatus {
                endpoint: endpoints::WALLET_STATUS,
                status: StatusCode(503),
            }),
        }
    }
}

// =========================================================================
// Router
// =========================================================================

pub struct FakeRouter {
    route: Mutex<String>,
    navigations: Mutex<Vec<String>>,
    left: Mutex<bool>,
}

impl FakeRouter {
    pub fn at(route: &str) -> Arc<Self> {
        Arc::new(Self {
            route: Mutex::new(route.to_string()),
            navigations: Mutex::new(Vec::new()),
            left: Mutex::new(false),
        })
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn has_left(&self) -> bool {
        *self.left.lock().unwrap()
    }
}

impl Navigator for FakeRouter {
    fn current_route(&self) -> String {
        self.route.lock().unwrap().clone()
    }

    fn navigate(&self, route: &str) {
        self.navigations.lock().unwrap().push(route.to_string());
        *self.route.lock().unwrap() = route.to_string();
    }

    fn leave_application(&self) {
        *self.left.lock().unwrap() = true;
    }
}

// =========================================================================
// Transport
// =========================================================================

/// 200 for the accepted bearer, 401 otherwise, 403 for forbidden paths.
pub struct Gate {
    accepted: String,
    forbidden: Mutex<Vec<String>>,
    seen: Mutex<Vec<Request>>,
}

impl Gate {
    pub fn accepting(token: &str) -> Arc<Self> {
        Arc::new(Self {
            accepted: token.to_string(),
            forbidden: Mutex::new(Vec::new()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn forbid(&self, path: &str) {
        self.forbidden.lock().unwrap().push(path.to_string());
    }

    pub fn seen(&self) -> Vec<Request> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for Gate {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.seen.lock().unwrap().push(request.clone());
        if self.forbidden.lock().unwrap().contains(&request.path) {
            return Ok(Response::new(StatusCode::FORBIDDEN));
        }
        if request.bearer() == Some(self.accepted.as_str()) {
            Ok(Response::ok())
        } else {
            Ok(Response::new(StatusCode::UNAUTHORIZED))
        }
    }
}

// =========================================================================
// Notifier
// =========================================================================

#[derive(Default)]
pub struct Notices {
    pub seen: Mutex<Vec<(NoticeLevel, String)>>,
}

impl Notifier for Notices {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.seen.lock().unwrap().push((level, message.to_string()));
    }
}

// =========================================================================
// Wiring
// =========================================================================

pub struct Harness {
    pub keyward: Keyward<FakeBackend, Arc<Gate>>,
    pub router: Arc<FakeRouter>,
    pub gate: Arc<Gate>,
    pub notices: Arc<Notices>,
}

impl Harness {
    pub fn backend(&self) -> &FakeBackend {
        self.keyward.backend()
    }
}

/// A façade at `route` whose backend answers `check` and whose transport
/// accepts `T1`.
pub fn harness(route: &str, check: Check) -> Harness {
    let router = FakeRouter::at(route);
    let gate = Gate::accepting("T1");
    let notices = Arc::new(Notices::default());
    let keyward = KeywardBuilder::new()
        .notifier(Arc::clone(&notices) as Arc<dyn Notifier>)
        .build(
            FakeBackend::new(check),
            Arc::clone(&gate),
            Arc::clone(&router) as Arc<dyn Navigator>,
        );
    Harness {
        keyward,
        router,
        gate,
        notices,
    }
}

/// Lets spawned tasks run (and paused time advance) for `ms`.
pub async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
