//! The response-error hook.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use keyward_protocol::{Request, Response};
use keyward_session::{AuthBackend, RequestDecorator};
use keyward_transport::{RequestId, Transport};
use tracing::{debug, trace, warn};

use crate::{GuardError, RefreshCoordinator};

/// Reacts to a 403 by taking the user out of the application.
pub trait LockoutHandler: Send + Sync + 'static {
    /// Called once per blocked request, before the error is returned.
    fn lockout(&self, path: &str);
}

/// Wraps a [`Transport`] with auth-failure recovery.
///
/// Per request:
///
/// ```text
///            ┌──────────── 2xx / other ────────────→ Ok(response)
/// send ──→ dispatch ── 403 ──→ lockout ───────────→ Err(HardBlocked)
///            │
///            └─ 401 ─┬─ refresh endpoint / skip_refresh → Err(Unauthorized)
///                    ├─ already retried ───────────────→ Err(RetryExhausted)
///                    └─ request_refresh()
///                          ├─ None ────────────────────→ Err(Unauthorized)
///                          └─ token → set bearer → dispatch again (once)
/// ```
///
/// Concurrent 401s converge on the coordinator's single in-flight refresh;
/// each request then resumes independently.
pub struct ResponseGuard<T: Transport, B: AuthBackend> {
    transport: T,
    decorator: RequestDecorator,
    coordinator: Arc<RefreshCoordinator<B>>,
    lockout: Option<Arc<dyn LockoutHandler>>,
    next_id: AtomicU64,
}

impl<T: Transport, B: AuthBackend> ResponseGuard<T, B> {
    /// Creates a guard. Without a lockout handler a 403 is only logged
    /// before the error is returned.
    pub fn new(
        transport: T,
        decorator: RequestDecorator,
        coordinator: Arc<RefreshCoordinator<B>>,
    ) -> Self {
        Self {
            transport,
            decorator,
            coordinator,
            lockout: None,
            next_id: AtomicU64::new(0),
        }
    }

    /// Installs the handler invoked on a 403.
    pub fn with_lockout(mut self, handler: Arc<dyn LockoutHandler>) -> Self {
        self.lockout = Some(handler);
        self
    }

    /// Decorates and dispatches `request`, recovering from one expired
    /// credential along the way.
    ///
    /// # Errors
    /// See [`GuardError`]. Statuses other than 401 and 403 are returned as
    /// `Ok` untouched.
    pub async fn send(&self, mut request: Request) -> Result<Response, GuardError> {
        let id = RequestId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.decorator.decorate(&mut request);
        trace!(%id, method = %request.method, path = %request.path, "dispatching");

        loop {
            let response = self.transport.send(request.clone()).await?;

            if response.status.is_forbidden() {
                warn!(%id, path = %request.path, "request hard-blocked");
                if let Some(handler) = &self.lockout {
                    handler.lockout(&request.path);
                }
                return Err(GuardError::HardBlocked { path: request.path });
            }

            if !response.status.is_unauthorized() {
                return Ok(response);
            }

            if request.is_refresh_call() || request.skip_refresh {
                debug!(%id, path = %request.path, "401 on a non-refreshable request");
                return Err(GuardError::Unauthorized {
                    path: request.path,
                    response,
                });
            }

            if request.retried {
                warn!(%id, path = %request.path, "401 after refresh, giving up");
                return Err(GuardError::RetryExhausted {
                    path: request.path,
                    response,
                });
            }

            request.retried = true;
            debug!(%id, path = %request.path, "401, awaiting refresh");

            match self.coordinator.request_refresh().await {
                Some(credential) => {
                    request.set_bearer(credential.as_str());
                    debug!(%id, "replaying with refreshed credential");
                }
                None => {
                    debug!(%id, "refresh failed, surfacing original 401");
                    return Err(GuardError::Unauthorized {
                        path: request.path,
                        response,
                    });
                }
            }
        }
    }

    /// The coordinator this guard refreshes through.
    pub fn coordinator(&self) -> &Arc<RefreshCoordinator<B>> {
        &self.coordinator
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}
