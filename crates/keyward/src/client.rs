//! `Keyward` builder and façade.
//!
//! This is the entry point for hosting the coordinator. It ties together
//! all the layers: transport → session → refresh → reconciliation →
//! navigation.

use std::sync::{Arc, Mutex, PoisonError};

use keyward_protocol::{Request, Response};
use keyward_refresh::{LockoutHandler, RefreshConfig, RefreshCoordinator, ResponseGuard};
use keyward_session::{
    AuthBackend, Credential, CredentialCache, Fingerprint, HttpAuthBackend, KeyValueStore,
    MemoryStore, RequestDecorator, SessionStore,
};
use keyward_tick::{Clock, TokioClock};
use keyward_transport::Transport;
use tracing::{info, warn};

use crate::{
    CheckOutcome, KeywardConfig, KeywardError, NavigationBridge, Navigator, NoticeLevel,
    Notifier, PollHandle, Reconciler, TracingNotifier, WatchHandle,
};

/// Builder for wiring a [`Keyward`] instance.
///
/// # Example
///
/// ```rust,ignore
/// use keyward::prelude::*;
///
/// let keyward = KeywardBuilder::new()
///     .config(KeywardConfig::from_json(&json)?)
///     .credential_store(local_storage)
///     .fingerprint(Arc::new(RandomFingerprint::new()))
///     .build_http(transport, navigator);
/// keyward.start().await;
/// ```
pub struct KeywardBuilder {
    config: KeywardConfig,
    credential_store: Option<Arc<dyn KeyValueStore>>,
    ephemeral_store: Option<Arc<dyn KeyValueStore>>,
    fingerprint: Option<Arc<dyn Fingerprint>>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl KeywardBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: KeywardConfig::default(),
            credential_store: None,
            ephemeral_store: None,
            fingerprint: None,
            clock: Arc::new(TokioClock),
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn config(mut self, config: KeywardConfig) -> Self {
        self.config = config;
        self
    }

    /// Where the access token persists. Defaults to an in-memory store.
    pub fn credential_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.credential_store = Some(store);
        self
    }

    /// Where the wallet flag is mirrored. Defaults to an in-memory store.
    pub fn ephemeral_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.ephemeral_store = Some(store);
        self
    }

    pub fn fingerprint(mut self, fingerprint: Arc<dyn Fingerprint>) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    /// The clock the debounce windows read.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Where user-facing notices go. Defaults to the log.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Wires everything around a caller-supplied backend.
    pub fn build<B: AuthBackend, T: Transport>(
        self,
        backend: B,
        transport: T,
        navigator: Arc<dyn Navigator>,
    ) -> Keyward<B, T> {
        self.assemble(|_| backend, transport, navigator)
    }

    /// Wires everything around an [`HttpAuthBackend`] that shares
    /// `transport` and the request decorator with the guarded client.
    pub fn build_http<T: Transport + Clone>(
        self,
        transport: T,
        navigator: Arc<dyn Navigator>,
    ) -> Keyward<HttpAuthBackend<T>, T> {
        let backend_transport = transport.clone();
        self.assemble(
            |decorator| HttpAuthBackend::new(backend_transport, decorator),
            transport,
            navigator,
        )
    }

    fn assemble<B: AuthBackend, T: Transport>(
        self,
        backend_for: impl FnOnce(RequestDecorator) -> B,
        transport: T,
        navigator: Arc<dyn Navigator>,
    ) -> Keyward<B, T> {
        let config = self.config.validated();

        let store = self
            .credential_store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let credentials = CredentialCache::with_key(store, config.credential_key.clone());

        let mut decorator = RequestDecorator::new(credentials.clone());
        if let Some(fingerprint) = self.fingerprint {
            decorator = decorator.with_fingerprint(fingerprint);
        }

        let session = Arc::new(match self.ephemeral_store {
            Some(store) => SessionStore::with_ephemeral_cache(store),
            None => SessionStore::new(),
        });

        let backend = Arc::new(backend_for(decorator.clone()));

        let coordinator = Arc::new(RefreshCoordinator::with_config(
            Arc::clone(&backend),
            credentials.clone(),
            Arc::clone(&session),
            RefreshConfig {
                timeout: config.refresh_timeout,
            },
        ));

        let navigation = Arc::new(NavigationBridge::new(
            navigator,
            config.routes.clone(),
            config.navigation_grace,
        ));

        let client = ResponseGuard::new(transport, decorator, Arc::clone(&coordinator))
            .with_lockout(Arc::clone(&navigation) as Arc<dyn LockoutHandler>);

        let reconciler = Arc::new(Reconciler::new(
            Arc::clone(&backend),
            Arc::clone(&session),
            Arc::clone(&navigation),
            &config,
            self.clock,
        ));

        Keyward {
            config,
            session,
            credentials,
            backend,
            coordinator,
            client,
            reconciler,
            navigation,
            notifier: self.notifier,
            watcher: Mutex::new(None),
        }
    }
}

impl Default for KeywardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A wired-up session coordinator.
///
/// Call [`start()`](Self::start) once the host's router is ready, then
/// route outbound requests through [`send()`](Self::send) and forward
/// route changes and form submissions to the matching entry points.
pub struct Keyward<B: AuthBackend, T: Transport> {
    config: KeywardConfig,
    session: Arc<SessionStore>,
    credentials: CredentialCache,
    backend: Arc<B>,
    coordinator: Arc<RefreshCoordinator<B>>,
    client: ResponseGuard<T, B>,
    reconciler: Arc<Reconciler<B>>,
    navigation: Arc<NavigationBridge>,
    notifier: Arc<dyn Notifier>,
    watcher: Mutex<Option<WatchHandle>>,
}

impl<B: AuthBackend, T: Transport> Keyward<B, T> {
    /// Starts the state watcher (once) and runs the startup check.
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn start(&self) -> CheckOutcome {
        {
            let mut watcher = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
            if watcher.is_none() {
                *watcher = Some(self.reconciler.watch());
            }
        }
        self.reconciler.startup_check().await
    }

    /// Sends a request through the guarded client.
    pub async fn send(&self, request: Request) -> Result<Response, KeywardError> {
        Ok(self.client.send(request).await?)
    }

    /// Ends the session on the server, then locally.
    ///
    /// On failure local state is left as it was and the user is warned.
    pub async fn logout(&self) -> Result<(), KeywardError> {
        match self.backend.logout().await {
            Ok(()) => {
                self.credentials.remove();
                self.session.set_authenticated(false);
                info!("logged out");
                self.notifier.notify(NoticeLevel::Info, "Signed out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "logout failed");
                self.notifier
                    .notify(NoticeLevel::Warning, "Could not sign out. Please try again.");
                Err(e.into())
            }
        }
    }

    /// Stores a credential issued by a sign-in flow and marks the session
    /// authenticated.
    pub fn signed_in(&self, token: impl Into<String>) {
        self.credentials.set(&Credential::new(token));
        self.session.set_authenticated(true);
        info!("signed in");
    }

    /// Forward every route change here.
    pub async fn on_location_change(&self, path: &str) -> CheckOutcome {
        self.reconciler.on_location_change(path).await
    }

    /// Call after a sign-in or sign-up form was submitted. Keep the handle
    /// for as long as the "check your inbox" screen is shown.
    pub fn form_submitted(&self) -> PollHandle {
        self.reconciler.form_submitted()
    }

    pub fn config(&self) -> &KeywardConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn credentials(&self) -> &CredentialCache {
        &self.credentials
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator<B>> {
        &self.coordinator
    }

    /// The guarded client.
    pub fn client(&self) -> &ResponseGuard<T, B> {
        &self.client
    }

    pub fn reconciler(&self) -> &Arc<Reconciler<B>> {
        &self.reconciler
    }

    pub fn navigation(&self) -> &Arc<NavigationBridge> {
        &self.navigation
    }
}
