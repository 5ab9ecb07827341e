//! Keeps the local auth state in line with the server.
//!
//! Four triggers, each with its own debounce:
//!
//! | Trigger                 | Cooldown            | On failure                    |
//! |-------------------------|---------------------|-------------------------------|
//! | startup                 | `check_cooldown`    | treated as signed out         |
//! | state became signed out | `redirect_cooldown` | state left alone, go to login |
//! | landed on login route   | `location_cooldown` | treated as signed out         |
//! | form submitted (poll)   | none (interval)     | ignored, keep polling         |
//!
//! The watcher and the poll are success-only: a failed check never writes
//! `false` into the session from those paths.

use std::sync::Arc;

use keyward_session::{AuthBackend, AuthChange, SessionStore, SubscriptionId};
use keyward_tick::{Clock, Cooldown, PollConfig, PollScheduler};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::{KeywardConfig, NavOutcome, NavigationBridge, Target};

/// Result of a server check run by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Debounced; the server was not asked.
    Skipped,
    Authenticated,
    Unauthenticated,
}

/// How the watcher reacted to a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// The change was not a transition to signed out.
    Ignored,
    /// Signed out, but a redirect already fired inside the cooldown.
    Debounced,
    /// The server still accepts the session; the flag was set back.
    Corrected,
    /// Signed out for real (or the server could not be reached).
    Redirected(NavOutcome),
}

/// The reconciliation loop.
///
/// Share it behind an `Arc`: [`watch`](Self::watch) and
/// [`form_submitted`](Self::form_submitted) spawn tasks that hold a clone.
pub struct Reconciler<B: AuthBackend> {
    backend: Arc<B>,
    session: Arc<SessionStore>,
    navigation: Arc<NavigationBridge>,
    check_cooldown: Cooldown,
    location_cooldown: Cooldown,
    redirect_cooldown: Cooldown,
    poll: PollConfig,
}

impl<B: AuthBackend> Reconciler<B> {
    pub fn new(
        backend: Arc<B>,
        session: Arc<SessionStore>,
        navigation: Arc<NavigationBridge>,
        config: &KeywardConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            session,
            navigation,
            check_cooldown: Cooldown::with_clock(
                "startup-check",
                config.check_cooldown,
                Arc::clone(&clock),
            ),
            location_cooldown: Cooldown::with_clock(
                "location-check",
                config.location_cooldown,
                Arc::clone(&clock),
            ),
            redirect_cooldown: Cooldown::with_clock(
                "redirect",
                config.redirect_cooldown,
                clock,
            ),
            poll: config.poll(),
        }
    }

    // -----------------------------------------------------------------------
    // Startup / location
    // -----------------------------------------------------------------------

    /// Asks the server whether the session is valid and acts on the answer.
    ///
    /// Signed out: go to login. Signed in: fetch the wallet flag and leave
    /// the login route if on it. A failed check counts as signed out.
    pub async fn startup_check(&self) -> CheckOutcome {
        if !self.check_cooldown.try_acquire() {
            debug!(
                remaining_ms = self.check_cooldown.remaining().as_millis() as u64,
                "startup check debounced"
            );
            return CheckOutcome::Skipped;
        }
        self.run_check().await
    }

    /// Re-checks when the user lands on the login route, e.g. via the back
    /// button while a session cookie still exists.
    pub async fn on_location_change(&self, path: &str) -> CheckOutcome {
        if !self.navigation.is_login_route(path) {
            return CheckOutcome::Skipped;
        }
        if !self.location_cooldown.try_acquire() {
            debug!(
                path,
                remaining_ms = self.location_cooldown.remaining().as_millis() as u64,
                "location check debounced"
            );
            return CheckOutcome::Skipped;
        }
        self.run_check().await
    }

    async fn run_check(&self) -> CheckOutcome {
        let authenticated = match self.backend.check().await {
            Ok(authenticated) => authenticated,
            Err(e) => {
                warn!(error = %e, "auth check failed, treating as signed out");
                false
            }
        };

        self.session.set_authenticated(authenticated);

        if !authenticated {
            self.navigation.to(Target::Login).await;
            return CheckOutcome::Unauthenticated;
        }

        let initialized = match self.backend.wallet_status().await {
            Ok(status) => status.is_root_wallet_initialized,
            Err(e) => {
                debug!(error = %e, "wallet status unavailable, assuming uninitialized");
                false
            }
        };
        self.session.set_root_wallet_initialized(initialized);

        if self.navigation.is_at(Target::Login) {
            self.navigation.to(Target::Home).await;
        }
        CheckOutcome::Authenticated
    }

    // -----------------------------------------------------------------------
    // State-change watcher
    // -----------------------------------------------------------------------

    /// Reacts to a committed state change.
    ///
    /// Only a transition to signed out matters. Local writes can be stale,
    /// so the server is asked first: if it still accepts the session the
    /// flag is restored and nothing navigates. Only the redirect itself is
    /// gated by the redirect cooldown.
    pub async fn on_state_change(&self, change: AuthChange) -> Reaction {
        if change.current.is_authenticated {
            return Reaction::Ignored;
        }

        match self.backend.check().await {
            Ok(true) => {
                info!("server still accepts session, restoring signed-in state");
                self.session.set_authenticated(true);
                Reaction::Corrected
            }
            Ok(false) => self.redirect_to_login().await,
            Err(e) => {
                debug!(error = %e, "re-check failed, keeping signed-out state");
                self.redirect_to_login().await
            }
        }
    }

    async fn redirect_to_login(&self) -> Reaction {
        if !self.redirect_cooldown.try_acquire() {
            debug!(
                remaining_ms = self.redirect_cooldown.remaining().as_millis() as u64,
                "redirect debounced"
            );
            return Reaction::Debounced;
        }
        Reaction::Redirected(self.navigation.to(Target::Login).await)
    }

    /// Subscribes to the session and runs
    /// [`on_state_change`](Self::on_state_change) for every change, in
    /// order, on a spawned task.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn watch(self: &Arc<Self>) -> WatchHandle {
        let (tx, mut rx) = mpsc::unbounded_channel::<AuthChange>();
        let subscription = self.session.subscribe(move |change| {
            // Closed only after the handle is dropped.
            let _ = tx.send(*change);
        });

        let reconciler = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(change) = rx.recv().await {
                let reaction = reconciler.on_state_change(change).await;
                trace!(?reaction, "state change handled");
            }
        });

        debug!("state watcher started");
        WatchHandle {
            session: Arc::clone(&self.session),
            subscription,
            task,
        }
    }

    // -----------------------------------------------------------------------
    // Post-submit poll
    // -----------------------------------------------------------------------

    /// Starts polling the server after a sign-in or sign-up form was
    /// submitted. Stops on the first positive check, after setting the
    /// session and navigating home, or once the configured poll limit is
    /// spent.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn form_submitted(self: &Arc<Self>) -> PollHandle {
        let reconciler = Arc::clone(self);
        let mut scheduler = PollScheduler::new(self.poll.clone());

        let task = tokio::spawn(async move {
            loop {
                let poll = scheduler.wait_for_poll().await;
                match reconciler.backend.check().await {
                    Ok(true) => {
                        info!(attempt = poll.attempt, "confirmation received");
                        reconciler.session.set_authenticated(true);
                        reconciler.navigation.to(Target::Home).await;
                        break;
                    }
                    Ok(false) => trace!(attempt = poll.attempt, "not confirmed yet"),
                    Err(e) => debug!(attempt = poll.attempt, error = %e, "poll check failed"),
                }
                if poll.last {
                    warn!(attempts = poll.attempt, "no confirmation within poll limit, giving up");
                    break;
                }
            }
        });

        debug!(interval_ms = self.poll.interval.as_millis() as u64, "post-submit poll started");
        PollHandle { task: Some(task) }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn navigation(&self) -> &Arc<NavigationBridge> {
        &self.navigation
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Keeps the state watcher alive. Dropping it unsubscribes and stops the
/// task.
pub struct WatchHandle {
    session: Arc<SessionStore>,
    subscription: SubscriptionId,
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.session.unsubscribe(self.subscription);
        self.task.abort();
        debug!("state watcher stopped");
    }
}

/// Controls a running post-submit poll. Dropping it stops the poll.
pub struct PollHandle {
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stops polling now.
    pub fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether the poll ended on its own (confirmed or out of polls).
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the poll to end on its own.
    pub async fn finished(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
