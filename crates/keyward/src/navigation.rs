//! Redirects between the login and home routes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use keyward_refresh::LockoutHandler;
use tracing::{debug, info, warn};

use crate::RouteConfig;

/// The host's router, seen through the narrowest possible window.
pub trait Navigator: Send + Sync + 'static {
    /// The route currently displayed, e.g. `/login` or `/app?tab=2`.
    fn current_route(&self) -> String;

    /// Starts an in-app navigation. May complete asynchronously.
    fn navigate(&self, route: &str);

    /// Leaves the application entirely (full top-level redirect).
    fn leave_application(&self);
}

/// Where a redirect should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Login,
    Home,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("login"),
            Self::Home => f.write_str("home"),
        }
    }
}

/// What [`NavigationBridge::to`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// Already on the target route. Nothing happened.
    AlreadyThere,
    /// An email-link activation is in progress. Nothing happened.
    Suppressed,
    /// Navigated and the route changed as expected.
    Navigated,
    /// Navigated but the route had not changed after the grace delay.
    Unverified,
}

/// Decides whether a redirect should happen, performs it, and checks it
/// landed.
pub struct NavigationBridge {
    navigator: Arc<dyn Navigator>,
    routes: RouteConfig,
    grace: Duration,
}

impl NavigationBridge {
    pub fn new(navigator: Arc<dyn Navigator>, routes: RouteConfig, grace: Duration) -> Self {
        Self {
            navigator,
            routes,
            grace,
        }
    }

    /// The configured route for `target`.
    pub fn route(&self, target: Target) -> &str {
        match target {
            Target::Login => &self.routes.login,
            Target::Home => &self.routes.home,
        }
    }

    /// Whether the current route is `target`. Query and fragment are
    /// ignored.
    pub fn is_at(&self, target: Target) -> bool {
        route_path(&self.navigator.current_route()) == self.route(target)
    }

    /// Whether an email-link activation is being displayed.
    pub fn is_activating(&self) -> bool {
        self.navigator
            .current_route()
            .starts_with(&self.routes.activation_prefix)
    }

    /// Whether `path` is the login route.
    pub fn is_login_route(&self, path: &str) -> bool {
        route_path(path) == self.routes.login
    }

    /// Redirects to `target` unless that would be pointless or harmful.
    pub async fn to(&self, target: Target) -> NavOutcome {
        let current = self.navigator.current_route();

        if route_path(&current) == self.route(target) {
            debug!(%target, "already at target route");
            return NavOutcome::AlreadyThere;
        }
        if self.is_activating() {
            debug!(%target, route = %current, "activation in progress, not redirecting");
            return NavOutcome::Suppressed;
        }

        let route = self.route(target).to_string();
        info!(%target, from = %current, to = %route, "navigating");
        self.navigator.navigate(&route);

        tokio::time::sleep(self.grace).await;

        let landed = self.navigator.current_route();
        if route_path(&landed) == route {
            NavOutcome::Navigated
        } else {
            warn!(%target, expected = %route, actual = %landed, "navigation did not take effect");
            NavOutcome::Unverified
        }
    }

    /// Leaves the application entirely.
    pub fn leave_application(&self) {
        warn!("leaving application");
        self.navigator.leave_application();
    }
}

impl LockoutHandler for NavigationBridge {
    fn lockout(&self, path: &str) {
        warn!(path, "access blocked by server");
        self.leave_application();
    }
}

fn route_path(route: &str) -> &str {
    route.split(['?', '#']).next().unwrap_or(route)
}
