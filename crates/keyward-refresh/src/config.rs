//! Refresh configuration.

use std::time::Duration;

/// Configuration for the [`RefreshCoordinator`](crate::RefreshCoordinator).
#[derive(Debug, Clone, Default)]
pub struct RefreshConfig {
    /// Upper bound on a single refresh call. When it elapses the refresh
    /// counts as failed and every waiter receives `None`.
    ///
    /// `None` (the default) waits indefinitely: a hung refresh hangs every
    /// joined caller until the backend answers.
    pub timeout: Option<Duration>,
}

impl RefreshConfig {
    /// A config that gives up on a refresh after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}
