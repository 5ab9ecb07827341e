//! Minimum-interval rate limiter.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::{Clock, TokioClock};

/// Lets an action through at most once per `window`.
///
/// The first [`try_acquire`](Self::try_acquire) always succeeds and stamps
/// the current instant; later calls succeed only once `window` has
/// elapsed since the last successful one. Rejected calls do not move the
/// stamp, so a steady stream of triggers still lets one through per
/// window instead of starving forever.
///
/// Thread-safe: the check and the stamp happen under one lock.
pub struct Cooldown {
    name: &'static str,
    window: Duration,
    last: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl Cooldown {
    /// Creates a cooldown reading Tokio's clock.
    pub fn new(name: &'static str, window: Duration) -> Self {
        Self::with_clock(name, window, Arc::new(TokioClock))
    }

    /// Creates a cooldown reading the given clock.
    pub fn with_clock(
        name: &'static str,
        window: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name,
            window,
            last: Mutex::new(None),
            clock,
        }
    }

    /// Returns `true` and restarts the window if the action may run now.
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        match *last {
            Some(at) if now.saturating_duration_since(at) < self.window => {
                trace!(
                    cooldown = self.name,
                    remaining_ms = (self.window - now.saturating_duration_since(at)).as_millis() as u64,
                    "suppressed by cooldown"
                );
                false
            }
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Time left until the next `try_acquire` would succeed.
    pub fn remaining(&self) -> Duration {
        let now = self.clock.now();
        let last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        match *last {
            Some(at) => self.window.saturating_sub(now.saturating_duration_since(at)),
            None => Duration::ZERO,
        }
    }
}

impl std::fmt::Debug for Cooldown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cooldown")
            .field("name", &self.name)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
