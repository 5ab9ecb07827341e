//! Fixed-interval poll scheduler.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`PollScheduler`].
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Time between polls. `Duration::ZERO` disables polling entirely
    /// ([`PollScheduler::wait_for_poll`] pends forever).
    pub interval: Duration,
    /// Random jitter (0..max) added to the *first* poll so many clients
    /// entering the waiting state at once don't hit the backend in lockstep.
    pub initial_jitter: Duration,
    /// Stop after this many polls. `None` polls until told to stop.
    pub max_polls: Option<u64>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            initial_jitter: Duration::ZERO,
            max_polls: None,
        }
    }
}

impl PollConfig {
    /// Shortest interval a scheduler will accept.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

    /// Create a config for a specific interval with default settings.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`PollScheduler::new`]. A nonzero interval
    /// below [`Self::MIN_INTERVAL`] is raised to it.
    pub fn validated(mut self) -> Self {
        if !self.interval.is_zero() && self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                "poll interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self
    }
}

/// Returned by [`PollScheduler::wait_for_poll`] each time a poll is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollInfo {
    /// Poll number, starting at 1.
    pub attempt: u64,
    /// `true` if this poll is the last one allowed by `max_polls`.
    pub last: bool,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Drives a repeating poll.
///
/// Missed deadlines are skipped, never caught up: if the task awaiting the
/// poll was busy past a deadline, the next poll is scheduled from now.
pub struct PollScheduler {
    config: PollConfig,
    attempts: u64,
    next_poll: Option<Instant>,
}

impl PollScheduler {
    /// Create a new scheduler from config.
    pub fn new(config: PollConfig) -> Self {
        let config = config.validated();

        let next_poll = (!config.interval.is_zero()).then(|| {
            let jitter = if config.initial_jitter.is_zero() {
                Duration::ZERO
            } else {
                let max = config.initial_jitter.as_micros() as u64;
                Duration::from_micros(rand::rng().random_range(0..max))
            };
            Instant::now() + config.interval + jitter
        });

        debug!(
            interval_ms = config.interval.as_millis() as u64,
            max_polls = ?config.max_polls,
            "poll scheduler created"
        );

        Self {
            config,
            attempts: 0,
            next_poll,
        }
    }

    /// Create a scheduler polling at the given interval.
    pub fn every(interval: Duration) -> Self {
        Self::new(PollConfig::every(interval))
    }

    /// Wait until the next poll is due.
    ///
    /// Pends forever when polling is disabled or `max_polls` has been
    /// reached, so it is safe inside `tokio::select!`.
    pub async fn wait_for_poll(&mut self) -> PollInfo {
        let next = match self.next_poll {
            Some(next) if !self.exhausted() => next,
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        self.attempts += 1;
        self.next_poll = Some(now + self.config.interval);

        let info = PollInfo {
            attempt: self.attempts,
            last: self.config.max_polls == Some(self.attempts),
        };
        trace!(attempt = info.attempt, "poll due");
        info
    }

    /// Whether `max_polls` has been reached.
    pub fn exhausted(&self) -> bool {
        self.config
            .max_polls
            .is_some_and(|max| self.attempts >= max)
    }
}
