//! Timing primitives for Keyward.
//!
//! - [`Clock`]: an injectable monotonic clock, so every time-dependent
//!   decision can be driven deterministically in tests ([`ManualClock`])
//!   or by Tokio's clock in production ([`TokioClock`]).
//! - [`Cooldown`]: a minimum-interval rate limiter. Every debounce in the
//!   coordinator (auth check, location recheck, login redirect) is one of
//!   these.
//! - [`PollScheduler`]: a fixed-interval poller for the "waiting for the
//!   email link" state.
//!
//! # Integration
//!
//! The poll scheduler is designed to sit inside a spawned task's loop:
//!
//! ```ignore
//! loop {
//!     scheduler.wait_for_poll().await;
//!     if backend.check().await == Ok(true) {
//!         break;
//!     }
//! }
//! ```

mod clock;
mod cooldown;
mod poll;

pub use clock::{Clock, ManualClock, TokioClock};
pub use cooldown::Cooldown;
pub use poll::{PollConfig, PollInfo, PollScheduler};
