//! Credential refresh for Keyward.
//!
//! When the access token expires, every request in flight discovers it at
//! roughly the same moment. This crate makes sure that turns into exactly
//! one call to the refresh endpoint:
//!
//! - [`RefreshCoordinator`]: single-flight refresh. The first caller runs
//!   the network call; everyone who arrives while it is in flight waits on
//!   a one-shot channel and receives the same outcome.
//! - [`ResponseGuard`]: the response-error hook. Wraps a
//!   [`Transport`](keyward_transport::Transport), decorates outbound
//!   requests, and on a 401 joins the refresh and replays the request once.
//! - [`LockoutHandler`]: what to do on a 403 (hard block).
//!
//! # Key invariants
//!
//! - At most one refresh call in flight at any instant.
//! - After a refresh settles, the in-flight flag is clear and the waiter
//!   queue is empty, even if the leading future was dropped mid-call.
//! - A request is replayed at most once.

mod config;
mod coordinator;
mod error;
mod guard;

pub use config::RefreshConfig;
pub use coordinator::RefreshCoordinator;
pub use error::GuardError;
pub use guard::{LockoutHandler, ResponseGuard};
