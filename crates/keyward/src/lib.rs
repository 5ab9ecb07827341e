//! # Keyward
//!
//! Session authentication coordinator for web clients.
//!
//! Keyward tracks whether the client is signed in, refreshes an expired
//! access token transparently, and keeps that state consistent across any
//! number of concurrent requests and UI events. The host plugs in four
//! narrow collaborators: an [`AuthBackend`], a [`Transport`], a
//! [`Navigator`], and optionally a [`Notifier`].
//!
//! ## Layers
//!
//! ```text
//! Keyward (façade)
//!   ├── Reconciler ─────────→ NavigationBridge ──→ Navigator
//!   ├── ResponseGuard ──────→ RefreshCoordinator ──→ AuthBackend
//!   │        └─ RequestDecorator ──→ CredentialCache ──→ KeyValueStore
//!   └── SessionStore (observable)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use keyward::prelude::*;
//!
//! struct Router;
//!
//! impl Navigator for Router {
//!     fn current_route(&self) -> String {
//!         "/".to_string()
//!     }
//!     fn navigate(&self, _route: &str) {}
//!     fn leave_application(&self) {}
//! }
//!
//! # async fn run(transport: impl Transport + Clone) {
//! let keyward = KeywardBuilder::new().build_http(transport, Arc::new(Router));
//! keyward.start().await;
//! let response = keyward.send(Request::get("/wallet/balances")).await;
//! # }
//! ```
//!
//! [`AuthBackend`]: keyward_session::AuthBackend
//! [`Transport`]: keyward_transport::Transport

mod client;
mod config;
mod error;
mod navigation;
mod notify;
mod reconcile;
mod telemetry;

pub use client::{Keyward, KeywardBuilder};
pub use config::{KeywardConfig, RouteConfig};
pub use error::KeywardError;
pub use navigation::{NavOutcome, NavigationBridge, Navigator, Target};
pub use notify::{NoticeLevel, Notifier, TracingNotifier};
pub use reconcile::{CheckOutcome, PollHandle, Reaction, Reconciler, WatchHandle};
pub use telemetry::init_tracing;

/// Re-exports of the sub-crates, for callers that need the lower layers
/// directly.
pub mod protocol {
    pub use keyward_protocol::*;
}

pub mod refresh {
    pub use keyward_refresh::*;
}

pub mod session {
    pub use keyward_session::*;
}

pub mod tick {
    pub use keyward_tick::*;
}

pub mod transport {
    pub use keyward_transport::*;
}

/// Everything a host typically needs.
pub mod prelude {
    pub use keyward_protocol::{
        AccessGrant, Method, Request, Response, StatusCode, WalletStatus, endpoints,
    };
    pub use keyward_refresh::{GuardError, LockoutHandler, RefreshCoordinator, ResponseGuard};
    pub use keyward_session::{
        AuthBackend, AuthChange, AuthState, Credential, CredentialCache, Fingerprint,
        HttpAuthBackend, KeyValueStore, MemoryStore, RandomFingerprint, SessionError,
        SessionStore,
    };
    pub use keyward_tick::{Clock, ManualClock, TokioClock};
    pub use keyward_transport::{Transport, TransportError};

    pub use crate::{
        CheckOutcome, Keyward, KeywardBuilder, KeywardConfig, KeywardError, NavOutcome,
        NavigationBridge, Navigator, NoticeLevel, Notifier, PollHandle, Reaction, Reconciler,
        RouteConfig, Target, TracingNotifier, WatchHandle, init_tracing,
    };
}
