//! Auth state and credential management for Keyward.
//!
//! This crate owns the client's notion of "who am I":
//!
//! 1. **Auth state** ([`SessionStore`]): the observable authenticated and
//!    root-wallet flags.
//! 2. **Credentials** ([`CredentialCache`] over a [`KeyValueStore`]): the
//!    persisted access token.
//! 3. **Request decoration** ([`RequestDecorator`]): bearer and
//!    fingerprint headers on every outbound call.
//! 4. **The backend contract** ([`AuthBackend`], [`HttpAuthBackend`]):
//!    `check`, `access`, `logout`, and wallet status.
//!
//! # How it fits in the stack
//!
//! ```text
//! Keyward (above)        ← reconciliation, navigation, logout
//!     ↕
//! Refresh layer          ← single-flight refresh, response guard
//!     ↕
//! Session (this crate)   ← auth state, token storage, backend contract
//!     ↕
//! Transport / Protocol   ← Request, Response, Transport
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod credential;
mod decorate;
mod error;
mod session;

pub use auth::{AuthBackend, HttpAuthBackend};
pub use credential::{
    Credential, CredentialCache, KeyValueStore, MemoryStore, DEFAULT_CREDENTIAL_KEY,
};
pub use decorate::{Fingerprint, RandomFingerprint, RequestDecorator};
pub use error::SessionError;
pub use session::{AuthChange, AuthState, SessionStore, SubscriptionId, WALLET_CACHE_KEY};
