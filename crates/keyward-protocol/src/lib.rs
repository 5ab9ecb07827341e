//! Wire protocol for Keyward.
//!
//! This crate defines the shapes that travel between the coordinator and
//! the authentication backend:
//!
//! - **Envelopes** ([`Request`], [`Response`], [`StatusCode`], [`Method`]):
//!   the transport-neutral request/response pair every outbound call uses.
//! - **Auth payloads** ([`AccessGrant`], [`WalletStatus`]) and the fixed
//!   [`endpoints`] and [`headers`] the coordinator relies on.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how payload bodies are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (Request → Response) → Protocol (decode bodies) → Session (auth state)
//! ```
//!
//! Nothing here performs I/O. The protocol layer only knows how requests
//! are described and how bodies are decoded.

mod codec;
mod error;
mod types;
mod wire;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{Method, Request, Response, StatusCode};
pub use wire::{endpoints, headers, AccessGrant, WalletStatus};
