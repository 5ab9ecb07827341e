//! Transport abstraction layer for Keyward.
//!
//! Provides the [`Transport`] trait: the outbound request pipeline the
//! coordinator plugs into. Keyward never opens sockets itself. An
//! application implements `Transport` on top of whatever HTTP client it
//! already uses, and the refresh layer wraps it.
//!
//! A `Transport` returns `Ok(Response)` for every response that made it
//! back, whatever its status. Only failures to get a response at all
//! (DNS, connection reset, aborted request) are `Err`.

#![allow(async_fn_in_trait)]

mod error;

pub use error::TransportError;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use keyward_protocol::{Request, Response};

/// Opaque identifier for an outbound request, used to correlate log lines
/// across a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a new `RequestId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Sends requests and yields responses.
///
/// `Send + Sync + 'static` so one transport can be shared by every task
/// that issues requests, and the returned future is `Send` so callers can
/// `tokio::spawn` work that awaits it.
pub trait Transport: Send + Sync + 'static {
    /// Dispatches the request and waits for its response.
    fn send(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send {
        (**self).send(request)
    }
}
