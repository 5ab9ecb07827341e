//! Error types for the session layer.

use keyward_protocol::{ProtocolError, StatusCode};
use keyward_transport::TransportError;

/// Errors returned by an [`AuthBackend`](crate::AuthBackend).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The call never got a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The endpoint answered with a status its contract doesn't allow.
    #[error("{endpoint} returned unexpected status {status}")]
    UnexpectedStatus {
        endpoint: &'static str,
        status: StatusCode,
    },
}
