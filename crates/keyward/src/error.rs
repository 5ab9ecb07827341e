//! Unified error type for the Keyward crates.

use keyward_protocol::ProtocolError;
use keyward_refresh::GuardError;
use keyward_session::SessionError;
use keyward_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `keyward` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum KeywardError {
    /// A transport-level error (network failure, aborted request).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An auth backend call failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A guarded request could not be completed.
    #[error(transparent)]
    Guard(#[from] GuardError),

    /// The configuration could not be parsed.
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

impl KeywardError {
    /// Whether the user should see this error. Auth failures that resolve
    /// by redirecting to login are not user-visible.
    pub fn is_user_visible(&self) -> bool {
        match self {
            Self::Guard(e) => e.is_user_visible(),
            _ => true,
        }
    }
}
