//! Error types for the refresh layer.

use keyward_protocol::Response;
use keyward_transport::TransportError;

/// Errors surfaced by [`ResponseGuard::send`](crate::ResponseGuard::send).
///
/// Non-auth error statuses (404, 500, ...) are not errors at this layer;
/// they come back as `Ok(Response)` for the caller to interpret.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// No response at all. Passed through untouched.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A 401 that could not be recovered: the refresh failed, or the
    /// request was one that must never trigger a refresh. Carries the
    /// original response.
    #[error("unauthorized: {path}")]
    Unauthorized { path: String, response: Response },

    /// A 403. The lockout handler has already been invoked.
    #[error("access blocked: {path}")]
    HardBlocked { path: String },

    /// The request was already replayed once with a fresh credential and
    /// still got a 401.
    #[error("still unauthorized after refresh: {path}")]
    RetryExhausted { path: String, response: Response },
}

impl GuardError {
    /// `true` for the kinds the user should actually see: the hard block
    /// and an exhausted retry. Everything else resolves by redirecting to
    /// login, not by surfacing an error on the page.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::HardBlocked { .. } | Self::RetryExhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use keyward_protocol::StatusCode;

    use super::*;

    #[test]
    fn test_is_user_visible_only_for_unrecoverable_kinds() {
        let unauthorized = Response::new(StatusCode::UNAUTHORIZED);
        assert!(GuardError::HardBlocked { path: "/x".into() }.is_user_visible());
        assert!(GuardError::RetryExhausted {
            path: "/x".into(),
            response: unauthorized.clone(),
        }
        .is_user_visible());
        assert!(!GuardError::Unauthorized {
            path: "/x".into(),
            response: unauthorized,
        }
        .is_user_visible());
        assert!(!GuardError::Transport(TransportError::Aborted).is_user_visible());
    }

    #[test]
    fn test_display_includes_path() {
        let err = GuardError::HardBlocked {
            path: "/admin".into(),
        };
        assert_eq!(err.to_string(), "access blocked: /admin");
    }
}
