//! Auth backend payloads, endpoint paths, and header names.

use serde::{Deserialize, Serialize};

/// Paths of the remote auth endpoints the coordinator talks to.
pub mod endpoints {
    /// `GET`: 2xx means authenticated, 401 means not.
    pub const CHECK: &str = "/auth/check";

    /// `GET`: mints a fresh access token. Never refreshed on its own 401.
    pub const ACCESS: &str = "/auth/access";

    /// `POST`: ends the server-side session.
    pub const LOGOUT: &str = "/auth/logout";

    /// `GET`: secondary root-wallet status, fetched after a positive check.
    pub const WALLET_STATUS: &str = "/wallet/status";
}

/// Canonical (lowercase) header names.
pub mod headers {
    pub const AUTHORIZATION: &str = "authorization";
    pub const FINGERPRINT: &str = "x-client-fingerprint";
}

/// Body of a successful `access` call.
///
/// The backend may answer 2xx with no token at all; that is a refresh
/// failure, not a decode error, so the field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    #[serde(default)]
    pub access_token: Option<String>,
}

impl AccessGrant {
    /// Wraps a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
        }
    }

    /// The token, treating an empty string the same as a missing one.
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Consumes the grant and returns the non-empty token, if any.
    pub fn into_token(self) -> Option<String> {
        self.access_token.filter(|t| !t.is_empty())
    }
}

/// Body of the wallet status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStatus {
    #[serde(default)]
    pub is_root_wallet_initialized: bool,
}
