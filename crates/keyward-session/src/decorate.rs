//! Outbound request decoration.

use std::sync::Arc;

use keyward_protocol::{Request, headers};
use rand::Rng;

use crate::CredentialCache;

/// Supplies a stable identifier for this client instance.
///
/// Returning `None` skips the header for that request.
pub trait Fingerprint: Send + Sync + 'static {
    fn fingerprint(&self) -> Option<String>;
}

/// A fingerprint generated once per process: 128 random bits as 32 hex
/// characters.
#[derive(Debug, Clone)]
pub struct RandomFingerprint(String);

impl RandomFingerprint {
    pub fn new() -> Self {
        let bytes: [u8; 16] = rand::rng().random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RandomFingerprint {
    fn default() -> Self {
        Self::new()
    }
}

impl Fingerprint for RandomFingerprint {
    fn fingerprint(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// The request-decorator hook: runs on every request before dispatch.
///
/// Attaches `Authorization: Bearer <token>` when a token is cached and the
/// fingerprint header when a fingerprint source is configured. Both are
/// best-effort; a missing token or fingerprint just leaves the header off.
#[derive(Clone)]
pub struct RequestDecorator {
    credentials: CredentialCache,
    fingerprint: Option<Arc<dyn Fingerprint>>,
}

impl RequestDecorator {
    pub fn new(credentials: CredentialCache) -> Self {
        Self {
            credentials,
            fingerprint: None,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: Arc<dyn Fingerprint>) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    pub fn decorate(&self, request: &mut Request) {
        if let Some(credential) = self.credentials.get() {
            request.set_bearer(credential.as_str());
        }
        if let Some(id) = self.fingerprint.as_ref().and_then(|f| f.fingerprint()) {
            request.set_header(headers::FINGERPRINT, id);
        }
    }

    pub fn credentials(&self) -> &CredentialCache {
        &self.credentials
    }
}

impl std::fmt::Debug for RequestDecorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDecorator")
            .field("credentials", &self.credentials)
            .field("fingerprint", &self.fingerprint.is_some())
            .finish()
    }
}
