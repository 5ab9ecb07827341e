//! Integration tests for `HttpAuthBackend` against a scripted transport.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use keyward_protocol::{Method, ProtocolError, Request, Response, StatusCode, endpoints, headers};
use keyward_session::{
    AuthBackend, Credential, CredentialCache, HttpAuthBackend, RandomFingerprint,
    RequestDecorator, SessionError,
};
use keyward_transport::{Transport, TransportError};

// =========================================================================
// Scripted transport
// =========================================================================

/// Replies from a path → response table and records every request.
#[derive(Default)]
struct Scripted {
    replies: Mutex<HashMap<String, Result<Response, TransportError>>>,
    seen: Mutex<Vec<Request>>,
}

impl Scripted {
    fn reply(&self, path: &str, reply: Result<Response, TransportError>) {
        self.replies.lock().unwrap().insert(path.to_string(), reply);
    }

    fn seen(&self) -> Vec<Request> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for Scripted {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&request.path)
            .cloned()
            .unwrap_or_else(|| Ok(Response::new(StatusCode(404))));
        self.seen.lock().unwrap().push(request);
        reply
    }
}

fn backend() -> (HttpAuthBackend<Arc<Scripted>>, Arc<Scripted>, CredentialCache) {
    let transport = Arc::new(Scripted::default());
    let cache = CredentialCache::in_memory();
    let backend =
        HttpAuthBackend::new(Arc::clone(&transport), RequestDecorator::new(cache.clone()));
    (backend, transport, cache)
}

// =========================================================================
// check()
// =========================================================================

#[tokio::test]
async fn test_check_success_and_no_content_mean_authenticated() {
    let (backend, transport, _) = backend();

    transport.reply(endpoints::CHECK, Ok(Response::ok()));
    assert!(backend.check().await.unwrap());

    transport.reply(endpoints::CHECK, Ok(Response::new(StatusCode::NO_CONTENT)));
    assert!(backend.check().await.unwrap());
}

#[tokio::test]
async fn test_check_unauthorized_means_signed_out() {
    let (backend, transport, _) = backend();
    transport.reply(endpoints::CHECK, Ok(Response::new(StatusCode::UNAUTHORIZED)));

    assert!(!backend.check().await.unwrap());
}

#[tokio::test]
async fn test_check_other_status_propagates_as_error() {
    let (backend, transport, _) = backend();
    transport.reply(
        endpoints::CHECK,
        Ok(Response::new(StatusCode::INTERNAL_SERVER_ERROR)),
    );

    let result = backend.check().await;

    assert!(matches!(
        result,
        Err(SessionError::UnexpectedStatus { status, .. }) if status == StatusCode::INTERNAL_SERVER_ERROR
    ));
}

#[tokio::test]
async fn test_check_network_failure_propagates() {
    let (backend, transport, _) = backend();
    transport.reply(endpoints::CHECK, Err(TransportError::Network("reset".into())));

    assert!(matches!(
        backend.check().await,
        Err(SessionError::Transport(TransportError::Network(_)))
    ));
}

// =========================================================================
// access()
// =========================================================================

#[tokio::test]
async fn test_access_decodes_token() {
    let (backend, transport, _) = backend();
    transport.reply(
        endpoints::ACCESS,
        Ok(Response::ok().with_body(r#"{"accessToken":"T1"}"#)),
    );

    let grant = backend.access().await.unwrap();

    assert_eq!(grant.token(), Some("T1"));
}

#[tokio::test]
async fn test_access_empty_body_is_tokenless_grant() {
    let (backend, transport, _) = backend();
    transport.reply(endpoints::ACCESS, Ok(Response::new(StatusCode::NO_CONTENT)));

    let grant = backend.access().await.unwrap();

    assert_eq!(grant.token(), None);
}

#[tokio::test]
async fn test_access_malformed_body_is_protocol_error() {
    let (backend, transport, _) = backend();
    transport.reply(endpoints::ACCESS, Ok(Response::ok().with_body("<html>")));

    assert!(matches!(backend.access().await, Err(SessionError::Protocol(_))));
}

#[tokio::test]
async fn test_access_unauthorized_is_error() {
    let (backend, transport, _) = backend();
    transport.reply(endpoints::ACCESS, Ok(Response::new(StatusCode::UNAUTHORIZED)));

    assert!(matches!(
        backend.access().await,
        Err(SessionError::UnexpectedStatus { endpoint, .. }) if endpoint == endpoints::ACCESS
    ));
}

// =========================================================================
// logout() / wallet_status()
// =========================================================================

#[tokio::test]
async fn test_logout_posts_and_accepts_no_content() {
    let (backend, transport, _) = backend();
    transport.reply(endpoints::LOGOUT, Ok(Response::new(StatusCode::NO_CONTENT)));

    backend.logout().await.unwrap();

    let seen = transport.seen();
    assert_eq!(seen[0].method, Method::Post);
    assert_eq!(seen[0].path, endpoints::LOGOUT);
}

#[tokio::test]
async fn test_logout_failure_status_is_error() {
    let (backend, transport, _) = backend();
    transport.reply(endpoints::LOGOUT, Ok(Response::new(StatusCode(502))));

    assert!(backend.logout().await.is_err());
}

#[tokio::test]
async fn test_wallet_status_is_sent_with_skip_refresh() {
    let (backend, transport, _) = backend();
    transport.reply(
        endpoints::WALLET_STATUS,
        Ok(Response::ok().with_body(r#"{"isRootWalletInitialized":true}"#)),
    );

    let status = backend.wallet_status().await.unwrap();

    assert!(status.is_root_wallet_initialized);
    assert!(transport.seen()[0].skip_refresh);
}

#[tokio::test]
async fn test_wallet_status_empty_body_is_invalid_message() {
    let (backend, transport, _) = backend();
    transport.reply(endpoints::WALLET_STATUS, Ok(Response::new(StatusCode::NO_CONTENT)));

    assert!(matches!(
        backend.wallet_status().await,
        Err(SessionError::Protocol(ProtocolError::InvalidMessage(_)))
    ));
}

// =========================================================================
// Decoration
// =========================================================================

#[tokio::test]
async fn test_backend_requests_carry_bearer_and_fingerprint() {
    let transport = Arc::new(Scripted::default());
    let cache = CredentialCache::in_memory();
    cache.set(&Credential::new("T9"));
    let decorator =
        RequestDecorator::new(cache).with_fingerprint(Arc::new(RandomFingerprint::new()));
    let backend = HttpAuthBackend::new(Arc::clone(&transport), decorator);
    transport.reply(endpoints::CHECK, Ok(Response::ok()));

    backend.check().await.unwrap();

    let seen = transport.seen();
    assert_eq!(seen[0].bearer(), Some("T9"));
    assert!(seen[0].header(headers::FINGERPRINT).is_some());
}
