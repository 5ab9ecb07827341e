//! The authentication backend contract.
//!
//! Keyward doesn't implement authentication itself. Credential issuance,
//! session cookies, and token minting all live on a remote service. This
//! module defines what the coordinator needs from that service
//! ([`AuthBackend`]) and ships one adapter, [`HttpAuthBackend`], that
//! speaks the standard endpoint set over any [`Transport`].

use std::future::Future;

use keyward_protocol::{
    AccessGrant, Codec, JsonCodec, ProtocolError, Request, Response, WalletStatus,
    endpoints,
};
use keyward_transport::Transport;

use crate::{RequestDecorator, SessionError};

/// The remote authentication service.
///
/// `Send + Sync + 'static` because the refresh coordinator and the
/// reconciliation tasks share one backend across spawned tasks.
///
/// # Example
///
/// ```rust
/// use keyward_protocol::{AccessGrant, WalletStatus};
/// use keyward_session::{AuthBackend, SessionError};
///
/// /// Always signed in, always hands out the same token.
/// struct AlwaysIn;
///
/// impl AuthBackend for AlwaysIn {
///     async fn check(&self) -> Result<bool, SessionError> {
///         Ok(true)
///     }
///     async fn access(&self) -> Result<AccessGrant, SessionError> {
///         Ok(AccessGrant::new("dev-token"))
///     }
///     async fn logout(&self) -> Result<(), SessionError> {
///         Ok(())
///     }
///     async fn wallet_status(&self) -> Result<WalletStatus, SessionError> {
///         Ok(WalletStatus::default())
///     }
/// }
/// ```
pub trait AuthBackend: Send + Sync + 'static {
    /// Asks whether the current session is valid.
    ///
    /// `Ok(true)` authenticated, `Ok(false)` not authenticated, `Err` for
    /// anything else (network failure, unexpected status).
    fn check(&self) -> impl Future<Output = Result<bool, SessionError>> + Send;

    /// Mints a fresh access token from the longer-lived session.
    ///
    /// A grant with no token is a refresh failure, not an error.
    fn access(
        &self,
    ) -> impl Future<Output = Result<AccessGrant, SessionError>> + Send;

    /// Ends the server-side session.
    fn logout(&self) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Fetches the secondary root-wallet status.
    fn wallet_status(
        &self,
    ) -> impl Future<Output = Result<WalletStatus, SessionError>> + Send;
}

// ---------------------------------------------------------------------------
// HttpAuthBackend
// ---------------------------------------------------------------------------

/// [`AuthBackend`] over the standard endpoint set.
///
/// | Call            | Request                        | Mapping                                  |
/// |-----------------|--------------------------------|------------------------------------------|
/// | `check`         | `GET /auth/check`              | 2xx → `true`, 401 → `false`, else error  |
/// | `access`        | `GET /auth/access`             | 2xx → decoded grant, else error          |
/// | `logout`        | `POST /auth/logout`            | 2xx → ok, else error                     |
/// | `wallet_status` | `GET /wallet/status` (no refresh on 401) | 2xx → decoded status, else error |
///
/// Requests are decorated like any other outbound call, so the bearer and
/// fingerprint headers ride along.
pub struct HttpAuthBackend<T: Transport, C: Codec = JsonCodec> {
    transport: T,
    decorator: RequestDecorator,
    codec: C,
}

impl<T: Transport> HttpAuthBackend<T> {
    /// Creates a backend that decodes bodies as JSON.
    pub fn new(transport: T, decorator: RequestDecorator) -> Self {
        Self::with_codec(transport, decorator, JsonCodec)
    }
}

impl<T: Transport, C: Codec> HttpAuthBackend<T, C> {
    /// Creates a backend with a custom body codec.
    pub fn with_codec(transport: T, decorator: RequestDecorator, codec: C) -> Self {
        Self {
            transport,
            decorator,
            codec,
        }
    }

    async fn call(&self, mut request: Request) -> Result<Response, SessionError> {
        self.decorator.decorate(&mut request);
        let response = self.transport.send(request).await?;
        Ok(response)
    }

    fn expect_success(
        endpoint: &'static str,
        response: &Response,
    ) -> Result<(), SessionError> {
        if response.status.is_success() {
            Ok(())
        } else {
            Err(SessionError::UnexpectedStatus {
                endpoint,
                status: response.status,
            })
        }
    }
}

impl<T: Transport, C: Codec> AuthBackend for HttpAuthBackend<T, C> {
    async fn check(&self) -> Result<bool, SessionError> {
        let response = self.call(Request::get(endpoints::CHECK)).await?;
        if response.status.is_unauthorized() {
            return Ok(false);
        }
        Self::expect_success(endpoints::CHECK, &response)?;
        Ok(true)
    }

    async fn access(&self) -> Result<AccessGrant, SessionError> {
        let response = self.call(Request::get(endpoints::ACCESS)).await?;
        Self::expect_success(endpoints::ACCESS, &response)?;
        if response.body.is_empty() {
            return Ok(AccessGrant::default());
        }
        Ok(self.codec.decode(&response.body)?)
    }

    async fn logout(&self) -> Result<(), SessionError> {
        let response = self.call(Request::post(endpoints::LOGOUT)).await?;
        Self::expect_success(endpoints::LOGOUT, &response)
    }

    async fn wallet_status(&self) -> Result<WalletStatus, SessionError> {
        let request = Request::get(endpoints::WALLET_STATUS).skipping_refresh();
        let response = self.call(request).await?;
        Self::expect_success(endpoints::WALLET_STATUS, &response)?;
        if response.body.is_empty() {
            return Err(ProtocolError::InvalidMessage("empty wallet status body".into()).into());
        }
        Ok(self.codec.decode(&response.body)?)
    }
}
