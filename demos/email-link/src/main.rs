//! Email-link sign-in, end to end, against an in-process fake server.
//!
//! 1. Startup check finds no session and redirects to `/login`.
//! 2. The user submits the email form; the app polls while they open the
//!    link in their mail client.
//! 3. The link is "clicked" after a short delay; the poll notices and goes
//!    home.
//! 4. The server rotates the access token; two concurrent requests hit a
//!    401 and share a single refresh.
//!
//! Run with `RUST_LOG=debug cargo run -p email-link` for the full trace.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use keyward::prelude::*;
use serde_json::json;
use tracing::info;

// ---------------------------------------------------------------------------
// Fake server
// ---------------------------------------------------------------------------

/// Session cookie state plus the currently valid access token.
struct FakeServer {
    confirmed: AtomicBool,
    generation: AtomicU32,
}

impl FakeServer {
    fn new() -> Self {
        Self {
            confirmed: AtomicBool::new(false),
            generation: AtomicU32::new(1),
        }
    }

    fn current_token(&self) -> String {
        format!("tok-{}", self.generation.load(Ordering::SeqCst))
    }

    fn rotate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl Transport for FakeServer {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let confirmed = self.confirmed.load(Ordering::SeqCst);

        let response = match request.path.as_str() {
            endpoints::CHECK if confirmed => Response::new(StatusCode::NO_CONTENT),
            endpoints::CHECK => Response::new(StatusCode::UNAUTHORIZED),
            endpoints::ACCESS if confirmed => {
                // Refreshing is slow enough for concurrent 401s to pile up.
                tokio::time::sleep(Duration::from_millis(200)).await;
                let body = json!({ "accessToken": self.current_token() });
                Response::ok().with_body(body.to_string())
            }
            endpoints::ACCESS => Response::new(StatusCode::UNAUTHORIZED),
            endpoints::LOGOUT => {
                self.confirmed.store(false, Ordering::SeqCst);
                Response::new(StatusCode::NO_CONTENT)
            }
            _ if request.bearer() != Some(self.current_token().as_str()) => {
                Response::new(StatusCode::UNAUTHORIZED)
            }
            endpoints::WALLET_STATUS => {
                Response::ok().with_body(json!({ "isRootWalletInitialized": true }).to_string())
            }
            _ => Response::ok().with_body(json!({ "balance": "12.5" }).to_string()),
        };

        info!(method = %request.method, path = %request.path, status = response.status.0, "server");
        Ok(response)
    }
}

// ---------------------------------------------------------------------------
// Fake router
// ---------------------------------------------------------------------------

struct ConsoleRouter {
    route: Mutex<String>,
}

impl Navigator for ConsoleRouter {
    fn current_route(&self) -> String {
        self.route.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn navigate(&self, route: &str) {
        info!(route, "router: navigate");
        if let Ok(mut current) = self.route.lock() {
            *current = route.to_string();
        }
    }

    fn leave_application(&self) {
        info!("router: leaving application");
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), KeywardError> {
    init_tracing("email_link=info,keyward=info,keyward_refresh=info,info");

    let config = KeywardConfig::from_json(
        r#"{ "poll_interval_ms": 500, "navigation_grace_ms": 50 }"#,
    )?;

    let server = Arc::new(FakeServer::new());
    let router = Arc::new(ConsoleRouter {
        route: Mutex::new("/wallet".to_string()),
    });

    let keyward = KeywardBuilder::new()
        .config(config)
        .fingerprint(Arc::new(RandomFingerprint::new()))
        .build_http(Arc::clone(&server), Arc::clone(&router) as Arc<dyn Navigator>);

    // 1. No session yet.
    let outcome = keyward.start().await;
    info!(?outcome, route = %router.current_route(), "startup check done");

    // 2. Email form submitted.
    router.navigate("/check-inbox");
    let poll = keyward.form_submitted();

    // 3. The user clicks the link a moment later.
    let clicker = Arc::clone(&server);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1_600)).await;
        info!("user opened the email link");
        clicker.confirmed.store(true, Ordering::SeqCst);
    });

    poll.finished().await;
    info!(
        authenticated = keyward.session().is_authenticated(),
        route = %router.current_route(),
        "signed in"
    );

    // 4. Token rotation: both requests 401, one refresh, both replayed.
    server.rotate();
    let (a, b) = tokio::join!(
        keyward.send(Request::get("/wallet/balances")),
        keyward.send(Request::get("/wallet/history")),
    );
    info!(
        a = ?a.map(|r| r.status),
        b = ?b.map(|r| r.status),
        refresh_calls = keyward.coordinator().refresh_calls(),
        "requests after rotation"
    );

    keyward.logout().await?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    info!(route = %router.current_route(), "done");

    Ok(())
}
