//! Log output setup for binaries.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_directive` applies (for
/// example `"keyward=debug,info"`). Returns `false` if a global subscriber
/// was already installed, which is harmless in tests.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}
