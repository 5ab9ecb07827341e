//! User-facing notices (toasts).

use std::fmt;

use tracing::{error, info, warn};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Shows a short message to the user.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Writes notices to the log. Used when the host has no toast system.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => info!(notice = message),
            NoticeLevel::Warning => warn!(notice = message),
            NoticeLevel::Error => error!(notice = message),
        }
    }
}
