//! Ports to the user interface.
//!
//! The client never draws anything. Toasts and navigation go through these
//! traits; persisted storage lives in [`crate::session`].

use std::fmt;

/// Route of the login page.
pub const LOGIN_ROUTE: &str = "/login";
/// Route of the public home page.
pub const HOME_ROUTE: &str = "/";

/// Toast styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

impl fmt::Display for ToastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        })
    }
}

/// Shows short notices to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: ToastLevel, text: &str);
}

/// Moves the user to another route.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Notifier for headless use: toasts become log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: ToastLevel, text: &str) {
        match level {
            ToastLevel::Error => tracing::error!(%level, "{text}"),
            ToastLevel::Info | ToastLevel::Success => tracing::info!(%level, "{text}"),
        }
    }
}

/// Navigator for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        tracing::info!(route, "navigate");
    }
}
