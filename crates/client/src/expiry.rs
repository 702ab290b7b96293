//! Default logout subscriber.

use std::sync::Arc;
use std::time::Duration;

use bep_core::{Locale, Message};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::dispatch::LogoutHandler;
use crate::ports::{LOGIN_ROUTE, Navigator, Notifier, ToastLevel};
use crate::session::{SessionIdentity, SessionStorage, keys};

/// Clears the persisted session when the server rejects it, and sends a
/// previously signed-in user back to the login page.
#[derive(Clone)]
pub struct SessionExpiryHandler {
    storage: Arc<dyn SessionStorage>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    locale: Locale,
    redirect_delay: Duration,
}

impl std::fmt::Debug for SessionExpiryHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionExpiryHandler")
            .field("locale", &self.locale)
            .field("redirect_delay", &self.redirect_delay)
            .finish_non_exhaustive()
    }
}

impl SessionExpiryHandler {
    #[must_use]
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        locale: Locale,
        redirect_delay: Duration,
    ) -> Self {
        Self {
            storage,
            notifier,
            navigator,
            locale,
            redirect_delay,
        }
    }

    /// Clear the session. If a user was signed in, toast and schedule the
    /// redirect; the returned handle completes after navigation. Anonymous
    /// sessions are cleared silently and return `None`.
    ///
    /// Outside a tokio runtime the redirect happens immediately.
    pub fn expire(&self) -> Option<JoinHandle<()>> {
        let was_authenticated = self.storage.get(keys::USER).is_some();
        SessionIdentity::clear(self.storage.as_ref());

        if !was_authenticated {
            tracing::debug!("401 without a stored session, nothing to announce");
            return None;
        }

        tracing::info!("session expired, redirecting to login");
        self.notifier
            .notify(ToastLevel::Error, &Message::SessionExpired.text(self.locale));

        let navigator = Arc::clone(&self.navigator);
        let delay = self.redirect_delay;
        if let Ok(handle) = Handle::try_current() {
            Some(handle.spawn(async move {
                tokio::time::sleep(delay).await;
                navigator.navigate(LOGIN_ROUTE);
            }))
        } else {
            navigator.navigate(LOGIN_ROUTE);
            None
        }
    }
}

impl LogoutHandler for SessionExpiryHandler {
    fn on_unauthorized(&self) {
        drop(self.expire());
    }
}
