//! Route guards for the admin and staff areas.
//!
//! A guard starts in [`GuardState::Checking`], asks the server who the user
//! is exactly once, and settles:
//!
//! ```text
//! Checking ──user──────────▶ Authenticated   (render children)
//!     │
//!     ├──401───────────────▶ Unauthenticated (clear, redirect once)
//!     │
//!     └──403/5xx/transport─▶ Failed          (error view)
//! ```
//!
//! Settled states are terminal; a second `resolve` is a no-op.

use std::future::Future;
use std::sync::Arc;

use bep_core::{Area, SessionUser};
use chrono::Utc;

use crate::error::ApiError;
use crate::http::{ApiClient, OnUnauthorized};
use crate::ports::{LOGIN_ROUTE, Navigator};
use crate::session::{SessionIdentity, SessionStorage};

/// Answers "who am I" for an area.
pub trait IdentitySource: Send + Sync {
    /// # Errors
    ///
    /// [`ApiError::Unauthorized`] when there is no session; any other
    /// error when the question could not be answered.
    fn current_user(&self, area: Area) -> impl Future<Output = Result<SessionUser, ApiError>> + Send;
}

impl IdentitySource for ApiClient {
    async fn current_user(&self, area: Area) -> Result<SessionUser, ApiError> {
        let path = format!("api/{}/me", area.as_str());
        self.get_json::<SessionUser>(&path, OnUnauthorized::Error)
            .await?
            .ok_or(ApiError::MissingBody)
    }
}

/// Where a guard is in its check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authenticated(SessionUser),
    Unauthenticated,
    Failed(String),
}

/// What the guarded page should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardView<'a> {
    Loading,
    Children(&'a SessionUser),
    /// Nothing: a redirect to login has been issued.
    Redirecting,
    Error(&'a str),
}

/// Guard for one area.
pub struct AuthGuard<S> {
    area: Area,
    source: S,
    storage: Arc<dyn SessionStorage>,
    navigator: Arc<dyn Navigator>,
    state: GuardState,
}

impl<S> std::fmt::Debug for AuthGuard<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGuard")
            .field("area", &self.area)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S> AuthGuard<S>
where
    S: IdentitySource,
{
    #[must_use]
    pub fn new(
        area: Area,
        source: S,
        storage: Arc<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            area,
            source,
            storage,
            navigator,
            state: GuardState::Checking,
        }
    }

    #[must_use]
    pub const fn area(&self) -> Area {
        self.area
    }

    #[must_use]
    pub const fn state(&self) -> &GuardState {
        &self.state
    }

    #[must_use]
    pub fn view(&self) -> GuardView<'_> {
        match &self.state {
            GuardState::Checking => GuardView::Loading,
            GuardState::Authenticated(user) => GuardView::Children(user),
            GuardState::Unauthenticated => GuardView::Redirecting,
            GuardState::Failed(message) => GuardView::Error(message),
        }
    }

    /// Run the identity check. Does nothing once the guard has settled.
    #[tracing::instrument(skip(self), fields(area = self.area.as_str()))]
    pub async fn resolve(&mut self) -> &GuardState {
        if self.state != GuardState::Checking {
            return &self.state;
        }

        self.state = match self.source.current_user(self.area).await {
            Ok(user) => {
                SessionIdentity::refresh(self.storage.as_ref(), &user, Utc::now());
                tracing::debug!(user = %user.username, "guard passed");
                GuardState::Authenticated(user)
            }
            Err(ApiError::Unauthorized) => {
                SessionIdentity::clear(self.storage.as_ref());
                self.navigator.navigate(LOGIN_ROUTE);
                GuardState::Unauthenticated
            }
            Err(e) => {
                tracing::warn!(error = %e, "identity check failed");
                let message = e.user_message().map_or_else(|| e.to_string(), str::to_string);
                GuardState::Failed(message)
            }
        };
        &self.state
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bep_core::{Role, UserId};
    use reqwest::StatusCode;

    use super::*;
    use crate::expiry::tests::{RecordingUi, signed_in};
    use crate::session::{MemoryStorage, keys};

    #[derive(Clone, Copy)]
    enum Answer {
        User,
        Unauthorized,
        Forbidden,
    }

    struct FakeSource {
        answer: Answer,
        calls: AtomicUsize,
        areas: Mutex<Vec<Area>>,
    }

    impl FakeSource {
        fn new(answer: Answer) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
                areas: Mutex::new(Vec::new()),
            }
        }
    }

    impl IdentitySource for &FakeSource {
        async fn current_user(&self, area: Area) -> Result<SessionUser, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.areas.lock().unwrap().push(area);
            match self.answer {
                Answer::User => Ok(SessionUser {
                    id: UserId::new(2),
                    username: "an".to_string(),
                    role: Role::Admin,
                    permissions: Vec::new(),
                    full_name: None,
                    email: None,
                }),
                Answer::Unauthorized => Err(ApiError::Unauthorized),
                Answer::Forbidden => Err(ApiError::Status {
                    status: StatusCode::FORBIDDEN,
                    message: "Admin access required".to_string(),
                }),
            }
        }
    }

    fn guard<'a>(
        area: Area,
        source: &'a FakeSource,
        storage: &Arc<MemoryStorage>,
        ui: &Arc<RecordingUi>,
    ) -> AuthGuard<&'a FakeSource> {
        AuthGuard::new(
            area,
            source,
            Arc::clone(storage) as Arc<dyn SessionStorage>,
            Arc::clone(ui) as Arc<dyn Navigator>,
        )
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let source = FakeSource::new(Answer::User);
        let storage = Arc::new(MemoryStorage::new());
        let ui = Arc::new(RecordingUi::default());
        let g = guard(Area::Admin, &source, &storage, &ui);

        assert_eq!(g.view(), GuardView::Loading);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_authenticated_renders_children_and_stores_user() {
        let source = FakeSource::new(Answer::User);
        let storage = Arc::new(MemoryStorage::new());
        let ui = Arc::new(RecordingUi::default());
        let mut g = guard(Area::Staff, &source, &storage, &ui);

        g.resolve().await;

        assert!(matches!(g.view(), GuardView::Children(u) if u.username == "an"));
        assert!(ui.routes.lock().unwrap().is_empty());
        assert_eq!(*source.areas.lock().unwrap(), vec![Area::Staff]);
        assert!(storage.get(keys::USER).is_some());
        assert!(storage.get(keys::LAST_ACTIVITY).is_some());
    }

    #[tokio::test]
    async fn test_unauthorized_redirects_exactly_once() {
        let source = FakeSource::new(Answer::Unauthorized);
        let storage = Arc::new(MemoryStorage::new());
        let ui = Arc::new(RecordingUi::default());
        signed_in(&storage);
        let mut g = guard(Area::Admin, &source, &storage, &ui);

        g.resolve().await;
        g.resolve().await;

        assert_eq!(g.view(), GuardView::Redirecting);
        assert_eq!(*ui.routes.lock().unwrap(), vec!["/login".to_string()]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(storage.get(keys::USER).is_none());
    }

    #[tokio::test]
    async fn test_forbidden_fails_without_redirect() {
        let source = FakeSource::new(Answer::Forbidden);
        let storage = Arc::new(MemoryStorage::new());
        let ui = Arc::new(RecordingUi::default());
        let mut g = guard(Area::Admin, &source, &storage, &ui);

        g.resolve().await;

        assert_eq!(g.view(), GuardView::Error("Admin access required"));
        assert!(ui.routes.lock().unwrap().is_empty());
    }
}
