//! Wiring for a back-office session.

use std::sync::Arc;

use bep_core::{Area, SessionUser, UploadRestrictions, VideoSlot};
use chrono::Utc;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::dispatch::LogoutDispatcher;
use crate::error::ApiError;
use crate::expiry::SessionExpiryHandler;
use crate::guard::AuthGuard;
use crate::http::{ApiClient, OnUnauthorized};
use crate::ports::{HOME_ROUTE, Navigator, Notifier};
use crate::session::{SessionIdentity, SessionStorage};
use crate::upload::video::ActivatedVideo;
use crate::upload::{ObjectUploader, ServerUploadParameters, VideoUploader};

/// The user-interface side of the client.
#[derive(Clone)]
pub struct Ports {
    pub storage: Arc<dyn SessionStorage>,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    user: SessionUser,
}

/// An API client with the session-expiry handler subscribed to its
/// dispatcher, plus constructors for everything that needs both.
#[derive(Clone)]
pub struct BackOffice {
    config: ClientConfig,
    client: ApiClient,
    ports: Ports,
}

impl std::fmt::Debug for BackOffice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackOffice")
            .field("config", &self.config)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl BackOffice {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, ports: Ports) -> Result<Self, ApiError> {
        let dispatcher = LogoutDispatcher::new();
        dispatcher.subscribe(Arc::new(SessionExpiryHandler::new(
            Arc::clone(&ports.storage),
            Arc::clone(&ports.notifier),
            Arc::clone(&ports.navigator),
            config.locale,
            config.logout_redirect_delay,
        )));
        let client = ApiClient::new(&config, dispatcher)?;

        Ok(Self {
            config,
            client,
            ports,
        })
    }

    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The identity currently persisted.
    #[must_use]
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity::load(self.ports.storage.as_ref())
    }

    /// Sign in and persist the identity.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials and the
    /// server's message for other refusals.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionUser, ApiError> {
        let response: LoginResponse = self
            .client
            .send_json(
                Method::POST,
                "api/auth/login",
                &LoginRequest { username, password },
                OnUnauthorized::Error,
            )
            .await?
            .ok_or(ApiError::MissingBody)?;

        SessionIdentity::persist_login(self.ports.storage.as_ref(), &response.user, Utc::now());
        tracing::info!(user = %response.user.username, role = %response.user.role, "signed in");
        Ok(response.user)
    }

    /// Sign out: tell the server, clear the persisted fields, go home.
    /// Local state is cleared even if the server call fails.
    ///
    /// # Errors
    ///
    /// Returns the server call's error after clearing.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self
            .client
            .send_json::<_, serde_json::Value>(
                Method::POST,
                "api/admin/logout",
                &serde_json::json!({}),
                OnUnauthorized::Error,
            )
            .await;

        SessionIdentity::clear(self.ports.storage.as_ref());
        self.ports.navigator.navigate(HOME_ROUTE);

        match result {
            Ok(_) | Err(ApiError::Unauthorized) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// A guard for `area`, still in its checking state.
    #[must_use]
    pub fn guard(&self, area: Area) -> AuthGuard<ApiClient> {
        AuthGuard::new(
            area,
            self.client.clone(),
            Arc::clone(&self.ports.storage),
            Arc::clone(&self.ports.navigator),
        )
    }

    #[must_use]
    pub fn video_uploader(&self) -> VideoUploader {
        VideoUploader::new(
            self.client.clone(),
            Arc::clone(&self.ports.notifier),
            self.config.locale,
            self.config.video_rules,
        )
    }

    #[must_use]
    pub fn object_uploader(&self, restrictions: UploadRestrictions) -> ObjectUploader<ServerUploadParameters> {
        ObjectUploader::new(restrictions, ServerUploadParameters::new(self.client.clone()))
    }

    /// See [`VideoUploader::activate`].
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn activate_video(&self, slot: VideoSlot) -> Result<Option<ActivatedVideo>, ApiError> {
        self.video_uploader().activate(slot).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::expiry::tests::{RecordingUi, signed_in};
    use crate::session::{MemoryStorage, keys};

    #[test]
    fn test_new_subscribes_expiry_handler() {
        let ui = Arc::new(RecordingUi::default());
        let storage = Arc::new(MemoryStorage::new());
        signed_in(&storage);
        let ports = Ports {
            storage: Arc::clone(&storage) as Arc<dyn SessionStorage>,
            notifier: Arc::clone(&ui) as Arc<dyn Notifier>,
            navigator: Arc::clone(&ui) as Arc<dyn Navigator>,
        };
        let office = BackOffice::new(ClientConfig::new("http://localhost:3000").unwrap(), ports).unwrap();

        assert!(office.identity().is_authenticated());
        assert_eq!(office.client().dispatcher().subscriber_count(), 1);

        // No runtime here, so the redirect is immediate.
        office.client().dispatcher().dispatch();
        assert!(storage.get(keys::USER).is_none());
        assert_eq!(*ui.routes.lock().unwrap(), vec!["/login".to_string()]);
        assert_eq!(ui.toasts.lock().unwrap().len(), 1);
    }
}
