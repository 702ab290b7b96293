//! Credentialed HTTP client for the site API.
//!
//! Every request carries the session cookie (the underlying client keeps a
//! cookie jar). A 401 is either handed to the [`LogoutDispatcher`] and
//! reported as `Ok(None)`, or surfaced as [`ApiError::Unauthorized`],
//! depending on [`OnUnauthorized`].

use reqwest::{Method, Response, StatusCode, multipart::Form};
use serde::{Serialize, de::DeserializeOwned};
use tracing::instrument;
use url::Url;

use crate::config::ClientConfig;
use crate::dispatch::LogoutDispatcher;
use crate::error::ApiError;

/// What a request does when the server answers 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnUnauthorized {
    /// Invoke the logout dispatcher and return `Ok(None)`.
    #[default]
    Dispatch,
    /// Return [`ApiError::Unauthorized`] without dispatching.
    Error,
}

/// Client for the site's JSON API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    dispatcher: LogoutDispatcher,
}

impl ApiClient {
    /// Create a client with its own cookie jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend
    /// initialisation).
    pub fn new(config: &ClientConfig, dispatcher: LogoutDispatcher) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(concat!("bep-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            dispatcher,
        })
    }

    /// The dispatcher 401s are routed to.
    #[must_use]
    pub const fn dispatcher(&self) -> &LogoutDispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path (`api/admin/me`, leading slash optional) against
    /// the site origin.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if the path does not form a URL.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures, non-2xx answers, and bodies
    /// that do not decode as `T`.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get_json<T>(
        &self,
        path: &str,
        on_unauthorized: OnUnauthorized,
    ) -> Result<Option<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let request = self.http.get(self.url(path)?);
        self.execute(request, on_unauthorized).await
    }

    /// Send a JSON body and decode the JSON answer.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_json`].
    #[instrument(skip(self, body), fields(method = %method, path = %path))]
    pub async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        on_unauthorized: OnUnauthorized,
    ) -> Result<Option<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.request(method, self.url(path)?).json(body);
        self.execute(request, on_unauthorized).await
    }

    /// `POST` a multipart form. 401s always go to the dispatcher.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_json`].
    #[instrument(skip(self, form), fields(path = %path))]
    pub async fn post_multipart<T>(&self, path: &str, form: Form) -> Result<Option<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let request = self.http.post(self.url(path)?).multipart(form);
        self.execute(request, OnUnauthorized::Dispatch).await
    }

    async fn execute<T>(
        &self,
        request: reqwest::RequestBuilder,
        on_unauthorized: OnUnauthorized,
    ) -> Result<Option<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return match on_unauthorized {
                OnUnauthorized::Dispatch => {
                    tracing::info!("session rejected by server, dispatching logout");
                    self.dispatcher.dispatch();
                    Ok(None)
                }
                OnUnauthorized::Error => Err(ApiError::Unauthorized),
            };
        }

        decode(response).await.map(Some)
    }
}

async fn decode<T>(response: Response) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!(status = %status, "API request failed");
        return Err(ApiError::from_status(status, &body));
    }

    // Empty 2xx bodies decode as `null` so `()` and `Option<_>` targets work.
    let text = if body.trim().is_empty() { "null" } else { &body };
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = ClientConfig::new(base).unwrap();
        ApiClient::new(&config, LogoutDispatcher::new()).unwrap()
    }

    #[test]
    fn test_url_joins_under_base_path() {
        let api = client("https://bepsaigon.vn/site");
        assert_eq!(
            api.url("/api/staff/me").unwrap().as_str(),
            "https://bepsaigon.vn/site/api/staff/me"
        );
        assert_eq!(
            api.url("api/upload-hero-video").unwrap().as_str(),
            "https://bepsaigon.vn/site/api/upload-hero-video"
        );
    }

    #[test]
    fn test_default_mode_dispatches() {
        assert_eq!(OnUnauthorized::default(), OnUnauthorized::Dispatch);
    }
}
