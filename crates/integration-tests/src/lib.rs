//! Integration tests for the Bếp site and back-office client.
//!
//! # Running Tests
//!
//! ```bash
//! # Client flows against an in-process mock site
//! cargo test -p bep-integration-tests
//!
//! # Live API checks (needs a running server and BEP_BASE_URL)
//! cargo test -p bep-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `session_expiry` - Logout dispatch, guards, sign-in and sign-out
//! - `uploads` - Pre-signed object batches and the staged video saga
//! - `site_api` - Live server checks
//!
//! The mock site speaks the same routes and JSON shapes as the server,
//! and records what it was asked so tests can assert on traffic.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use bep_client::{
    BackOffice, ClientConfig, MemoryStorage, Navigator, Notifier, Ports, SessionStorage, ToastLevel,
};
use bep_core::{Locale, Role, SessionUser, UserId, VideoSlot};

/// Password every mock account accepts.
pub const PASSWORD: &str = "nuoc-mam-2024";

const SESSION_COOKIE: &str = "bep_session=mock-session";

/// One object received through a pre-signed PUT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Default)]
struct Recorded {
    requests: Vec<String>,
    objects: Vec<StoredObject>,
    pending: HashMap<VideoSlot, String>,
    live: HashMap<VideoSlot, String>,
}

#[derive(Clone)]
struct MockState {
    base_url: String,
    account: SessionUser,
    revoked: Arc<AtomicBool>,
    fail_register: Arc<AtomicBool>,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockState {
    fn record(&self, request: impl Into<String>) {
        self.with(|r| r.requests.push(request.into()));
    }

    fn with<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut recorded = self.recorded.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut recorded)
    }

    fn signed_in(&self, headers: &HeaderMap) -> bool {
        !self.revoked.load(Ordering::SeqCst)
            && headers
                .get_all(header::COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .any(|v| v.split(';').any(|c| c.trim() == SESSION_COOKIE))
    }
}

fn error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({ "error": code, "message": message }))).into_response()
}

fn unauthorized() -> Response {
    error(StatusCode::UNAUTHORIZED, "unauthorized", "Not authenticated")
}

/// An in-process site listening on an ephemeral port.
pub struct MockSite {
    addr: SocketAddr,
    state: MockState,
    task: JoinHandle<()>,
}

impl MockSite {
    /// Start a site whose only account is `account`.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start(account: SessionUser) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("bind mock site: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("mock site address: {e}"));

        let state = MockState {
            base_url: format!("http://{addr}"),
            account,
            revoked: Arc::new(AtomicBool::new(false)),
            fail_register: Arc::new(AtomicBool::new(false)),
            recorded: Arc::new(Mutex::new(Recorded::default())),
        };

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/admin/logout", post(logout))
            .route("/api/{area}/me", get(me))
            .route("/api/uploads/objects", post(sign_upload))
            .route("/uploads/objects/{key}", put(put_object))
            .route("/api/upload-hero-video", post(upload_video))
            .route("/api/save-hero-video", post(save_video))
            .route("/api/hero-video/activate", post(activate_video))
            .with_state(state.clone());

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "mock site stopped");
            }
        });

        Self { addr, state, task }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make the server refuse every session from now on.
    pub fn revoke_sessions(&self) {
        self.state.revoked.store(true, Ordering::SeqCst);
    }

    /// Make `api/save-hero-video` answer 500.
    pub fn fail_register(&self) {
        self.state.fail_register.store(true, Ordering::SeqCst);
    }

    /// `"METHOD /path"` for every request, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.with(|r| r.requests.clone())
    }

    /// How many requests hit `path` (any method).
    #[must_use]
    pub fn hits(&self, path: &str) -> usize {
        self.state
            .with(|r| r.requests.iter().filter(|req| req.ends_with(&format!(" {path}"))).count())
    }

    #[must_use]
    pub fn objects(&self) -> Vec<StoredObject> {
        self.state.with(|r| r.objects.clone())
    }

    #[must_use]
    pub fn pending_video(&self, slot: VideoSlot) -> Option<String> {
        self.state.with(|r| r.pending.get(&slot).cloned())
    }

    #[must_use]
    pub fn live_video(&self, slot: VideoSlot) -> Option<String> {
        self.state.with(|r| r.live.get(&slot).cloned())
    }
}

impl Drop for MockSite {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(state): State<MockState>, Json(body): Json<LoginBody>) -> Response {
    state.record("POST /api/auth/login");
    if body.username != state.account.username || body.password != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "unauthorized", "Invalid username or password");
    }
    state.revoked.store(false, Ordering::SeqCst);
    (
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/; HttpOnly"))],
        Json(json!({ "user": state.account })),
    )
        .into_response()
}

async fn logout(State(state): State<MockState>) -> Response {
    state.record("POST /api/admin/logout");
    (
        [(header::SET_COOKIE, "bep_session=; Path=/; Max-Age=0".to_string())],
        Json(json!({ "success": true })),
    )
        .into_response()
}

async fn me(State(state): State<MockState>, Path(area): Path<String>, headers: HeaderMap) -> Response {
    state.record(format!("GET /api/{area}/me"));
    if !state.signed_in(&headers) {
        return unauthorized();
    }
    if area == "admin" && state.account.role != Role::Admin {
        return error(StatusCode::FORBIDDEN, "forbidden", "Admin access required");
    }
    Json(&state.account).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignBody {
    file_name: String,
}

async fn sign_upload(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<SignBody>,
) -> Response {
    state.record("POST /api/uploads/objects");
    if !state.signed_in(&headers) {
        return unauthorized();
    }
    Json(json!({
        "method": "PUT",
        "url": format!(
            "{}/uploads/objects/{}?expires=4102444800&signature=feedface",
            state.base_url, body.file_name
        ),
        "publicUrl": format!("/media/objects/{}", body.file_name),
    }))
    .into_response()
}

async fn put_object(
    State(state): State<MockState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record(format!("PUT /uploads/objects/{key}"));
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.with(|r| {
        r.objects.push(StoredObject {
            key: key.clone(),
            content_type,
            size: body.len(),
        });
    });
    Json(json!({ "url": format!("/media/objects/{key}") })).into_response()
}

async fn upload_video(State(state): State<MockState>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    state.record("POST /api/upload-hero-video");
    if !state.signed_in(&headers) {
        return unauthorized();
    }
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("video") {
            continue;
        }
        let name = field.file_name().unwrap_or("video.mp4").to_string();
        if field.bytes().await.is_err() {
            return error(StatusCode::BAD_REQUEST, "bad_request", "Could not read the upload");
        }
        return Json(json!({ "url": format!("/media/videos/{name}") })).into_response();
    }
    error(StatusCode::BAD_REQUEST, "bad_request", "No video file was uploaded")
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveBody {
    video_url: String,
    video_type: VideoSlot,
}

async fn save_video(State(state): State<MockState>, headers: HeaderMap, Json(body): Json<SaveBody>) -> Response {
    state.record("POST /api/save-hero-video");
    if !state.signed_in(&headers) {
        return unauthorized();
    }
    if state.fail_register.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "Internal server error");
    }
    let file_name = body
        .video_url
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    state.with(|r| r.pending.insert(body.video_type, body.video_url.clone()));
    let message = format!(
        "Video staged for {}. Activate it to publish.",
        body.video_type.as_str()
    );
    Json(json!({ "fileName": file_name, "message": message })).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivateBody {
    video_type: VideoSlot,
}

async fn activate_video(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<ActivateBody>,
) -> Response {
    state.record("POST /api/hero-video/activate");
    if !state.signed_in(&headers) {
        return unauthorized();
    }
    let slot = body.video_type;
    let Some(url) = state.with(|r| r.pending.remove(&slot)) else {
        let message = format!("No pending video for {}", slot.as_str());
        return error(StatusCode::NOT_FOUND, "not_found", &message);
    };
    state.with(|r| r.live.insert(slot, url.clone()));
    Json(json!({ "videoType": slot, "url": url })).into_response()
}

/// Accounts for the mock site.
#[must_use]
pub fn account(role: Role) -> SessionUser {
    let (id, username) = match role {
        Role::Admin => (1, "chi-hoa"),
        Role::Staff => (2, "lan"),
    };
    SessionUser {
        id: UserId::new(id),
        username: username.to_string(),
        role,
        permissions: Vec::new(),
        full_name: None,
        email: None,
    }
}

/// Records toasts and navigation instead of drawing them.
#[derive(Debug, Default)]
pub struct RecordingUi {
    toasts: Mutex<Vec<(ToastLevel, String)>>,
    routes: Mutex<Vec<String>>,
}

impl RecordingUi {
    #[must_use]
    pub fn toasts(&self) -> Vec<(ToastLevel, String)> {
        self.toasts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Wait until `route` has been navigated to, or give up after a second.
    pub async fn wait_for_route(&self, route: &str) -> bool {
        for _ in 0..100 {
            if self.routes().iter().any(|r| r == route) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

impl Notifier for RecordingUi {
    fn notify(&self, level: ToastLevel, text: &str) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, text.to_string()));
    }
}

impl Navigator for RecordingUi {
    fn navigate(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}

/// A back office against `site`, with English text unless asked otherwise
/// and a short redirect delay.
pub struct Harness {
    pub office: BackOffice,
    pub storage: Arc<MemoryStorage>,
    pub ui: Arc<RecordingUi>,
}

impl Harness {
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn new(site: &MockSite) -> Self {
        Self::with_locale(site, Locale::En)
    }

    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn with_locale(site: &MockSite, locale: Locale) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let ui = Arc::new(RecordingUi::default());
        let config = ClientConfig::new(&site.base_url())
            .unwrap_or_else(|e| panic!("mock site URL: {e}"))
            .with_locale(locale)
            .with_logout_redirect_delay(Duration::from_millis(20));
        let ports = Ports {
            storage: Arc::clone(&storage) as Arc<dyn SessionStorage>,
            notifier: Arc::clone(&ui) as Arc<dyn Notifier>,
            navigator: Arc::clone(&ui) as Arc<dyn Navigator>,
        };
        let office = BackOffice::new(config, ports).unwrap_or_else(|e| panic!("back office: {e}"));

        Self { office, storage, ui }
    }
}
