//! Router tests that never reach the database.
//!
//! The pool connects lazily, so every request here must be answered by an
//! extractor, a validator, or the upload signer before any query runs.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bep_core::{Permission, Role, SessionUser, UserId};
use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};

use crate::config::SiteConfig;
use crate::config::tests::test_config;
use crate::middleware::session::SESSION_COOKIE_NAME;
use crate::models::session_keys;
use crate::state::AppState;

struct TestApp {
    router: Router,
    store: MemoryStore,
    state: AppState,
}

fn test_app() -> TestApp {
    test_app_with(test_config())
}

fn test_app_with(config: SiteConfig) -> TestApp {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/bep_test")
        .unwrap();
    let state = AppState::new(config, pool);

    let store = MemoryStore::default();
    let layer = SessionManagerLayer::new(store.clone())
        .with_name(SESSION_COOKIE_NAME)
        .with_secure(false);

    TestApp {
        router: crate::app(state.clone(), layer),
        store,
        state,
    }
}

fn staff_user(permissions: Vec<Permission>) -> SessionUser {
    SessionUser {
        id: UserId::new(7),
        username: "lan".to_string(),
        role: Role::Staff,
        permissions,
        full_name: Some("Trần Thị Lan".to_string()),
        email: None,
    }
}

/// Seed a session holding `user` and return its cookie header.
async fn session_cookie(store: &MemoryStore, user: &SessionUser) -> String {
    let session = Session::new(None, Arc::new(store.clone()), None);
    session.insert(session_keys::CURRENT_USER, user).await.unwrap();
    session.save().await.unwrap();
    format!("{SESSION_COOKIE_NAME}={}", session.id().unwrap())
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.5")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_me_without_session_is_401_json() {
    let app = test_app();
    let response = app
        .router
        .oneshot(Request::get("/api/admin/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store, max-age=0");
    let body = json_body(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_staff_identity_by_area() {
    let app = test_app();
    let cookie = session_cookie(&app.store, &staff_user(vec![Permission::BookingsManage])).await;

    let staff = app
        .router
        .clone()
        .oneshot(
            Request::get("/api/staff/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(staff.status(), StatusCode::OK);
    let body = json_body(staff).await;
    assert_eq!(body["username"], "lan");
    assert_eq!(body["role"], "staff");
    assert_eq!(body["permissions"], serde_json::json!(["bookings.manage"]));

    let admin = app
        .router
        .oneshot(
            Request::get("/api/admin/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(admin.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_permission_is_403() {
    let app = test_app();
    let cookie = session_cookie(&app.store, &staff_user(vec![Permission::MenuWrite])).await;

    let mut request = json_request(
        "PUT",
        "/api/admin/seo",
        &serde_json::json!({
            "path": "/menu",
            "titleVi": "Thực đơn",
            "titleEn": "Menu",
            "descriptionVi": "",
            "descriptionEn": ""
        }),
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("content.write"));
}

#[tokio::test]
async fn test_login_rejects_missing_fields() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            &serde_json::json!({"username": "lan"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "bad_request");

    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            &serde_json::json!({"username": "  ", "password": "x"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["message"],
        "Username and password are required"
    );
}

#[tokio::test]
async fn test_booking_validation_happens_before_storage() {
    let app = test_app();
    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            &serde_json::json!({
                "customerName": "Minh",
                "phone": "0901234567",
                "partySize": 40,
                "reservedFor": (Utc::now() + chrono::Duration::days(2)).to_rfc3339()
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["message"],
        "Party size must be between 1 and 20"
    );
}

#[tokio::test]
async fn test_sign_upload_requires_session() {
    let app = test_app();
    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/api/uploads/objects",
            &serde_json::json!({"fileName": "a.png", "contentType": "image/png", "size": 10}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

fn put_request(url: &url::Url, content_type: &str, body: &'static [u8]) -> Request<Body> {
    let uri = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    };
    Request::put(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_signed_put_round_trip() {
    let app = test_app();
    let cookie = session_cookie(&app.store, &staff_user(vec![Permission::MediaUpload])).await;

    let mut sign = json_request(
        "POST",
        "/api/uploads/objects",
        &serde_json::json!({"fileName": "Bún Chả.png", "contentType": "image/png", "size": 4}),
    );
    sign.headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.router.clone().oneshot(sign).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["method"], "PUT");
    let url = url::Url::parse(body["url"].as_str().unwrap()).unwrap();
    assert!(url.path().starts_with("/uploads/objects/"));
    assert!(body["publicUrl"].as_str().unwrap().contains("/media/objects/"));

    let response = app
        .router
        .oneshot(put_request(&url, "image/png", b"\x89PNG"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let key = url.path_segments().unwrap().next_back().unwrap();
    let stored = app.state.media().root().join("objects").join(key);
    assert_eq!(tokio::fs::read(&stored).await.unwrap(), b"\x89PNG");
    tokio::fs::remove_file(stored).await.unwrap();
}

#[tokio::test]
async fn test_tampered_or_expired_put_is_refused() {
    let app = test_app();
    let base = app.state.config().base_url.clone();
    let signer = app.state.signer();

    let url = signer.presign(&base, "k1.png", "image/png", Utc::now()).unwrap();

    // Signed for a different content type.
    let response = app
        .router
        .clone()
        .oneshot(put_request(&url, "image/gif", b"GIF8"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Signature moved to another key.
    let mut moved = url.clone();
    moved.set_path("/uploads/objects/k2.png");
    let response = app
        .router
        .clone()
        .oneshot(put_request(&moved, "image/png", b"\x89PNG"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let stale = signer
        .presign(&base, "k3.png", "image/png", Utc::now() - chrono::Duration::days(1))
        .unwrap();
    let response = app
        .router
        .oneshot(put_request(&stale, "image/png", b"\x89PNG"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(
        json_body(response).await["message"]
            .as_str()
            .unwrap()
            .contains("expired")
    );
}

#[tokio::test]
async fn test_video_upload_rejects_non_video() {
    let app = test_app();
    let cookie = session_cookie(&app.store, &staff_user(vec![Permission::MediaUpload])).await;

    let boundary = "bep-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"video\"; filename=\"menu.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\n\
         %PDF-1.7\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::post("/api/upload-hero-video")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::COOKIE, cookie)
        .body(Body::from(body))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        json_body(response).await["message"]
            .as_str()
            .unwrap()
            .contains("not a video")
    );
}

fn video_upload(cookie: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "bep-boundary";
    let mut body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"video\"; filename=\"{file_name}\"\r\n\
         Content-Type: video/mp4\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::post("/api/upload-hero-video")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::COOKIE, cookie)
        .body(Body::from(body))
        .unwrap()
}

fn small_video_config() -> SiteConfig {
    let mut config = test_config();
    config.uploads.media_dir =
        std::env::temp_dir().join(format!("bep-media-{}", uuid::Uuid::new_v4().simple()));
    config.uploads.max_video_bytes = 16;
    config
}

#[tokio::test]
async fn test_oversize_video_leaves_no_partial_file() {
    let app = test_app_with(small_video_config());
    let cookie = session_cookie(&app.store, &staff_user(vec![Permission::MediaUpload])).await;

    let response = app
        .router
        .oneshot(video_upload(&cookie, "hero.mp4", &[7; 64]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let videos = app.state.media().root().join("videos");
    let mut entries = tokio::fs::read_dir(&videos).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());
    tokio::fs::remove_dir_all(app.state.media().root()).await.unwrap();
}

#[tokio::test]
async fn test_video_is_streamed_to_media_dir() {
    let app = test_app_with(small_video_config());
    let cookie = session_cookie(&app.store, &staff_user(vec![Permission::MediaUpload])).await;

    let response = app
        .router
        .oneshot(video_upload(&cookie, "Hero Loop.mp4", b"ftypisom"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let url = json_body(response).await["url"].as_str().unwrap().to_string();
    let file_name = url.strip_prefix("/media/videos/").unwrap();
    assert!(file_name.ends_with("-hero-loop.mp4"));
    let stored = app.state.media().root().join("videos").join(file_name);
    assert_eq!(tokio::fs::read(&stored).await.unwrap(), b"ftypisom");
    tokio::fs::remove_dir_all(app.state.media().root()).await.unwrap();
}
