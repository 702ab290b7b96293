//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness
//! GET    /health/ready                  - Database readiness
//!
//! # Auth
//! POST   /api/auth/login                - Sign in (rate limited)
//! POST   /api/admin/logout              - Sign out
//! GET    /api/admin/me                  - Identity for the admin area
//! GET    /api/staff/me                  - Identity for the staff area
//!
//! # Menu
//! GET    /api/menu                      - Available items (cached)
//! GET    /api/admin/menu-items          - All items          (menu.write)
//! POST   /api/admin/menu-items          - Create             (menu.write)
//! PUT    /api/admin/menu-items/{id}     - Update             (menu.write)
//! DELETE /api/admin/menu-items/{id}     - Delete             (menu.write)
//!
//! # SEO
//! GET    /api/seo?path=                 - Entry for a page
//! GET    /api/admin/seo                 - All entries        (content.write)
//! PUT    /api/admin/seo                 - Upsert             (content.write)
//!
//! # Media
//! POST   /api/uploads/objects           - Pre-sign a PUT     (media.upload)
//! PUT    /uploads/objects/{key}         - Signed object upload
//! POST   /api/upload-hero-video         - Store a video      (media.upload)
//! POST   /api/save-hero-video           - Stage as pending   (media.upload)
//! POST   /api/hero-video/activate       - Promote to live    (media.upload)
//! GET    /api/site-videos               - Slots (live only for visitors)
//! GET    /media/...                     - Stored files
//!
//! # Bookings
//! POST   /api/bookings                  - Public booking form
//! GET    /api/staff/bookings            - List               (bookings.manage)
//! PATCH  /api/staff/bookings/{id}       - Change status      (bookings.manage)
//!
//! # Users
//! GET    /api/admin/users               - List               (users.manage)
//! POST   /api/admin/users               - Create             (users.manage)
//! ```

pub mod auth;
pub mod bookings;
pub mod menu;
pub mod seo;
pub mod uploads;
pub mod users;
pub mod videos;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post, put},
};

use crate::config::UploadConfig;
use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Room for multipart boundaries and headers around the video itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

fn body_limit(bytes: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max(usize::try_from(bytes).unwrap_or(usize::MAX))
}

/// All routes except the session-free health checks.
pub fn routes(uploads: &UploadConfig) -> Router<AppState> {
    let login = Router::new()
        .route("/api/auth/login", post(auth::login))
        .layer(login_rate_limiter());

    Router::new()
        .merge(login)
        // Auth
        .route("/api/admin/logout", post(auth::logout))
        .route("/api/admin/me", get(auth::admin_me))
        .route("/api/staff/me", get(auth::staff_me))
        // Menu
        .route("/api/menu", get(menu::public_menu))
        .route(
            "/api/admin/menu-items",
            get(menu::list_items).post(menu::create_item),
        )
        .route(
            "/api/admin/menu-items/{id}",
            put(menu::update_item).delete(menu::delete_item),
        )
        // SEO
        .route("/api/seo", get(seo::get_page))
        .route("/api/admin/seo", get(seo::list_pages).put(seo::upsert_page))
        // Media
        .route("/api/uploads/objects", post(uploads::sign_upload))
        .route(
            "/uploads/objects/{key}",
            put(uploads::put_object).layer(body_limit(uploads.max_object_bytes)),
        )
        .route(
            "/api/upload-hero-video",
            post(videos::upload_video)
                .layer(body_limit(
                    uploads.max_video_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
                )),
        )
        .route("/api/save-hero-video", post(videos::save_video))
        .route("/api/hero-video/activate", post(videos::activate_video))
        .route("/api/site-videos", get(videos::list_videos))
        // Bookings
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/staff/bookings", get(bookings::list_bookings))
        .route(
            "/api/staff/bookings/{id}",
            axum::routing::patch(bookings::update_booking),
        )
        // Users
        .route(
            "/api/admin/users",
            get(users::list_users).post(users::create_user),
        )
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
