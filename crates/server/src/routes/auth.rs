//! Sign-in, sign-out, and identity endpoints.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use bep_core::SessionUser;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::extract::ApiJson;
use crate::middleware::{AdminUser, OptionalUser, StaffUser, clear_current_user, set_current_user};
use crate::services::auth::AuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /api/auth/login
#[instrument(skip(state, session, request), fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let user = AuthService::new(state.pool())
        .login(&request.username, &request.password)
        .await?;
    let session_user = user.to_session_user();

    set_current_user(&session, &session_user).await?;
    set_sentry_user(session_user.id, &session_user.username);
    tracing::info!(user_id = %session_user.id, role = %session_user.role, "User signed in");

    Ok(Json(LoginResponse { user: session_user }))
}

/// POST /api/admin/logout
///
/// Succeeds with or without a live session.
pub async fn logout(
    session: Session,
    OptionalUser(user): OptionalUser,
) -> Result<Json<LogoutResponse>, AppError> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    if let Some(user) = user {
        tracing::info!(user_id = %user.id, "User signed out");
    }
    Ok(Json(LogoutResponse { success: true }))
}

/// GET /api/admin/me
pub async fn admin_me(AdminUser(user): AdminUser) -> Json<SessionUser> {
    Json(user)
}

/// GET /api/staff/me
pub async fn staff_me(StaffUser(user): StaffUser) -> Json<SessionUser> {
    Json(user)
}
