//! Back-office account management.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;

use bep_core::{Email, Permission, Role, SessionUser};

use crate::db::UserRepository;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::{AdminUser, require_permission};
use crate::services::auth::{AccountRequest, AuthService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: Option<Vec<Permission>>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
) -> Result<Json<Vec<SessionUser>>, AppError> {
    require_permission(&user, Permission::UsersManage)?;
    let users = UserRepository::new(state.pool()).list_all().await?;
    Ok(Json(users.iter().map(crate::models::User::to_session_user).collect()))
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<SessionUser>), AppError> {
    require_permission(&user, Permission::UsersManage)?;

    let email = request
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .map(Email::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let created = AuthService::new(state.pool())
        .create_user(&AccountRequest {
            username: &request.username,
            password: &request.password,
            role: request.role,
            permissions: request.permissions.as_deref(),
            full_name: request.full_name.as_deref(),
            email,
        })
        .await?;

    tracing::info!(user_id = %created.id, role = %created.role, by = %user.username, "User created");
    Ok((StatusCode::CREATED, Json(created.to_session_user())))
}
