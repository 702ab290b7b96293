//! Menu endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use bep_core::{MenuItemId, Permission};

use crate::db::MenuRepository;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::{StaffUser, require_permission};
use crate::models::{MenuItem, MenuItemInput};
use crate::state::AppState;

/// GET /api/menu
pub async fn public_menu(
    State(state): State<AppState>,
) -> Result<Json<Arc<Vec<MenuItem>>>, AppError> {
    Ok(Json(state.public_menu().await?))
}

/// GET /api/admin/menu-items
pub async fn list_items(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    require_permission(&user, Permission::MenuWrite)?;
    Ok(Json(MenuRepository::new(state.pool()).list_all().await?))
}

/// POST /api/admin/menu-items
pub async fn create_item(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    ApiJson(input): ApiJson<MenuItemInput>,
) -> Result<(StatusCode, Json<MenuItem>), AppError> {
    require_permission(&user, Permission::MenuWrite)?;
    input.validate().map_err(AppError::BadRequest)?;

    let item = MenuRepository::new(state.pool()).create(&input).await?;
    state.invalidate_menu().await;
    tracing::info!(item_id = %item.id, slug = %item.slug, by = %user.username, "Menu item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/admin/menu-items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Path(id): Path<MenuItemId>,
    ApiJson(input): ApiJson<MenuItemInput>,
) -> Result<Json<MenuItem>, AppError> {
    require_permission(&user, Permission::MenuWrite)?;
    input.validate().map_err(AppError::BadRequest)?;

    let item = MenuRepository::new(state.pool()).update(id, &input).await?;
    state.invalidate_menu().await;
    Ok(Json(item))
}

/// DELETE /api/admin/menu-items/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Path(id): Path<MenuItemId>,
) -> Result<StatusCode, AppError> {
    require_permission(&user, Permission::MenuWrite)?;

    MenuRepository::new(state.pool()).delete(id).await?;
    state.invalidate_menu().await;
    tracing::info!(item_id = %id, by = %user.username, "Menu item deleted");
    Ok(StatusCode::NO_CONTENT)
}
