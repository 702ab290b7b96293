//! Page SEO endpoints.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use bep_core::Permission;

use crate::db::SeoRepository;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::{StaffUser, require_permission};
use crate::models::{PageSeo, PageSeoInput};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SeoQuery {
    pub path: String,
}

/// GET /api/seo?path=/menu
pub async fn get_page(
    State(state): State<AppState>,
    Query(query): Query<SeoQuery>,
) -> Result<Json<PageSeo>, AppError> {
    SeoRepository::new(state.pool())
        .get_by_path(&query.path)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No SEO entry for {}", query.path)))
}

/// GET /api/admin/seo
pub async fn list_pages(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
) -> Result<Json<Vec<PageSeo>>, AppError> {
    require_permission(&user, Permission::ContentWrite)?;
    Ok(Json(SeoRepository::new(state.pool()).list().await?))
}

/// PUT /api/admin/seo
pub async fn upsert_page(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    ApiJson(input): ApiJson<PageSeoInput>,
) -> Result<Json<PageSeo>, AppError> {
    require_permission(&user, Permission::ContentWrite)?;
    input.validate().map_err(AppError::BadRequest)?;

    let page = SeoRepository::new(state.pool()).upsert(&input).await?;
    tracing::info!(path = %page.path, by = %user.username, "SEO entry saved");
    Ok(Json(page))
}
