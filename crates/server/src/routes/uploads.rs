//! Pre-signed object uploads.
//!
//! `POST /api/uploads/objects` hands a signed-in user a short-lived URL;
//! the browser then PUTs the file body to `/uploads/objects/{key}` without
//! a session. The signature binds the key, the content type, and the expiry.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, header::CONTENT_TYPE},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use bep_core::{Permission, UploadRejection, UploadRestrictions};

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::{StaffUser, require_permission};
use crate::services::media::{MediaKind, public_url, unique_name};
use crate::services::signing::SignatureError;
use crate::state::AppState;

/// Types accepted through pre-signed URLs.
const ALLOWED_OBJECT_TYPES: [&str; 4] = ["image/*", "video/*", "application/pdf", "text/plain"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResponse {
    pub method: &'static str,
    pub url: String,
    pub public_url: String,
}

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: i64,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct StoredResponse {
    pub url: String,
}

pub(crate) fn object_restrictions(state: &AppState) -> UploadRestrictions {
    UploadRestrictions {
        max_files: 1,
        max_file_size: state.config().uploads.max_object_bytes,
        allowed_mime_types: ALLOWED_OBJECT_TYPES.iter().map(ToString::to_string).collect(),
    }
}

impl From<UploadRejection> for AppError {
    fn from(rejection: UploadRejection) -> Self {
        match rejection {
            UploadRejection::TooLarge { .. } => Self::PayloadTooLarge(rejection.to_string()),
            _ => Self::BadRequest(rejection.to_string()),
        }
    }
}

/// POST /api/uploads/objects
pub async fn sign_upload(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    ApiJson(request): ApiJson<SignRequest>,
) -> Result<Json<SignResponse>, AppError> {
    require_permission(&user, Permission::MediaUpload)?;
    object_restrictions(&state).check_file(request.size, &request.content_type)?;

    let key = unique_name(&request.file_name);
    let base_url = &state.config().base_url;
    let url = state
        .signer()
        .presign(base_url, &key, &request.content_type, Utc::now())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let public_url = base_url
        .join(&public_url(MediaKind::Objects, &key))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(key, size = request.size, by = %user.username, "Signed object upload");
    Ok(Json(SignResponse {
        method: "PUT",
        url: url.into(),
        public_url: public_url.into(),
    }))
}

/// PUT /uploads/objects/{key}?expires=&signature=
///
/// The body limit is set on the route from the object ceiling.
pub async fn put_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StoredResponse>, AppError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Content-Type is required".to_string()))?;

    state
        .signer()
        .verify(&key, content_type, query.expires, &query.signature, Utc::now())
        .map_err(|e| match e {
            SignatureError::Expired | SignatureError::Invalid => AppError::Forbidden(e.to_string()),
            other => AppError::Internal(other.to_string()),
        })?;

    let size = u64::try_from(body.len()).unwrap_or(u64::MAX);
    object_restrictions(&state).check_file(size, content_type)?;

    let stored = state.media().save(MediaKind::Objects, &key, &body).await?;
    Ok(Json(StoredResponse { url: stored.url }))
}
