//! Background video endpoints.
//!
//! Upload stores the file, save stages it as the slot's pending video, and
//! activate promotes pending to live.

use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use bep_core::{Permission, VideoRules, VideoSlot};

use crate::db::{RepositoryError, VideoRepository};
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::{OptionalUser, StaffUser, require_permission};
use crate::models::PublicVideo;
use crate::services::media::{MEDIA_URL_PREFIX, MediaKind, MediaWriter};
use crate::state::AppState;

/// Multipart field carrying the file.
const VIDEO_FIELD: &str = "video";

#[derive(Debug, Serialize)]
pub struct UploadedVideo {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveVideoRequest {
    pub video_url: String,
    pub video_type: VideoSlot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveVideoResponse {
    pub file_name: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    pub video_type: VideoSlot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivatedVideo {
    pub video_type: VideoSlot,
    pub url: String,
}

fn multipart_error(err: &MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

fn videos_prefix() -> String {
    format!("{MEDIA_URL_PREFIX}/{}/", MediaKind::Videos.dir_name())
}

/// Stream a multipart field to disk, checking the running size per chunk.
async fn receive(
    field: &mut Field<'_>,
    writer: &mut MediaWriter,
    rules: &VideoRules,
    content_type: &str,
) -> Result<(), AppError> {
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(&e))? {
        let size = writer
            .written()
            .saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
        rules.check(size, content_type)?;
        writer.write_chunk(&chunk).await?;
    }
    Ok(())
}

/// POST /api/upload-hero-video (multipart, field `video`)
pub async fn upload_video(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    mut multipart: Multipart,
) -> Result<Json<UploadedVideo>, AppError> {
    require_permission(&user, Permission::MediaUpload)?;
    let rules = VideoRules {
        max_size_bytes: state.config().uploads.max_video_bytes,
    };

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("video").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        rules.check(0, &content_type)?;

        let mut writer = state.media().create(MediaKind::Videos, &file_name).await?;
        if let Err(e) = receive(&mut field, &mut writer, &rules, &content_type).await {
            writer.discard().await;
            return Err(e);
        }
        let size = writer.written();
        let stored = writer.finish().await?;
        tracing::info!(url = %stored.url, size, by = %user.username, "Video uploaded");
        return Ok(Json(UploadedVideo { url: stored.url }));
    }

    Err(AppError::BadRequest(format!("Missing multipart field '{VIDEO_FIELD}'")))
}

/// POST /api/save-hero-video
pub async fn save_video(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    ApiJson(request): ApiJson<SaveVideoRequest>,
) -> Result<Json<SaveVideoResponse>, AppError> {
    require_permission(&user, Permission::MediaUpload)?;

    let file_name = request
        .video_url
        .strip_prefix(&videos_prefix())
        .filter(|name| !name.is_empty() && !name.contains('/'))
        .ok_or_else(|| AppError::BadRequest("videoUrl must point at an uploaded video".to_string()))?
        .to_string();

    let video = VideoRepository::new(state.pool())
        .stage_pending(request.video_type, &request.video_url, &file_name)
        .await?;
    tracing::info!(slot = video.slot.as_str(), file_name, by = %user.username, "Video staged");

    Ok(Json(SaveVideoResponse {
        message: format!(
            "Video staged for {}. Activate it to publish.",
            video.slot.as_str()
        ),
        file_name,
    }))
}

/// POST /api/hero-video/activate
pub async fn activate_video(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    ApiJson(request): ApiJson<ActivateRequest>,
) -> Result<Json<ActivatedVideo>, AppError> {
    require_permission(&user, Permission::MediaUpload)?;

    let video = VideoRepository::new(state.pool())
        .activate(request.video_type)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!(
                "No pending video for {}",
                request.video_type.as_str()
            )),
            other => other.into(),
        })?;
    let url = video
        .live_url
        .ok_or_else(|| AppError::Internal("activated video has no live URL".to_string()))?;

    tracing::info!(slot = video.slot.as_str(), url, by = %user.username, "Video activated");
    Ok(Json(ActivatedVideo {
        video_type: video.slot,
        url,
    }))
}

/// GET /api/site-videos
///
/// Visitors get live URLs only; back-office users also see pending state.
pub async fn list_videos(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Response, AppError> {
    let videos = VideoRepository::new(state.pool()).list().await?;
    if user.is_some() {
        return Ok(Json(videos).into_response());
    }
    let public: Vec<PublicVideo> = videos.into_iter().map(Into::into).collect();
    Ok(Json(public).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_videos_prefix() {
        assert_eq!(videos_prefix(), "/media/videos/");
    }
}
