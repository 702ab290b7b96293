//! Staged background video uploads.
//!
//! Three phases run in order, each with its own failure mapping:
//!
//! 1. [`VideoPhase::Validate`]: size and `video/*` type, locally.
//! 2. [`VideoPhase::Upload`]: multipart POST to `api/upload-hero-video`,
//!    answered with the stored file's URL.
//! 3. [`VideoPhase::Register`]: POST that URL to `api/save-hero-video`,
//!    which stages it as the slot's pending video.
//!
//! A staged video goes live only when [`VideoUploader::activate`] is
//! called. Register failures do not repeat the upload.

use std::sync::Arc;

use bep_core::{Locale, Message, UploadRejection, UploadResult, VideoRules, VideoSlot};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::FileUpload;
use crate::error::ApiError;
use crate::http::{ApiClient, OnUnauthorized};
use crate::ports::{Notifier, ToastLevel};

/// Saga phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPhase {
    Validate,
    Upload,
    Register,
}

#[derive(Debug, Error)]
pub enum VideoUploadError {
    #[error("no file selected")]
    NoFileSelected,

    #[error("video rejected: {0}")]
    Rejected(#[from] UploadRejection),

    #[error("video upload failed: {0}")]
    Upload(#[source] ApiError),

    #[error("registering the video failed: {0}")]
    Register(#[source] ApiError),

    /// The server rejected the session during a phase; the logout
    /// dispatcher has already run.
    #[error("session expired during {0:?}")]
    SessionExpired(VideoPhase),
}

impl VideoUploadError {
    #[must_use]
    pub const fn phase(&self) -> VideoPhase {
        match self {
            Self::NoFileSelected | Self::Rejected(_) => VideoPhase::Validate,
            Self::Upload(_) => VideoPhase::Upload,
            Self::Register(_) => VideoPhase::Register,
            Self::SessionExpired(phase) => *phase,
        }
    }

    /// Toast text for this failure. `None` for an expired session, which
    /// the expiry handler announces itself.
    #[must_use]
    pub fn message(&self, locale: Locale) -> Option<String> {
        let message = match self {
            Self::NoFileSelected => Message::NoFileSelected,
            Self::Rejected(rejection) => rejection.message(),
            Self::Upload(e) | Self::Register(e) => Message::UploadFailed {
                detail: e.user_message().map(str::to_string),
            },
            Self::SessionExpired(_) => return None,
        };
        Some(message.text(locale))
    }
}

/// A file picker holding at most one selection.
#[derive(Debug, Default)]
pub struct FileInput {
    selected: Option<FileUpload>,
}

impl FileInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, file: FileUpload) {
        self.selected = Some(file);
    }

    #[must_use]
    pub const fn selected(&self) -> Option<&FileUpload> {
        self.selected.as_ref()
    }

    /// Take the selection, leaving the input empty.
    pub const fn take(&mut self) -> Option<FileUpload> {
        self.selected.take()
    }
}

/// A video waiting for activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedVideo {
    pub slot: VideoSlot,
    pub url: String,
    pub file_name: Option<String>,
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct UploadedVideo {
    url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveVideoRequest<'a> {
    video_url: &'a str,
    video_type: VideoSlot,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveVideoResponse {
    file_name: Option<String>,
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivateRequest {
    video_type: VideoSlot,
}

/// Answer of the activation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivatedVideo {
    pub video_type: VideoSlot,
    pub url: String,
}

/// Runs the staged video saga.
#[derive(Clone)]
pub struct VideoUploader {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
    locale: Locale,
    rules: VideoRules,
}

impl std::fmt::Debug for VideoUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoUploader")
            .field("locale", &self.locale)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl VideoUploader {
    #[must_use]
    pub fn new(client: ApiClient, notifier: Arc<dyn Notifier>, locale: Locale, rules: VideoRules) -> Self {
        Self {
            client,
            notifier,
            locale,
            rules,
        }
    }

    /// Upload and stage the selected video for `slot`.
    ///
    /// The input is emptied whatever the outcome, so the same file can be
    /// picked again. `on_complete` is called exactly once.
    ///
    /// # Errors
    ///
    /// Returns the phase-specific failure. Every failure but an expired
    /// session has already been toasted.
    #[tracing::instrument(skip_all, fields(slot = slot.as_str()))]
    pub async fn upload_selected<F>(
        &self,
        input: &mut FileInput,
        slot: VideoSlot,
        on_complete: F,
    ) -> Result<StagedVideo, VideoUploadError>
    where
        F: FnOnce(UploadResult),
    {
        let outcome = match input.take() {
            Some(file) => self.run(file, slot).await,
            None => Err(VideoUploadError::NoFileSelected),
        };

        match outcome {
            Ok(staged) => {
                // The server's note is English-only; the toast follows the locale.
                self.notifier
                    .notify(ToastLevel::Success, &Message::VideoPending.text(self.locale));
                on_complete(UploadResult::succeeded(
                    staged.file_name.clone(),
                    staged.message.clone(),
                ));
                Ok(staged)
            }
            Err(e) => {
                tracing::warn!(phase = ?e.phase(), error = %e, "video upload failed");
                if let Some(text) = e.message(self.locale) {
                    self.notifier.notify(ToastLevel::Error, &text);
                }
                on_complete(UploadResult::failed());
                Err(e)
            }
        }
    }

    async fn run(&self, file: FileUpload, slot: VideoSlot) -> Result<StagedVideo, VideoUploadError> {
        self.rules.check(file.size(), &file.mime_type)?;

        let FileUpload {
            name,
            mime_type,
            data,
        } = file;
        let part = Part::bytes(data)
            .file_name(name.clone())
            .mime_str(&mime_type)
            .map_err(|e| VideoUploadError::Upload(e.into()))?;
        let form = Form::new().part("video", part);

        let uploaded: UploadedVideo = self
            .client
            .post_multipart("api/upload-hero-video", form)
            .await
            .map_err(VideoUploadError::Upload)?
            .ok_or(VideoUploadError::SessionExpired(VideoPhase::Upload))?;
        tracing::debug!(url = %uploaded.url, "video stored");

        let request = SaveVideoRequest {
            video_url: &uploaded.url,
            video_type: slot,
        };
        let saved: SaveVideoResponse = self
            .client
            .send_json(Method::POST, "api/save-hero-video", &request, OnUnauthorized::Dispatch)
            .await
            .map_err(VideoUploadError::Register)?
            .ok_or(VideoUploadError::SessionExpired(VideoPhase::Register))?;

        Ok(StagedVideo {
            slot,
            url: uploaded.url,
            file_name: saved.file_name.or(Some(name)),
            message: saved.message,
        })
    }

    /// Promote the pending video of `slot` to live ("save changes").
    /// Returns `None` if the session had expired.
    ///
    /// # Errors
    ///
    /// Returns the API error, after toasting it.
    pub async fn activate(&self, slot: VideoSlot) -> Result<Option<ActivatedVideo>, ApiError> {
        let request = ActivateRequest { video_type: slot };
        let result = self
            .client
            .send_json(Method::POST, "api/hero-video/activate", &request, OnUnauthorized::Dispatch)
            .await;

        match &result {
            Ok(Some(_)) => self
                .notifier
                .notify(ToastLevel::Success, &Message::VideoActivated.text(self.locale)),
            Ok(None) => {}
            Err(e) => {
                let text = Message::UploadFailed {
                    detail: e.user_message().map(str::to_string),
                }
                .text(self.locale);
                self.notifier.notify(ToastLevel::Error, &text);
            }
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bep_core::{Locale, Message};
    use reqwest::StatusCode;

    use super::*;
    use crate::config::ClientConfig;
    use crate::dispatch::LogoutDispatcher;
    use crate::expiry::tests::RecordingUi;

    const MB: usize = 1024 * 1024;

    fn uploader(ui: &Arc<RecordingUi>) -> VideoUploader {
        // Nothing listens here; validation failures must not reach it.
        let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        let client = ApiClient::new(&config, LogoutDispatcher::new()).unwrap();
        VideoUploader::new(
            client,
            Arc::clone(ui) as Arc<dyn Notifier>,
            Locale::En,
            VideoRules::with_max_mb(2),
        )
    }

    #[tokio::test]
    async fn test_oversize_video_is_rejected_locally() {
        let ui = Arc::new(RecordingUi::default());
        let mut input = FileInput::new();
        input.select(FileUpload::new("big.mp4", "video/mp4", vec![0; 3 * MB]));

        let mut reported = None;
        let err = uploader(&ui)
            .upload_selected(&mut input, VideoSlot::Hero, |r| reported = Some(r))
            .await
            .unwrap_err();

        assert!(matches!(err, VideoUploadError::Rejected(UploadRejection::TooLarge { .. })));
        assert_eq!(err.phase(), VideoPhase::Validate);
        assert_eq!(reported, Some(UploadResult::failed()));
        assert!(input.selected().is_none());
        assert_eq!(
            ui.toasts.lock().unwrap()[0],
            (ToastLevel::Error, Message::FileTooLarge { max_mb: 2 }.text(Locale::En))
        );
    }

    #[tokio::test]
    async fn test_non_video_is_rejected_locally() {
        let ui = Arc::new(RecordingUi::default());
        let mut input = FileInput::new();
        input.select(FileUpload::new("photo.jpg", "image/jpeg", vec![0; 10]));

        let err = uploader(&ui)
            .upload_selected(&mut input, VideoSlot::Reservation, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, VideoUploadError::Rejected(UploadRejection::NotAVideo { .. })));
        assert_eq!(ui.toasts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let ui = Arc::new(RecordingUi::default());
        let mut input = FileInput::new();
        let mut called = 0;

        let err = uploader(&ui)
            .upload_selected(&mut input, VideoSlot::Hero, |_| called += 1)
            .await
            .unwrap_err();

        assert!(matches!(err, VideoUploadError::NoFileSelected));
        assert_eq!(called, 1);
        assert_eq!(
            ui.toasts.lock().unwrap().as_slice(),
            [(ToastLevel::Error, "No file selected.".to_string())]
        );
        assert_eq!(err.message(Locale::Vi).as_deref(), Some("Chưa chọn tệp nào."));
    }

    #[test]
    fn test_error_messages() {
        let expired = VideoUploadError::SessionExpired(VideoPhase::Register);
        assert_eq!(expired.phase(), VideoPhase::Register);
        assert!(expired.message(Locale::En).is_none());

        let register = VideoUploadError::Register(ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: "Unknown video type".to_string(),
        });
        assert_eq!(
            register.message(Locale::En).as_deref(),
            Some("Upload failed: Unknown video type")
        );
    }

    #[test]
    fn test_save_request_wire_shape() {
        let body = serde_json::to_value(SaveVideoRequest {
            video_url: "/media/videos/hero.mp4",
            video_type: VideoSlot::Hero,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"videoUrl": "/media/videos/hero.mp4", "videoType": "hero"})
        );
    }
}
