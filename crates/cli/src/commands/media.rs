//! Media commands, driven through the back-office client.
//!
//! # Usage
//!
//! ```bash
//! # Stage a new hero video, then publish it
//! bep-cli video upload ./hero.mp4 --slot hero
//! bep-cli video activate --slot hero
//!
//! # Upload images through pre-signed URLs
//! bep-cli objects upload ./pho.webp ./bun-cha.webp
//! ```
//!
//! # Environment Variables
//!
//! - `BEP_BASE_URL` - Site URL
//! - `BEP_USERNAME` / `BEP_PASSWORD` - Back-office credentials

use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use bep_client::{
    ApiError, BackOffice, ClientConfig, FileInput, FileStorage, FileUpload, Ports, SessionStorage,
    TracingNavigator, TracingNotifier, VideoUploadError,
};
use bep_core::{Locale, UploadRestrictions, VideoSlot};

/// Object uploads accepted from the command line.
const OBJECT_TYPES: [&str; 2] = ["image/*", "application/pdf"];
const MAX_OBJECT_FILES: usize = 20;
const MAX_OBJECT_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Video(#[from] VideoUploadError),

    #[error("Session expired, sign in again")]
    SessionExpired,

    #[error("{failed} of {total} files failed")]
    Batch { failed: usize, total: usize },
}

/// Connection settings shared by the media commands.
#[derive(Debug)]
pub struct Connection<'a> {
    pub base_url: &'a str,
    pub username: &'a str,
    pub password: &'a SecretString,
    pub locale: Locale,
    pub session_file: &'a Path,
}

/// Sign in and return a ready back office.
async fn sign_in(connection: &Connection<'_>) -> Result<BackOffice, MediaError> {
    let config = ClientConfig::new(connection.base_url)?.with_locale(connection.locale);
    let ports = Ports {
        storage: Arc::new(FileStorage::open(connection.session_file)) as Arc<dyn SessionStorage>,
        notifier: Arc::new(TracingNotifier),
        navigator: Arc::new(TracingNavigator),
    };
    let office = BackOffice::new(config, ports)?;
    office
        .login(connection.username, connection.password.expose_secret())
        .await?;
    Ok(office)
}

async fn read_file(path: &Path) -> Result<FileUpload, MediaError> {
    FileUpload::from_path(path)
        .await
        .map_err(|source| MediaError::Read {
            path: path.display().to_string(),
            source,
        })
}

/// Upload a video and stage it for `slot`, optionally publishing it.
///
/// # Errors
///
/// Returns the failing phase's error.
pub async fn upload_video(
    connection: &Connection<'_>,
    path: &Path,
    slot: VideoSlot,
    activate: bool,
) -> Result<(), MediaError> {
    let office = sign_in(connection).await?;
    let mut input = FileInput::new();
    input.select(read_file(path).await?);

    let staged = office
        .video_uploader()
        .upload_selected(&mut input, slot, |result| {
            tracing::debug!(success = result.success, "upload finished");
        })
        .await?;
    tracing::info!(slot = slot.as_str(), url = %staged.url, "Video staged");

    if activate {
        activate_staged(&office, slot).await?;
    }
    Ok(())
}

/// Publish the pending video of `slot`.
///
/// # Errors
///
/// Returns the API error, or `SessionExpired` if the server dropped the session.
pub async fn activate_video(connection: &Connection<'_>, slot: VideoSlot) -> Result<(), MediaError> {
    let office = sign_in(connection).await?;
    activate_staged(&office, slot).await
}

async fn activate_staged(office: &BackOffice, slot: VideoSlot) -> Result<(), MediaError> {
    let activated = office
        .activate_video(slot)
        .await?
        .ok_or(MediaError::SessionExpired)?;
    tracing::info!(slot = activated.video_type.as_str(), url = %activated.url, "Video live");
    Ok(())
}

/// Upload files through pre-signed URLs.
///
/// # Errors
///
/// Returns `MediaError::Batch` if any file failed; the others are kept.
pub async fn upload_objects(connection: &Connection<'_>, paths: &[PathBuf]) -> Result<(), MediaError> {
    let office = sign_in(connection).await?;

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(read_file(path).await?);
    }
    let total = files.len();

    let uploader = office.object_uploader(UploadRestrictions {
        max_files: MAX_OBJECT_FILES,
        max_file_size: MAX_OBJECT_BYTES,
        allowed_mime_types: OBJECT_TYPES.iter().map(ToString::to_string).collect(),
    });
    let result = uploader
        .upload(files, |batch| {
            tracing::info!(
                succeeded = batch.successful.len(),
                failed = batch.failed.len(),
                "Batch finished"
            );
        })
        .await;

    for object in &result.successful {
        tracing::info!(
            name = %object.name,
            url = object.public_url.as_deref().unwrap_or(&object.upload_url),
            "Uploaded"
        );
    }
    for failure in &result.failed {
        tracing::warn!(name = %failure.name, reason = %failure.reason, "Not uploaded");
    }

    if result.failed.is_empty() {
        Ok(())
    } else {
        Err(MediaError::Batch {
            failed: result.failed.len(),
            total,
        })
    }
}
