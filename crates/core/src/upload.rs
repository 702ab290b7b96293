//! Upload rules shared by the server's checks and the client's pre-flight
//! validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::i18n::Message;

const MB: u64 = 1024 * 1024;

/// Default ceiling for background videos.
pub const DEFAULT_MAX_VIDEO_BYTES: u64 = 200 * MB;

/// Why a file was refused before upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("file is {size} bytes, limit is {max_bytes}")]
    TooLarge { size: u64, max_bytes: u64 },
    #[error("file type {mime:?} is not allowed")]
    TypeNotAllowed { mime: String },
    #[error("file type {mime:?} is not a video")]
    NotAVideo { mime: String },
    #[error("{count} files selected, limit is {max}")]
    TooManyFiles { count: usize, max: usize },
}

impl UploadRejection {
    /// The localized notice for this rejection.
    #[must_use]
    pub const fn message(&self) -> Message {
        match self {
            Self::TooLarge { max_bytes, .. } => Message::FileTooLarge {
                max_mb: max_bytes.div_ceil(MB),
            },
            Self::TypeNotAllowed { .. } => Message::FileTypeNotAllowed,
            Self::NotAVideo { .. } => Message::NotAVideo,
            Self::TooManyFiles { max, .. } => Message::TooManyFiles { max: *max },
        }
    }
}

/// Restrictions for a batch of object uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRestrictions {
    pub max_files: usize,
    pub max_file_size: u64,
    /// Exact MIME types or `type/*` wildcards. Empty allows anything.
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadRestrictions {
    fn default() -> Self {
        Self {
            max_files: 1,
            max_file_size: 10 * MB,
            allowed_mime_types: Vec::new(),
        }
    }
}

impl UploadRestrictions {
    /// One small image: menu photos, avatars, Open Graph images.
    #[must_use]
    pub fn single_image() -> Self {
        Self {
            max_files: 1,
            max_file_size: 2 * MB,
            allowed_mime_types: ["image/jpeg", "image/png", "image/webp"]
                .map(String::from)
                .to_vec(),
        }
    }

    /// Check the number of files picked.
    ///
    /// # Errors
    ///
    /// Returns [`UploadRejection::TooManyFiles`] above `max_files`.
    pub const fn check_count(&self, count: usize) -> Result<(), UploadRejection> {
        if count > self.max_files {
            return Err(UploadRejection::TooManyFiles {
                count,
                max: self.max_files,
            });
        }
        Ok(())
    }

    /// Check one file's size and type.
    ///
    /// # Errors
    ///
    /// Returns [`UploadRejection::TooLarge`] or
    /// [`UploadRejection::TypeNotAllowed`].
    pub fn check_file(&self, size: u64, mime: &str) -> Result<(), UploadRejection> {
        if size > self.max_file_size {
            return Err(UploadRejection::TooLarge {
                size,
                max_bytes: self.max_file_size,
            });
        }
        if !self.allows_mime(mime) {
            return Err(UploadRejection::TypeNotAllowed {
                mime: mime.to_string(),
            });
        }
        Ok(())
    }

    /// Whether `mime` matches the allowed list.
    #[must_use]
    pub fn allows_mime(&self, mime: &str) -> bool {
        let mime = essence(mime);
        self.allowed_mime_types.is_empty()
            || self.allowed_mime_types.iter().any(|allowed| {
                allowed.strip_suffix("/*").map_or_else(
                    || allowed.eq_ignore_ascii_case(&mime),
                    |prefix| {
                        mime.split_once('/')
                            .is_some_and(|(top, _)| top.eq_ignore_ascii_case(prefix))
                    },
                )
            })
    }
}

/// Rules for background video uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRules {
    pub max_size_bytes: u64,
}

impl Default for VideoRules {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_VIDEO_BYTES,
        }
    }
}

impl VideoRules {
    #[must_use]
    pub const fn with_max_mb(max_mb: u64) -> Self {
        Self {
            max_size_bytes: max_mb.saturating_mul(MB),
        }
    }

    /// Check size first, then that the type is `video/*`.
    ///
    /// # Errors
    ///
    /// Returns [`UploadRejection::TooLarge`] or [`UploadRejection::NotAVideo`].
    pub fn check(&self, size: u64, mime: &str) -> Result<(), UploadRejection> {
        if size > self.max_size_bytes {
            return Err(UploadRejection::TooLarge {
                size,
                max_bytes: self.max_size_bytes,
            });
        }
        if !essence(mime).starts_with("video/") {
            return Err(UploadRejection::NotAVideo {
                mime: mime.to_string(),
            });
        }
        Ok(())
    }
}

/// MIME type without parameters, lowercased (`Video/MP4; codecs=avc1` →
/// `video/mp4`).
fn essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Outcome reported to the caller of an upload pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UploadResult {
    #[must_use]
    pub fn succeeded(file_name: Option<String>, message: Option<String>) -> Self {
        Self {
            success: true,
            file_name,
            message,
        }
    }

    #[must_use]
    pub fn failed() -> Self {
        Self::default()
    }
}
