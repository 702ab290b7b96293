//! Locales and the user-facing notices raised by the session and upload
//! flows.
//!
//! Page copy lives with the front end; only the messages the Rust flows
//! themselves surface are translated here.

use serde::{Deserialize, Serialize};

/// Site language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Vi,
    En,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vi" | "vi-vn" => Ok(Self::Vi),
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            _ => Err(format!("unsupported locale: {s}")),
        }
    }
}

/// A notice shown to the user as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// The session ended (401) while the user was signed in.
    SessionExpired,
    /// A file exceeded the size ceiling.
    FileTooLarge { max_mb: u64 },
    /// The upload was started with no file picked.
    NoFileSelected,
    /// A video upload was not a `video/*` file.
    NotAVideo,
    /// A file type outside the allowed list.
    FileTypeNotAllowed,
    /// Too many files were picked at once.
    TooManyFiles { max: usize },
    /// An upload failed; `detail` is the server's message when there was one.
    UploadFailed { detail: Option<String> },
    /// A video was uploaded and staged; it goes live on "save changes".
    VideoPending,
    /// A staged video was promoted to its slot.
    VideoActivated,
}

impl Message {
    /// Render the notice in `locale`.
    #[must_use]
    pub fn text(&self, locale: Locale) -> String {
        match (self, locale) {
            (Self::SessionExpired, Locale::Vi) => {
                "Phiên đăng nhập đã hết hạn. Vui lòng đăng nhập lại.".to_string()
            }
            (Self::SessionExpired, Locale::En) => {
                "Your session has expired. Please sign in again.".to_string()
            }
            (Self::FileTooLarge { max_mb }, Locale::Vi) => {
                format!("Tệp quá lớn. Kích thước tối đa là {max_mb}MB.")
            }
            (Self::FileTooLarge { max_mb }, Locale::En) => {
                format!("File is too large. Maximum size is {max_mb}MB.")
            }
            (Self::NoFileSelected, Locale::Vi) => "Chưa chọn tệp nào.".to_string(),
            (Self::NoFileSelected, Locale::En) => "No file selected.".to_string(),
            (Self::NotAVideo, Locale::Vi) => "Vui lòng chọn một tệp video.".to_string(),
            (Self::NotAVideo, Locale::En) => "Please choose a video file.".to_string(),
            (Self::FileTypeNotAllowed, Locale::Vi) => {
                "Định dạng tệp không được hỗ trợ.".to_string()
            }
            (Self::FileTypeNotAllowed, Locale::En) => "This file type is not allowed.".to_string(),
            (Self::TooManyFiles { max }, Locale::Vi) => {
                format!("Chỉ được tải lên tối đa {max} tệp.")
            }
            (Self::TooManyFiles { max }, Locale::En) => {
                format!("You can upload at most {max} files.")
            }
            (Self::UploadFailed { detail }, Locale::Vi) => detail.as_ref().map_or_else(
                || "Tải lên thất bại.".to_string(),
                |d| format!("Tải lên thất bại: {d}"),
            ),
            (Self::UploadFailed { detail }, Locale::En) => detail.as_ref().map_or_else(
                || "Upload failed.".to_string(),
                |d| format!("Upload failed: {d}"),
            ),
            (Self::VideoPending, Locale::Vi) => {
                "Đã tải video lên. Nhấn \"Lưu thay đổi\" để áp dụng.".to_string()
            }
            (Self::VideoPending, Locale::En) => {
                "Video uploaded. Press \"Save changes\" to apply it.".to_string()
            }
            (Self::VideoActivated, Locale::Vi) => "Đã áp dụng video mới.".to_string(),
            (Self::VideoActivated, Locale::En) => "The new video is live.".to_string(),
        }
    }
}
