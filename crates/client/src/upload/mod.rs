//! Upload pipelines.
//!
//! - [`object`] - batch uploads straight to pre-signed URLs
//! - [`video`] - staged background video uploads (upload, then register)

pub mod object;
pub mod video;

use std::path::Path;

pub use object::{
    BatchResult, FailedUpload, FileStatus, ObjectUploader, ServerUploadParameters,
    UploadDashboard, UploadParameterSource, UploadParameters, UploadedObject,
};
pub use video::{FileInput, StagedVideo, VideoPhase, VideoUploadError, VideoUploader};

/// A file picked by the user, held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}

impl FileUpload {
    #[must_use]
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read a file from disk, guessing its type from the extension.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        let mime_type = mime_from_extension(path).to_string();
        Ok(Self {
            name,
            mime_type,
            data,
        })
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_from_extension(Path::new("hero.MP4")), "video/mp4");
        assert_eq!(mime_from_extension(Path::new("pho.jpeg")), "image/jpeg");
        assert_eq!(mime_from_extension(Path::new("menu")), "application/octet-stream");
    }

    #[test]
    fn test_debug_hides_bytes() {
        let file = FileUpload::new("a.png", "image/png", vec![0; 4]);
        assert_eq!(
            format!("{file:?}"),
            r#"FileUpload { name: "a.png", mime_type: "image/png", size: 4 }"#
        );
    }
}
