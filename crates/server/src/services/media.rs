//! Media storage on the local filesystem.
//!
//! Files land under `<media_dir>/<kind>/<name>` and are served by the router
//! at `/media/<kind>/<name>`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// URL prefix the media directory is served under.
pub const MEDIA_URL_PREFIX: &str = "/media";

const MAX_NAME_CHARS: usize = 80;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid object key: {0}")]
    InvalidKey(String),
}

/// Top-level folder a file is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Videos,
    Objects,
}

impl MediaKind {
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Videos => "videos",
            Self::Objects => "objects",
        }
    }
}

/// A stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub file_name: String,
    /// Site-relative URL, e.g. `/media/videos/<name>`.
    pub url: String,
}

/// Writes uploaded files under the media directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open a file under a fresh unique name derived from `original_name`,
    /// to be filled chunk by chunk.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Io` if the file cannot be created.
    #[instrument(skip(self))]
    pub async fn create(&self, kind: MediaKind, original_name: &str) -> Result<MediaWriter, MediaError> {
        let key = unique_name(original_name);
        let dir = self.root.join(kind.dir_name());
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(&key);
        let file = tokio::fs::File::create(&path).await?;

        Ok(MediaWriter {
            file,
            path,
            kind,
            key,
            written: 0,
        })
    }

    /// Store `bytes` under an exact object key, as issued by [`unique_name`].
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidKey` if the key could escape its folder.
    pub async fn save(
        &self,
        kind: MediaKind,
        key: &str,
        bytes: &[u8],
    ) -> Result<StoredMedia, MediaError> {
        if !is_safe_key(key) {
            return Err(MediaError::InvalidKey(key.to_string()));
        }

        let dir = self.root.join(kind.dir_name());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(key), bytes).await?;

        tracing::info!(kind = kind.dir_name(), key, "Stored media file");
        Ok(StoredMedia {
            file_name: key.to_string(),
            url: public_url(kind, key),
        })
    }
}

/// A media file being written. Call [`MediaWriter::finish`] to keep it or
/// [`MediaWriter::discard`] to remove the partial file.
#[derive(Debug)]
pub struct MediaWriter {
    file: tokio::fs::File,
    path: PathBuf,
    kind: MediaKind,
    key: String,
    written: u64,
}

impl MediaWriter {
    /// Bytes written so far.
    #[must_use]
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Append a chunk.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Io` if the write fails.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), MediaError> {
        self.file.write_all(chunk).await?;
        self.written = self
            .written
            .saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
        Ok(())
    }

    /// Flush to disk and return the stored file.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Io` if the flush fails.
    pub async fn finish(mut self) -> Result<StoredMedia, MediaError> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        tracing::info!(kind = self.kind.dir_name(), key = %self.key, size = self.written, "Stored media file");
        Ok(StoredMedia {
            url: public_url(self.kind, &self.key),
            file_name: self.key,
        })
    }

    /// Remove the partial file.
    pub async fn discard(self) {
        drop(self.file);
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            tracing::warn!(path = %self.path.display(), error = %e, "Could not remove partial upload");
        }
    }
}

/// Site-relative URL of a stored file.
#[must_use]
pub fn public_url(kind: MediaKind, key: &str) -> String {
    format!("{MEDIA_URL_PREFIX}/{}/{key}", kind.dir_name())
}

/// A collision-free storage name that keeps a readable tail of the original.
#[must_use]
pub fn unique_name(original_name: &str) -> String {
    format!("{}-{}", Uuid::new_v4().simple(), sanitize_file_name(original_name))
}

/// Reduce a client-supplied file name to `[a-z0-9._-]`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    // Drop any directory part a browser may have sent.
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let mut cleaned = String::with_capacity(base.len());
    for c in base.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '-'
        };
        // Collapse runs of dashes.
        if !(c == '-' && cleaned.ends_with('-')) {
            cleaned.push(c);
        }
    }

    let trimmed: String = cleaned
        .trim_matches(|c| c == '-' || c == '.')
        .chars()
        .rev()
        .take(MAX_NAME_CHARS)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed
    }
}

fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Hero Video.MP4"), "hero-video.mp4");
        assert_eq!(sanitize_file_name("C:\\Users\\lan\\clip.mov"), "clip.mov");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("bánh mì.jpg"), "b-nh-m-.jpg");
        assert_eq!(sanitize_file_name("..."), "file");
    }

    #[test]
    fn test_sanitize_keeps_the_extension_of_long_names() {
        let long = format!("{}.webp", "a".repeat(200));
        let cleaned = sanitize_file_name(&long);
        assert_eq!(cleaned.chars().count(), MAX_NAME_CHARS);
        assert!(cleaned.ends_with(".webp"));
    }

    #[test]
    fn test_unique_names_differ() {
        let a = unique_name("dish.png");
        let b = unique_name("dish.png");
        assert_ne!(a, b);
        assert!(a.ends_with("-dish.png"));
        assert!(is_safe_key(&a));
    }

    #[test]
    fn test_unsafe_keys() {
        assert!(!is_safe_key(""));
        assert!(!is_safe_key("../x"));
        assert!(!is_safe_key(".env"));
        assert!(!is_safe_key("a/b"));
    }

    #[tokio::test]
    async fn test_chunks_land_under_kind_folder() {
        let root = std::env::temp_dir().join(format!("bep-media-{}", Uuid::new_v4().simple()));
        let store = MediaStore::new(&root);

        let mut writer = store.create(MediaKind::Videos, "intro.mp4").await.unwrap();
        writer.write_chunk(b"fa").await.unwrap();
        writer.write_chunk(b"ke").await.unwrap();
        assert_eq!(writer.written(), 4);
        let stored = writer.finish().await.unwrap();

        assert!(stored.url.starts_with("/media/videos/"));
        assert!(stored.url.ends_with("-intro.mp4"));
        let on_disk = tokio::fs::read(root.join("videos").join(&stored.file_name)).await.unwrap();
        assert_eq!(on_disk, b"fake");

        assert!(matches!(
            store.save(MediaKind::Objects, "../escape", b"x").await,
            Err(MediaError::InvalidKey(_))
        ));

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_discard_removes_partial_file() {
        let root = std::env::temp_dir().join(format!("bep-media-{}", Uuid::new_v4().simple()));
        let store = MediaStore::new(&root);

        let mut writer = store.create(MediaKind::Videos, "cut-short.mp4").await.unwrap();
        writer.write_chunk(&[0; 1024]).await.unwrap();
        writer.discard().await;

        let mut entries = tokio::fs::read_dir(root.join("videos")).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
