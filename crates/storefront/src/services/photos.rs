//! Uploaded photo storage.
//!
//! Photos are written as-is to the upload directory and served from
//! `/uploads`. Only `image/*` uploads are accepted; the file extension comes
//! from the MIME subtype.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Errors from storing a photo.
#[derive(Debug, Error)]
pub enum PhotoError {
    /// The upload is not an image.
    #[error("That filetype isn't allowed!")]
    NotAnImage(String),

    /// Writing the file failed.
    #[error("failed to store photo: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes uploaded photos to a directory.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory photos are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `PhotoError::Io` if the directory cannot be created.
    pub async fn ensure_dir(&self) -> Result<(), PhotoError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Store an upload and return its filename.
    ///
    /// An empty upload (no file chosen in the form) stores nothing and
    /// returns `None`.
    ///
    /// # Errors
    ///
    /// Returns `PhotoError::NotAnImage` for non-image MIME types and
    /// `PhotoError::Io` if the file cannot be written.
    pub async fn save(
        &self,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<Option<String>, PhotoError> {
        if bytes.is_empty() {
            return Ok(None);
        }

        let filename = photo_filename(content_type.unwrap_or_default())?;
        tokio::fs::write(self.dir.join(&filename), bytes).await?;

        tracing::debug!(filename = %filename, size = bytes.len(), "Photo stored");
        Ok(Some(filename))
    }

    /// Delete a photo written by [`save`](Self::save) that no listing uses.
    ///
    /// Only bare filenames are accepted. Failures are logged, not returned.
    pub async fn discard(&self, filename: &str) {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.') {
            tracing::warn!(filename = %filename, "Refusing to discard photo outside upload dir");
            return;
        }

        match tokio::fs::remove_file(self.dir.join(filename)).await {
            Ok(()) => tracing::debug!(filename = %filename, "Orphaned photo removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(filename = %filename, error = %e, "Failed to remove photo"),
        }
    }
}

/// `<uuid>.<subtype>` for an `image/<subtype>` MIME type.
fn photo_filename(content_type: &str) -> Result<String, PhotoError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let subtype = essence
        .strip_prefix("image/")
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)))
        .ok_or_else(|| PhotoError::NotAnImage(content_type.to_string()))?;

    // `svg+xml` and friends: keep the part before the structured suffix.
    let extension = subtype.split('+').next().unwrap_or(subtype);

    Ok(format!("{}.{extension}", Uuid::new_v4()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_mime() {
        let name = photo_filename("image/jpeg").unwrap();
        assert!(name.ends_with(".jpeg"));
        let stem = name.trim_end_matches(".jpeg");
        assert!(Uuid::parse_str(stem).is_ok());
    }

    #[test]
    fn test_filename_ignores_parameters_and_case() {
        assert!(photo_filename("Image/PNG; charset=binary").unwrap().ends_with(".png"));
        assert!(photo_filename("image/svg+xml").unwrap().ends_with(".svg"));
    }

    #[test]
    fn test_rejects_non_images() {
        assert!(matches!(
            photo_filename("application/pdf"),
            Err(PhotoError::NotAnImage(_))
        ));
        assert!(photo_filename("").is_err());
        assert!(photo_filename("image/").is_err());
        assert!(photo_filename("image/../../etc").is_err());
    }

    #[tokio::test]
    async fn test_empty_upload_stores_nothing() {
        let store = PhotoStore::new(std::env::temp_dir().join("delicious-photos-empty"));
        assert_eq!(store.save(Some("image/png"), &[]).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_writes_file() {
        let dir = std::env::temp_dir().join(format!("delicious-photos-{}", Uuid::new_v4()));
        let store = PhotoStore::new(&dir);
        store.ensure_dir().await.unwrap();

        let name = store
            .save(Some("image/png"), b"\x89PNG fake")
            .await
            .unwrap()
            .unwrap();
        let written = tokio::fs::read(dir.join(&name)).await.unwrap();
        assert_eq!(written, b"\x89PNG fake");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_discard_removes_saved_photo() {
        let dir = std::env::temp_dir().join(format!("delicious-photos-{}", Uuid::new_v4()));
        let store = PhotoStore::new(&dir);
        store.ensure_dir().await.unwrap();

        let name = store
            .save(Some("image/jpeg"), b"jpeg bytes")
            .await
            .unwrap()
            .unwrap();
        store.discard(&name).await;
        assert!(!dir.join(&name).exists());

        // Already gone: nothing to do.
        store.discard(&name).await;

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_discard_ignores_paths() {
        let dir = std::env::temp_dir().join(format!("delicious-photos-{}", Uuid::new_v4()));
        let outside = std::env::temp_dir().join(format!("delicious-keep-{}", Uuid::new_v4()));
        tokio::fs::write(&outside, b"keep").await.unwrap();

        let store = PhotoStore::new(&dir);
        let relative = format!("../{}", outside.file_name().unwrap().to_string_lossy());
        store.discard(&relative).await;
        assert!(outside.exists());

        tokio::fs::remove_file(&outside).await.unwrap();
    }
}
