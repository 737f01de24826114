//! Product image storage on the local filesystem.
//!
//! Files live under `<storage_dir>/products/` and are served at
//! `/storage/products/...`. The database stores the path relative to the
//! storage root.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Largest accepted upload.
pub const MAX_IMAGE_BYTES: usize = 2048 * 1024;

/// Sub-directory for product images.
const PRODUCTS_DIR: &str = "products";

/// Errors from image validation or storage.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("The image must be a file of type: jpg, jpeg, png, webp.")]
    UnsupportedType,

    #[error("The image field must not be greater than 2048 kilobytes.")]
    TooLarge,

    #[error("The image field is required.")]
    Empty,

    #[error("invalid stored image path: {0}")]
    InvalidPath(String),

    #[error("image storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepted image formats, detected from the file contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    /// Detect the format from magic bytes.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    /// File extension used when storing.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }
}

/// Check an upload against the accepted extensions, size and contents.
///
/// # Errors
///
/// Returns the `ImageError` describing the first rule that failed.
pub fn validate_upload(file_name: Option<&str>, bytes: &[u8]) -> Result<ImageKind, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }

    if let Some(name) = file_name {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        if !matches!(
            extension.as_deref(),
            Some("jpg" | "jpeg" | "png" | "webp")
        ) {
            return Err(ImageError::UnsupportedType);
        }
    }

    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge);
    }

    ImageKind::sniff(bytes).ok_or(ImageError::UnsupportedType)
}

/// Filesystem-backed image store.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Create a store rooted at the public storage directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage root served at `/storage`.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a product image under a generated name and return its relative path.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::Io` if the file cannot be written.
    pub async fn store_product_image(
        &self,
        kind: ImageKind,
        bytes: &[u8],
    ) -> Result<String, ImageError> {
        let dir = self.root.join(PRODUCTS_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), kind.extension());
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        Ok(format!("{PRODUCTS_DIR}/{file_name}"))
    }

    /// Remove a stored file. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::InvalidPath` if the path escapes the storage root.
    /// Returns `ImageError::Io` for other filesystem errors.
    pub async fn delete(&self, relative_path: &str) -> Result<(), ImageError> {
        let path = self.resolve(relative_path)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a file, logging instead of failing.
    pub async fn delete_quietly(&self, relative_path: &str) {
        if let Err(e) = self.delete(relative_path).await {
            tracing::warn!(path = %relative_path, error = %e, "Failed to delete image");
        }
    }

    fn resolve(&self, relative_path: &str) -> Result<PathBuf, ImageError> {
        let relative = Path::new(relative_path);
        let is_plain = !relative_path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        if !is_plain {
            return Err(ImageError::InvalidPath(relative_path.to_owned()));
        }
        Ok(self.root.join(relative))
    }
}
