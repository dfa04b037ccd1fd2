//! Uploaded media storage
//!
//! Files live under the media root and are referenced by their path relative
//! to it (`uploads/recipe/<uuid>.png`). The same relative path, prefixed with
//! the media URL, is how clients fetch them.

use std::io::{self, Cursor};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Directory (relative to the media root) holding recipe images
pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

/// Image formats accepted for upload, by MIME type
const ACCEPTED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
];

/// Detected image format of an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageFormat {
    pub mime_type: &'static str,
    pub extension: &'static str,
}

/// Sniff and decode `bytes`; returns the format if it is an accepted image
///
/// The client-supplied filename and content type are never trusted. The
/// signature picks the format and extension; the whole file must then decode,
/// so truncated or corrupt images are rejected. Decoding is CPU-bound: call
/// this from a blocking task.
pub fn detect_image(bytes: &[u8]) -> Option<ImageFormat> {
    let kind = infer::get(bytes)?;
    if !ACCEPTED_IMAGE_TYPES.contains(&kind.mime_type()) {
        return None;
    }

    if let Err(e) = decode_image(bytes) {
        debug!("Rejected {} upload: {}", kind.mime_type(), e);
        return None;
    }

    Some(ImageFormat {
        mime_type: kind.mime_type(),
        extension: kind.extension(),
    })
}

fn decode_image(bytes: &[u8]) -> image::ImageResult<()> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;
    Ok(())
}

/// Media directory on disk plus the URL prefix it is served under
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Create the media root if it doesn't exist
    pub async fn ensure_root(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Store a recipe image under a fresh unique name
    ///
    /// Returns the path relative to the media root.
    pub async fn save_recipe_image(&self, bytes: &[u8], format: ImageFormat) -> io::Result<String> {
        let relative = format!("{}/{}.{}", RECIPE_IMAGE_DIR, Uuid::new_v4(), format.extension);
        let path = self.root.join(&relative);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        debug!("Stored {} ({} bytes) at {}", format.mime_type, bytes.len(), path.display());
        Ok(relative)
    }

    /// Public URL of a stored file
    pub fn url_for(&self, relative: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), relative)
    }

    /// Absolute path of a stored file
    ///
    /// `None` for absolute paths or paths escaping the media root.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let path = Path::new(relative);
        let contained = path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        (contained && !relative.is_empty()).then(|| self.root.join(path))
    }

    /// Delete a stored file; failures are logged, never returned
    pub async fn remove(&self, relative: &str) {
        let Some(path) = self.resolve(relative) else {
            warn!("Refusing to remove media outside root: {:?}", relative);
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!("Removed media file {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Media file already gone: {}", path.display())
            }
            Err(e) => warn!("Failed to remove media file {}: {}", path.display(), e),
        }
    }
}
