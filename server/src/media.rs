//! Recipe image validation and on-disk storage.
//!
//! Images live under a media root as `uploads/recipe/<uuid>.<ext>` and are
//! served back under [`MEDIA_URL`]. The database stores only the relative path.

use std::io::{self, Cursor};
use std::path::{Component, Path, PathBuf};

use image::{ImageFormat, ImageReader};
use uuid::Uuid;

/// Allowed image formats for recipe images.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum file size for images (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// URL prefix the media root is mounted at.
pub const MEDIA_URL: &str = "/media";

const RECIPE_UPLOAD_DIR: &str = "uploads/recipe";

/// Validate image data: size, allowed format, and that it actually decodes.
///
/// Returns the file extension to store it under (e.g., "png").
pub fn validate_image(data: &[u8]) -> Result<&'static str, String> {
    if data.is_empty() {
        return Err("The submitted file is empty".to_string());
    }

    if data.len() > MAX_FILE_SIZE {
        return Err(format!(
            "Image too large: {} bytes (max {})",
            data.len(),
            MAX_FILE_SIZE
        ));
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("Failed to read image: {}", e))?;

    let format = reader
        .format()
        .ok_or_else(|| "Upload a valid image. The file you uploaded was either not an image or a corrupted image".to_string())?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(format!(
            "Unsupported image format: {:?}. Allowed: JPEG, PNG, GIF, WebP",
            format
        ));
    }

    reader
        .decode()
        .map_err(|e| format!("Failed to decode image: {}", e))?;

    Ok(format.extensions_str().first().copied().unwrap_or("img"))
}

/// Filesystem-backed store for uploaded files.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a recipe image under a fresh unique name and return its relative path.
    pub fn save_recipe_image(&self, data: &[u8], extension: &str) -> io::Result<String> {
        let relative = format!("{}/{}.{}", RECIPE_UPLOAD_DIR, Uuid::new_v4(), extension);
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, data)?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "stored recipe image");
        Ok(relative)
    }

    /// Remove a stored file. Missing files are not an error.
    pub fn delete(&self, relative: &str) -> io::Result<()> {
        let Some(path) = self.resolve(relative) else {
            tracing::warn!("Refusing to delete media path outside root: {}", relative);
            return Ok(());
        };
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Absolute path for a stored relative path, if it stays inside the root.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        let inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        inside.then(|| self.root.join(relative))
    }
}

/// Public URL for a stored relative path.
pub fn media_url(relative: &str) -> String {
    format!("{}/{}", MEDIA_URL, relative)
}
