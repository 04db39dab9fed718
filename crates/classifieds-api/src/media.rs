use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

/// Subdirectory of the media root holding ad images.
const IMAGE_DIR: &str = "images";

pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["bmp", "gif", "jpeg", "jpg", "png", "webp"];

/// Manages uploaded files under the media root.
///
/// Files are stored under generated names, so stored paths never contain
/// anything supplied by the client.
pub struct MediaStorage {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStorage {
    pub async fn new(root: PathBuf, url_prefix: String) -> Result<Self> {
        fs::create_dir_all(root.join(IMAGE_DIR)).await?;
        info!("Media root: {}", root.display());
        Ok(Self { root, url_prefix })
    }

    /// Absolute path of a stored file.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Public URL of a stored file.
    pub fn url(&self, name: &str) -> String {
        format!("{}/{}", self.url_prefix, name)
    }

    /// Writes an image and returns its path relative to the media root.
    pub async fn save_image(&self, extension: &str, data: &[u8]) -> Result<String> {
        let name = format!("{}/{}.{}", IMAGE_DIR, Uuid::new_v4(), extension);
        let path = self.path(&name);

        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        info!("Stored {} ({} bytes)", name, data.len());
        Ok(name)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path(name)).await {
            Ok(()) => {
                info!("Deleted media file {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Media file {} already gone", name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal; failures are logged and skipped.
    pub async fn delete_all(&self, names: &[String]) {
        for name in names {
            if let Err(e) = self.delete(name).await {
                warn!("Failed to delete media file {}: {}", name, e);
            }
        }
    }
}

/// Lowercased extension of an uploaded file name, if it is an accepted image type.
pub fn image_extension(file_name: Option<&str>) -> Result<String, String> {
    let extension = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(format!(
            "File extension '{}' is not allowed. Allowed extensions are: {}.",
            extension,
            ALLOWED_IMAGE_EXTENSIONS.join(", ")
        ))
    }
}
