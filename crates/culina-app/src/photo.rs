//! Photos read from disk, standing in for the camera.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, warn};

use culina_core::error::CulinaError;
use culina_core::types::CapturedPhoto;
use culina_inventory::services::PhotoSource;

/// Serves a single image file as the captured photo.
#[derive(Debug, Clone)]
pub struct FilePhotoSource {
    path: PathBuf,
    fallback_mime_type: String,
}

impl FilePhotoSource {
    pub fn new(path: impl Into<PathBuf>, fallback_mime_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fallback_mime_type: fallback_mime_type.into(),
        }
    }

    fn mime_type(&self) -> String {
        mime_for(&self.path)
            .map(str::to_string)
            .unwrap_or_else(|| self.fallback_mime_type.clone())
    }
}

/// Media type implied by a file extension.
pub fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

#[async_trait]
impl PhotoSource for FilePhotoSource {
    /// Denied only when the OS refuses to open the file.
    async fn request_permission(&self) -> bool {
        match tokio::fs::File::open(&self.path).await {
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                warn!(path = %self.path.display(), "Photo is not readable");
                false
            }
            _ => true,
        }
    }

    /// An empty file counts as a cancelled capture.
    async fn capture(&self) -> Result<Option<CapturedPhoto>, CulinaError> {
        let bytes = tokio::fs::read(&self.path).await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        let mime_type = self.mime_type();
        debug!(path = %self.path.display(), bytes = bytes.len(), mime_type = %mime_type, "Photo read");
        Ok(Some(CapturedPhoto::new(STANDARD.encode(&bytes), mime_type)))
    }
}
