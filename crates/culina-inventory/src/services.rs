//! Collaborator traits consumed by the inventory and scan pipeline.
//!
//! HTTP implementations live in `culina-client`; the photo source used by
//! the binary lives in `culina-app`.

use async_trait::async_trait;

use culina_core::error::CulinaError;
use culina_core::types::CapturedPhoto;

/// Resolves a representative picture for an ingredient name.
///
/// Implementations never fail: any lookup problem resolves to a placeholder
/// URL so that enrichment and merging always complete.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn image_for(&self, query: &str) -> String;
}

/// Turns a pantry photo into a list of ingredient names.
///
/// Names come back lowercase and already split; they may still contain
/// duplicates.
#[async_trait]
pub trait IngredientRecognizer: Send + Sync {
    async fn recognize(&self, photo: &CapturedPhoto) -> Result<Vec<String>, CulinaError>;
}

/// Source of photos for a scan.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Ask for camera/library access. `false` means denied.
    async fn request_permission(&self) -> bool;

    /// Capture one photo. `Ok(None)` means the user backed out.
    async fn capture(&self) -> Result<Option<CapturedPhoto>, CulinaError>;
}
