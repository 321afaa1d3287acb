//! Image enrichment.
//!
//! Fills the empty-image sentinel with a representative picture. Lookups for
//! one pass run concurrently and share no mutable state.

use futures::future::join_all;
use tracing::debug;

use culina_core::types::{InventoryItem, PLACEHOLDER_IMAGE_URL};

use crate::services::ImageSearch;

/// Look up a picture for `name`, substituting the placeholder for an empty
/// answer.
pub async fn resolve_image(search: &dyn ImageSearch, name: &str) -> String {
    let url = search.image_for(name).await;
    if url.trim().is_empty() {
        debug!(name = %name, "Image search returned nothing; using placeholder");
        PLACEHOLDER_IMAGE_URL.to_string()
    } else {
        url
    }
}

/// Resolve pictures for many names at once, preserving order.
pub async fn resolve_images(search: &dyn ImageSearch, names: &[String]) -> Vec<String> {
    join_all(names.iter().map(|name| resolve_image(search, name))).await
}

/// Return `list` with every un-enriched item's image filled in.
///
/// Items that already have an image pass through unchanged, so running the
/// pass on an enriched list is a no-op.
pub async fn enrich_images(list: &[InventoryItem], search: &dyn ImageSearch) -> Vec<InventoryItem> {
    let lookups = list.iter().map(|item| async move {
        if item.needs_image() {
            let image = resolve_image(search, &item.name).await;
            item.clone().with_image(image)
        } else {
            item.clone()
        }
    });
    join_all(lookups).await
}
