//! Inventory management for Culina.
//!
//! Owns the canonical ingredient list, the batch-delete selection, image
//! enrichment, and the photo scan pipeline that feeds new items in.

pub mod enrich;
pub mod error;
pub mod scan;
pub mod selection;
pub mod services;
pub mod store;

#[cfg(test)]
mod testing;

pub use enrich::{enrich_images, resolve_image, resolve_images};
pub use error::InventoryError;
pub use scan::{review_candidates, ScanNotice, ScanOutcome, ScanPipeline, ScanState};
pub use selection::Selection;
pub use services::{ImageSearch, IngredientRecognizer, PhotoSource};
pub use store::{new_item, InventoryStore, Snapshot};
