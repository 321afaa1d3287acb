//! Error types for the inventory and scan pipeline.

use culina_core::error::CulinaError;
use uuid::Uuid;

use crate::scan::ScanState;

/// Errors from inventory mutations and the scan/review workflow.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("ingredient name cannot be empty")]
    EmptyName,
    #[error("duplicate item id: {0}")]
    DuplicateId(Uuid),
    #[error("ingredient already listed: {0}")]
    DuplicateName(String),
    #[error("invalid scan transition: {from} -> {to}")]
    InvalidTransition { from: ScanState, to: ScanState },
    #[error("no scan review in progress")]
    NotReviewing,
    #[error("review candidate not found: {0}")]
    CandidateNotFound(Uuid),
    #[error("review list is empty")]
    EmptyReview,
    #[error("scan merge aborted: {0}")]
    MergeAborted(String),
}

impl From<InventoryError> for CulinaError {
    fn from(err: InventoryError) -> Self {
        CulinaError::Validation(err.to_string())
    }
}
