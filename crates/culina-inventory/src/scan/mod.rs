//! Bulk ingestion from a pantry photo.
//!
//! A scan runs capture -> recognize -> review -> merge. Recognition output is
//! noisy, so nothing reaches the canonical list until the user confirms the
//! reviewed candidates. Every remote failure ends the run without touching
//! the inventory.

pub mod state;

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};
use uuid::Uuid;

use culina_core::types::{normalize, Category, InventoryItem, NameKey, ReviewCandidate};

use crate::enrich::resolve_images;
use crate::error::InventoryError;
use crate::services::{ImageSearch, IngredientRecognizer, PhotoSource};
use crate::store::InventoryStore;

pub use state::ScanState;

/// User-facing reason a scan ended without a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanNotice {
    PermissionDenied,
    CaptureCancelled,
    CaptureFailed(String),
    NoNewIngredients,
    RecognitionFailed(String),
}

impl fmt::Display for ScanNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanNotice::PermissionDenied => {
                write!(f, "Camera access is required to scan your pantry.")
            }
            ScanNotice::CaptureCancelled => write!(f, "Scan cancelled."),
            ScanNotice::CaptureFailed(reason) => write!(f, "Could not read the photo: {}", reason),
            ScanNotice::NoNewIngredients => write!(f, "No new ingredients found."),
            ScanNotice::RecognitionFailed(_) => write!(f, "Scan failed. Try again later."),
        }
    }
}

/// Result of starting a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Candidates are ready for review; the pipeline is `Reviewing`.
    Review(Vec<ReviewCandidate>),
    /// The run ended early; the pipeline is back to `Idle`.
    Notice(ScanNotice),
}

/// Build review candidates from raw recognizer output.
///
/// Blank names, names already in `known`, and repeats within the batch are
/// dropped. The first spelling of each name wins.
pub fn review_candidates(recognized: &[String], known: &HashSet<NameKey>) -> Vec<ReviewCandidate> {
    let mut seen = HashSet::new();
    recognized
        .iter()
        .filter_map(|raw| {
            let name = raw.trim();
            let key = normalize(name);
            if key.is_empty() || known.contains(&key) || !seen.insert(key) {
                return None;
            }
            Some(ReviewCandidate::new(name))
        })
        .collect()
}

struct Review {
    candidates: Vec<ReviewCandidate>,
    /// Inventory names live when recognition finished.
    known: HashSet<NameKey>,
}

struct Inner {
    state: ScanState,
    review: Option<Review>,
}

/// Resets the pipeline to `Idle` if a run is dropped mid-flight.
struct IdleGuard {
    inner: Arc<Mutex<Inner>>,
    armed: bool,
}

impl IdleGuard {
    fn new(inner: &Arc<Mutex<Inner>>) -> Self {
        Self {
            inner: Arc::clone(inner),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for IdleGuard {
    fn drop(&mut self) {
        if self.armed {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            warn!("Scan interrupted in {}; resetting to Idle", inner.state);
            inner.state = ScanState::Idle;
            inner.review = None;
        }
    }
}

/// Drives one scan at a time against the canonical inventory.
pub struct ScanPipeline {
    inventory: Arc<InventoryStore>,
    photos: Arc<dyn PhotoSource>,
    recognizer: Arc<dyn IngredientRecognizer>,
    images: Arc<dyn ImageSearch>,
    default_category: Category,
    inner: Arc<Mutex<Inner>>,
}

impl ScanPipeline {
    pub fn new(
        inventory: Arc<InventoryStore>,
        photos: Arc<dyn PhotoSource>,
        recognizer: Arc<dyn IngredientRecognizer>,
        images: Arc<dyn ImageSearch>,
    ) -> Self {
        Self {
            inventory,
            photos,
            recognizer,
            images,
            default_category: Category::Pantry,
            inner: Arc::new(Mutex::new(Inner {
                state: ScanState::Idle,
                review: None,
            })),
        }
    }

    /// Category given to merged items (defaults to `Pantry`).
    pub fn with_default_category(mut self, category: Category) -> Self {
        self.default_category = category;
        self
    }

    pub fn state(&self) -> ScanState {
        self.lock().state
    }

    /// Candidates under review; empty outside `Reviewing`.
    pub fn candidates(&self) -> Vec<ReviewCandidate> {
        self.lock()
            .review
            .as_ref()
            .map(|r| r.candidates.clone())
            .unwrap_or_default()
    }

    /// Whether `confirm` would do anything.
    pub fn can_confirm(&self) -> bool {
        let inner = self.lock();
        inner.state == ScanState::Reviewing
            && inner.review.as_ref().is_some_and(|r| !r.candidates.is_empty())
    }

    /// Start a scan: capture, recognize, and prepare candidates for review.
    ///
    /// Fails only if a scan is already in progress. Every other early exit is
    /// reported as a [`ScanNotice`] with the pipeline back at `Idle`.
    pub async fn scan(&self) -> Result<ScanOutcome, InventoryError> {
        self.transition(ScanState::Capturing)?;
        let guard = IdleGuard::new(&self.inner);
        let outcome = self.run_scan().await;
        guard.disarm();
        outcome
    }

    async fn run_scan(&self) -> Result<ScanOutcome, InventoryError> {
        if !self.photos.request_permission().await {
            info!("Scan aborted: permission denied");
            return self.end_early(ScanNotice::PermissionDenied);
        }

        let photo = match self.photos.capture().await {
            Ok(Some(photo)) => photo,
            Ok(None) => return self.end_early(ScanNotice::CaptureCancelled),
            Err(e) => {
                warn!(error = %e, "Photo capture failed");
                return self.end_early(ScanNotice::CaptureFailed(e.to_string()));
            }
        };

        self.transition(ScanState::Recognizing)?;
        debug!(mime_type = %photo.mime_type, bytes = photo.base64.len(), "Sending photo for recognition");
        let recognized = match self.recognizer.recognize(&photo).await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Ingredient recognition failed");
                return self.end_early(ScanNotice::RecognitionFailed(e.to_string()));
            }
        };

        let known: HashSet<NameKey> = self.inventory.snapshot().iter().map(InventoryItem::key).collect();
        let candidates = review_candidates(&recognized, &known);
        info!(
            recognized = recognized.len(),
            candidates = candidates.len(),
            "Recognition complete"
        );
        if candidates.is_empty() {
            return self.end_early(ScanNotice::NoNewIngredients);
        }

        let mut inner = self.lock();
        Self::check(inner.state, ScanState::Reviewing)?;
        inner.state = ScanState::Reviewing;
        inner.review = Some(Review {
            candidates: candidates.clone(),
            known,
        });
        Ok(ScanOutcome::Review(candidates))
    }

    /// Rename a candidate. Blank names and names that are already listed
    /// (in the inventory or among the other candidates) are rejected.
    pub fn rename(&self, id: Uuid, name: &str) -> Result<(), InventoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InventoryError::EmptyName);
        }
        let mut inner = self.lock();
        let review = Self::review_mut(&mut inner)?;
        if !review.candidates.iter().any(|c| c.id == id) {
            return Err(InventoryError::CandidateNotFound(id));
        }

        let key = normalize(name);
        let clashes = review.known.contains(&key)
            || review
                .candidates
                .iter()
                .any(|c| c.id != id && normalize(&c.name) == key);
        if clashes {
            return Err(InventoryError::DuplicateName(name.to_string()));
        }

        if let Some(candidate) = review.candidates.iter_mut().find(|c| c.id == id) {
            candidate.name = name.to_string();
        }
        Ok(())
    }

    /// Drop one candidate from the review.
    pub fn remove(&self, id: Uuid) -> Result<(), InventoryError> {
        let mut inner = self.lock();
        let review = Self::review_mut(&mut inner)?;
        let before = review.candidates.len();
        review.candidates.retain(|c| c.id != id);
        if review.candidates.len() == before {
            return Err(InventoryError::CandidateNotFound(id));
        }
        Ok(())
    }

    /// Discard the review and return to `Idle`.
    pub fn cancel(&self) -> Result<(), InventoryError> {
        let mut inner = self.lock();
        Self::review_mut(&mut inner)?;
        inner.state = ScanState::Idle;
        inner.review = None;
        info!("Scan review cancelled");
        Ok(())
    }

    /// Turn the remaining candidates into inventory items.
    ///
    /// Pictures are looked up concurrently, then all items are appended to
    /// the canonical list in one batch. Returns the new items.
    ///
    /// The merge runs on its own task: once `Merging` starts it finishes
    /// and the pipeline returns to `Idle` even if this future is dropped.
    pub async fn confirm(&self) -> Result<Vec<InventoryItem>, InventoryError> {
        let candidates = {
            let mut inner = self.lock();
            let review = Self::review_mut(&mut inner)?;
            if review.candidates.is_empty() {
                return Err(InventoryError::EmptyReview);
            }
            let candidates = std::mem::take(&mut review.candidates);
            Self::check(inner.state, ScanState::Merging)?;
            inner.state = ScanState::Merging;
            inner.review = None;
            candidates
        };
        let guard = IdleGuard::new(&self.inner);
        let names: Vec<String> = candidates.into_iter().map(|c| c.name).collect();
        let inventory = Arc::clone(&self.inventory);
        let images = Arc::clone(&self.images);
        let category = self.default_category;

        let merge = tokio::spawn(async move {
            let urls = resolve_images(images.as_ref(), &names).await;
            let items: Vec<InventoryItem> = names
                .into_iter()
                .zip(urls)
                .map(|(name, image)| InventoryItem::new(name, category).with_image(image))
                .collect();
            let merged = inventory.add_items(items.clone()).await;
            {
                let mut inner = guard.inner.lock().unwrap_or_else(PoisonError::into_inner);
                debug!("Scan state: {} -> {}", inner.state, ScanState::Idle);
                inner.state = ScanState::Idle;
            }
            guard.disarm();
            merged?;
            info!(count = items.len(), "Scan merged into inventory");
            Ok::<_, InventoryError>(items)
        });

        merge
            .await
            .map_err(|e| InventoryError::MergeAborted(e.to_string()))?
    }

    // -- Private helpers --

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(from: ScanState, to: ScanState) -> Result<(), InventoryError> {
        if from.can_transition_to(&to) {
            Ok(())
        } else {
            Err(InventoryError::InvalidTransition { from, to })
        }
    }

    fn transition(&self, target: ScanState) -> Result<(), InventoryError> {
        let mut inner = self.lock();
        Self::check(inner.state, target)?;
        debug!("Scan state: {} -> {}", inner.state, target);
        inner.state = target;
        Ok(())
    }

    fn end_early(&self, notice: ScanNotice) -> Result<ScanOutcome, InventoryError> {
        self.transition(ScanState::Idle)?;
        Ok(ScanOutcome::Notice(notice))
    }

    fn review_mut<'g>(inner: &'g mut MutexGuard<'_, Inner>) -> Result<&'g mut Review, InventoryError> {
        if inner.state != ScanState::Reviewing {
            return Err(InventoryError::NotReviewing);
        }
        inner.review.as_mut().ok_or(InventoryError::NotReviewing)
    }
}

impl fmt::Debug for ScanPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanPipeline")
            .field("state", &self.state())
            .field("default_category", &self.default_category)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedPhotos, ScriptedRecognizer, StaticImages};
    use async_trait::async_trait;
    use culina_core::error::CulinaError;
    use culina_core::types::CapturedPhoto;
    use culina_storage::MemoryStore;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    async fn inventory_with(names: &[&str]) -> Arc<InventoryStore> {
        let store = InventoryStore::empty(Arc::new(MemoryStore::new()));
        for name in names {
            store
                .add_item(InventoryItem::new(*name, Category::Fridge).with_image("https://img/x"))
                .await
                .unwrap();
        }
        Arc::new(store)
    }

    fn pipeline(
        inventory: Arc<InventoryStore>,
        photos: FixedPhotos,
        recognizer: ScriptedRecognizer,
    ) -> ScanPipeline {
        let images = StaticImages::new().with("eggs", "https://img/eggs");
        ScanPipeline::new(inventory, Arc::new(photos), Arc::new(recognizer), Arc::new(images))
    }

    fn review_of(outcome: ScanOutcome) -> Vec<ReviewCandidate> {
        match outcome {
            ScanOutcome::Review(candidates) => candidates,
            other => panic!("expected a review, got {:?}", other),
        }
    }

    // ---- candidate building ----

    #[test]
    fn test_candidates_dedup_against_inventory_and_batch() {
        let known = HashSet::from([normalize("Milk")]);
        let candidates = review_candidates(&names(&["eggs", "milk", "eggs"]), &known);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "eggs");
    }

    #[test]
    fn test_candidates_skip_blank_and_case_variants() {
        let candidates =
            review_candidates(&names(&["  ", "Tomato", "tomato ", "basil"]), &HashSet::new());
        let got: Vec<_> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(got, vec!["Tomato", "basil"]);
    }

    #[test]
    fn test_candidates_get_distinct_ids() {
        let candidates = review_candidates(&names(&["a", "b"]), &HashSet::new());
        assert_ne!(candidates[0].id, candidates[1].id);
    }

    // ---- scan ----

    #[tokio::test]
    async fn test_scan_enters_review() {
        let inventory = inventory_with(&["Milk"]).await;
        let scan = pipeline(
            inventory,
            FixedPhotos::granted(),
            ScriptedRecognizer::new().ok(&["eggs", "milk", "eggs"]),
        );

        let candidates = review_of(scan.scan().await.unwrap());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "eggs");
        assert_eq!(scan.state(), ScanState::Reviewing);
        assert_eq!(scan.candidates(), candidates);
        assert!(scan.can_confirm());
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let inventory = inventory_with(&[]).await;
        let scan = pipeline(
            inventory.clone(),
            FixedPhotos::denied(),
            ScriptedRecognizer::new().ok(&["eggs"]),
        );

        let outcome = scan.scan().await.unwrap();
        assert_eq!(outcome, ScanOutcome::Notice(ScanNotice::PermissionDenied));
        assert_eq!(scan.state(), ScanState::Idle);
        assert!(inventory.is_empty());
    }

    #[tokio::test]
    async fn test_capture_cancelled() {
        let scan = pipeline(
            inventory_with(&[]).await,
            FixedPhotos::cancelled(),
            ScriptedRecognizer::new(),
        );
        let outcome = scan.scan().await.unwrap();
        assert_eq!(outcome, ScanOutcome::Notice(ScanNotice::CaptureCancelled));
        assert_eq!(scan.state(), ScanState::Idle);
    }

    #[tokio::test]
    async fn test_recognition_failure_keeps_nothing() {
        let inventory = inventory_with(&["Milk"]).await;
        let scan = pipeline(
            inventory.clone(),
            FixedPhotos::granted(),
            ScriptedRecognizer::new().err("Server error: 500"),
        );

        let outcome = scan.scan().await.unwrap();
        assert!(matches!(
            outcome,
            ScanOutcome::Notice(ScanNotice::RecognitionFailed(ref r)) if r.contains("500")
        ));
        assert_eq!(scan.state(), ScanState::Idle);
        assert!(scan.candidates().is_empty());
        assert_eq!(inventory.len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_new_skips_review() {
        let scan = pipeline(
            inventory_with(&["Milk", "Eggs"]).await,
            FixedPhotos::granted(),
            ScriptedRecognizer::new().ok(&["milk", "eggs"]),
        );
        let outcome = scan.scan().await.unwrap();
        assert_eq!(outcome, ScanOutcome::Notice(ScanNotice::NoNewIngredients));
        assert_eq!(scan.state(), ScanState::Idle);
    }

    #[tokio::test]
    async fn test_scan_while_reviewing_is_rejected() {
        let scan = pipeline(
            inventory_with(&[]).await,
            FixedPhotos::granted(),
            ScriptedRecognizer::new().ok(&["eggs"]).ok(&["ham"]),
        );
        scan.scan().await.unwrap();
        let second = scan.scan().await;
        assert!(matches!(
            second,
            Err(InventoryError::InvalidTransition {
                from: ScanState::Reviewing,
                to: ScanState::Capturing,
            })
        ));
        assert_eq!(scan.candidates().len(), 1);
    }

    // ---- review ----

    #[tokio::test]
    async fn test_rename_and_remove() {
        let scan = pipeline(
            inventory_with(&["Milk"]).await,
            FixedPhotos::granted(),
            ScriptedRecognizer::new().ok(&["egs", "ham", "cheese"]),
        );
        let candidates = review_of(scan.scan().await.unwrap());

        scan.rename(candidates[0].id, "  eggs ").unwrap();
        scan.remove(candidates[1].id).unwrap();

        let now: Vec<_> = scan.candidates().into_iter().map(|c| c.name).collect();
        assert_eq!(now, vec!["eggs", "cheese"]);
    }

    #[tokio::test]
    async fn test_rename_rejects_blank_and_duplicates() {
        let scan = pipeline(
            inventory_with(&["Milk"]).await,
            FixedPhotos::granted(),
            ScriptedRecognizer::new().ok(&["eggs", "ham"]),
        );
        let candidates = review_of(scan.scan().await.unwrap());
        let id = candidates[0].id;

        assert!(matches!(scan.rename(id, "   "), Err(InventoryError::EmptyName)));
        assert!(matches!(scan.rename(id, "MILK"), Err(InventoryError::DuplicateName(_))));
        assert!(matches!(scan.rename(id, "Ham"), Err(InventoryError::DuplicateName(_))));
        // Renaming to its own name with different case is fine.
        scan.rename(id, "Eggs").unwrap();
        assert!(matches!(
            scan.rename(Uuid::new_v4(), "x"),
            Err(InventoryError::CandidateNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_review_mutators_need_review() {
        let scan = pipeline(inventory_with(&[]).await, FixedPhotos::granted(), ScriptedRecognizer::new());
        assert!(matches!(scan.rename(Uuid::new_v4(), "x"), Err(InventoryError::NotReviewing)));
        assert!(matches!(scan.remove(Uuid::new_v4()), Err(InventoryError::NotReviewing)));
        assert!(matches!(scan.cancel(), Err(InventoryError::NotReviewing)));
        assert!(matches!(scan.confirm().await, Err(InventoryError::NotReviewing)));
    }

    #[tokio::test]
    async fn test_cancel_discards_review() {
        let inventory = inventory_with(&[]).await;
        let scan = pipeline(
            inventory.clone(),
            FixedPhotos::granted(),
            ScriptedRecognizer::new().ok(&["eggs"]),
        );
        scan.scan().await.unwrap();
        scan.cancel().unwrap();

        assert_eq!(scan.state(), ScanState::Idle);
        assert!(scan.candidates().is_empty());
        assert!(inventory.is_empty());
    }

    #[tokio::test]
    async fn test_confirm_empty_review_is_disallowed() {
        let scan = pipeline(
            inventory_with(&[]).await,
            FixedPhotos::granted(),
            ScriptedRecognizer::new().ok(&["eggs"]),
        );
        let candidates = review_of(scan.scan().await.unwrap());
        scan.remove(candidates[0].id).unwrap();

        assert!(!scan.can_confirm());
        assert!(matches!(scan.confirm().await, Err(InventoryError::EmptyReview)));
        assert_eq!(scan.state(), ScanState::Reviewing);
    }

    // ---- merge ----

    #[tokio::test]
    async fn test_confirm_merges_in_one_batch() {
        let inventory = inventory_with(&["Milk"]).await;
        let mut rx = inventory.subscribe();

        let scan = pipeline(
            inventory.clone(),
            FixedPhotos::granted(),
            ScriptedRecognizer::new().ok(&["eggs", "saffron"]),
        );
        let candidates = review_of(scan.scan().await.unwrap());
        let merged = scan.confirm().await.unwrap();

        assert_eq!(scan.state(), ScanState::Idle);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "eggs");
        assert_eq!(merged[0].image, "https://img/eggs");
        assert_eq!(merged[1].image, culina_core::types::PLACEHOLDER_IMAGE_URL);
        for (item, candidate) in merged.iter().zip(&candidates) {
            assert_eq!(item.category, Category::Pantry);
            assert!(item.amount.is_empty());
            assert!(item.expiration_date.is_empty());
            assert_ne!(item.id, candidate.id);
        }

        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(&snapshot[1..], merged.as_slice());
    }

    #[tokio::test]
    async fn test_confirm_uses_configured_category() {
        let inventory = inventory_with(&[]).await;
        let scan = pipeline(
            inventory.clone(),
            FixedPhotos::granted(),
            ScriptedRecognizer::new().ok(&["peas"]),
        )
        .with_default_category(Category::Freezer);
        scan.scan().await.unwrap();
        let merged = scan.confirm().await.unwrap();
        assert_eq!(merged[0].category, Category::Freezer);
    }

    // ---- interruption ----

    struct HangingRecognizer;

    #[async_trait]
    impl IngredientRecognizer for HangingRecognizer {
        async fn recognize(&self, _photo: &CapturedPhoto) -> Result<Vec<String>, CulinaError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_dropped_scan_resets_to_idle() {
        let scan = ScanPipeline::new(
            inventory_with(&[]).await,
            Arc::new(FixedPhotos::granted()),
            Arc::new(HangingRecognizer),
            Arc::new(StaticImages::new()),
        );

        tokio::select! {
            biased;
            _ = scan.scan() => panic!("recognizer never answers"),
            _ = tokio::task::yield_now() => {}
        }

        assert_eq!(scan.state(), ScanState::Idle);
    }

    /// Image search that waits until a permit is released.
    struct GatedImages(Arc<tokio::sync::Semaphore>);

    #[async_trait]
    impl ImageSearch for GatedImages {
        async fn image_for(&self, query: &str) -> String {
            let _permit = self.0.acquire().await;
            format!("https://img/{}", query)
        }
    }

    #[tokio::test]
    async fn test_dropped_confirm_still_merges() {
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let inventory = inventory_with(&[]).await;
        let scan = ScanPipeline::new(
            Arc::clone(&inventory),
            Arc::new(FixedPhotos::granted()),
            Arc::new(ScriptedRecognizer::new().ok(&["eggs", "tofu"])),
            Arc::new(GatedImages(Arc::clone(&gate))),
        );
        scan.scan().await.unwrap();

        tokio::select! {
            biased;
            _ = scan.confirm() => panic!("pictures are still gated"),
            _ = tokio::task::yield_now() => {}
        }
        assert_eq!(scan.state(), ScanState::Merging);
        assert!(inventory.is_empty());

        gate.add_permits(1);
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while scan.state() != ScanState::Idle {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let merged: Vec<_> = inventory.snapshot().iter().map(|i| i.image.clone()).collect();
        assert_eq!(merged, vec!["https://img/eggs", "https://img/tofu"]);
        assert_eq!(scan.state(), ScanState::Idle);
    }
}
