//! Canonical inventory list.
//!
//! `InventoryStore` owns the list and the active category filter. Every
//! mutation builds a new vector and publishes it whole through a `watch`
//! channel, so observers only ever see complete snapshots. After each
//! published change the latest snapshot is written to the key-value store on
//! a best-effort basis.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use culina_core::types::{normalize, Category, CategoryFilter, InventoryItem};
use culina_storage::{KeyValueStore, INVENTORY_KEY};

use crate::enrich::enrich_images;
use crate::error::InventoryError;
use crate::services::ImageSearch;

/// Shared, immutable view of the inventory at one point in time.
pub type Snapshot = Arc<Vec<InventoryItem>>;

// =============================================================================
// Pure list transformations
// =============================================================================

/// A fresh, not yet enriched item with a newly minted id.
pub fn new_item(
    name: &str,
    category: Category,
    amount: impl Into<String>,
    expiration_date: impl Into<String>,
) -> InventoryItem {
    InventoryItem::new(name.trim(), category)
        .with_amount(amount)
        .with_expiration_date(expiration_date)
}

/// Append `item`, rejecting an empty name or an id already present.
pub fn with_item_added(
    list: &[InventoryItem],
    item: InventoryItem,
) -> Result<Vec<InventoryItem>, InventoryError> {
    with_items_added(list, vec![item])
}

/// Append a batch of items in order. All-or-nothing.
pub fn with_items_added(
    list: &[InventoryItem],
    items: Vec<InventoryItem>,
) -> Result<Vec<InventoryItem>, InventoryError> {
    let mut ids: HashSet<Uuid> = list.iter().map(|i| i.id).collect();
    for item in &items {
        if item.name.trim().is_empty() {
            return Err(InventoryError::EmptyName);
        }
        if !ids.insert(item.id) {
            return Err(InventoryError::DuplicateId(item.id));
        }
    }
    let mut next = Vec::with_capacity(list.len() + items.len());
    next.extend_from_slice(list);
    next.extend(items);
    Ok(next)
}

/// Replace the item with the same id. `Ok(None)` when no such item exists.
pub fn with_item_updated(
    list: &[InventoryItem],
    item: &InventoryItem,
) -> Result<Option<Vec<InventoryItem>>, InventoryError> {
    if item.name.trim().is_empty() {
        return Err(InventoryError::EmptyName);
    }
    if !list.iter().any(|i| i.id == item.id) {
        return Ok(None);
    }
    Ok(Some(
        list.iter()
            .map(|i| if i.id == item.id { item.clone() } else { i.clone() })
            .collect(),
    ))
}

/// Drop every item whose id is in `ids`.
pub fn without_items(list: &[InventoryItem], ids: &HashSet<Uuid>) -> Vec<InventoryItem> {
    list.iter().filter(|i| !ids.contains(&i.id)).cloned().collect()
}

/// Items visible under `filter`, in their original order.
pub fn filter_by_category(list: &[InventoryItem], filter: CategoryFilter) -> Vec<InventoryItem> {
    match filter {
        CategoryFilter::All => list.to_vec(),
        CategoryFilter::Only(_) => list
            .iter()
            .filter(|i| filter.matches(i.category))
            .cloned()
            .collect(),
    }
}

// =============================================================================
// InventoryStore
// =============================================================================

/// Owner of the canonical inventory list.
///
/// Passed around as `Arc<InventoryStore>`; there is no global instance.
pub struct InventoryStore {
    items: watch::Sender<Snapshot>,
    filter: watch::Sender<CategoryFilter>,
    store: Arc<dyn KeyValueStore>,
    save_lock: Mutex<()>,
}

impl InventoryStore {
    /// Create a store with an empty list, without reading persisted data.
    pub fn empty(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_items(store, Vec::new())
    }

    fn with_items(store: Arc<dyn KeyValueStore>, items: Vec<InventoryItem>) -> Self {
        let (items, _) = watch::channel(Arc::new(items));
        let (filter, _) = watch::channel(CategoryFilter::All);
        Self {
            items,
            filter,
            store,
            save_lock: Mutex::new(()),
        }
    }

    /// Load the persisted list.
    ///
    /// A missing key, a read failure or unparseable data all yield an empty
    /// inventory. Repeated ids keep their first item.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let items = match store.get(INVENTORY_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<InventoryItem>>(&raw) {
                Ok(items) => first_per_id(items),
                Err(e) => {
                    warn!(error = %e, "Persisted inventory is unreadable; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read inventory; starting empty");
                Vec::new()
            }
        };
        info!(count = items.len(), "Inventory loaded");
        Self::with_items(store, items)
    }

    /// Current snapshot of the canonical list.
    pub fn snapshot(&self) -> Snapshot {
        self.items.borrow().clone()
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.items.subscribe()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: Uuid) -> Option<InventoryItem> {
        self.items.borrow().iter().find(|i| i.id == id).cloned()
    }

    /// Whether an item with the same normalized name is already listed.
    pub fn contains_name(&self, name: &str) -> bool {
        let key = normalize(name);
        self.items.borrow().iter().any(|i| i.key() == key)
    }

    // -- Category filter --

    pub fn filter(&self) -> CategoryFilter {
        *self.filter.borrow()
    }

    pub fn set_filter(&self, filter: CategoryFilter) {
        debug!(filter = %filter, "Category filter changed");
        self.filter.send_replace(filter);
    }

    pub fn subscribe_filter(&self) -> watch::Receiver<CategoryFilter> {
        self.filter.subscribe()
    }

    /// The canonical list under the active filter.
    pub fn visible_items(&self) -> Vec<InventoryItem> {
        filter_by_category(&self.snapshot(), self.filter())
    }

    // -- Mutations --

    /// Replace the whole list. Ids must be unique.
    pub async fn set_items(&self, items: Vec<InventoryItem>) -> Result<(), InventoryError> {
        if let Some(dup) = first_duplicate_id(&items) {
            return Err(InventoryError::DuplicateId(dup));
        }
        self.items.send_replace(Arc::new(items));
        self.persist().await;
        Ok(())
    }

    /// Append a new item.
    ///
    /// A name that matches an existing item is allowed but logged.
    pub async fn add_item(&self, item: InventoryItem) -> Result<(), InventoryError> {
        if self.contains_name(&item.name) {
            warn!(name = %item.name, "Adding an ingredient whose name is already listed");
        }
        let id = item.id;
        self.apply(|list| with_item_added(list, item))?;
        debug!(id = %id, "Inventory item added");
        self.persist().await;
        Ok(())
    }

    /// Append a batch of items in one published change.
    pub async fn add_items(&self, items: Vec<InventoryItem>) -> Result<usize, InventoryError> {
        let count = items.len();
        if count == 0 {
            return Ok(0);
        }
        self.apply(|list| with_items_added(list, items))?;
        info!(count, "Inventory items appended");
        self.persist().await;
        Ok(count)
    }

    /// Replace the item with a matching id. Returns `false` if absent.
    pub async fn update_item(&self, item: InventoryItem) -> Result<bool, InventoryError> {
        let mut outcome = Ok(false);
        self.items.send_if_modified(|current| {
            match with_item_updated(current.as_slice(), &item) {
                Ok(Some(next)) => {
                    *current = Arc::new(next);
                    outcome = Ok(true);
                    true
                }
                Ok(None) => false,
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });
        if matches!(outcome, Ok(true)) {
            debug!(id = %item.id, "Inventory item updated");
            self.persist().await;
        }
        outcome
    }

    /// Add the item if its id is new, otherwise replace it.
    pub async fn upsert_item(&self, item: InventoryItem) -> Result<(), InventoryError> {
        if self.get(item.id).is_some() {
            self.update_item(item).await.map(|_| ())
        } else {
            self.add_item(item).await
        }
    }

    /// Remove every item whose id is in `ids`. Returns how many were removed.
    pub async fn remove_items(&self, ids: &HashSet<Uuid>) -> usize {
        let mut removed = 0;
        self.items.send_if_modified(|current| {
            let next = without_items(current.as_slice(), ids);
            removed = current.len() - next.len();
            if removed > 0 {
                *current = Arc::new(next);
                true
            } else {
                false
            }
        });
        if removed > 0 {
            info!(removed, "Inventory items removed");
            self.persist().await;
        }
        removed
    }

    /// Run one enrichment pass over the current snapshot.
    ///
    /// Resolved images are merged by id into whatever list is current when
    /// the pass finishes, and only into items that still lack an image.
    /// Returns how many items were updated.
    pub async fn enrich(&self, search: &dyn ImageSearch) -> usize {
        let snapshot = self.snapshot();
        if !snapshot.iter().any(InventoryItem::needs_image) {
            return 0;
        }

        let enriched = enrich_images(&snapshot, search).await;
        let resolved: HashMap<Uuid, String> = snapshot
            .iter()
            .zip(enriched)
            .filter(|(before, _)| before.needs_image())
            .map(|(_, after)| (after.id, after.image))
            .collect();

        let mut applied = 0;
        self.items.send_if_modified(|current| {
            let next: Vec<InventoryItem> = current
                .iter()
                .map(|item| match resolved.get(&item.id) {
                    Some(image) if item.needs_image() => {
                        applied += 1;
                        item.clone().with_image(image.clone())
                    }
                    _ => item.clone(),
                })
                .collect();
            if applied > 0 {
                *current = Arc::new(next);
                true
            } else {
                false
            }
        });

        if applied > 0 {
            info!(applied, "Inventory images enriched");
            self.persist().await;
        }
        applied
    }

    // -- Internals --

    fn apply<F>(&self, f: F) -> Result<(), InventoryError>
    where
        F: FnOnce(&[InventoryItem]) -> Result<Vec<InventoryItem>, InventoryError>,
    {
        let mut outcome = Ok(());
        self.items.send_if_modified(|current| {
            match f(current.as_slice()) {
                Ok(next) => {
                    *current = Arc::new(next);
                    true
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });
        outcome
    }

    /// Write the latest snapshot. Failures are logged and swallowed.
    async fn persist(&self) {
        let _guard = self.save_lock.lock().await;
        let snapshot = self.snapshot();
        let json = match serde_json::to_string(snapshot.as_ref()) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Failed to serialize inventory");
                return;
            }
        };
        if let Err(e) = self.store.set(INVENTORY_KEY, &json).await {
            error!(error = %e, "Failed to save inventory");
        }
    }
}

fn first_per_id(items: Vec<InventoryItem>) -> Vec<InventoryItem> {
    let total = items.len();
    let mut seen = HashSet::with_capacity(total);
    let kept: Vec<_> = items.into_iter().filter(|i| seen.insert(i.id)).collect();
    if kept.len() < total {
        warn!(dropped = total - kept.len(), "Persisted inventory repeats ids; kept the first of each");
    }
    kept
}

fn first_duplicate_id(list: &[InventoryItem]) -> Option<Uuid> {
    let mut seen = HashSet::with_capacity(list.len());
    list.iter().map(|i| i.id).find(|id| !seen.insert(*id))
}

impl std::fmt::Debug for InventoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryStore")
            .field("items", &self.len())
            .field("filter", &self.filter())
            .finish()
    }
}
