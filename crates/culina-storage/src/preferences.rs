//! Free-text dietary preferences.

use std::sync::Arc;

use tracing::{error, warn};

use crate::kv::{KeyValueStore, PREFERENCES_KEY};

/// Load/save wrapper around the preferences key.
///
/// Follows the same best-effort policy as the inventory: read failures
/// look like "no preferences", write failures are logged.
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current preferences text, empty when none were saved.
    pub async fn load(&self) -> String {
        match self.store.get(PREFERENCES_KEY).await {
            Ok(Some(text)) => text,
            Ok(None) => String::new(),
            Err(e) => {
                warn!(error = %e, "Failed to load preferences; treating as empty");
                String::new()
            }
        }
    }

    /// Persist preferences. Returns whether the write succeeded.
    pub async fn save(&self, text: &str) -> bool {
        match self.store.set(PREFERENCES_KEY, text).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to save preferences");
                false
            }
        }
    }
}
