//! Composition root: one handle per stateful component.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use culina_chat::ChatSession;
use culina_client::ApiClient;
use culina_core::config::CulinaConfig;
use culina_core::error::Result;
use culina_inventory::{InventoryStore, PhotoSource, ScanPipeline};
use culina_storage::{Database, KeyValueStore, Preferences, SqliteStore};

/// Everything a command needs, built once from the config.
pub struct App {
    pub config: CulinaConfig,
    pub inventory: Arc<InventoryStore>,
    pub preferences: Preferences,
    pub api: Arc<ApiClient>,
}

impl App {
    /// Open the local database and load the inventory.
    ///
    /// `data_dir` overrides `general.data_dir` when given.
    pub async fn open(config: CulinaConfig, data_dir: Option<&str>) -> Result<Self> {
        let data_dir = expand_home(data_dir.unwrap_or(&config.general.data_dir));
        let db_path = data_dir.join(&config.storage.database_file);
        let db = Arc::new(Database::new(&db_path)?);
        info!(path = %db_path.display(), "SQLite database opened");

        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new(db));
        let inventory = Arc::new(InventoryStore::load(Arc::clone(&store)).await);
        let preferences = Preferences::new(store);
        let api = Arc::new(ApiClient::new(&config.api)?);

        Ok(Self {
            config,
            inventory,
            preferences,
            api,
        })
    }

    /// A scan pipeline reading photos from `photos`.
    pub fn scan_pipeline(&self, photos: Arc<dyn PhotoSource>) -> ScanPipeline {
        ScanPipeline::new(
            Arc::clone(&self.inventory),
            photos,
            self.api.clone(),
            self.api.clone(),
        )
        .with_default_category(self.config.scan.default_category)
    }

    /// A fresh conversation that sees the live inventory.
    pub fn chat_session(&self) -> ChatSession {
        ChatSession::new(self.api.clone(), self.inventory.subscribe())
            .with_max_message_length(self.config.chat.max_message_length)
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        return Path::new(&home).join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        assert_eq!(expand_home("/var/lib/culina"), PathBuf::from("/var/lib/culina"));
        assert_eq!(expand_home("data"), PathBuf::from("data"));
    }

    #[test]
    fn test_expand_home_uses_home_dir() {
        let expanded = expand_home("~/.culina/data");
        assert!(expanded.ends_with(".culina/data"));
        assert!(!expanded.starts_with("~"));
    }

    #[tokio::test]
    async fn test_open_creates_database_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested");
        let app = App::open(CulinaConfig::default(), data_dir.to_str()).await.unwrap();

        assert!(app.inventory.is_empty());
        assert!(data_dir.join("culina.db").exists());
    }
}
