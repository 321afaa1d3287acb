use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CulinaError, Result};
use crate::types::Category;

/// Top-level configuration for the Culina client.
///
/// Loaded from `~/.culina/config.toml` by default. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CulinaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl CulinaConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CulinaConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file does not
    /// exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CulinaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the local database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.culina/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Remote backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL serving `/chat`, `/images` and `/ingredients-from-image`.
    pub base_url: String,
    /// Per-request timeout in seconds. 0 disables the timeout.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://culina.onrender.com".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Local persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file name inside `general.data_dir`.
    pub database_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_file: "culina.db".to_string(),
        }
    }
}

/// Photo scan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Category assigned to items merged from a scan.
    pub default_category: Category,
    /// Media type used when the photo's type cannot be inferred.
    pub fallback_mime_type: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            default_category: Category::Pantry,
            fallback_mime_type: "image/jpeg".to_string(),
        }
    }
}

/// Chat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum accepted message length in characters.
    pub max_message_length: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = CulinaConfig::default();
        assert_eq!(config.general.data_dir, "~/.culina/data");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.api.base_url, "https://culina.onrender.com");
        assert_eq!(config.api.timeout_secs, 60);
        assert_eq!(config.storage.database_file, "culina.db");
        assert_eq!(config.scan.default_category, Category::Pantry);
        assert_eq!(config.scan.fallback_mime_type, "image/jpeg");
        assert_eq!(config.chat.max_message_length, 2000);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
data_dir = "/custom/data"
log_level = "debug"

[api]
base_url = "http://192.168.1.127:3000"
timeout_secs = 5

[scan]
default_category = "Fridge"
"#;
        let file = create_temp_config(content);
        let config = CulinaConfig::load(file.path()).unwrap();
        assert_eq!(config.general.data_dir, "/custom/data");
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.api.base_url, "http://192.168.1.127:3000");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.scan.default_category, Category::Fridge);
        // Unspecified fields keep their defaults
        assert_eq!(config.scan.fallback_mime_type, "image/jpeg");
        assert_eq!(config.storage.database_file, "culina.db");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = CulinaConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.data_dir, "~/.culina/data");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        let result = CulinaConfig::load(file.path());
        assert!(matches!(result, Err(CulinaError::Config(_))));
    }

    #[test]
    fn test_load_unknown_category_is_error() {
        let file = create_temp_config("[scan]\ndefault_category = \"Cellar\"\n");
        assert!(CulinaConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = CulinaConfig::default();
        config.api.base_url = "http://localhost:3000".to_string();
        config.save(&path).unwrap();

        assert!(path.exists());
        let reloaded = CulinaConfig::load(&path).unwrap();
        assert_eq!(reloaded.api.base_url, "http://localhost:3000");
        assert_eq!(reloaded.general.log_level, "info");
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = CulinaConfig::load(file.path()).unwrap();
        assert_eq!(config.api.timeout_secs, 60);
        assert_eq!(config.chat.max_message_length, 2000);
    }
}
