//! CLI argument definitions for the Culina application.
//!
//! Uses `clap` with derive macros. Priority resolution: CLI args > env vars >
//! config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use culina_core::types::{Category, CategoryFilter};

/// Culina: keep track of what's in your kitchen and ask what to cook.
#[derive(Parser, Debug)]
#[command(name = "culina", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding the local database.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// View and edit the ingredient list.
    Inventory {
        #[command(subcommand)]
        action: InventoryAction,
    },
    /// Add ingredients found in a pantry photo.
    Scan {
        /// Photo to recognize.
        photo: PathBuf,
        /// Accept every recognized ingredient without review.
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    /// Talk to the cooking assistant.
    Chat,
    /// Dietary preferences.
    Preferences {
        #[command(subcommand)]
        action: PreferencesAction,
    },
    /// Check that the backend is reachable.
    Ping,
}

#[derive(Subcommand, Debug)]
pub enum InventoryAction {
    /// List ingredients.
    List {
        /// All, Fridge, Freezer or Pantry.
        #[arg(long, default_value = "All")]
        category: CategoryFilter,
    },
    /// Add an ingredient.
    Add {
        name: String,
        #[arg(long, default_value = "Pantry")]
        category: Category,
        #[arg(long)]
        amount: Option<String>,
        /// Free-text expiration date.
        #[arg(long = "expires")]
        expires: Option<String>,
    },
    /// Change an ingredient.
    Edit {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long = "expires")]
        expires: Option<String>,
    },
    /// Remove ingredients by id.
    Remove {
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
    /// Fetch pictures for ingredients that have none.
    Enrich,
}

#[derive(Subcommand, Debug)]
pub enum PreferencesAction {
    Show,
    Set { text: String },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CULINA_CONFIG env var > ~/.culina/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CULINA_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory override, if any.
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log level override, if any.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".culina").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".culina").join("config.toml");
    }
    PathBuf::from("config.toml")
}
