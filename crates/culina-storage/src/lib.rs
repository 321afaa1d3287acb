//! Culina storage crate - SQLite-backed key-value persistence.
//!
//! Provides a WAL-mode SQLite database with migrations, the
//! `KeyValueStore` seam used by the inventory, and the preferences wrapper.

pub mod db;
pub mod kv;
pub mod migrations;
pub mod preferences;

pub use db::Database;
pub use kv::{KeyValueStore, MemoryStore, SqliteStore, INVENTORY_KEY, PREFERENCES_KEY};
pub use preferences::Preferences;
