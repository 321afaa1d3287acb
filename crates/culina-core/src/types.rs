use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CulinaError;

/// Image shown for an ingredient when no picture could be found.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/60?text=No+Image";

// =============================================================================
// Enums
// =============================================================================

/// Where an ingredient is kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Fridge,
    Freezer,
    #[default]
    Pantry,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Fridge, Category::Freezer, Category::Pantry];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Fridge => write!(f, "Fridge"),
            Category::Freezer => write!(f, "Freezer"),
            Category::Pantry => write!(f, "Pantry"),
        }
    }
}

impl FromStr for Category {
    type Err = CulinaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fridge" => Ok(Category::Fridge),
            "freezer" => Ok(Category::Freezer),
            "pantry" => Ok(Category::Pantry),
            other => Err(CulinaError::Validation(format!("unknown category: {}", other))),
        }
    }
}

/// Category filter applied to the visible inventory.
///
/// `All` exists only as a filter value, never as an item attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Returns whether an item of `category` passes this filter.
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "All"),
            CategoryFilter::Only(c) => write!(f, "{}", c),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = CulinaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse().map(CategoryFilter::Only)
    }
}

/// Author of a chat turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// A single ingredient in the canonical inventory list.
///
/// `image` is either a URL or the empty string, which marks the item as not
/// yet enriched. Field names serialize in camelCase so that the persisted
/// list and the assistant payload share one shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub category: Category,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub expiration_date: String,
}

impl InventoryItem {
    /// Create an un-enriched item with a freshly minted id.
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            image: String::new(),
            category,
            amount: String::new(),
            expiration_date: String::new(),
        }
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = amount.into();
        self
    }

    pub fn with_expiration_date(mut self, date: impl Into<String>) -> Self {
        self.expiration_date = date.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Whether the item still carries the empty-image sentinel.
    pub fn needs_image(&self) -> bool {
        self.image.is_empty()
    }

    /// Dedup key for this item's name.
    pub fn key(&self) -> NameKey {
        normalize(&self.name)
    }
}

/// Case-folded, trimmed ingredient name used for every duplicate check.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameKey(String);

impl NameKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize an ingredient name into its dedup key.
pub fn normalize(name: &str) -> NameKey {
    NameKey(name.trim().to_lowercase())
}

/// A recognized ingredient awaiting user confirmation. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewCandidate {
    /// Temporary id, never reused for the resulting inventory item.
    pub id: Uuid,
    pub name: String,
}

impl ReviewCandidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// A photo ready to be sent for recognition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedPhoto {
    /// Base64 payload without any data-URL prefix.
    pub base64: String,
    pub mime_type: String,
}

impl CapturedPhoto {
    pub fn new(base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            mime_type: mime_type.into(),
        }
    }

    /// The photo as a `data:` URL.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

// =============================================================================
// Chat
// =============================================================================

/// Wire form of one transcript turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
}
