use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, EntryId};

/// A single line on the grocery list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub description: String,
    /// Free-text amount, e.g. `2kg` (empty if none)
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub completed: bool,
    /// Ordering key among the entries of `category_id`
    pub position: i64,
    pub category_id: CategoryId,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(
        id: EntryId,
        description: impl Into<String>,
        category_id: CategoryId,
        position: i64,
    ) -> Self {
        Entry {
            id,
            description: description.into(),
            quantity: String::new(),
            notes: String::new(),
            completed: false,
            position,
            category_id,
            updated_at: Utc::now(),
        }
    }

    /// Total-order key among siblings; the id breaks position ties.
    pub fn sort_key(&self) -> (i64, EntryId) {
        (self.position, self.id)
    }
}
