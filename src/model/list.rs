use serde::{Deserialize, Serialize};

use super::category::Category;
use super::entry::Entry;
use super::ids::{CategoryId, EntryId};

/// The authoritative categories and entries, as returned by a full fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroceryList {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl GroceryList {
    pub fn new(categories: Vec<Category>, entries: Vec<Entry>) -> Self {
        GroceryList {
            categories,
            entries,
        }
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Categories in display order
    pub fn sorted_categories(&self) -> Vec<&Category> {
        let mut cats: Vec<&Category> = self.categories.iter().collect();
        cats.sort_by_key(|c| c.sort_key());
        cats
    }

    /// Entries of one category in display order
    pub fn entries_in(&self, category_id: CategoryId) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|e| e.category_id == category_id)
            .collect();
        entries.sort_by_key(|e| e.sort_key());
        entries
    }

    /// Entries whose category does not exist
    pub fn orphans(&self) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| self.category(e.category_id).is_none())
            .collect()
    }
}
