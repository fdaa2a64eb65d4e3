use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::CategoryId;

/// Id of the category every list starts with
pub const DEFAULT_CATEGORY_ID: CategoryId = 1;
pub const DEFAULT_CATEGORY_NAME: &str = "Uncategorized";

/// A named group of entries, ordered among the other categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub position: i64,
    #[serde(default)]
    pub is_default_category: bool,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>, position: i64) -> Self {
        Category {
            id,
            name: name.into(),
            position,
            is_default_category: false,
            updated_at: Utc::now(),
        }
    }

    /// The seeded "Uncategorized" category
    pub fn default_category() -> Self {
        Category {
            is_default_category: true,
            ..Category::new(DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_NAME, 0)
        }
    }

    pub fn sort_key(&self) -> (i64, CategoryId) {
        (self.position, self.id)
    }
}
