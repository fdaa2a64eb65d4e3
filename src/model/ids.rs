use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type EntryId = i64;
pub type CategoryId = i64;

const ENTRY_PREFIX: &str = "entry-";
const CATEGORY_PREFIX: &str = "category-";
const CATEGORIES_LABEL: &str = "categories";

/// Error returned when a label does not name an item or container
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid label: {0}")]
pub struct LabelError(pub String);

/// A draggable (and droppable) element: an entry row or a whole category.
///
/// Labels are `entry-<id>` and `category-<id>`, so an entry and a category
/// with the same numeric id never share a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ItemId {
    Entry(EntryId),
    Category(CategoryId),
}

impl ItemId {
    pub fn is_category(self) -> bool {
        matches!(self, ItemId::Category(_))
    }

    pub fn as_entry(self) -> Option<EntryId> {
        match self {
            ItemId::Entry(id) => Some(id),
            ItemId::Category(_) => None,
        }
    }

    pub fn as_category(self) -> Option<CategoryId> {
        match self {
            ItemId::Category(id) => Some(id),
            ItemId::Entry(_) => None,
        }
    }

    /// The container holding this category's entries, if this is a category.
    pub fn entries_container(self) -> Option<ContainerId> {
        self.as_category().map(ContainerId::Category)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Entry(id) => write!(f, "{}{}", ENTRY_PREFIX, id),
            ItemId::Category(id) => write!(f, "{}{}", CATEGORY_PREFIX, id),
        }
    }
}

impl FromStr for ItemId {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix(ENTRY_PREFIX) {
            return rest
                .parse()
                .map(ItemId::Entry)
                .map_err(|_| LabelError(s.to_string()));
        }
        if let Some(rest) = s.strip_prefix(CATEGORY_PREFIX) {
            return rest
                .parse()
                .map(ItemId::Category)
                .map_err(|_| LabelError(s.to_string()));
        }
        Err(LabelError(s.to_string()))
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ItemId {
    type Error = LabelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A droppable region holding an ordered sequence of items.
///
/// `Categories` is the top-level category ordering; `Category(id)` holds the
/// entries of that category and shares its label with `ItemId::Category(id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ContainerId {
    Categories,
    Category(CategoryId),
}

impl ContainerId {
    /// The category item this container belongs to (None for the top level).
    pub fn category_item(self) -> Option<ItemId> {
        match self {
            ContainerId::Categories => None,
            ContainerId::Category(id) => Some(ItemId::Category(id)),
        }
    }

    pub fn category_id(self) -> Option<CategoryId> {
        match self {
            ContainerId::Categories => None,
            ContainerId::Category(id) => Some(id),
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerId::Categories => f.write_str(CATEGORIES_LABEL),
            ContainerId::Category(id) => write!(f, "{}{}", CATEGORY_PREFIX, id),
        }
    }
}

impl FromStr for ContainerId {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == CATEGORIES_LABEL {
            return Ok(ContainerId::Categories);
        }
        match s.parse::<ItemId>() {
            Ok(ItemId::Category(id)) => Ok(ContainerId::Category(id)),
            _ => Err(LabelError(s.to_string())),
        }
    }
}

impl From<ContainerId> for String {
    fn from(id: ContainerId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ContainerId {
    type Error = LabelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
