use serde::Serialize;

use crate::model::{Category, CategoryId, Entry, EntryId, GroceryList};

/// Error type for position planning
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("entry not found: {0}")]
    UnknownEntry(EntryId),
    #[error("category not found: {0}")]
    UnknownCategory(CategoryId),
}

/// What the element was dropped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// The slot held by this entry before the drag began
    Entry(EntryId),
    /// The header or background of a category (append to its end)
    Category(CategoryId),
}

/// The element being moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moving<'a> {
    Entry(&'a Entry),
    Category(&'a Category),
}

/// A committed move, ready for the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MoveUpdate {
    Entry {
        id: EntryId,
        #[serde(skip_serializing_if = "Option::is_none")]
        new_position: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        new_category_id: Option<CategoryId>,
    },
    Category {
        id: CategoryId,
        new_position: i64,
    },
}

/// Compute the update for dropping `moving` onto `target`.
///
/// Positions always come from the authoritative list as it was when the
/// drag started, never from indices in the preview.
pub fn plan_move(
    list: &GroceryList,
    moving: Moving<'_>,
    target: DropTarget,
) -> Result<MoveUpdate, PositionError> {
    match moving {
        Moving::Entry(entry) => plan_entry_move(list, entry, target),
        Moving::Category(category) => plan_category_move(list, category, target),
    }
}

fn plan_entry_move(
    list: &GroceryList,
    entry: &Entry,
    target: DropTarget,
) -> Result<MoveUpdate, PositionError> {
    let (new_position, category_id) = match target {
        DropTarget::Entry(occupant_id) => {
            let occupant = list
                .entry(occupant_id)
                .ok_or(PositionError::UnknownEntry(occupant_id))?;
            (occupant.position, occupant.category_id)
        }
        DropTarget::Category(category_id) => {
            if list.category(category_id).is_none() {
                return Err(PositionError::UnknownCategory(category_id));
            }
            (append_position(list, category_id, entry.id), category_id)
        }
    };

    Ok(MoveUpdate::Entry {
        id: entry.id,
        new_position: Some(new_position),
        new_category_id: (category_id != entry.category_id).then_some(category_id),
    })
}

fn plan_category_move(
    list: &GroceryList,
    category: &Category,
    target: DropTarget,
) -> Result<MoveUpdate, PositionError> {
    let new_position = match target {
        DropTarget::Category(target_id) => {
            list.category(target_id)
                .ok_or(PositionError::UnknownCategory(target_id))?
                .position
        }
        DropTarget::Entry(entry_id) => {
            let entry = list
                .entry(entry_id)
                .ok_or(PositionError::UnknownEntry(entry_id))?;
            match list.category(entry.category_id) {
                Some(owner) => owner.position,
                None => {
                    tracing::warn!(
                        category = category.id,
                        entry = entry_id,
                        "category dropped on entry without a category, appending to end"
                    );
                    append_category_position(list, category.id)
                }
            }
        }
    };

    Ok(MoveUpdate::Category {
        id: category.id,
        new_position,
    })
}

/// One past the highest position among the entries of `category_id`,
/// ignoring `moving` itself, or 0 for an empty category.
pub fn append_position(list: &GroceryList, category_id: CategoryId, moving: EntryId) -> i64 {
    list.entries
        .iter()
        .filter(|e| e.category_id == category_id && e.id != moving)
        .map(|e| e.position)
        .max()
        .map_or(0, |max| max + 1)
}

/// One past the highest category position, ignoring `moving` itself.
pub fn append_category_position(list: &GroceryList, moving: CategoryId) -> i64 {
    list.categories
        .iter()
        .filter(|c| c.id != moving)
        .map(|c| c.position)
        .max()
        .map_or(0, |max| max + 1)
}
