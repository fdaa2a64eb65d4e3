use std::fmt;

use serde::Serialize;

use crate::model::{Category, ContainerId, Entry, GroceryList, ItemId};

use super::container_index::ContainerIndex;
use super::position::Moving;

/// Error type for drag state transitions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragError {
    #[error("a drag is already in progress ({0})")]
    AlreadyDragging(ItemId),
    #[error("no drag in progress")]
    NotDragging,
    #[error("cannot drag {0}: not in the list")]
    UnknownElement(ItemId),
}

/// Lifecycle of one drag gesture.
///
/// `Committing` and `Cancelled` are transient: they are entered inside
/// `end`/`cancel` and left for `Idle` before control returns to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DragPhase {
    Idle,
    Active,
    Previewing,
    Committing,
    Cancelled,
}

impl fmt::Display for DragPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DragPhase::Idle => "idle",
            DragPhase::Active => "active",
            DragPhase::Previewing => "previewing",
            DragPhase::Committing => "committing",
            DragPhase::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Data snapshot of the element being dragged, taken at drag start
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Lifted {
    Entry(Entry),
    Category(Category),
}

impl Lifted {
    pub fn id(&self) -> ItemId {
        match self {
            Lifted::Entry(e) => ItemId::Entry(e.id),
            Lifted::Category(c) => ItemId::Category(c.id),
        }
    }

    pub fn as_moving(&self) -> Moving<'_> {
        match self {
            Lifted::Entry(e) => Moving::Entry(e),
            Lifted::Category(c) => Moving::Category(c),
        }
    }

    /// Short text for overlays and logs
    pub fn label(&self) -> &str {
        match self {
            Lifted::Entry(e) => &e.description,
            Lifted::Category(c) => &c.name,
        }
    }
}

/// State owned by the engine for the duration of one drag
#[derive(Debug, Clone)]
pub struct DragSession {
    lifted: Lifted,
    origin: ContainerId,
    origin_index: usize,
    /// The container index exactly as it was when the drag started
    snapshot: ContainerIndex,
    phase: DragPhase,
    moved_across: bool,
}

impl DragSession {
    /// Lift `id` out of `index`, snapshotting both the element and the index.
    pub fn start(list: &GroceryList, index: &ContainerIndex, id: ItemId) -> Result<Self, DragError> {
        let lifted = match id {
            ItemId::Entry(entry_id) => list.entry(entry_id).cloned().map(Lifted::Entry),
            ItemId::Category(category_id) => {
                list.category(category_id).cloned().map(Lifted::Category)
            }
        }
        .ok_or(DragError::UnknownElement(id))?;

        let origin = index
            .container_of(id)
            .ok_or(DragError::UnknownElement(id))?;
        let origin_index = index
            .index_of(origin, id)
            .ok_or(DragError::UnknownElement(id))?;

        Ok(DragSession {
            lifted,
            origin,
            origin_index,
            snapshot: index.clone(),
            phase: DragPhase::Active,
            moved_across: false,
        })
    }

    pub fn active(&self) -> ItemId {
        self.lifted.id()
    }

    pub fn lifted(&self) -> &Lifted {
        &self.lifted
    }

    pub fn origin(&self) -> ContainerId {
        self.origin
    }

    pub fn origin_index(&self) -> usize {
        self.origin_index
    }

    pub fn snapshot(&self) -> &ContainerIndex {
        &self.snapshot
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn mark_previewing(&mut self) {
        self.phase = DragPhase::Previewing;
    }

    pub fn mark_committing(&mut self) {
        self.phase = DragPhase::Committing;
    }

    pub fn mark_cancelled(&mut self) {
        self.phase = DragPhase::Cancelled;
    }

    /// Whether a preview step has moved the element into another container
    pub fn moved_across(&self) -> bool {
        self.moved_across
    }

    pub fn mark_moved_across(&mut self) {
        self.moved_across = true;
    }

    /// The member that held `(container, index)` before the drag started.
    pub fn pre_drag_occupant(&self, container: ContainerId, index: usize) -> Option<ItemId> {
        self.snapshot.members(container).get(index).copied()
    }

    /// Consume the session, handing back the pre-drag index for restoration.
    pub fn into_snapshot(self) -> ContainerIndex {
        self.snapshot
    }
}
