use serde::Serialize;

use crate::io::sync::{SyncAdapter, SyncError};
use crate::model::{ContainerId, GroceryList, ItemId, PointerGeometry};

use super::collision::{CollisionResolver, is_container_root, target_container};
use super::container_index::{ContainerIndex, IndexError};
use super::drag::{DragError, DragPhase, DragSession, Lifted};
use super::position::{DropTarget, MoveUpdate, plan_move};

/// Error type for engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Drag(#[from] DragError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// What a finished drag amounted to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "update", rename_all = "snake_case")]
pub enum DropOutcome {
    /// Dropped on its own slot; nothing persisted
    NoOp,
    /// No target resolved; the pre-drag preview was restored
    Cancelled,
    /// Persisted and applied to the preview
    Committed(MoveUpdate),
    /// Applied to the preview but the sync adapter refused it
    SyncFailed(MoveUpdate),
    /// The preview no longer matched the list and was rebuilt
    Discarded,
}

impl DropOutcome {
    pub fn update(&self) -> Option<&MoveUpdate> {
        match self {
            DropOutcome::Committed(u) | DropOutcome::SyncFailed(u) => Some(u),
            _ => None,
        }
    }
}

/// Where the active element finally lands, and what that slot means
struct Landing {
    container: ContainerId,
    index: usize,
    target: DropTarget,
}

/// Owns the authoritative list, the optimistic preview and the drag session.
///
/// The UI drives it through `on_drag_start`, `on_drag_over`, `on_drag_end`
/// and `on_drag_cancel`, and renders `preview()` and `lifted()`. Nothing
/// outside the engine mutates ordering.
pub struct ReorderEngine {
    list: GroceryList,
    index: ContainerIndex,
    resolver: CollisionResolver,
    session: Option<DragSession>,
    /// Preview differs from what `list` alone would produce
    optimistic: bool,
    optimistic_before_drag: bool,
    needs_refresh: bool,
}

impl ReorderEngine {
    pub fn new(list: GroceryList) -> Result<Self, EngineError> {
        let index = ContainerIndex::rebuild(&list)?;
        Ok(ReorderEngine {
            list,
            index,
            resolver: CollisionResolver::new(),
            session: None,
            optimistic: false,
            optimistic_before_drag: false,
            needs_refresh: false,
        })
    }

    /// The authoritative list as last fetched
    pub fn list(&self) -> &GroceryList {
        &self.list
    }

    /// Read-only preview for rendering
    pub fn preview(&self) -> &ContainerIndex {
        &self.index
    }

    pub fn lifted(&self) -> Option<&Lifted> {
        self.session.as_ref().map(|s| s.lifted())
    }

    pub fn phase(&self) -> DragPhase {
        self.session
            .as_ref()
            .map_or(DragPhase::Idle, |s| s.phase())
    }

    pub fn is_optimistic(&self) -> bool {
        self.optimistic
    }

    /// Set after a failed persist; cleared by the next refresh
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    pub fn on_drag_start(&mut self, id: ItemId) -> Result<(), EngineError> {
        if let Some(session) = &self.session {
            tracing::warn!(active = %session.active(), requested = %id, "drag start while dragging");
            return Err(DragError::AlreadyDragging(session.active()).into());
        }
        let session = DragSession::start(&self.list, &self.index, id)?;
        tracing::debug!(active = %id, origin = %session.origin(), "drag started");
        self.resolver.reset();
        self.optimistic_before_drag = self.optimistic;
        self.session = Some(session);
        Ok(())
    }

    /// Update the preview for the current pointer geometry.
    ///
    /// Only a change of container mutates the preview; calling this again
    /// with the same geometry leaves it untouched.
    pub fn on_drag_over(&mut self, geometry: &PointerGeometry) -> Result<(), EngineError> {
        let Some(session) = self.session.as_mut() else {
            tracing::warn!("drag over without a drag in progress");
            return Err(DragError::NotDragging.into());
        };
        let active = session.active();
        session.mark_previewing();

        let Some(over) = self.resolver.resolve(geometry, active, &self.index) else {
            return Ok(());
        };
        if active.is_category() {
            // Categories are only reordered on drop
            return Ok(());
        }
        let Some(to) = target_container(over, active, &self.index) else {
            return Ok(());
        };
        let from = self
            .index
            .container_of(active)
            .ok_or(IndexError::OutOfSync(format!("{} lost from preview", active)))?;
        if from == to {
            return Ok(());
        }

        let at = insertion_index(&self.index, geometry, active, over, to);
        self.index.move_within_or_across(active, from, to, at)?;
        tracing::debug!(active = %active, %from, %to, index = at, "previewed move");
        self.resolver.note_moved_to_new_container();
        session.mark_moved_across();
        self.optimistic = true;
        Ok(())
    }

    /// Finish the drag: settle the preview and persist the move.
    pub fn on_drag_end<S>(
        &mut self,
        geometry: &PointerGeometry,
        sync: &mut S,
    ) -> Result<DropOutcome, EngineError>
    where
        S: SyncAdapter + ?Sized,
    {
        let Some(mut session) = self.session.take() else {
            tracing::warn!("drag end without a drag in progress");
            return Err(DragError::NotDragging.into());
        };
        session.mark_committing();
        let active = session.active();
        let over = self.resolver.resolve(geometry, active, &self.index);
        self.resolver.reset();

        let Some(over) = over else {
            tracing::debug!(active = %active, "dropped outside any target");
            self.restore(session);
            return Ok(DropOutcome::Cancelled);
        };

        if let Err(e) = self.index.check_against(&self.list) {
            tracing::warn!(error = %e, "preview out of sync, rebuilding");
            self.discard_preview();
            return Ok(DropOutcome::Discarded);
        }

        let landing = match self.settle(&mut session, geometry, over) {
            Ok(Some(landing)) => landing,
            Ok(None) => {
                tracing::debug!(active = %active, "dropped on its own slot");
                self.restore(session);
                return Ok(DropOutcome::NoOp);
            }
            Err(e) => {
                tracing::warn!(error = %e, active = %active, "could not settle drop, rebuilding");
                self.discard_preview();
                return Ok(DropOutcome::Discarded);
            }
        };

        let update = match plan_move(&self.list, session.lifted().as_moving(), landing.target) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(error = %e, active = %active, "invalid move, rebuilding");
                self.discard_preview();
                return Ok(DropOutcome::Discarded);
            }
        };
        tracing::debug!(
            active = %active,
            container = %landing.container,
            index = landing.index,
            ?update,
            "drop committed"
        );
        self.optimistic = true;

        let persisted = match update {
            MoveUpdate::Entry {
                id,
                new_position,
                new_category_id,
            } => sync.persist_entry_move(id, new_position, new_category_id),
            MoveUpdate::Category { id, new_position } => {
                sync.persist_category_move(id, new_position)
            }
        };
        match persisted {
            Ok(()) => Ok(DropOutcome::Committed(update)),
            Err(e) => {
                self.report_sync_failure(&e);
                Ok(DropOutcome::SyncFailed(update))
            }
        }
    }

    /// Abort the drag, restoring the preview exactly as it was at start.
    pub fn on_drag_cancel(&mut self) -> Result<(), EngineError> {
        let Some(mut session) = self.session.take() else {
            tracing::warn!("drag cancel without a drag in progress");
            return Err(DragError::NotDragging.into());
        };
        session.mark_cancelled();
        tracing::debug!(active = %session.active(), "drag cancelled");
        self.resolver.reset();
        self.restore(session);
        Ok(())
    }

    /// Replace the authoritative list and discard the preview.
    ///
    /// A drag in progress is cancelled. On error the previous state is kept
    /// and `needs_refresh` stays set.
    pub fn refresh(&mut self, list: GroceryList) -> Result<(), EngineError> {
        let index = ContainerIndex::rebuild(&list)?;
        if let Some(session) = self.session.take() {
            tracing::warn!(active = %session.active(), "refresh during drag, cancelling it");
            self.resolver.reset();
        }
        tracing::debug!(
            categories = list.categories.len(),
            entries = list.entries.len(),
            "authoritative refresh"
        );
        self.list = list;
        self.index = index;
        self.optimistic = false;
        self.needs_refresh = false;
        Ok(())
    }

    pub fn refresh_from<S>(&mut self, sync: &mut S) -> Result<(), EngineError>
    where
        S: SyncAdapter + ?Sized,
    {
        let list = sync.fetch_all()?;
        self.refresh(list)
    }

    /// Record a failed persist. The preview stays until the next refresh.
    pub fn report_sync_failure(&mut self, error: &SyncError) {
        tracing::warn!(error = %error, "persist failed, refresh required");
        self.needs_refresh = true;
    }

    fn restore(&mut self, session: DragSession) {
        self.index = session.into_snapshot();
        self.optimistic = self.optimistic_before_drag;
    }

    fn discard_preview(&mut self) {
        match ContainerIndex::rebuild(&self.list) {
            Ok(index) => {
                self.index = index;
                self.optimistic = false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "list cannot be indexed, refresh required");
                self.needs_refresh = true;
            }
        }
    }

    /// Apply the final reorder to the preview and work out the landing slot.
    /// `None` means the element ends where it started.
    fn settle(
        &mut self,
        session: &mut DragSession,
        geometry: &PointerGeometry,
        over: ItemId,
    ) -> Result<Option<Landing>, IndexError> {
        let active = session.active();
        let current = self
            .index
            .container_of(active)
            .ok_or(IndexError::OutOfSync(format!("{} lost from preview", active)))?;

        if active.is_category() {
            return self.settle_category(session, current, over);
        }

        let container = target_container(over, active, &self.index)
            .ok_or(IndexError::OutOfSync(format!("{} has no container", over)))?;

        if is_container_root(over, active) {
            let end = self.index.members(container).len();
            if current == container {
                let from = self.position_in(container, active)?;
                self.index.array_move(container, from, end)?;
            } else {
                self.index
                    .move_within_or_across(active, current, container, end)?;
            }
            let index = self.position_in(container, active)?;
            if container == session.origin() && index == session.origin_index() {
                return Ok(None);
            }
            let category = container
                .category_id()
                .ok_or(IndexError::UnknownContainer(container))?;
            return Ok(Some(Landing {
                container,
                index,
                target: DropTarget::Category(category),
            }));
        }

        if current != container {
            let at = insertion_index(&self.index, geometry, active, over, container);
            self.index
                .move_within_or_across(active, current, container, at)?;
            session.mark_moved_across();
        } else if over != active {
            let from = self.position_in(container, active)?;
            let to = if session.moved_across() {
                // Already previewed here: land beside `over` by the same
                // midpoint rule the crossing used
                let rest: Vec<ItemId> = self
                    .index
                    .members(container)
                    .iter()
                    .copied()
                    .filter(|m| *m != active)
                    .collect();
                slot_beside(&rest, geometry, over)
            } else {
                // Plain reorder inside one container: take the slot of `over`
                self.position_in(container, over)?
            };
            self.index.array_move(container, from, to)?;
        }

        let index = self.position_in(container, active)?;
        if container == session.origin() && index == session.origin_index() {
            return Ok(None);
        }
        let target = match session.pre_drag_occupant(container, index) {
            Some(ItemId::Entry(occupant)) => DropTarget::Entry(occupant),
            Some(other) => {
                return Err(IndexError::OutOfSync(format!(
                    "{} found in {}",
                    other, container
                )));
            }
            None => DropTarget::Category(
                container
                    .category_id()
                    .ok_or(IndexError::UnknownContainer(container))?,
            ),
        };
        Ok(Some(Landing {
            container,
            index,
            target,
        }))
    }

    fn settle_category(
        &mut self,
        session: &DragSession,
        current: ContainerId,
        over: ItemId,
    ) -> Result<Option<Landing>, IndexError> {
        let active = session.active();
        let (slot, target) = match over {
            ItemId::Category(id) => (over, DropTarget::Category(id)),
            ItemId::Entry(id) => {
                // Stand in for the category that owns the entry
                let owner = self
                    .index
                    .container_of(over)
                    .and_then(|c| c.category_item())
                    .ok_or(IndexError::OutOfSync(format!("{} has no category", over)))?;
                (owner, DropTarget::Entry(id))
            }
        };
        if slot == active {
            return Ok(None);
        }
        let from = self.position_in(current, active)?;
        let to = self.position_in(current, slot)?;
        self.index.array_move(current, from, to)?;
        Ok(Some(Landing {
            container: current,
            index: to,
            target,
        }))
    }

    fn position_in(&self, container: ContainerId, item: ItemId) -> Result<usize, IndexError> {
        self.index
            .index_of(container, item)
            .ok_or(IndexError::NotInContainer { item, container })
    }
}

/// Slot in `to` for the active element: after `over` when the pointer is
/// below its midpoint, before it otherwise, and at the end for a root.
fn insertion_index(
    index: &ContainerIndex,
    geometry: &PointerGeometry,
    active: ItemId,
    over: ItemId,
    to: ContainerId,
) -> usize {
    let members = index.members(to);
    if is_container_root(over, active) {
        return members.len();
    }
    slot_beside(members, geometry, over)
}

fn slot_beside(members: &[ItemId], geometry: &PointerGeometry, over: ItemId) -> usize {
    let Some(at) = members.iter().position(|m| *m == over) else {
        return members.len();
    };
    let probe = geometry
        .pointer
        .or_else(|| geometry.active_rect.map(|r| r.center()));
    let below = match (probe, geometry.rect_of(over)) {
        (Some(p), Some(rect)) => p.y > rect.center().y,
        _ => false,
    };
    if below { at + 1 } else { at }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, CategoryId, Droppable, Entry, EntryId, Point, Rect};

    #[derive(Default)]
    struct Recorder {
        entry_moves: Vec<(EntryId, Option<i64>, Option<CategoryId>)>,
        category_moves: Vec<(CategoryId, i64)>,
        fail: bool,
    }

    impl SyncAdapter for Recorder {
        fn fetch_all(&mut self) -> Result<GroceryList, SyncError> {
            Ok(list())
        }

        fn persist_entry_move(
            &mut self,
            id: EntryId,
            new_position: Option<i64>,
            new_category_id: Option<CategoryId>,
        ) -> Result<(), SyncError> {
            self.entry_moves.push((id, new_position, new_category_id));
            if self.fail {
                return Err(SyncError::Rejected("offline".into()));
            }
            Ok(())
        }

        fn persist_category_move(
            &mut self,
            id: CategoryId,
            new_position: i64,
        ) -> Result<(), SyncError> {
            self.category_moves.push((id, new_position));
            if self.fail {
                return Err(SyncError::Rejected("offline".into()));
            }
            Ok(())
        }
    }

    // category-1 rows 0..3, category-2 rows 3..6, category-3 row 6
    fn list() -> GroceryList {
        GroceryList::new(
            vec![
                Category::new(1, "Produce", 0),
                Category::new(2, "Dairy", 1),
                Category::new(3, "Empty", 2),
            ],
            vec![
                Entry::new(10, "apples", 1, 0),
                Entry::new(11, "kale", 1, 1),
                Entry::new(20, "milk", 2, 0),
                Entry::new(21, "butter", 2, 1),
            ],
        )
    }

    fn geometry(y: f64) -> PointerGeometry {
        PointerGeometry {
            pointer: Some(Point::new(2.0, y)),
            active_rect: Some(Rect::new(0.0, y - 0.5, 10.0, 1.0)),
            droppables: vec![
                Droppable::new(ItemId::Category(1), Rect::new(0.0, 0.0, 10.0, 3.0)),
                Droppable::new(ItemId::Entry(10), Rect::new(0.0, 1.0, 10.0, 1.0)),
                Droppable::new(ItemId::Entry(11), Rect::new(0.0, 2.0, 10.0, 1.0)),
                Droppable::new(ItemId::Category(2), Rect::new(0.0, 3.0, 10.0, 3.0)),
                Droppable::new(ItemId::Entry(20), Rect::new(0.0, 4.0, 10.0, 1.0)),
                Droppable::new(ItemId::Entry(21), Rect::new(0.0, 5.0, 10.0, 1.0)),
                Droppable::new(ItemId::Category(3), Rect::new(0.0, 6.0, 10.0, 1.0)),
            ],
        }
    }

    #[test]
    fn over_moves_across_before_upper_half() {
        let mut engine = ReorderEngine::new(list()).unwrap();
        engine.on_drag_start(ItemId::Entry(10)).unwrap();
        engine.on_drag_over(&geometry(5.2)).unwrap();
        assert_eq!(
            engine.preview().members(ContainerId::Category(2)),
            &[ItemId::Entry(20), ItemId::Entry(10), ItemId::Entry(21)]
        );
        assert_eq!(engine.phase(), DragPhase::Previewing);
        assert!(engine.is_optimistic());
    }

    #[test]
    fn over_moves_across_after_lower_half() {
        let mut engine = ReorderEngine::new(list()).unwrap();
        engine.on_drag_start(ItemId::Entry(10)).unwrap();
        engine.on_drag_over(&geometry(5.8)).unwrap();
        assert_eq!(
            engine.preview().members(ContainerId::Category(2)),
            &[ItemId::Entry(20), ItemId::Entry(21), ItemId::Entry(10)]
        );
    }

    #[test]
    fn over_within_container_does_not_mutate() {
        let mut engine = ReorderEngine::new(list()).unwrap();
        let before = engine.preview().clone();
        engine.on_drag_start(ItemId::Entry(10)).unwrap();
        engine.on_drag_over(&geometry(2.5)).unwrap();
        assert_eq!(engine.preview(), &before);
    }

    #[test]
    fn end_within_container_takes_occupant_position() {
        let mut engine = ReorderEngine::new(list()).unwrap();
        let mut sync = Recorder::default();
        engine.on_drag_start(ItemId::Entry(10)).unwrap();
        let outcome = engine.on_drag_end(&geometry(2.5), &mut sync).unwrap();
        assert_eq!(
            outcome,
            DropOutcome::Committed(MoveUpdate::Entry {
                id: 10,
                new_position: Some(1),
                new_category_id: None
            })
        );
        assert_eq!(
            engine.preview().members(ContainerId::Category(1)),
            &[ItemId::Entry(11), ItemId::Entry(10)]
        );
        assert_eq!(sync.entry_moves, vec![(10, Some(1), None)]);
        assert_eq!(engine.phase(), DragPhase::Idle);
    }

    #[test]
    fn end_on_own_slot_is_noop() {
        let mut engine = ReorderEngine::new(list()).unwrap();
        let mut sync = Recorder::default();
        engine.on_drag_start(ItemId::Entry(11)).unwrap();
        let outcome = engine.on_drag_end(&geometry(2.5), &mut sync).unwrap();
        assert_eq!(outcome, DropOutcome::NoOp);
        assert!(sync.entry_moves.is_empty());
        assert!(!engine.is_optimistic());
    }

    #[test]
    fn end_on_category_header_appends() {
        let mut engine = ReorderEngine::new(list()).unwrap();
        let mut sync = Recorder::default();
        engine.on_drag_start(ItemId::Entry(11)).unwrap();
        let outcome = engine.on_drag_end(&geometry(6.5), &mut sync).unwrap();
        assert_eq!(
            outcome,
            DropOutcome::Committed(MoveUpdate::Entry {
                id: 11,
                new_position: Some(0),
                new_category_id: Some(3)
            })
        );
        assert_eq!(engine.preview().members(ContainerId::Category(3)), &[ItemId::Entry(11)]);
    }

    #[test]
    fn end_on_other_row_after_crossing_lands_there() {
        let mut engine = ReorderEngine::new(list()).unwrap();
        let mut sync = Recorder::default();
        engine.on_drag_start(ItemId::Entry(10)).unwrap();
        engine.on_drag_over(&geometry(4.2)).unwrap();
        assert_eq!(
            engine.preview().members(ContainerId::Category(2)),
            &[ItemId::Entry(10), ItemId::Entry(20), ItemId::Entry(21)]
        );

        // Released on the lower half of butter
        let outcome = engine.on_drag_end(&geometry(5.8), &mut sync).unwrap();
        assert_eq!(
            outcome,
            DropOutcome::Committed(MoveUpdate::Entry {
                id: 10,
                new_position: Some(2),
                new_category_id: Some(2)
            })
        );
        assert_eq!(
            engine.preview().members(ContainerId::Category(2)),
            &[ItemId::Entry(20), ItemId::Entry(21), ItemId::Entry(10)]
        );
        assert_eq!(sync.entry_moves, vec![(10, Some(2), Some(2))]);
    }

    #[test]
    fn end_with_no_target_cancels() {
        let mut engine = ReorderEngine::new(list()).unwrap();
        let mut sync = Recorder::default();
        let before = engine.preview().clone();
        engine.on_drag_start(ItemId::Entry(10)).unwrap();
        let outcome = engine
            .on_drag_end(&PointerGeometry::default(), &mut sync)
            .unwrap();
        assert_eq!(outcome, DropOutcome::Cancelled);
        assert_eq!(engine.preview(), &before);
    }

    #[test]
    fn category_drop_reorders_categories() {
        let mut engine = ReorderEngine::new(list()).unwrap();
        let mut sync = Recorder::default();
        engine.on_drag_start(ItemId::Category(1)).unwrap();
        let outcome = engine.on_drag_end(&geometry(4.5), &mut sync).unwrap();
        assert_eq!(
            outcome,
            DropOutcome::Committed(MoveUpdate::Category {
                id: 1,
                new_position: 1
            })
        );
        assert_eq!(
            engine.preview().members(ContainerId::Categories),
            &[ItemId::Category(2), ItemId::Category(1), ItemId::Category(3)]
        );
        assert!(sync.entry_moves.is_empty());
    }

    #[test]
    fn sync_failure_flags_refresh() {
        let mut engine = ReorderEngine::new(list()).unwrap();
        let mut sync = Recorder {
            fail: true,
            ..Default::default()
        };
        engine.on_drag_start(ItemId::Entry(10)).unwrap();
        let outcome = engine.on_drag_end(&geometry(2.5), &mut sync).unwrap();
        assert!(matches!(outcome, DropOutcome::SyncFailed(_)));
        assert!(engine.needs_refresh());

        engine.refresh_from(&mut sync).unwrap();
        assert!(!engine.needs_refresh());
        assert!(!engine.is_optimistic());
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        let mut engine = ReorderEngine::new(list()).unwrap();
        let mut sync = Recorder::default();
        assert!(matches!(
            engine.on_drag_over(&geometry(1.5)),
            Err(EngineError::Drag(DragError::NotDragging))
        ));
        assert!(matches!(
            engine.on_drag_end(&geometry(1.5), &mut sync),
            Err(EngineError::Drag(DragError::NotDragging))
        ));
        engine.on_drag_start(ItemId::Entry(10)).unwrap();
        assert!(matches!(
            engine.on_drag_start(ItemId::Entry(11)),
            Err(EngineError::Drag(DragError::AlreadyDragging(_)))
        ));
    }

    #[test]
    fn refresh_mid_drag_cancels_session() {
        let mut engine = ReorderEngine::new(list()).unwrap();
        engine.on_drag_start(ItemId::Entry(10)).unwrap();
        engine.on_drag_over(&geometry(4.2)).unwrap();
        engine.refresh(list()).unwrap();
        assert_eq!(engine.phase(), DragPhase::Idle);
        assert!(engine.lifted().is_none());
        assert_eq!(engine.preview(), &ContainerIndex::rebuild(&list()).unwrap());
    }

    #[test]
    fn stale_preview_is_discarded() {
        let mut engine = ReorderEngine::new(list()).unwrap();
        let mut sync = Recorder::default();
        engine.on_drag_start(ItemId::Entry(10)).unwrap();
        // Simulate the list changing under the preview
        engine.list.entries.push(Entry::new(12, "leeks", 1, 2));
        let outcome = engine.on_drag_end(&geometry(2.5), &mut sync).unwrap();
        assert_eq!(outcome, DropOutcome::Discarded);
        assert!(sync.entry_moves.is_empty());
        engine.preview().check_against(engine.list()).unwrap();
    }
}
