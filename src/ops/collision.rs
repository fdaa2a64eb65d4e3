use crate::model::{ContainerId, Droppable, ItemId, Point, PointerGeometry, Rect};

use super::container_index::ContainerIndex;

/// Droppables containing `pointer`, nearest center first (smaller area on ties).
pub fn pointer_within<'a, I>(pointer: Point, candidates: I) -> Vec<ItemId>
where
    I: IntoIterator<Item = &'a Droppable>,
{
    let mut hits: Vec<(f64, f64, ItemId)> = candidates
        .into_iter()
        .filter(|d| d.rect.contains(pointer))
        .map(|d| (pointer.distance(d.rect.center()), d.rect.area(), d.id))
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    hits.into_iter().map(|(_, _, id)| id).collect()
}

/// Droppables overlapping `active`, largest overlap ratio first.
pub fn rect_intersection<'a, I>(active: &Rect, candidates: I) -> Vec<ItemId>
where
    I: IntoIterator<Item = &'a Droppable>,
{
    let mut hits: Vec<(f64, ItemId)> = candidates
        .into_iter()
        .map(|d| (active.intersection_ratio(&d.rect), d.id))
        .filter(|(ratio, _)| *ratio > 0.0)
        .collect();
    hits.sort_by(|a, b| b.0.total_cmp(&a.0));
    hits.into_iter().map(|(_, id)| id).collect()
}

/// All candidates, nearest center to `anchor` first.
pub fn closest_center<'a, I>(anchor: Point, candidates: I) -> Vec<ItemId>
where
    I: IntoIterator<Item = &'a Droppable>,
{
    let mut hits: Vec<(f64, ItemId)> = candidates
        .into_iter()
        .map(|d| (anchor.distance(d.rect.center()), d.id))
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0));
    hits.into_iter().map(|(_, id)| id).collect()
}

/// Resolves drag geometry to a target and remembers the last valid one.
///
/// Policy, most specific first:
/// 1. A dragged category only targets categories, closest center wins.
/// 2. Droppables under the pointer win.
/// 3. Otherwise the droppable with the best rect intersection wins.
/// 4. A matched category with entries is narrowed to its closest entry.
/// 5. No match falls back to the last resolved target.
#[derive(Debug, Clone, Default)]
pub struct CollisionResolver {
    last_over: Option<ItemId>,
    recently_moved: bool,
}

impl CollisionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached target returned when geometry resolves to nothing
    pub fn last_over(&self) -> Option<ItemId> {
        self.last_over
    }

    /// Record that the previous preview step moved the active element into a
    /// new container. The layout shift that follows may briefly resolve to
    /// nothing; the active element itself is then the safest target.
    pub fn note_moved_to_new_container(&mut self) {
        self.recently_moved = true;
    }

    /// Drop the cache; called when a drag session ends.
    pub fn reset(&mut self) {
        self.last_over = None;
        self.recently_moved = false;
    }

    pub fn resolve(
        &mut self,
        geometry: &PointerGeometry,
        active: ItemId,
        index: &ContainerIndex,
    ) -> Option<ItemId> {
        let found = if active.is_category() {
            geometry.anchor().and_then(|anchor| {
                closest_center(anchor, geometry.droppables.iter().filter(|d| d.id.is_category()))
                    .first()
                    .copied()
            })
        } else {
            self.first_collision(geometry)
                .map(|over| narrow_to_member(over, geometry, index))
        };

        let moved = std::mem::take(&mut self.recently_moved);
        match found {
            Some(over) => {
                self.last_over = Some(over);
                Some(over)
            }
            None => {
                if moved {
                    self.last_over = Some(active);
                }
                if self.last_over.is_some() {
                    tracing::trace!(fallback = ?self.last_over, "no collision, reusing last target");
                }
                self.last_over
            }
        }
    }

    fn first_collision(&self, geometry: &PointerGeometry) -> Option<ItemId> {
        if let Some(pointer) = geometry.pointer {
            let hits = pointer_within(pointer, &geometry.droppables);
            if let Some(first) = hits.first() {
                return Some(*first);
            }
        }
        let active_rect = geometry.active_rect?;
        rect_intersection(&active_rect, &geometry.droppables)
            .first()
            .copied()
    }
}

/// A category with entries resolves to its closest entry so the drop lands
/// at a specific index rather than the container root.
fn narrow_to_member(over: ItemId, geometry: &PointerGeometry, index: &ContainerIndex) -> ItemId {
    let Some(container) = over.entries_container() else {
        return over;
    };
    let members = index.members(container);
    if members.is_empty() {
        return over;
    }
    let Some(anchor) = geometry.anchor() else {
        return over;
    };
    closest_center(
        anchor,
        geometry
            .droppables
            .iter()
            .filter(|d| d.id != over && members.contains(&d.id)),
    )
    .first()
    .copied()
    .unwrap_or(over)
}

/// Whether `over` names a container root rather than a member slot.
pub fn is_container_root(over: ItemId, active: ItemId) -> bool {
    !active.is_category() && over.is_category()
}

/// The container `over` stands for when the active element lands on it.
pub fn target_container(over: ItemId, active: ItemId, index: &ContainerIndex) -> Option<ContainerId> {
    if is_container_root(over, active) {
        over.entries_container()
            .filter(|container| index.has_container(*container))
    } else {
        index.container_of(over)
    }
}
