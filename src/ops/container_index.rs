use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{CategoryId, ContainerId, EntryId, GroceryList, ItemId};

/// Error type for container index operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("entry {entry} references missing category {category}")]
    OrphanEntry { entry: EntryId, category: CategoryId },
    #[error("container not found: {0}")]
    UnknownContainer(ContainerId),
    #[error("{item} is not in {container}")]
    NotInContainer { item: ItemId, container: ContainerId },
    #[error("index out of sync with list: {0}")]
    OutOfSync(String),
}

/// Ordered mapping from container to its ordered member ids.
///
/// `Categories` is always the first key and holds every category; each
/// category then owns one container with its entries. Between drags this is
/// derived from the list by [`ContainerIndex::rebuild`]; during a drag it is
/// mutated in place as a visual preview only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ContainerIndex {
    containers: IndexMap<ContainerId, Vec<ItemId>>,
}

impl ContainerIndex {
    /// Derive the index from the authoritative list.
    pub fn rebuild(list: &GroceryList) -> Result<Self, IndexError> {
        if let Some(orphan) = list.orphans().first() {
            return Err(IndexError::OrphanEntry {
                entry: orphan.id,
                category: orphan.category_id,
            });
        }

        let categories = list.sorted_categories();
        let mut containers = IndexMap::with_capacity(categories.len() + 1);
        containers.insert(
            ContainerId::Categories,
            categories.iter().map(|c| ItemId::Category(c.id)).collect(),
        );
        for category in categories {
            let members = list
                .entries_in(category.id)
                .iter()
                .map(|e| ItemId::Entry(e.id))
                .collect();
            containers.insert(ContainerId::Category(category.id), members);
        }
        Ok(ContainerIndex { containers })
    }

    pub fn members(&self, container: ContainerId) -> &[ItemId] {
        self.containers
            .get(&container)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_container(&self, container: ContainerId) -> bool {
        self.containers.contains_key(&container)
    }

    /// Containers in display order, top-level first
    pub fn iter(&self) -> impl Iterator<Item = (ContainerId, &[ItemId])> {
        self.containers.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Entry containers in the order the category list currently shows them
    pub fn entry_containers(&self) -> Vec<(ContainerId, &[ItemId])> {
        self.members(ContainerId::Categories)
            .iter()
            .filter_map(|item| item.entries_container())
            .map(|c| (c, self.members(c)))
            .collect()
    }

    /// The container this item is a member of
    pub fn container_of(&self, item: ItemId) -> Option<ContainerId> {
        match item {
            ItemId::Category(_) => self
                .members(ContainerId::Categories)
                .contains(&item)
                .then_some(ContainerId::Categories),
            ItemId::Entry(_) => self
                .containers
                .iter()
                .find(|(k, v)| **k != ContainerId::Categories && v.contains(&item))
                .map(|(k, _)| *k),
        }
    }

    pub fn index_of(&self, container: ContainerId, item: ItemId) -> Option<usize> {
        self.members(container).iter().position(|m| *m == item)
    }

    /// Remove `item` from `from` and insert it into `to` at `to_index`
    /// (clamped to the end). Preview only: indices here are not sort keys.
    pub fn move_within_or_across(
        &mut self,
        item: ItemId,
        from: ContainerId,
        to: ContainerId,
        to_index: usize,
    ) -> Result<(), IndexError> {
        if !self.has_container(to) {
            return Err(IndexError::UnknownContainer(to));
        }
        let source = self
            .containers
            .get_mut(&from)
            .ok_or(IndexError::UnknownContainer(from))?;
        let at = source
            .iter()
            .position(|m| *m == item)
            .ok_or(IndexError::NotInContainer {
                item,
                container: from,
            })?;
        source.remove(at);

        let target = self
            .containers
            .get_mut(&to)
            .ok_or(IndexError::UnknownContainer(to))?;
        let to_index = to_index.min(target.len());
        target.insert(to_index, item);
        Ok(())
    }

    /// Move the member at `from` to `to` within one container.
    pub fn array_move(
        &mut self,
        container: ContainerId,
        from: usize,
        to: usize,
    ) -> Result<(), IndexError> {
        let members = self
            .containers
            .get_mut(&container)
            .ok_or(IndexError::UnknownContainer(container))?;
        if from >= members.len() {
            return Err(IndexError::OutOfSync(format!(
                "index {} out of range for {}",
                from, container
            )));
        }
        let item = members.remove(from);
        let to = to.min(members.len());
        members.insert(to, item);
        Ok(())
    }

    /// Verify that every entry and category of `list` appears exactly once
    /// in the right kind of container, and that nothing else does.
    pub fn check_against(&self, list: &GroceryList) -> Result<(), IndexError> {
        let top = self.members(ContainerId::Categories);
        if top.len() != list.categories.len() {
            return Err(IndexError::OutOfSync(format!(
                "{} categories indexed, {} in list",
                top.len(),
                list.categories.len()
            )));
        }
        for category in &list.categories {
            let item = ItemId::Category(category.id);
            if top.iter().filter(|m| **m == item).count() != 1 {
                return Err(IndexError::OutOfSync(format!("{} not indexed once", item)));
            }
            if !self.has_container(ContainerId::Category(category.id)) {
                return Err(IndexError::UnknownContainer(ContainerId::Category(
                    category.id,
                )));
            }
        }

        let mut indexed_entries = 0;
        for (container, members) in self.iter() {
            if container == ContainerId::Categories {
                continue;
            }
            for member in members {
                let Some(id) = member.as_entry() else {
                    return Err(IndexError::OutOfSync(format!(
                        "{} inside {}",
                        member, container
                    )));
                };
                if list.entry(id).is_none() {
                    return Err(IndexError::OutOfSync(format!("{} not in list", member)));
                }
                indexed_entries += 1;
            }
        }
        if indexed_entries != list.entries.len() {
            return Err(IndexError::OutOfSync(format!(
                "{} entries indexed, {} in list",
                indexed_entries,
                list.entries.len()
            )));
        }
        for entry in &list.entries {
            let item = ItemId::Entry(entry.id);
            let count: usize = self
                .iter()
                .map(|(_, members)| members.iter().filter(|m| **m == item).count())
                .sum();
            if count != 1 {
                return Err(IndexError::OutOfSync(format!(
                    "{} indexed {} times",
                    item, count
                )));
            }
        }
        Ok(())
    }
}
