use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::NamedTempFile;

use crate::io::lock::{ListLock, LockError};
use crate::io::sync::{SyncAdapter, SyncError};
use crate::model::{
    Category, CategoryId, DEFAULT_CATEGORY_ID, Entry, EntryId, GroceryList,
};

pub const GROCERY_DIR: &str = "grocery";
pub const LIST_FILE: &str = "list.json";
pub const CONFIG_FILE: &str = "config.toml";

const CONFIG_TEMPLATE: &str = "\
[log]
filter = \"info\"
file = \"gl.log\"

[ui]
show_positions = false
";

/// Error type for list storage
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not a grocery list: no grocery/list.json found")]
    NotAList,
    #[error("grocery list already exists at {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize list: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("entry not found: {0}")]
    UnknownEntry(EntryId),
    #[error("category not found: {0}")]
    UnknownCategory(CategoryId),
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Walk up from `start` looking for a directory holding `grocery/list.json`.
pub fn discover_root(start: &Path) -> Result<PathBuf, StoreError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(GROCERY_DIR).join(LIST_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(StoreError::NotAList);
        }
    }
}

/// Write `content` to a temp file beside `path`, then rename over it.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// The authoritative list in `grocery/list.json`.
///
/// Reorders close the gap behind the moved item and open a slot where it
/// lands, so positions stay dense (`0..n`) as long as every write goes
/// through here.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    dir: PathBuf,
}

impl FileStore {
    /// Open the list under `root` (the directory containing `grocery/`).
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        let dir = root.join(GROCERY_DIR);
        if !dir.join(LIST_FILE).is_file() {
            return Err(StoreError::NotAList);
        }
        Ok(FileStore {
            root: root.to_path_buf(),
            dir,
        })
    }

    /// Create `grocery/` under `root`, seeded with the default category.
    pub fn init(root: &Path, force: bool) -> Result<Self, StoreError> {
        let dir = root.join(GROCERY_DIR);
        let list_path = dir.join(LIST_FILE);
        if list_path.exists() && !force {
            return Err(StoreError::AlreadyExists(list_path));
        }
        fs::create_dir_all(&dir).map_err(|source| StoreError::Write {
            path: dir.clone(),
            source,
        })?;

        let store = FileStore {
            root: root.to_path_buf(),
            dir,
        };
        let config_path = store.dir.join(CONFIG_FILE);
        if !config_path.exists() {
            atomic_write(&config_path, CONFIG_TEMPLATE.as_bytes()).map_err(|source| {
                StoreError::Write {
                    path: config_path.clone(),
                    source,
                }
            })?;
        }
        let _lock = ListLock::acquire_default(&store.dir)?;
        store.save(&GroceryList::new(vec![Category::default_category()], Vec::new()))?;
        tracing::info!(path = %list_path.display(), "initialized grocery list");
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `grocery/` directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn list_path(&self) -> PathBuf {
        self.dir.join(LIST_FILE)
    }

    pub fn load(&self) -> Result<GroceryList, StoreError> {
        let path = self.list_path();
        let text = fs::read_to_string(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| StoreError::Parse { path, source })
    }

    /// Write the whole list. Callers hold the lock.
    fn save(&self, list: &GroceryList) -> Result<(), StoreError> {
        let path = self.list_path();
        let mut json = serde_json::to_string_pretty(list)?;
        json.push('\n');
        atomic_write(&path, json.as_bytes()).map_err(|source| StoreError::Write { path, source })
    }

    /// Load, apply `f`, save, all under the list lock.
    fn modify<T>(
        &self,
        f: impl FnOnce(&mut GroceryList) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _lock = ListLock::acquire_default(&self.dir)?;
        let mut list = self.load()?;
        let result = f(&mut list)?;
        self.save(&list)?;
        Ok(result)
    }

    pub fn add_category(&self, name: &str) -> Result<Category, StoreError> {
        self.modify(|list| {
            let id = list.categories.iter().map(|c| c.id).max().unwrap_or(0) + 1;
            let position = list.categories.len() as i64;
            let category = Category::new(id, name, position);
            list.categories.push(category.clone());
            tracing::info!(id, name, "added category");
            Ok(category)
        })
    }

    /// Append an entry to `category_id` (the default category when `None`).
    pub fn add_entry(
        &self,
        description: &str,
        category_id: Option<CategoryId>,
        quantity: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Entry, StoreError> {
        let category_id = category_id.unwrap_or(DEFAULT_CATEGORY_ID);
        self.modify(|list| {
            if list.category(category_id).is_none() {
                return Err(StoreError::UnknownCategory(category_id));
            }
            let id = list.entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
            let position = list
                .entries
                .iter()
                .filter(|e| e.category_id == category_id)
                .count() as i64;
            let mut entry = Entry::new(id, description, category_id, position);
            entry.quantity = quantity.unwrap_or_default().to_string();
            entry.notes = notes.unwrap_or_default().to_string();
            list.entries.push(entry.clone());
            tracing::info!(id, category = category_id, "added entry");
            Ok(entry)
        })
    }

    pub fn move_entry(
        &self,
        id: EntryId,
        new_position: Option<i64>,
        new_category_id: Option<CategoryId>,
    ) -> Result<Entry, StoreError> {
        self.modify(|list| reorder_entry(list, id, new_position, new_category_id))
    }

    pub fn move_category(&self, id: CategoryId, new_position: i64) -> Result<Category, StoreError> {
        self.modify(|list| reorder_category(list, id, new_position))
    }
}

impl SyncAdapter for FileStore {
    fn fetch_all(&mut self) -> Result<GroceryList, SyncError> {
        Ok(self.load()?)
    }

    fn persist_entry_move(
        &mut self,
        id: EntryId,
        new_position: Option<i64>,
        new_category_id: Option<CategoryId>,
    ) -> Result<(), SyncError> {
        self.move_entry(id, new_position, new_category_id)?;
        Ok(())
    }

    fn persist_category_move(
        &mut self,
        id: CategoryId,
        new_position: i64,
    ) -> Result<(), SyncError> {
        self.move_category(id, new_position)?;
        Ok(())
    }
}

/// Move an entry, closing the gap it leaves and opening one where it lands.
/// A missing position keeps the current one within the same category and
/// goes to the front when the category changes.
pub fn reorder_entry(
    list: &mut GroceryList,
    id: EntryId,
    new_position: Option<i64>,
    new_category_id: Option<CategoryId>,
) -> Result<Entry, StoreError> {
    let (prior_category, prior_position) = list
        .entry(id)
        .map(|e| (e.category_id, e.position))
        .ok_or(StoreError::UnknownEntry(id))?;
    let category = new_category_id.unwrap_or(prior_category);
    if list.category(category).is_none() {
        return Err(StoreError::UnknownCategory(category));
    }

    for e in list.entries.iter_mut() {
        if e.id != id && e.category_id == prior_category && e.position > prior_position {
            e.position -= 1;
        }
    }

    let siblings = list
        .entries
        .iter()
        .filter(|e| e.id != id && e.category_id == category)
        .count() as i64;
    let requested = match new_position {
        Some(p) => p,
        None if category == prior_category => prior_position,
        None => 0,
    };
    let position = requested.clamp(0, siblings);

    for e in list.entries.iter_mut() {
        if e.id != id && e.category_id == category && e.position >= position {
            e.position += 1;
        }
    }

    let entry = list
        .entries
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or(StoreError::UnknownEntry(id))?;
    entry.category_id = category;
    entry.position = position;
    entry.updated_at = Utc::now();
    tracing::debug!(id, category, position, "moved entry");
    Ok(entry.clone())
}

/// Move a category among the categories with the same shift semantics.
pub fn reorder_category(
    list: &mut GroceryList,
    id: CategoryId,
    new_position: i64,
) -> Result<Category, StoreError> {
    let prior_position = list
        .category(id)
        .map(|c| c.position)
        .ok_or(StoreError::UnknownCategory(id))?;

    for c in list.categories.iter_mut() {
        if c.id != id && c.position > prior_position {
            c.position -= 1;
        }
    }
    let position = new_position.clamp(0, list.categories.len() as i64 - 1);
    for c in list.categories.iter_mut() {
        if c.id != id && c.position >= position {
            c.position += 1;
        }
    }

    let category = list
        .categories
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or(StoreError::UnknownCategory(id))?;
    category.position = position;
    category.updated_at = Utc::now();
    tracing::debug!(id, position, "moved category");
    Ok(category.clone())
}
