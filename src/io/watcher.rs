use std::path::Path;
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::io::store::{CONFIG_FILE, LIST_FILE};

/// Events sent from the watcher to the TUI event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    /// `list.json` was written by someone
    ListChanged,
    ConfigChanged,
}

/// Watches the grocery/ directory for edits made outside this process
/// (another `gl` command, a text editor).
pub struct ListWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<ListEvent>,
}

impl ListWatcher {
    pub fn start(grocery_dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        // Some backends report canonical paths
        let dir = grocery_dir
            .canonicalize()
            .unwrap_or_else(|_| grocery_dir.to_path_buf());

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }
                for path in event.paths {
                    if let Some(evt) = classify(&dir, &path) {
                        let _ = tx.send(evt);
                    }
                }
            },
            Config::default(),
        )?;

        watcher.watch(grocery_dir, RecursiveMode::NonRecursive)?;
        Ok(ListWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Drain pending events, collapsing duplicates.
    pub fn poll(&self) -> Vec<ListEvent> {
        let mut events: Vec<ListEvent> = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            if !events.contains(&evt) {
                events.push(evt);
            }
        }
        events
    }
}

/// Atomic writes rename a temp file onto `list.json`, so only the final
/// name matters; the lock file and temp files are ignored.
fn classify(dir: &Path, path: &Path) -> Option<ListEvent> {
    if path.parent() != Some(dir) {
        return None;
    }
    match path.file_name().and_then(|n| n.to_str()) {
        Some(LIST_FILE) => Some(ListEvent::ListChanged),
        Some(CONFIG_FILE) => Some(ListEvent::ConfigChanged),
        _ => None,
    }
}
