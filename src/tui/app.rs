use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::cli::handlers::start_dir;
use crate::io::config_io::read_config;
use crate::io::log::{LogTarget, init_logging};
use crate::io::store::{FileStore, discover_root};
use crate::io::sync::{BackgroundSync, SyncAdapter, SyncReport};
use crate::io::watcher::{ListEvent, ListWatcher};
use crate::model::{Droppable, GroceryList, ItemId, ListConfig, Point, PointerGeometry, Rect};
use crate::ops::drag::DragPhase;
use crate::ops::engine::ReorderEngine;

use super::input;
use super::render;
use super::theme::Theme;

/// Pointer bookkeeping for the drag in progress
#[derive(Debug, Clone, Copy)]
pub struct PointerDrag {
    /// Where the element was grabbed
    pub grab: Point,
    /// Rect of the element when it was grabbed
    pub origin: Rect,
    pub last_row: u16,
}

/// Main application state
pub struct App {
    pub engine: ReorderEngine,
    pub sync: BackgroundSync,
    pub theme: Theme,
    pub show_positions: bool,
    pub should_quit: bool,
    /// One-line message for the status row, cleared on the next drag
    pub status: Option<String>,
    /// Droppable regions recorded by the last render
    pub droppables: Vec<Droppable>,
    /// Screen row of each rendered item
    pub rows: Vec<(u16, ItemId)>,
    pub pointer: Option<Point>,
    pub drag: Option<PointerDrag>,
    /// A fresh list that arrived mid-drag, applied once the drag is over
    pending: Option<GroceryList>,
}

impl App {
    pub fn new(engine: ReorderEngine, sync: BackgroundSync, config: &ListConfig) -> Self {
        App {
            engine,
            sync,
            theme: Theme::from_config(&config.ui),
            show_positions: config.ui.show_positions,
            should_quit: false,
            status: None,
            droppables: Vec::new(),
            rows: Vec::new(),
            pointer: None,
            drag: None,
            pending: None,
        }
    }

    pub fn apply_config(&mut self, config: &ListConfig) {
        self.theme = Theme::from_config(&config.ui);
        self.show_positions = config.ui.show_positions;
    }

    /// Called by the renderer with the layout it just drew.
    pub fn record_layout(&mut self, droppables: Vec<Droppable>, rows: Vec<(u16, ItemId)>) {
        self.droppables = droppables;
        self.rows = rows;
    }

    pub fn item_at_row(&self, row: u16) -> Option<ItemId> {
        self.rows.iter().find(|(r, _)| *r == row).map(|(_, id)| *id)
    }

    /// Geometry for the engine: the pointer, the grabbed rect moved along
    /// with it, and the rects from the last render.
    pub fn geometry(&self) -> PointerGeometry {
        let active_rect = match (self.drag, self.pointer) {
            (Some(drag), Some(p)) => Some(drag.origin.translate(p.x - drag.grab.x, p.y - drag.grab.y)),
            (Some(drag), None) => Some(drag.origin),
            _ => None,
        };
        PointerGeometry {
            pointer: self.pointer,
            active_rect,
            droppables: self.droppables.clone(),
        }
    }

    pub fn request_refresh(&mut self) {
        if let Err(e) = self.sync.request_refresh() {
            tracing::warn!(error = %e, "could not request refresh");
            self.status = Some(e.to_string());
        }
    }

    /// Feed finished background jobs into the engine.
    pub fn poll_sync(&mut self) {
        for report in self.sync.poll() {
            match report {
                SyncReport::Refreshed(list) => self.pending = Some(list),
                SyncReport::Failed(e) => {
                    self.engine.report_sync_failure(&e);
                    self.status = Some(format!("save failed: {}", e));
                    self.request_refresh();
                }
            }
        }
        self.apply_pending();
    }

    /// Apply a stashed refresh unless a drag is in progress.
    pub fn apply_pending(&mut self) {
        if self.engine.phase() != DragPhase::Idle {
            return;
        }
        if let Some(list) = self.pending.take()
            && let Err(e) = self.engine.refresh(list)
        {
            tracing::warn!(error = %e, "refresh rejected");
            self.status = Some(e.to_string());
        }
    }
}

pub fn run(dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let start = start_dir(dir)?;
    let root = discover_root(&start)?;
    let store = FileStore::open(&root)?;
    let config = read_config(store.dir())?;
    init_logging(&config.log, LogTarget::File(store.dir()));
    tracing::info!(root = %root.display(), "starting tui");

    let watcher = match ListWatcher::start(store.dir()) {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "file watcher unavailable");
            None
        }
    };
    let grocery_dir = store.dir().to_path_buf();
    let mut sync = BackgroundSync::spawn(store);
    let engine = ReorderEngine::new(sync.fetch_all()?)?;
    let mut app = App::new(engine, sync, &config);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Restore the terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref(), &grocery_dir);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&ListWatcher>,
    grocery_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key(app, key),
                Event::Mouse(mouse) => input::handle_mouse(app, mouse),
                _ => {}
            }
        }

        app.poll_sync();
        for evt in watcher.map(|w| w.poll()).unwrap_or_default() {
            match evt {
                ListEvent::ListChanged => app.request_refresh(),
                ListEvent::ConfigChanged => match read_config(grocery_dir) {
                    Ok(config) => app.apply_config(&config),
                    Err(e) => app.status = Some(e.to_string()),
                },
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
