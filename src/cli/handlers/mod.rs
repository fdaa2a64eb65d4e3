mod replay;

use std::path::{Path, PathBuf};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::log::{LogTarget, init_logging};
use crate::io::store::{self, FileStore, StoreError};
use crate::model::ListConfig;
use crate::ops::position::{DropTarget, MoveUpdate, Moving, plan_move};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Run a subcommand. `cli.command` must be `Some`; the bare invocation
/// launches the TUI from `main`.
pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let start = start_dir(cli.dir.as_deref())?;
    init_logging(&config_near(&start).log, LogTarget::Stderr);

    let Some(cmd) = cli.command else {
        return Err("no command given (try `gl --help`)".into());
    };
    match cmd {
        Commands::Init(args) => cmd_init(&start, args, json),
        Commands::List => cmd_list(&start, json),
        Commands::AddCategory(args) => cmd_add_category(&start, args, json),
        Commands::Add(args) => cmd_add(&start, args, json),
        Commands::Mv(args) => cmd_mv(&start, args, json),
        Commands::MvCategory(args) => cmd_mv_category(&start, args, json),
        Commands::Replay(args) => replay::cmd_replay(&start, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The directory discovery starts from: `-C <dir>` or the working directory.
pub fn start_dir(dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match dir {
        Some(dir) => Ok(std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

/// Config of the list above `start`, or defaults when there is none yet.
pub fn config_near(start: &Path) -> ListConfig {
    store::discover_root(start)
        .ok()
        .and_then(|root| config_io::read_config(&root.join(store::GROCERY_DIR)).ok())
        .unwrap_or_default()
}

fn open_store(start: &Path) -> Result<FileStore, StoreError> {
    let root = store::discover_root(start)?;
    FileStore::open(&root)
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_init(start: &Path, args: InitArgs, json: bool) -> CmdResult {
    let store = FileStore::init(start, args.force)?;
    if json {
        print_json(&serde_json::json!({ "path": store.list_path() }))
    } else {
        println!("initialized {}", store.list_path().display());
        Ok(())
    }
}

fn cmd_list(start: &Path, json: bool) -> CmdResult {
    let list = open_store(start)?.load()?;
    if json {
        return print_json(&list_to_json(&list));
    }
    for line in format_list(&list) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_add_category(start: &Path, args: AddCategoryArgs, json: bool) -> CmdResult {
    let name = args.name.trim();
    if name.is_empty() {
        return Err("category name cannot be empty".into());
    }
    let category = open_store(start)?.add_category(name)?;
    if json {
        print_json(&category)
    } else {
        println!("{}", category.id);
        Ok(())
    }
}

fn cmd_add(start: &Path, args: AddArgs, json: bool) -> CmdResult {
    let description = args.description.trim();
    if description.is_empty() {
        return Err("description cannot be empty".into());
    }
    let entry = open_store(start)?.add_entry(
        description,
        args.category,
        args.quantity.as_deref(),
        args.note.as_deref(),
    )?;
    if json {
        print_json(&entry_to_json(&entry))
    } else {
        println!("{}", entry.id);
        Ok(())
    }
}

fn report_move(update: Option<MoveUpdate>, json: bool) -> CmdResult {
    match (update, json) {
        (Some(update), true) => print_json(&update),
        (None, true) => print_json(&serde_json::Value::Null),
        (Some(update), false) => {
            println!("moved {}", format_update(&update));
            Ok(())
        }
        (None, false) => {
            println!("no change");
            Ok(())
        }
    }
}

fn cmd_mv(start: &Path, args: MvArgs, json: bool) -> CmdResult {
    let store = open_store(start)?;
    let list = store.load()?;
    let entry = list.entry(args.id).ok_or(StoreError::UnknownEntry(args.id))?;

    let target = match (args.onto, args.into) {
        (Some(onto), _) => DropTarget::Entry(onto),
        (None, Some(into)) => DropTarget::Category(into),
        (None, None) => return Err("one of --onto or --into is required".into()),
    };
    if target == DropTarget::Entry(entry.id) {
        return report_move(None, json);
    }

    let update = plan_move(&list, Moving::Entry(entry), target)?;
    if let MoveUpdate::Entry {
        id,
        new_position,
        new_category_id,
    } = update
    {
        store.move_entry(id, new_position, new_category_id)?;
    }
    report_move(Some(update), json)
}

fn cmd_mv_category(start: &Path, args: MvCategoryArgs, json: bool) -> CmdResult {
    let store = open_store(start)?;
    let list = store.load()?;
    let category = list
        .category(args.id)
        .ok_or(StoreError::UnknownCategory(args.id))?;
    if args.onto == args.id {
        return report_move(None, json);
    }

    let update = plan_move(&list, Moving::Category(category), DropTarget::Category(args.onto))?;
    if let MoveUpdate::Category { id, new_position } = update {
        store.move_category(id, new_position)?;
    }
    report_move(Some(update), json)
}
