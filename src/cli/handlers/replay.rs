use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::cli::commands::ReplayArgs;
use crate::cli::output::{ReplayJson, format_outcome};
use crate::io::sync::SyncAdapter;
use crate::model::{ItemId, PointerGeometry};
use crate::ops::engine::{DropOutcome, ReorderEngine};

use super::{CmdResult, open_store, print_json};

/// One recorded UI event, e.g. `{"start": "entry-3"}`, `{"over": {...}}`,
/// `"cancel"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayEvent {
    Start(ItemId),
    Over(PointerGeometry),
    End(PointerGeometry),
    Cancel,
}

pub fn cmd_replay(start: &Path, args: ReplayArgs, json: bool) -> CmdResult {
    let text = fs::read_to_string(&args.script)
        .map_err(|e| format!("could not read {}: {}", args.script, e))?;
    let events: Vec<ReplayEvent> = serde_json::from_str(&text)
        .map_err(|e| format!("could not parse {}: {}", args.script, e))?;

    let mut store = open_store(start)?;
    let mut engine = ReorderEngine::new(store.fetch_all()?)?;
    let outcomes = replay(&mut engine, &mut store, &events)?;

    let persisted = outcomes.iter().filter(|o| o.update().is_some()).count();
    if json {
        return print_json(&ReplayJson {
            outcomes,
            persisted,
        });
    }
    for outcome in &outcomes {
        println!("{}", format_outcome(outcome));
    }
    Ok(())
}

/// Drive `engine` through `events`, refreshing from `sync` after every drop
/// so the next drag starts from authoritative positions.
pub fn replay<S>(
    engine: &mut ReorderEngine,
    sync: &mut S,
    events: &[ReplayEvent],
) -> Result<Vec<DropOutcome>, Box<dyn std::error::Error>>
where
    S: SyncAdapter + ?Sized,
{
    let mut outcomes = Vec::new();
    for (i, event) in events.iter().enumerate() {
        let step = |e: crate::ops::engine::EngineError| format!("event {}: {}", i, e);
        match event {
            ReplayEvent::Start(id) => engine.on_drag_start(*id).map_err(step)?,
            ReplayEvent::Over(geometry) => engine.on_drag_over(geometry).map_err(step)?,
            ReplayEvent::Cancel => {
                engine.on_drag_cancel().map_err(step)?;
                outcomes.push(DropOutcome::Cancelled);
            }
            ReplayEvent::End(geometry) => {
                let outcome = engine.on_drag_end(geometry, sync).map_err(step)?;
                if outcome.update().is_some() || engine.needs_refresh() {
                    engine.refresh_from(sync).map_err(step)?;
                }
                outcomes.push(outcome);
            }
        }
    }
    Ok(outcomes)
}
