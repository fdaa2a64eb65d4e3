use serde::Serialize;

use crate::model::{Category, Entry, GroceryList};
use crate::ops::engine::DropOutcome;
use crate::ops::position::MoveUpdate;
use crate::util::unicode::{display_width, right_align};

#[derive(Serialize)]
pub struct EntryJson<'a> {
    pub id: i64,
    pub description: &'a str,
    pub position: i64,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub quantity: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub notes: &'a str,
    pub completed: bool,
}

#[derive(Serialize)]
pub struct CategoryJson<'a> {
    pub id: i64,
    pub name: &'a str,
    pub position: i64,
    pub is_default_category: bool,
    pub entries: Vec<EntryJson<'a>>,
}

#[derive(Serialize)]
pub struct ReplayJson {
    pub outcomes: Vec<DropOutcome>,
    pub persisted: usize,
}

pub fn entry_to_json(entry: &Entry) -> EntryJson<'_> {
    EntryJson {
        id: entry.id,
        description: &entry.description,
        position: entry.position,
        quantity: &entry.quantity,
        notes: &entry.notes,
        completed: entry.completed,
    }
}

/// The list as nested categories in display order
pub fn list_to_json(list: &GroceryList) -> Vec<CategoryJson<'_>> {
    list.sorted_categories()
        .into_iter()
        .map(|c| CategoryJson {
            id: c.id,
            name: &c.name,
            position: c.position,
            is_default_category: c.is_default_category,
            entries: list.entries_in(c.id).into_iter().map(entry_to_json).collect(),
        })
        .collect()
}

fn category_header(category: &Category) -> String {
    format!("[{}] {}", category.id, category.name)
}

/// Plain-text listing: a header per category, entries indented below with
/// ids right-aligned.
pub fn format_list(list: &GroceryList) -> Vec<String> {
    let id_width = list
        .entries
        .iter()
        .map(|e| display_width(&e.id.to_string()))
        .max()
        .unwrap_or(1);

    let mut lines = Vec::new();
    for (i, category) in list.sorted_categories().into_iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(category_header(category));
        let entries = list.entries_in(category.id);
        if entries.is_empty() {
            lines.push("  (empty)".to_string());
        }
        for entry in entries {
            let mut line = format!(
                "  {} {}",
                right_align(&entry.id.to_string(), id_width),
                entry.description
            );
            if !entry.quantity.is_empty() {
                line.push_str(&format!(" ({})", entry.quantity));
            }
            if entry.completed {
                line.push_str(" [done]");
            }
            if !entry.notes.is_empty() {
                line.push_str(&format!("  # {}", entry.notes));
            }
            lines.push(line);
        }
    }
    lines
}

pub fn format_outcome(outcome: &DropOutcome) -> String {
    match outcome {
        DropOutcome::NoOp => "no change".to_string(),
        DropOutcome::Cancelled => "cancelled".to_string(),
        DropOutcome::Discarded => "discarded stale preview".to_string(),
        DropOutcome::Committed(update) => format!("moved {}", format_update(update)),
        DropOutcome::SyncFailed(update) => format!("failed to save {}", format_update(update)),
    }
}

pub fn format_update(update: &MoveUpdate) -> String {
    match update {
        MoveUpdate::Entry {
            id,
            new_position,
            new_category_id,
        } => {
            let mut s = format!("entry {}", id);
            if let Some(p) = new_position {
                s.push_str(&format!(" to position {}", p));
            }
            if let Some(c) = new_category_id {
                s.push_str(&format!(" in category {}", c));
            }
            s
        }
        MoveUpdate::Category { id, new_position } => {
            format!("category {} to position {}", id, new_position)
        }
    }
}
