use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph};

use crate::model::{ContainerId, Droppable, ItemId, Rect};
use crate::ops::drag::DragPhase;
use crate::util::unicode::fit_to_width;

use super::app::App;

/// Draw the list, record its layout on `app`, then draw the lifted element
/// as a floating row under the pointer.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.background)),
        area,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let list_area = chunks[0];
    let width = list_area.width as usize;

    let lifted = app.engine.lifted().map(|l| l.id());
    let list = app.engine.list();
    let preview = app.engine.preview();

    let mut lines: Vec<Line> = Vec::new();
    let mut droppables = Vec::new();
    let mut rows = Vec::new();
    let row_rect = |row: usize, height: usize| {
        Rect::new(
            list_area.x as f64,
            (list_area.y as usize + row) as f64,
            list_area.width as f64,
            height as f64,
        )
    };

    for category_item in preview.members(ContainerId::Categories) {
        let Some(category) = category_item.as_category().and_then(|id| list.category(id)) else {
            continue;
        };
        let members = preview.members(ContainerId::Category(category.id));
        let category_lifted = lifted == Some(*category_item);
        let top = lines.len();

        let header_style = if category_lifted {
            app.theme.placeholder()
        } else {
            app.theme.header()
        };
        let name = fit_to_width(&category.name, width.saturating_sub(6));
        lines.push(Line::from(vec![
            Span::styled(name.trim_end().to_string(), header_style),
            Span::styled(
                format!(" ({})", members.len()),
                Style::default().fg(app.theme.dim),
            ),
        ]));
        rows.push((top, *category_item));

        if members.is_empty() {
            lines.push(Line::from(Span::styled(
                "  (empty)",
                Style::default().fg(app.theme.dim),
            )));
        }
        for member in members {
            let Some(entry) = member.as_entry().and_then(|id| list.entry(id)) else {
                continue;
            };
            let mut text = String::from("  ");
            if app.show_positions {
                text.push_str(&format!("{:>2} ", entry.position));
            }
            if entry.completed {
                text.push_str("✓ ");
            }
            text.push_str(&entry.description);
            if !entry.quantity.is_empty() {
                text.push_str(&format!(" · {}", entry.quantity));
            }
            let style = if category_lifted || lifted == Some(*member) {
                app.theme.placeholder()
            } else {
                app.theme.entry(entry.completed)
            };
            let row = lines.len();
            droppables.push(Droppable::new(*member, row_rect(row, 1)));
            rows.push((row, *member));
            lines.push(Line::from(Span::styled(
                fit_to_width(&text, width).trim_end().to_string(),
                style,
            )));
        }

        droppables.push(Droppable::new(
            *category_item,
            row_rect(top, lines.len() - top),
        ));
    }

    // Only what fits on screen can be hit
    let visible = list_area.height as usize;
    let droppables: Vec<Droppable> = droppables
        .into_iter()
        .filter(|d| (d.rect.y as usize) < list_area.y as usize + visible)
        .collect();
    let rows: Vec<(u16, ItemId)> = rows
        .into_iter()
        .filter(|(row, _)| *row < visible)
        .map(|(row, id)| (list_area.y + row as u16, id))
        .collect();

    frame.render_widget(Paragraph::new(lines), list_area);
    render_overlay(frame, app, list_area);
    render_status(frame, app, chunks[1]);
    app.record_layout(droppables, rows);
}

fn render_overlay(frame: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let (Some(lifted), Some(pointer)) = (app.engine.lifted(), app.pointer) else {
        return;
    };
    if area.height == 0 {
        return;
    }
    let row = (pointer.y.max(0.0) as u16).clamp(area.y, area.y + area.height - 1);
    let overlay = ratatui::layout::Rect::new(area.x, row, area.width, 1);
    let text = fit_to_width(&format!("» {}", lifted.label()), area.width as usize);
    frame.render_widget(Clear, overlay);
    frame.render_widget(
        Paragraph::new(Span::styled(text, app.theme.overlay())),
        overlay,
    );
}

fn render_status(frame: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let mut text = match (&app.status, app.engine.phase(), app.engine.lifted()) {
        (_, DragPhase::Active | DragPhase::Previewing, Some(lifted)) => {
            format!("dragging {} · esc cancel", lifted.label())
        }
        (Some(status), _, _) => status.clone(),
        _ => "r refresh · q quit".to_string(),
    };
    let mut style = Style::default().fg(app.theme.dim);
    if app.engine.needs_refresh() {
        text.push_str(" · out of sync");
        style = style.fg(app.theme.red);
    }
    frame.render_widget(
        Paragraph::new(Span::styled(fit_to_width(&text, area.width as usize), style)),
        area,
    );
}
