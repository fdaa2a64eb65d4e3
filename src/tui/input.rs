use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::cli::output::format_outcome;
use crate::model::Point;
use crate::ops::engine::DropOutcome;

use super::app::{App, PointerDrag};

pub fn handle_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true
        }
        KeyCode::Esc => cancel_drag(app),
        KeyCode::Char('r') => {
            app.status = Some("refreshing".to_string());
            app.request_refresh();
        }
        _ => {}
    }
}

pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => start_drag(app, mouse),
        MouseEventKind::Drag(MouseButton::Left) => drag_over(app, mouse),
        MouseEventKind::Up(MouseButton::Left) => end_drag(app, mouse),
        _ => {}
    }
}

/// Terminal rows have no sub-cell precision; bias the pointer toward the
/// direction of travel so the midpoint rule can land on either side.
fn pointer_at(mouse: MouseEvent, moving_down: bool) -> Point {
    let offset = if moving_down { 0.75 } else { 0.25 };
    Point::new(mouse.column as f64 + 0.5, mouse.row as f64 + offset)
}

fn start_drag(app: &mut App, mouse: MouseEvent) {
    if app.drag.is_some() {
        return;
    }
    let Some(id) = app.item_at_row(mouse.row) else {
        return;
    };
    let Some(origin) = app
        .droppables
        .iter()
        .find(|d| d.id == id)
        .map(|d| d.rect)
    else {
        return;
    };
    // Grab by the row actually pressed (a category block spans many rows)
    let origin = if id.is_category() {
        crate::model::Rect::new(origin.x, mouse.row as f64, origin.width, 1.0)
    } else {
        origin
    };
    if let Err(e) = app.engine.on_drag_start(id) {
        app.status = Some(e.to_string());
        return;
    }
    let grab = Point::new(mouse.column as f64 + 0.5, mouse.row as f64 + 0.5);
    app.status = None;
    app.pointer = Some(grab);
    app.drag = Some(PointerDrag {
        grab,
        origin,
        last_row: mouse.row,
    });
}

fn drag_over(app: &mut App, mouse: MouseEvent) {
    let Some(drag) = app.drag.as_mut() else {
        return;
    };
    let moving_down = mouse.row >= drag.last_row;
    drag.last_row = mouse.row;
    app.pointer = Some(pointer_at(mouse, moving_down));
    let geometry = app.geometry();
    if let Err(e) = app.engine.on_drag_over(&geometry) {
        tracing::warn!(error = %e, "drag over rejected");
    }
}

fn end_drag(app: &mut App, mouse: MouseEvent) {
    let Some(drag) = app.drag else {
        return;
    };
    app.pointer = Some(pointer_at(mouse, mouse.row >= drag.last_row));
    let geometry = app.geometry();
    app.drag = None;
    app.pointer = None;
    match app.engine.on_drag_end(&geometry, &mut app.sync) {
        Ok(DropOutcome::NoOp) => {}
        Ok(outcome) => app.status = Some(format_outcome(&outcome)),
        Err(e) => app.status = Some(e.to_string()),
    }
    app.apply_pending();
}

fn cancel_drag(app: &mut App) {
    if app.drag.take().is_none() {
        return;
    }
    app.pointer = None;
    if let Err(e) = app.engine.on_drag_cancel() {
        tracing::warn!(error = %e, "cancel rejected");
    }
    app.status = Some("cancelled".to_string());
    app.apply_pending();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, ContainerId, Droppable, Entry, GroceryList, ItemId, Rect};
    use crate::ops::drag::DragPhase;
    use crate::tui::app::test_support::app_for;

    fn list() -> GroceryList {
        GroceryList::new(
            vec![Category::new(1, "Dairy", 0), Category::new(2, "Bakery", 1)],
            vec![Entry::new(10, "milk", 1, 0), Entry::new(11, "eggs", 1, 1)],
        )
    }

    fn mouse(kind: MouseEventKind, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column: 3,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn laid_out() -> App {
        let mut app = app_for(list());
        app.record_layout(
            vec![
                Droppable::new(ItemId::Category(1), Rect::new(0.0, 0.0, 30.0, 3.0)),
                Droppable::new(ItemId::Entry(10), Rect::new(0.0, 1.0, 30.0, 1.0)),
                Droppable::new(ItemId::Entry(11), Rect::new(0.0, 2.0, 30.0, 1.0)),
                Droppable::new(ItemId::Category(2), Rect::new(0.0, 3.0, 30.0, 2.0)),
            ],
            vec![
                (0, ItemId::Category(1)),
                (1, ItemId::Entry(10)),
                (2, ItemId::Entry(11)),
                (3, ItemId::Category(2)),
            ],
        );
        app
    }

    #[test]
    fn press_on_row_lifts_item() {
        let mut app = laid_out();
        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 2));
        assert_eq!(app.engine.lifted().map(|l| l.id()), Some(ItemId::Entry(11)));
        assert_eq!(app.engine.phase(), DragPhase::Active);
    }

    #[test]
    fn press_on_empty_row_does_nothing() {
        let mut app = laid_out();
        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 4));
        assert!(app.engine.lifted().is_none());
        assert!(app.drag.is_none());
    }

    #[test]
    fn drag_into_empty_category_and_drop() {
        let mut app = laid_out();
        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 1));
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 4));
        assert_eq!(
            app.engine.preview().members(ContainerId::Category(2)),
            &[ItemId::Entry(10)]
        );
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 4));
        assert_eq!(app.engine.phase(), DragPhase::Idle);
        assert!(app.engine.is_optimistic());
        assert_eq!(
            app.status.as_deref(),
            Some("moved entry 10 to position 0 in category 2")
        );
    }

    #[test]
    fn escape_restores_preview() {
        let mut app = laid_out();
        let before = app.engine.preview().clone();
        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 1));
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 4));
        handle_key(&mut app, KeyEvent::from(KeyCode::Esc));
        assert_eq!(app.engine.preview(), &before);
        assert!(app.drag.is_none());
    }

    #[test]
    fn q_quits() {
        let mut app = laid_out();
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
