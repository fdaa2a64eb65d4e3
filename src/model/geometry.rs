use serde::{Deserialize, Serialize};

use super::ids::ItemId;

/// A point in layout coordinates (terminal cells or pixels; the engine does not care)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An axis-aligned rectangle. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Edges are inclusive on the top/left and exclusive on the bottom/right.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Overlap area divided by the union area, in `0.0..=1.0`.
    pub fn intersection_ratio(&self, other: &Rect) -> f64 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if left >= right || top >= bottom {
            return 0.0;
        }
        let overlap = (right - left) * (bottom - top);
        let union = self.area() + other.area() - overlap;
        if union <= 0.0 { 0.0 } else { overlap / union }
    }
}

/// A droppable region as laid out by the UI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Droppable {
    pub id: ItemId,
    pub rect: Rect,
}

impl Droppable {
    pub fn new(id: ItemId, rect: Rect) -> Self {
        Droppable { id, rect }
    }
}

/// Everything the engine needs to know about the screen for one drag event.
///
/// `pointer` is absent for keyboard drags; `active_rect` is the dragged
/// element's rect translated to where it is currently drawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerGeometry {
    #[serde(default)]
    pub pointer: Option<Point>,
    #[serde(default)]
    pub active_rect: Option<Rect>,
    #[serde(default)]
    pub droppables: Vec<Droppable>,
}

impl PointerGeometry {
    pub fn rect_of(&self, id: ItemId) -> Option<Rect> {
        self.droppables.iter().find(|d| d.id == id).map(|d| d.rect)
    }

    /// The point used for center-distance comparisons: the center of the
    /// dragged rect, or the pointer when there is no rect.
    pub fn anchor(&self) -> Option<Point> {
        self.active_rect.map(|r| r.center()).or(self.pointer)
    }
}
