use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Data Model ──────────────────────────────────────────────────────────────

/// Position on the drawing surface, relative to its top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box spanned by two opposite corners, whichever way round they are.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Boxes of one frame, in insertion order.
pub type FrameAnnotations = Vec<BoundingBox>;

/// Frame index to that frame's boxes. A missing index means no boxes.
pub type AnnotationCache = BTreeMap<u32, FrameAnnotations>;

/// Display label of the box at `position` (0-based).
pub fn box_label(position: usize) -> String {
    format!("Box {}", position + 1)
}
