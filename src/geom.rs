//! Integer geometry for sub-buffer access and selection shapes.
//!
//! Rectangles are half-open: `x..x + w` by `y..y + h`. Shapes are evaluated at
//! pixel centres, so a pixel `(px, py)` belongs to a shape when the point
//! `(px + 0.5, py + 0.5)` does.
use serde::Deserialize;

use crate::image::BitMask;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle anchored at the origin covering a `w × h` buffer.
    pub fn of_size(w: usize, h: usize) -> Self {
        Self::new(0, 0, w as i32, h as i32)
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Overlap of two rectangles; empty rectangles yield `None`.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        (x1 > x0 && y1 > y0).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Closed polygon given by its vertices; the last vertex connects to the first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Smallest rectangle containing every vertex (inclusive of the vertex pixels).
    pub fn bounding_rect(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::default();
        };
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1)
    }

    /// Even-odd containment test for a real-valued point.
    pub fn contains_f(&self, px: f64, py: f64) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = (self.points[i].x as f64, self.points[i].y as f64);
            let (xj, yj) = (self.points[j].x as f64, self.points[j].y as f64);
            if (yi > py) != (yj > py) {
                let x_cross = xj + (py - yj) * (xi - xj) / (yi - yj);
                if px < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

/// Selection outlines understood by the compositing layer.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionShape {
    Rectangle { rect: Rect },
    Ellipse { rect: Rect },
    Polygon { polygon: Polygon },
}

impl SelectionShape {
    pub fn bounding_rect(&self) -> Rect {
        match self {
            SelectionShape::Rectangle { rect } | SelectionShape::Ellipse { rect } => *rect,
            SelectionShape::Polygon { polygon } => polygon.bounding_rect(),
        }
    }

    /// Whether the pixel at document coordinates `p` lies inside the shape.
    pub fn contains(&self, p: Point) -> bool {
        let (cx, cy) = (p.x as f64 + 0.5, p.y as f64 + 0.5);
        match self {
            SelectionShape::Rectangle { rect } => rect.contains(p),
            SelectionShape::Ellipse { rect } => {
                if rect.is_empty() {
                    return false;
                }
                let rx = rect.w as f64 / 2.0;
                let ry = rect.h as f64 / 2.0;
                let dx = (cx - (rect.x as f64 + rx)) / rx;
                let dy = (cy - (rect.y as f64 + ry)) / ry;
                dx * dx + dy * dy <= 1.0
            }
            SelectionShape::Polygon { polygon } => {
                // Vertices are pixel indices, so test against the vertex pixel centres.
                polygon.contains_f(cx - 0.5, cy - 0.5) || polygon.points.contains(&p)
            }
        }
    }

    /// Shape mask over its bounding rectangle; set bits are inside the shape.
    pub fn mask(&self) -> BitMask {
        let bounds = self.bounding_rect();
        if bounds.is_empty() {
            return BitMask::new(0, 0, false);
        }
        let mut mask = BitMask::new(bounds.w as usize, bounds.h as usize, false);
        for y in 0..bounds.h {
            for x in 0..bounds.w {
                if self.contains(Point::new(bounds.x + x, bounds.y + y)) {
                    mask.set(x as usize, y as usize, true);
                }
            }
        }
        mask
    }
}
