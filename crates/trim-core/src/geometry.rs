//! Geometric types shared by the mapper, renderer and state machine
//!
//! All rectangles here are axis-aligned and use a top-left origin.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two points
    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Offset from `origin` to this point
    pub fn delta_from(&self, origin: Point) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }
}

/// Logical size of a surface in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size with zero (or invalid) dimensions replaced by 1 so it can be divided by
    pub fn non_degenerate(self) -> Self {
        Self {
            width: positive_or_one(self.width),
            height: positive_or_one(self.height),
        }
    }
}

fn positive_or_one(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        1.0
    }
}

/// Rectangle in logical pixel space local to the base surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicalRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LogicalRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two arbitrary corners, in any diagonal direction
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::from_edges(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
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

    /// True when both dimensions are strictly positive
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Intersect with `[0, bounds.width] x [0, bounds.height]`.
    ///
    /// A rectangle entirely outside the bounds collapses onto the nearest
    /// edge with zero width and/or height.
    pub fn clamp_to(&self, bounds: Size) -> Self {
        let left = self.left().clamp(0.0, bounds.width.max(0.0));
        let top = self.top().clamp(0.0, bounds.height.max(0.0));
        let right = self.right().clamp(left, bounds.width.max(left));
        let bottom = self.bottom().clamp(top, bounds.height.max(top));
        Self::from_edges(left, top, right, bottom)
    }

    /// Translate by a delta keeping the full rectangle inside `bounds`.
    ///
    /// The size is preserved; only the origin is clamped to
    /// `[0, bounds - size]`.
    pub fn translate_within(&self, dx: f64, dy: f64, bounds: Size) -> Self {
        let max_x = (bounds.width - self.width).max(0.0);
        let max_y = (bounds.height - self.height).max(0.0);
        Self {
            x: (self.x + dx).clamp(0.0, max_x),
            y: (self.y + dy).clamp(0.0, max_y),
            width: self.width,
            height: self.height,
        }
    }

    /// Multiply every component, used when a surface changes logical size
    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        Self {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }
}

/// Rectangle expressed as fractions of the surface's logical size
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check the `0 <= x <= x + w <= 1` invariant on both axes
    pub fn is_within_unit(&self) -> bool {
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        unit(self.x)
            && unit(self.y)
            && self.width >= 0.0
            && self.height >= 0.0
            && self.x + self.width <= 1.0 + 1e-9
            && self.y + self.height <= 1.0 + 1e-9
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}
