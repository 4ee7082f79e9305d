//! Rectangle math for draw, move and resize gestures
//!
//! Every function recomputes the rectangle from the snapshot taken at
//! pointer-down plus the live pointer position, so the result never drifts
//! with the number of move events.

use crate::geometry::{LogicalRect, Point, Size};
use crate::handle::Handle;

/// Draw: rectangle spanning the start point and the pointer, clamped to bounds
pub fn draw_rect(start: Point, current: Point, bounds: Size) -> LogicalRect {
    LogicalRect::from_corners(start, current).clamp_to(bounds)
}

/// Move: keep the original size and translate by the pointer delta.
/// The origin stays within `[0, bounds - size]`.
pub fn move_rect(original: &LogicalRect, start: Point, current: Point, bounds: Size) -> LogicalRect {
    let (dx, dy) = current.delta_from(start);
    original.translate_within(dx, dy, bounds)
}

/// Result of a resize step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resized {
    pub rect: LogicalRect,
    /// Handle under the pointer after any flip-over
    pub effective_handle: Handle,
}

/// Resize: move only the side(s) adjacent to `handle` by the pointer delta.
///
/// Sides not touched by the handle stay fixed. If the moving side crosses the
/// fixed one the rectangle flips, and a size below `min_size` is corrected by
/// pushing the moving side away from the fixed side.
pub fn resize_rect(
    original: &LogicalRect,
    handle: Handle,
    start: Point,
    current: Point,
    bounds: Size,
    min_size: f64,
) -> Resized {
    let (dx, dy) = current.delta_from(start);

    let (left, right, flip_x) = if handle.moves_left() {
        let (fixed, moving) = (original.right(), original.left() + dx);
        let (a, b) = resolve_axis(fixed, moving, original.left(), bounds.width, min_size);
        (a.min(b), a.max(b), b > a)
    } else if handle.moves_right() {
        let (fixed, moving) = (original.left(), original.right() + dx);
        let (a, b) = resolve_axis(fixed, moving, original.right(), bounds.width, min_size);
        (a.min(b), a.max(b), b < a)
    } else {
        (original.left(), original.right(), false)
    };

    let (top, bottom, flip_y) = if handle.moves_top() {
        let (fixed, moving) = (original.bottom(), original.top() + dy);
        let (a, b) = resolve_axis(fixed, moving, original.top(), bounds.height, min_size);
        (a.min(b), a.max(b), b > a)
    } else if handle.moves_bottom() {
        let (fixed, moving) = (original.top(), original.bottom() + dy);
        let (a, b) = resolve_axis(fixed, moving, original.bottom(), bounds.height, min_size);
        (a.min(b), a.max(b), b < a)
    } else {
        (original.top(), original.bottom(), false)
    };

    Resized {
        rect: LogicalRect::from_edges(left, top, right, bottom),
        effective_handle: handle.flipped(flip_x, flip_y),
    }
}

/// Clamp the moving edge into `[0, extent]` and enforce the minimum span.
///
/// Returns `(fixed, moving)`. The fixed edge is never altered. On a surface
/// narrower than `min_size` the floor shrinks to the surface extent.
fn resolve_axis(fixed: f64, moving: f64, moving_at_down: f64, extent: f64, min_size: f64) -> (f64, f64) {
    let extent = extent.max(0.0);
    let min_size = min_size.min(extent);
    let mut moving = moving.clamp(0.0, extent);
    if (moving - fixed).abs() < min_size {
        // Keep the side the edge was on; at exact overlap fall back to the
        // side it started from.
        let mut sign = if moving > fixed {
            1.0
        } else if moving < fixed {
            -1.0
        } else if moving_at_down >= fixed {
            1.0
        } else {
            -1.0
        };
        let pushed = fixed + sign * min_size;
        if pushed < 0.0 || pushed > extent {
            sign = -sign;
        }
        // Neither side fits when the fixed edge sits mid-surface.
        moving = (fixed + sign * min_size).clamp(0.0, extent);
    }
    (fixed, moving)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn handle() -> impl Strategy<Value = Handle> {
        (0u8..8).prop_map(|i| Handle::from_index(i).unwrap_or(Handle::SE))
    }

    proptest! {
        /// Property: resize never yields a negative or sub-minimum rectangle,
        /// and never leaves the surface
        #[test]
        fn resize_stays_positive_and_in_bounds(
            h in handle(),
            x in 0.0f64..300.0,
            y in 0.0f64..200.0,
            w in 1.0f64..100.0,
            hgt in 1.0f64..100.0,
            px in -1000.0f64..1000.0,
            py in -1000.0f64..1000.0,
        ) {
            let bounds = Size::new(400.0, 300.0);
            let original = LogicalRect::new(x, y, w, hgt);
            let start = h.anchor(&original);
            let r = resize_rect(&original, h, start, Point::new(px, py), bounds, 1.0);
            prop_assert!(r.rect.width >= 1.0 - 1e-9, "{:?}", r);
            prop_assert!(r.rect.height >= 1.0 - 1e-9, "{:?}", r);
            prop_assert!(r.rect.left() >= 0.0 && r.rect.right() <= 400.0 + 1e-9, "{:?}", r);
            prop_assert!(r.rect.top() >= 0.0 && r.rect.bottom() <= 300.0 + 1e-9, "{:?}", r);
        }

        /// Property: a minimum size above the surface extent never pushes an
        /// edge off the surface
        #[test]
        fn resize_on_tiny_surface_stays_in_bounds(
            h in handle(),
            side in 0.1f64..20.0,
            min_size in 0.0f64..40.0,
            px in -50.0f64..50.0,
            py in -50.0f64..50.0,
        ) {
            let bounds = Size::new(side, side);
            let original = LogicalRect::new(0.0, 0.0, side, side);
            let start = h.anchor(&original);
            let r = resize_rect(&original, h, start, Point::new(px, py), bounds, min_size);
            prop_assert!(r.rect.left() >= 0.0 && r.rect.right() <= side + 1e-9, "{:?}", r);
            prop_assert!(r.rect.top() >= 0.0 && r.rect.bottom() <= side + 1e-9, "{:?}", r);
        }

        /// Property: move preserves size and stays inside the surface
        #[test]
        fn move_preserves_size(
            x in 0.0f64..300.0,
            y in 0.0f64..200.0,
            dx in -1000.0f64..1000.0,
            dy in -1000.0f64..1000.0,
        ) {
            let bounds = Size::new(400.0, 300.0);
            let original = LogicalRect::new(x, y, 100.0, 100.0);
            let start = original.center();
            let moved = move_rect(&original, start, Point::new(start.x + dx, start.y + dy), bounds);
            prop_assert_eq!(moved.width, 100.0);
            prop_assert_eq!(moved.height, 100.0);
            prop_assert!(moved.x >= 0.0 && moved.right() <= 400.0);
            prop_assert!(moved.y >= 0.0 && moved.bottom() <= 300.0);
        }
    }
}
