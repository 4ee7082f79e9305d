//! Coordinate transformation between viewport, logical and normalized space
//!
//! - viewport (client) pixels: what pointer events report, affected by zoom
//! - logical pixels: unscaled CSS pixels local to the base surface
//! - normalized: fractions `[0, 1]` of the surface's logical size

use crate::geometry::{LogicalRect, NormalizedRect, Point, Size};
use std::cell::Cell;
use std::rc::Rc;

/// Zoom factor shared between the preview-zoom feature and every overlay.
///
/// Cloning yields another handle to the same value.
#[derive(Debug, Clone)]
pub struct ZoomState(Rc<Cell<f64>>);

impl ZoomState {
    pub fn new() -> Self {
        Self::with_scale(1.0)
    }

    pub fn with_scale(scale: f64) -> Self {
        Self(Rc::new(Cell::new(scale)))
    }

    /// Store a new raw zoom value. Invalid values are kept but read back as 1.
    pub fn set(&self, scale: f64) {
        self.0.set(scale);
    }

    /// Effective scale: the stored value if finite and positive, otherwise 1
    pub fn scale(&self) -> f64 {
        effective_scale(self.0.get())
    }
}

impl Default for ZoomState {
    fn default() -> Self {
        Self::new()
    }
}

fn effective_scale(raw: f64) -> f64 {
    if raw.is_finite() && raw > 0.0 {
        raw
    } else {
        1.0
    }
}

/// Measured placement of a base surface, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGeometry {
    /// Top-left of the surface in viewport pixels
    pub origin: Point,
    /// Unscaled size of the surface
    pub logical: Size,
}

impl SurfaceGeometry {
    pub fn new(left: f64, top: f64, logical_width: f64, logical_height: f64) -> Self {
        Self {
            origin: Point::new(left, top),
            logical: Size::new(logical_width, logical_height),
        }
    }
}

/// Pointer position converted to the surface's logical space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPosition {
    pub x: f64,
    pub y: f64,
    pub logical_width: f64,
    pub logical_height: f64,
}

impl LocalPosition {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Snapshot of origin, logical size and zoom used for a conversion.
///
/// An interaction captures one mapper at pointer-down and keeps it until
/// pointer-up so a mid-drag relayout cannot make the rectangle jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    origin: Point,
    logical: Size,
    scale: f64,
}

impl CoordinateMapper {
    pub fn new(geometry: SurfaceGeometry, scale: f64) -> Self {
        Self {
            origin: geometry.origin,
            logical: geometry.logical.non_degenerate(),
            scale: effective_scale(scale),
        }
    }

    /// Capture the current geometry and zoom
    pub fn capture(geometry: SurfaceGeometry, zoom: &ZoomState) -> Self {
        Self::new(geometry, zoom.scale())
    }

    pub fn bounds(&self) -> Size {
        self.logical
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Convert a viewport point to logical coordinates local to the surface
    pub fn to_local(&self, client: Point) -> LocalPosition {
        LocalPosition {
            x: (client.x - self.origin.x) / self.scale,
            y: (client.y - self.origin.y) / self.scale,
            logical_width: self.logical.width,
            logical_height: self.logical.height,
        }
    }

    /// Clamp a logical rectangle to the surface and express it as fractions
    pub fn to_normalized(&self, rect: LogicalRect) -> NormalizedRect {
        let clamped = rect.clamp_to(self.logical);
        NormalizedRect {
            x: clamped.x / self.logical.width,
            y: clamped.y / self.logical.height,
            width: clamped.width / self.logical.width,
            height: clamped.height / self.logical.height,
        }
    }

    /// Convert normalized fractions back to logical pixels (no clamping)
    pub fn from_normalized(&self, rect: NormalizedRect) -> LogicalRect {
        LogicalRect {
            x: rect.x * self.logical.width,
            y: rect.y * self.logical.height,
            width: rect.width * self.logical.width,
            height: rect.height * self.logical.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(w: f64, h: f64, scale: f64) -> CoordinateMapper {
        CoordinateMapper::new(SurfaceGeometry::new(100.0, 50.0, w, h), scale)
    }

    #[test]
    fn test_to_local_subtracts_origin() {
        let m = mapper(400.0, 300.0, 1.0);
        let p = m.to_local(Point::new(150.0, 100.0));
        assert_eq!(p.point(), Point::new(50.0, 50.0));
        assert_eq!(p.logical_width, 400.0);
        assert_eq!(p.logical_height, 300.0);
    }

    #[test]
    fn test_to_local_divides_by_zoom() {
        let m = mapper(400.0, 300.0, 2.0);
        let p = m.to_local(Point::new(300.0, 250.0));
        assert_eq!(p.point(), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_degenerate_zoom_falls_back_to_one() {
        for raw in [0.0, -1.5, f64::NAN, f64::INFINITY] {
            let zoom = ZoomState::with_scale(raw);
            assert_eq!(zoom.scale(), 1.0);
            let m = CoordinateMapper::capture(SurfaceGeometry::new(0.0, 0.0, 10.0, 10.0), &zoom);
            assert_eq!(m.scale(), 1.0);
        }
    }

    #[test]
    fn test_zoom_state_is_shared() {
        let zoom = ZoomState::new();
        let other = zoom.clone();
        other.set(1.5);
        assert_eq!(zoom.scale(), 1.5);
    }

    #[test]
    fn test_zero_logical_size_treated_as_one() {
        let m = mapper(0.0, 0.0, 1.0);
        assert_eq!(m.bounds(), Size::new(1.0, 1.0));
        let n = m.to_normalized(LogicalRect::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(n, NormalizedRect::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_to_normalized_scenario() {
        let m = mapper(400.0, 300.0, 1.0);
        let n = m.to_normalized(LogicalRect::new(50.0, 50.0, 100.0, 70.0));
        assert!((n.x - 0.125).abs() < 1e-9);
        assert!((n.y - 0.166_666).abs() < 1e-4);
        assert!((n.width - 0.25).abs() < 1e-9);
        assert!((n.height - 0.233_333).abs() < 1e-4);
    }

    #[test]
    fn test_to_normalized_clamps_out_of_bounds() {
        let m = mapper(400.0, 300.0, 1.0);
        let n = m.to_normalized(LogicalRect::new(-40.0, 200.0, 100.0, 200.0));
        assert_eq!(n.x, 0.0);
        assert_eq!(n.width, 60.0 / 400.0);
        assert!((n.y + n.height - 1.0).abs() < 1e-9);
        assert!(n.is_within_unit());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimension() -> impl Strategy<Value = f64> {
        1.0f64..4000.0
    }

    proptest! {
        /// Property: normalize then denormalize reproduces an in-bounds rectangle
        #[test]
        fn roundtrip_logical_normalized_logical(
            w in dimension(),
            h in dimension(),
            fx in 0.0f64..1.0,
            fy in 0.0f64..1.0,
            fw in 0.0f64..1.0,
            fh in 0.0f64..1.0,
        ) {
            let m = CoordinateMapper::new(SurfaceGeometry::new(0.0, 0.0, w, h), 1.0);
            let x = fx * w;
            let y = fy * h;
            let rect = LogicalRect::new(x, y, fw * (w - x), fh * (h - y));

            let back = m.from_normalized(m.to_normalized(rect));

            let tolerance = 1e-6;
            prop_assert!((back.x - rect.x).abs() < tolerance, "x: {} vs {}", back.x, rect.x);
            prop_assert!((back.y - rect.y).abs() < tolerance, "y: {} vs {}", back.y, rect.y);
            prop_assert!((back.width - rect.width).abs() < tolerance);
            prop_assert!((back.height - rect.height).abs() < tolerance);
        }

        /// Property: any rectangle normalizes into the unit square
        #[test]
        fn normalized_always_within_unit(
            w in dimension(),
            h in dimension(),
            x in -5000.0f64..5000.0,
            y in -5000.0f64..5000.0,
            rw in 0.0f64..5000.0,
            rh in 0.0f64..5000.0,
        ) {
            let m = CoordinateMapper::new(SurfaceGeometry::new(0.0, 0.0, w, h), 1.0);
            let n = m.to_normalized(LogicalRect::new(x, y, rw, rh));
            prop_assert!(n.is_within_unit(), "{:?}", n);
        }

        /// Property: zoom scales client deltas down linearly
        #[test]
        fn zoom_scales_linearly(
            scale in 0.25f64..3.0,
            dx in 0.0f64..1000.0,
        ) {
            let m = CoordinateMapper::new(SurfaceGeometry::new(10.0, 10.0, 500.0, 500.0), scale);
            let p = m.to_local(Point::new(10.0 + dx, 10.0));
            prop_assert!((p.x * scale - dx).abs() < 1e-9);
        }
    }
}
