//! Host abstraction over the annotated surface and its overlay layer

use crate::coords::SurfaceGeometry;
use crate::error::OverlayError;
use crate::scene::Scene;

/// Everything an overlay instance needs from the element it annotates.
///
/// In the browser this is the base canvas, its positioned host, and the SVG
/// layer; tests use an in-memory recorder.
pub trait OverlaySurface {
    /// Current viewport origin and logical size of the base surface
    fn geometry(&self) -> Result<SurfaceGeometry, OverlayError>;

    /// Replace the overlay layer's content with `scene`.
    ///
    /// Creates the layer on first use. Must fully clear previous content.
    fn draw(&mut self, scene: &Scene) -> Result<(), OverlayError>;

    /// Route the given pointer's events to this surface until released
    fn capture_pointer(&mut self, pointer_id: i32);

    fn release_pointer(&mut self, pointer_id: i32);

    /// Register the move/up/cancel listeners that live for one gesture
    fn begin_gesture(&mut self);

    /// Remove the gesture-scoped listeners. Safe to call when none are set.
    fn end_gesture(&mut self);

    /// Recompute the overlay layer's position and size after a layout change
    fn reposition(&mut self);

    /// Remove every listener and destroy the overlay layer
    fn teardown(&mut self);
}
