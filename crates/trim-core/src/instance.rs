//! Per-surface interaction state machine
//!
//! ```text
//! idle ──down(empty)──▶ maybe-draw ──move > threshold──▶ draw ──┐
//!  │ ▲                       │                                 │
//!  │ └──────────up───────────┘                                 │
//!  ├──down(body)───▶ move ─────────────────────────────────────┤
//!  └──down(handle)─▶ resize ───────────────────────────────────┴─up/cancel─▶ idle
//! ```

use crate::callbacks::NotificationKind;
use crate::config::OverlayConfig;
use crate::coords::{CoordinateMapper, SurfaceGeometry, ZoomState};
use crate::error::OverlayError;
use crate::geometry::{LogicalRect, NormalizedRect, Point, Size};
use crate::gesture::{draw_rect, move_rect, resize_rect};
use crate::handle::{Handle, HitTarget};
use crate::scene::Scene;
use crate::surface::OverlaySurface;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    MaybeDraw,
    Draw,
    Move,
    Resize,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::MaybeDraw => "maybe-draw",
            Mode::Draw => "draw",
            Mode::Move => "move",
            Mode::Resize => "resize",
        }
    }
}

/// Whether selecting this overlay deselects its siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    Single,
    Multi,
}

impl SelectionMode {
    /// Parse the host's selection mode string; unknown values mean single
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "multi" | "multiple" => SelectionMode::Multi,
            _ => SelectionMode::Single,
        }
    }
}

/// Pointer event as seen by the state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pointer_id: i32,
    /// Position in viewport pixels
    pub client: Point,
    /// `MouseEvent.button`; 0 is the primary button
    pub button: i16,
    pub is_primary: bool,
}

impl PointerInput {
    /// Primary-button press of the primary pointer
    pub fn primary(pointer_id: i32, x: f64, y: f64) -> Self {
        Self {
            pointer_id,
            client: Point::new(x, y),
            button: 0,
            is_primary: true,
        }
    }

    fn is_primary_press(&self) -> bool {
        self.is_primary && self.button == 0
    }
}

/// What a pointer-down did, so the registry can apply cross-instance effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownOutcome {
    /// Not a primary press, or a gesture is already running
    Ignored,
    /// A gesture started in the given mode
    Started(Mode),
    /// The delete affordance was pressed and the rectangle removed
    Deleted,
}

/// Snapshot taken at pointer-down and valid until pointer-up
#[derive(Debug, Clone, Copy)]
struct Gesture {
    pointer_id: i32,
    mapper: CoordinateMapper,
    start: Point,
    rect_at_down: Option<LogicalRect>,
    handle: Option<Handle>,
    did_drag: bool,
}

/// Exactly what the renderer last received, for change detection
#[derive(Debug, Clone, Copy, PartialEq)]
struct Drawn {
    rect: Option<LogicalRect>,
    selected: bool,
    size: Size,
}

/// One overlay attached to one base surface
pub struct OverlayInstance<S, C> {
    id: String,
    surface: S,
    callbacks: C,
    selection_mode: SelectionMode,
    mode: Mode,
    current_rect: Option<LogicalRect>,
    selected: bool,
    gesture: Option<Gesture>,
    active_handle: Option<Handle>,
    /// Latest pointer position not yet applied by a frame
    pending_point: Option<Point>,
    pending_reposition: bool,
    logical_size: Size,
    drawn: Option<Drawn>,
}

impl<S: OverlaySurface, C> OverlayInstance<S, C> {
    pub fn new(
        id: impl Into<String>,
        surface: S,
        callbacks: C,
        selection_mode: SelectionMode,
        selected: bool,
    ) -> Self {
        let logical_size = surface
            .geometry()
            .map(|g| g.logical.non_degenerate())
            .unwrap_or(Size::new(1.0, 1.0));
        Self {
            id: id.into(),
            surface,
            callbacks,
            selection_mode,
            mode: Mode::Idle,
            current_rect: None,
            selected,
            gesture: None,
            active_handle: None,
            pending_point: None,
            pending_reposition: false,
            logical_size,
            drawn: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection_mode
    }

    pub fn current_rect(&self) -> Option<LogicalRect> {
        self.current_rect
    }

    pub fn active_handle(&self) -> Option<Handle> {
        self.active_handle
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending_point.is_some()
    }

    /// Current rectangle as fractions of the surface, recomputed on demand
    pub fn normalized_rect(&self) -> Option<NormalizedRect> {
        let mapper = CoordinateMapper::new(
            SurfaceGeometry {
                origin: Point::default(),
                logical: self.logical_size,
            },
            1.0,
        );
        self.current_rect.map(|r| mapper.to_normalized(r))
    }

    /// Read the surface geometry and rescale the stored rectangle if the
    /// logical size changed since the last layout.
    fn sync_layout(&mut self) -> Result<SurfaceGeometry, OverlayError> {
        let geometry = self.surface.geometry()?;
        let size = geometry.logical.non_degenerate();
        if size != self.logical_size {
            if let Some(rect) = self.current_rect {
                let sx = size.width / self.logical_size.width;
                let sy = size.height / self.logical_size.height;
                self.current_rect = Some(rect.scale(sx, sy).clamp_to(size));
            }
            tracing::debug!(
                surface = %self.id,
                "logical size changed {}x{} -> {}x{}",
                self.logical_size.width,
                self.logical_size.height,
                size.width,
                size.height
            );
            self.logical_size = size;
        }
        Ok(geometry)
    }

    /// Push the current state to the renderer if it differs from what was
    /// last drawn (or unconditionally when `force` is set).
    pub fn redraw(&mut self, config: &OverlayConfig, force: bool) -> Result<bool, OverlayError> {
        let next = Drawn {
            rect: self.current_rect,
            selected: self.selected,
            size: self.logical_size,
        };
        if !force && self.drawn == Some(next) {
            return Ok(false);
        }
        let scene = Scene::build(
            self.logical_size,
            self.current_rect.as_ref(),
            self.selected,
            &config.style,
        );
        self.surface.draw(&scene)?;
        self.drawn = Some(next);
        tracing::trace!(surface = %self.id, nodes = scene.nodes.len(), "overlay drawn");
        Ok(true)
    }

    fn redraw_logged(&mut self, config: &OverlayConfig) {
        if let Err(e) = self.redraw(config, false) {
            tracing::warn!(surface = %self.id, "{}", e);
        }
    }

    /// Change the selection flag, redrawing when it actually changes
    pub fn set_selected(&mut self, selected: bool, config: &OverlayConfig) -> bool {
        if self.selected == selected {
            return false;
        }
        self.selected = selected;
        self.redraw_logged(config);
        true
    }

    /// Replace the rectangle from host-supplied normalized values.
    ///
    /// An empty slice clears the rectangle. Only the first rectangle is used.
    pub fn render(&mut self, rects: &[NormalizedRect], config: &OverlayConfig) -> Result<(), OverlayError> {
        self.sync_layout()?;
        if rects.len() > 1 {
            tracing::warn!(
                surface = %self.id,
                "render received {} rects, using the first",
                rects.len()
            );
        }
        self.current_rect = match rects.first() {
            None => None,
            Some(n) if !n.is_finite() => {
                return Err(OverlayError::DrawFailed(format!(
                    "non-finite rectangle {:?}",
                    n
                )))
            }
            Some(n) => {
                let mapper = CoordinateMapper::new(
                    SurfaceGeometry {
                        origin: Point::default(),
                        logical: self.logical_size,
                    },
                    1.0,
                );
                Some(mapper.from_normalized(*n).clamp_to(self.logical_size))
            }
        };
        self.redraw(config, true)?;
        Ok(())
    }

    /// Start a gesture (or delete) for a pointer-down on `target`
    pub fn pointer_down(
        &mut self,
        input: &PointerInput,
        target: HitTarget,
        zoom: &ZoomState,
        config: &OverlayConfig,
    ) -> Result<DownOutcome, OverlayError> {
        if !input.is_primary_press() || self.gesture.is_some() {
            return Ok(DownOutcome::Ignored);
        }

        if target == HitTarget::Delete {
            self.delete_rect(config);
            return Ok(DownOutcome::Deleted);
        }

        let geometry = self.sync_layout()?;
        let mapper = CoordinateMapper::capture(geometry, zoom);
        let start = mapper.to_local(input.client).point();

        let (mode, handle) = match (target, self.current_rect) {
            (HitTarget::Handle(h), Some(_)) => (Mode::Resize, Some(h)),
            (HitTarget::Body, Some(_)) => (Mode::Move, None),
            _ => (Mode::MaybeDraw, None),
        };

        match mode {
            Mode::Move => {
                self.selected = true;
            }
            Mode::MaybeDraw => {
                self.selected = false;
            }
            _ => {}
        }

        self.gesture = Some(Gesture {
            pointer_id: input.pointer_id,
            mapper,
            start,
            rect_at_down: self.current_rect,
            handle,
            did_drag: false,
        });
        self.mode = mode;
        self.active_handle = handle;
        self.pending_point = None;
        self.surface.capture_pointer(input.pointer_id);
        self.surface.begin_gesture();
        self.redraw_logged(config);

        tracing::debug!(
            surface = %self.id,
            mode = mode.as_str(),
            x = start.x,
            y = start.y,
            "gesture started"
        );
        Ok(DownOutcome::Started(mode))
    }

    /// Record a pointer move. Returns true if this created new pending work
    /// that needs a frame.
    pub fn pointer_move(&mut self, input: &PointerInput) -> bool {
        match self.gesture {
            Some(g) if g.pointer_id == input.pointer_id => {
                let newly_pending = self.pending_point.is_none();
                self.pending_point = Some(input.client);
                newly_pending
            }
            _ => false,
        }
    }

    /// Apply the latest pending move and redraw if the geometry changed
    pub fn flush_frame(&mut self, config: &OverlayConfig) {
        if let Some(client) = self.pending_point.take() {
            self.apply_point(client, config);
            self.redraw_logged(config);
        }
    }

    fn apply_point(&mut self, client: Point, config: &OverlayConfig) {
        let Some(gesture) = self.gesture.as_mut() else {
            return;
        };
        let bounds = gesture.mapper.bounds();
        let local = gesture.mapper.to_local(client).point();

        match self.mode {
            Mode::Idle => {}
            Mode::MaybeDraw => {
                if gesture.start.distance_to(local) > config.drag_threshold {
                    self.mode = Mode::Draw;
                    gesture.did_drag = true;
                    self.current_rect = Some(draw_rect(gesture.start, local, bounds));
                    tracing::debug!(surface = %self.id, "drag threshold crossed, drawing");
                }
            }
            Mode::Draw => {
                gesture.did_drag = true;
                self.current_rect = Some(draw_rect(gesture.start, local, bounds));
            }
            Mode::Move => {
                if let Some(original) = gesture.rect_at_down {
                    let moved = move_rect(&original, gesture.start, local, bounds);
                    gesture.did_drag |= moved != original;
                    self.current_rect = Some(moved);
                }
            }
            Mode::Resize => {
                if let (Some(original), Some(handle)) = (gesture.rect_at_down, gesture.handle) {
                    let resized =
                        resize_rect(&original, handle, gesture.start, local, bounds, config.min_size);
                    gesture.did_drag |= resized.rect != original;
                    self.current_rect = Some(resized.rect);
                    self.active_handle = Some(resized.effective_handle);
                }
            }
        }
    }

    /// Finish the gesture. Returns the commit to deliver, if any.
    ///
    /// Pointer-cancel and lost capture go through here as well.
    pub fn pointer_up(&mut self, input: &PointerInput, config: &OverlayConfig) -> Option<NotificationKind> {
        match self.gesture {
            Some(g) if g.pointer_id == input.pointer_id => {}
            _ => return None,
        }
        if let Some(client) = self.pending_point.take() {
            self.apply_point(client, config);
        }
        let gesture = self.gesture.take()?;
        let mode = self.mode;
        self.end_gesture(gesture.pointer_id);

        let notification = if mode == Mode::MaybeDraw {
            tracing::debug!(surface = %self.id, "click without drag");
            None
        } else {
            match self.current_rect {
                Some(rect) if rect.has_area() => {
                    let normalized = gesture.mapper.to_normalized(rect);
                    if gesture.did_drag {
                        self.selected = false;
                    }
                    tracing::debug!(
                        surface = %self.id,
                        mode = mode.as_str(),
                        x = normalized.x,
                        y = normalized.y,
                        w = normalized.width,
                        h = normalized.height,
                        "gesture committed"
                    );
                    Some(NotificationKind::Commit(normalized))
                }
                _ => {
                    tracing::debug!(surface = %self.id, mode = mode.as_str(), "degenerate rectangle discarded");
                    self.current_rect = None;
                    None
                }
            }
        };

        self.redraw_logged(config);
        if self.pending_reposition {
            self.pending_reposition = false;
            self.relayout(config);
        }
        notification
    }

    fn end_gesture(&mut self, pointer_id: i32) {
        self.surface.release_pointer(pointer_id);
        self.surface.end_gesture();
        self.mode = Mode::Idle;
        self.active_handle = None;
        self.pending_point = None;
    }

    /// Remove the rectangle and deselect. Returns true if anything changed.
    pub fn delete_rect(&mut self, config: &OverlayConfig) -> bool {
        let had_rect = self.current_rect.is_some();
        self.current_rect = None;
        self.selected = false;
        self.redraw_logged(config);
        tracing::debug!(surface = %self.id, "rectangle deleted");
        had_rect
    }

    /// Handle a document-level key press. Returns true if it deleted.
    pub fn key_down(&mut self, key: &str, config: &OverlayConfig) -> bool {
        if key != "Delete" || !self.selected || self.gesture.is_some() || self.current_rect.is_none() {
            return false;
        }
        self.delete_rect(config)
    }

    /// Reposition after a window/viewport change, or defer until the
    /// running gesture ends. Returns true if the reposition happened now.
    pub fn relayout(&mut self, config: &OverlayConfig) -> bool {
        if self.gesture.is_some() {
            self.pending_reposition = true;
            return false;
        }
        self.surface.reposition();
        if let Err(e) = self.sync_layout() {
            tracing::warn!(surface = %self.id, "{}", e);
            return false;
        }
        self.redraw_logged(config);
        true
    }

    pub fn has_pending_reposition(&self) -> bool {
        self.pending_reposition
    }

    /// Release everything this instance registered
    pub fn teardown(&mut self) {
        if let Some(gesture) = self.gesture.take() {
            self.end_gesture(gesture.pointer_id);
        }
        self.surface.teardown();
        tracing::debug!(surface = %self.id, "overlay torn down");
    }
}
