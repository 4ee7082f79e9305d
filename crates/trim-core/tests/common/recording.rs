//! In-memory surface and callback channel that record everything they see

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use trim_core::{
    CallbackError, Effects, NormalizedRect, NotificationKind, OverlayConfig, OverlayError,
    OverlayRegistry, OverlaySurface, RectCallbacks, Scene, SurfaceGeometry, ZoomState,
};

#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub geometry: Option<SurfaceGeometry>,
    pub draws: Vec<Scene>,
    pub captured: Vec<i32>,
    pub released: Vec<i32>,
    pub gestures_begun: u32,
    pub gestures_ended: u32,
    pub repositions: u32,
    pub teardowns: u32,
}

/// Surface whose log stays readable after the surface moves into a registry
#[derive(Clone, Default)]
pub struct RecordingSurface {
    pub log: Rc<RefCell<SurfaceLog>>,
}

impl RecordingSurface {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        let surface = Self::default();
        surface.set_geometry(SurfaceGeometry::new(left, top, width, height));
        surface
    }

    /// Surface with no host element, as after the canvas was removed
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn set_geometry(&self, geometry: SurfaceGeometry) {
        self.log.borrow_mut().geometry = Some(geometry);
    }

    pub fn draw_count(&self) -> usize {
        self.log.borrow().draws.len()
    }

    pub fn last_scene(&self) -> Option<Scene> {
        self.log.borrow().draws.last().cloned()
    }
}

impl OverlaySurface for RecordingSurface {
    fn geometry(&self) -> Result<SurfaceGeometry, OverlayError> {
        self.log
            .borrow()
            .geometry
            .ok_or_else(|| OverlayError::MissingTarget("recording".to_string()))
    }

    fn draw(&mut self, scene: &Scene) -> Result<(), OverlayError> {
        self.log.borrow_mut().draws.push(scene.clone());
        Ok(())
    }

    fn capture_pointer(&mut self, pointer_id: i32) {
        self.log.borrow_mut().captured.push(pointer_id);
    }

    fn release_pointer(&mut self, pointer_id: i32) {
        self.log.borrow_mut().released.push(pointer_id);
    }

    fn begin_gesture(&mut self) {
        self.log.borrow_mut().gestures_begun += 1;
    }

    fn end_gesture(&mut self) {
        self.log.borrow_mut().gestures_ended += 1;
    }

    fn reposition(&mut self) {
        self.log.borrow_mut().repositions += 1;
    }

    fn teardown(&mut self) {
        self.log.borrow_mut().teardowns += 1;
    }
}

/// Callback channel that records delivered notifications
#[derive(Clone, Default)]
pub struct RecordingCallbacks {
    pub calls: Rc<RefCell<Vec<NotificationKind>>>,
    pub fail: bool,
}

impl RecordingCallbacks {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn commits(&self) -> Vec<NormalizedRect> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|k| match k {
                NotificationKind::Commit(r) => Some(*r),
                NotificationKind::Clear => None,
            })
            .collect()
    }

    pub fn clears(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|k| matches!(k, NotificationKind::Clear))
            .count()
    }
}

impl RectCallbacks for RecordingCallbacks {
    fn commit_rect(&self, rect: NormalizedRect) -> Result<(), CallbackError> {
        self.calls.borrow_mut().push(NotificationKind::Commit(rect));
        if self.fail {
            return Err(CallbackError::new("commitRect", "host threw"));
        }
        Ok(())
    }

    fn clear_rect(&self) -> Result<(), CallbackError> {
        self.calls.borrow_mut().push(NotificationKind::Clear);
        if self.fail {
            return Err(CallbackError::new("clearRect", "host threw"));
        }
        Ok(())
    }
}

pub type Registry = OverlayRegistry<RecordingSurface, RecordingCallbacks>;

pub fn registry() -> Registry {
    OverlayRegistry::new(OverlayConfig::default(), ZoomState::new())
}

/// Deliver notifications the way the browser controller does
pub fn deliver(effects: Effects<RecordingCallbacks>) -> bool {
    let needs_frame = effects.needs_frame;
    for n in effects.notifications {
        n.deliver();
    }
    needs_frame
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {} to be within 1e-3 of {}",
        actual,
        expected
    );
}

pub fn assert_rect_close(actual: NormalizedRect, expected: (f64, f64, f64, f64)) {
    assert_close(actual.x, expected.0);
    assert_close(actual.y, expected.1);
    assert_close(actual.width, expected.2);
    assert_close(actual.height, expected.3);
}
