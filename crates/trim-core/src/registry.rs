//! Registry of live overlays keyed by surface identity
//!
//! The registry is an explicit object owned by the UI controller. It holds
//! the shared zoom state, the config, and the claim on the pointer gesture
//! currently in progress, and it applies the cross-instance rules
//! (single-selection, one gesture at a time).

use crate::callbacks::{Notification, NotificationKind, RectCallbacks};
use crate::config::OverlayConfig;
use crate::coords::ZoomState;
use crate::error::OverlayError;
use crate::geometry::NormalizedRect;
use crate::handle::HitTarget;
use crate::instance::{DownOutcome, Mode, OverlayInstance, PointerInput, SelectionMode};
use crate::surface::OverlaySurface;
use std::collections::HashMap;

/// Work produced by a registry call that must happen after the registry
/// borrow is released
#[must_use]
#[derive(Debug)]
pub struct Effects<C> {
    pub notifications: Vec<Notification<C>>,
    /// A pointer move is waiting for the next animation frame
    pub needs_frame: bool,
}

impl<C> Effects<C> {
    pub fn none() -> Self {
        Self {
            notifications: Vec::new(),
            needs_frame: false,
        }
    }

    fn frame() -> Self {
        Self {
            notifications: Vec::new(),
            needs_frame: true,
        }
    }

    fn notify(notification: Notification<C>) -> Self {
        Self {
            notifications: vec![notification],
            needs_frame: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty() && !self.needs_frame
    }
}

impl<C> Default for Effects<C> {
    fn default() -> Self {
        Self::none()
    }
}

pub struct OverlayRegistry<S, C> {
    instances: HashMap<String, OverlayInstance<S, C>>,
    zoom: ZoomState,
    config: OverlayConfig,
    /// Surface whose instance owns the running gesture
    active: Option<String>,
}

impl<S: OverlaySurface, C: RectCallbacks + Clone> OverlayRegistry<S, C> {
    pub fn new(config: OverlayConfig, zoom: ZoomState) -> Self {
        Self {
            instances: HashMap::new(),
            zoom,
            config,
            active: None,
        }
    }

    pub fn zoom(&self) -> &ZoomState {
        &self.zoom
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&OverlayInstance<S, C>> {
        self.instances.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut OverlayInstance<S, C>> {
        self.instances.get_mut(id)
    }

    /// Surface currently running a gesture, if any
    pub fn active_surface(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Create (or re-create) the overlay for `id`.
    ///
    /// A previous instance for the same id is torn down first; only its
    /// `selected` flag carries over.
    pub fn attach(&mut self, id: &str, surface: S, callbacks: C, selection_mode: SelectionMode) {
        let selected = match self.instances.remove(id) {
            Some(mut previous) => {
                previous.teardown();
                tracing::debug!(surface = id, "re-attaching overlay");
                previous.is_selected()
            }
            None => false,
        };
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        let instance = OverlayInstance::new(id, surface, callbacks, selection_mode, selected);
        self.instances.insert(id.to_string(), instance);
        tracing::debug!(surface = id, count = self.instances.len(), "overlay attached");
    }

    /// Tear down and forget the overlay. Unknown ids are a no-op.
    ///
    /// Returns true if an instance was removed.
    pub fn detach(&mut self, id: &str) -> bool {
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        match self.instances.remove(id) {
            Some(mut instance) => {
                instance.teardown();
                true
            }
            None => false,
        }
    }

    pub fn detach_all(&mut self) {
        self.active = None;
        for (_, mut instance) in self.instances.drain() {
            instance.teardown();
        }
    }

    /// Replace the overlay's rectangle with host-supplied values (0 or 1 rects)
    pub fn render(&mut self, id: &str, rects: &[NormalizedRect]) -> Result<(), OverlayError> {
        let instance = self
            .instances
            .get_mut(id)
            .ok_or_else(|| OverlayError::UnknownSurface(id.to_string()))?;
        instance.render(rects, &self.config)
    }

    pub fn pointer_down(&mut self, id: &str, input: &PointerInput, target: HitTarget) -> Effects<C> {
        if let Some(active) = self.active.as_deref() {
            if active != id {
                tracing::trace!(surface = id, owner = active, "pointer-down ignored, gesture owned elsewhere");
                return Effects::none();
            }
        }
        let Some(instance) = self.instances.get_mut(id) else {
            return Effects::none();
        };
        let outcome = match instance.pointer_down(input, target, &self.zoom, &self.config) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(surface = id, "{}", e);
                return Effects::none();
            }
        };
        match outcome {
            DownOutcome::Ignored => Effects::none(),
            DownOutcome::Deleted => {
                let channel = instance.callbacks().clone();
                Effects::notify(notification(id, channel, NotificationKind::Clear))
            }
            DownOutcome::Started(mode) => {
                let selection_mode = instance.selection_mode();
                self.active = Some(id.to_string());
                if mode == Mode::Move && selection_mode == SelectionMode::Single {
                    self.deselect_others(id);
                }
                Effects::none()
            }
        }
    }

    pub fn pointer_move(&mut self, id: &str, input: &PointerInput) -> Effects<C> {
        if self.active.as_deref() != Some(id) {
            return Effects::none();
        }
        let needs_frame = self
            .instances
            .get_mut(id)
            .is_some_and(|instance| instance.pointer_move(input));
        if needs_frame {
            Effects::frame()
        } else {
            Effects::none()
        }
    }

    /// Apply coalesced pointer moves; called once per animation frame
    pub fn flush_frames(&mut self) {
        for instance in self.instances.values_mut() {
            if instance.has_pending_frame() {
                instance.flush_frame(&self.config);
            }
        }
    }

    /// Finish the active gesture on `id`. Also used for pointer-cancel and
    /// lost pointer capture.
    pub fn pointer_up(&mut self, id: &str, input: &PointerInput) -> Effects<C> {
        if self.active.as_deref() != Some(id) {
            return Effects::none();
        }
        let Some(instance) = self.instances.get_mut(id) else {
            self.active = None;
            return Effects::none();
        };
        let kind = instance.pointer_up(input, &self.config);
        let channel = instance.callbacks().clone();
        if !instance.is_gesture_active() {
            self.active = None;
        }
        match kind {
            Some(kind) => Effects::notify(notification(id, channel, kind)),
            None => Effects::none(),
        }
    }

    pub fn pointer_cancel(&mut self, id: &str, input: &PointerInput) -> Effects<C> {
        self.pointer_up(id, input)
    }

    /// Document-level key press routed to one instance
    pub fn key_down(&mut self, id: &str, key: &str) -> Effects<C> {
        let Some(instance) = self.instances.get_mut(id) else {
            return Effects::none();
        };
        if instance.key_down(key, &self.config) {
            let channel = instance.callbacks().clone();
            Effects::notify(notification(id, channel, NotificationKind::Clear))
        } else {
            Effects::none()
        }
    }

    /// Programmatically delete the rectangle, as the delete affordance does.
    /// Nothing happens mid-gesture or when there is no rectangle.
    pub fn delete(&mut self, id: &str) -> Effects<C> {
        match self.instances.get_mut(id) {
            Some(instance) if instance.is_gesture_active() || instance.current_rect().is_none() => {
                Effects::none()
            }
            Some(instance) => {
                instance.delete_rect(&self.config);
                let channel = instance.callbacks().clone();
                Effects::notify(notification(id, channel, NotificationKind::Clear))
            }
            None => Effects::none(),
        }
    }

    /// Select the rectangle on `id`, honouring its selection mode.
    ///
    /// Returns false if there is no rectangle to select.
    pub fn select(&mut self, id: &str) -> bool {
        let Some(instance) = self.instances.get_mut(id) else {
            return false;
        };
        if instance.current_rect().is_none() {
            return false;
        }
        instance.set_selected(true, &self.config);
        if instance.selection_mode() == SelectionMode::Single {
            self.deselect_others(id);
        }
        true
    }

    pub fn clear_selection(&mut self) {
        for instance in self.instances.values_mut() {
            instance.set_selected(false, &self.config);
        }
    }

    /// Fan a layout change out to every instance. Instances mid-gesture
    /// defer until their gesture ends. Returns how many repositioned now.
    pub fn relayout_all(&mut self) -> usize {
        let mut repositioned = 0;
        for instance in self.instances.values_mut() {
            if instance.relayout(&self.config) {
                repositioned += 1;
            }
        }
        tracing::trace!(repositioned, total = self.instances.len(), "relayout");
        repositioned
    }

    fn deselect_others(&mut self, id: &str) {
        for (other_id, other) in self.instances.iter_mut() {
            if other_id != id && other.set_selected(false, &self.config) {
                tracing::debug!(surface = %other_id, selected_by = id, "deselected sibling");
            }
        }
    }
}

fn notification<C>(id: &str, channel: C, kind: NotificationKind) -> Notification<C> {
    Notification {
        surface_id: id.to_string(),
        channel,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effects_emptiness() {
        let none: Effects<()> = Effects::none();
        assert!(none.is_empty());
        assert!(!Effects::<()>::frame().is_empty());
        let n = notification("page-1", (), NotificationKind::Clear);
        let effects = Effects::notify(n);
        assert!(!effects.is_empty());
        assert_eq!(effects.notifications[0].surface_id, "page-1");
    }
}
