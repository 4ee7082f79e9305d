//! `TrimPreview`: the trim overlay API the page script talks to
//!
//! Owns the overlay registry behind `Rc<RefCell<..>>`. DOM listeners hold
//! only weak references back to it, so dropping the controller releases
//! everything. Host callbacks run after the registry borrow is released, so
//! the host may call back into the controller from `commitRect`/`clearRect`.

use crate::channel::{parse_rects, JsCallbackChannel};
use crate::dom_surface::{DomSurface, EventHandlers, Listener};
use js_sys::Function;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use trim_core::{
    Debouncer, Effects, HitTarget, OverlayConfig, OverlayRegistry, Point, PointerInput, SelectionMode, ZoomState,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, KeyboardEvent, PointerEvent};

type Registry = OverlayRegistry<DomSurface, JsCallbackChannel>;

struct Shared {
    registry: RefCell<Registry>,
    /// Outstanding `requestAnimationFrame` id
    frame_request: Cell<Option<i32>>,
    frame_callback: Closure<dyn FnMut(f64)>,
    debouncer: RefCell<Debouncer>,
    layout_callback: RefCell<Option<Function>>,
    /// window resize + visualViewport resize/scroll, present while any
    /// overlay is attached
    viewport: RefCell<Vec<Listener>>,
}

impl Shared {
    fn new(config: OverlayConfig) -> Rc<Self> {
        let debouncer = Debouncer::new(config.relayout_debounce_ms);
        Rc::new_cyclic(|weak: &Weak<Shared>| {
            let w = weak.clone();
            let frame_callback = Closure::wrap(Box::new(move |_timestamp: f64| {
                if let Some(shared) = w.upgrade() {
                    shared.on_frame();
                }
            }) as Box<dyn FnMut(f64)>);
            Shared {
                registry: RefCell::new(OverlayRegistry::new(config, ZoomState::new())),
                frame_request: Cell::new(None),
                frame_callback,
                debouncer: RefCell::new(debouncer),
                layout_callback: RefCell::new(None),
                viewport: RefCell::new(Vec::new()),
            }
        })
    }

    /// Run `f` against the registry unless it is already borrowed further
    /// up the stack.
    fn with_registry<R>(&self, op: &str, f: impl FnOnce(&mut Registry) -> R) -> Option<R> {
        match self.registry.try_borrow_mut() {
            Ok(mut registry) => Some(f(&mut registry)),
            Err(_) => {
                tracing::warn!("{} ignored: overlay registry busy", op);
                None
            }
        }
    }

    fn apply(&self, effects: Effects<JsCallbackChannel>) {
        if effects.needs_frame {
            self.schedule_frame();
        }
        for notification in effects.notifications {
            notification.deliver();
        }
    }

    fn schedule_frame(&self) {
        if self.frame_request.get().is_some() {
            return;
        }
        let requested = web_sys::window()
            .ok_or_else(|| JsValue::from_str("No window object available"))
            .and_then(|w| w.request_animation_frame(self.frame_callback.as_ref().unchecked_ref()));
        match requested {
            Ok(id) => self.frame_request.set(Some(id)),
            Err(e) => {
                tracing::warn!("requestAnimationFrame failed, flushing now: {:?}", e);
                self.with_registry("frame", |r| r.flush_frames());
            }
        }
    }

    fn on_frame(&self) {
        self.frame_request.set(None);
        if self.with_registry("frame", |r| r.flush_frames()).is_none() {
            self.schedule_frame();
        }
    }

    fn handlers(self: &Rc<Self>, surface_id: &str) -> EventHandlers {
        let down = {
            let (w, id) = (Rc::downgrade(self), surface_id.to_string());
            move |event: PointerEvent, target: HitTarget| {
                let Some(shared) = w.upgrade() else {
                    return;
                };
                let input = pointer_input(&event);
                let Some((effects, started)) = shared.with_registry("pointerdown", |r| {
                    let effects = r.pointer_down(&id, &input, target);
                    (effects, r.active_surface() == Some(id.as_str()))
                }) else {
                    return;
                };
                if started {
                    event.prevent_default();
                }
                shared.apply(effects);
            }
        };
        let move_ = {
            let (w, id) = (Rc::downgrade(self), surface_id.to_string());
            move |event: PointerEvent| {
                let Some(shared) = w.upgrade() else {
                    return;
                };
                let input = pointer_input(&event);
                if let Some(effects) = shared.with_registry("pointermove", |r| r.pointer_move(&id, &input)) {
                    shared.apply(effects);
                }
            }
        };
        let up = {
            let (w, id) = (Rc::downgrade(self), surface_id.to_string());
            move |event: PointerEvent| {
                let Some(shared) = w.upgrade() else {
                    return;
                };
                let input = pointer_input(&event);
                // lostpointercapture fired synchronously from our own release
                // finds the registry borrowed; the gesture is already over.
                let Ok(mut registry) = shared.registry.try_borrow_mut() else {
                    return;
                };
                let effects = registry.pointer_up(&id, &input);
                drop(registry);
                shared.apply(effects);
            }
        };
        let key = {
            let (w, id) = (Rc::downgrade(self), surface_id.to_string());
            move |event: KeyboardEvent| {
                let Some(shared) = w.upgrade() else {
                    return;
                };
                let key = event.key();
                if let Some(effects) = shared.with_registry("keydown", |r| r.key_down(&id, &key)) {
                    if !effects.is_empty() {
                        event.prevent_default();
                    }
                    shared.apply(effects);
                }
            }
        };
        EventHandlers {
            pointer_down: Rc::new(down),
            pointer_move: Rc::new(move_),
            pointer_up: Rc::new(up),
            key_down: Rc::new(key),
        }
    }

    fn ensure_viewport_listeners(self: &Rc<Self>) {
        if !self.viewport.borrow().is_empty() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        let on_change = |w: Weak<Shared>| {
            move |_event: Event| {
                if let Some(shared) = w.upgrade() {
                    shared.schedule_relayout();
                }
            }
        };
        let mut listeners = vec![Listener::attached(
            window.as_ref(),
            "resize",
            on_change(Rc::downgrade(self)),
        )];
        if let Some(vv) = window.visual_viewport() {
            let target: &EventTarget = vv.as_ref();
            listeners.push(Listener::attached(target, "resize", on_change(Rc::downgrade(self))));
            listeners.push(Listener::attached(target, "scroll", on_change(Rc::downgrade(self))));
        }
        *self.viewport.borrow_mut() = listeners;
    }

    fn release_viewport_listeners_if_idle(&self) {
        let idle = self.registry.try_borrow().map(|r| r.is_empty()).unwrap_or(false);
        if idle {
            self.viewport.borrow_mut().clear();
            self.debouncer.borrow_mut().cancel();
        }
    }

    fn schedule_relayout(self: &Rc<Self>) {
        let (ticket, delay) = {
            let mut debouncer = self.debouncer.borrow_mut();
            (debouncer.schedule(), debouncer.delay_ms())
        };
        let w = Rc::downgrade(self);
        let fire = Closure::once_into_js(move || {
            if let Some(shared) = w.upgrade() {
                if shared.debouncer.borrow_mut().fire(ticket) {
                    shared.relayout();
                }
            }
        });
        let scheduled = web_sys::window()
            .ok_or_else(|| JsValue::from_str("No window object available"))
            .and_then(|win| {
                win.set_timeout_with_callback_and_timeout_and_arguments_0(
                    fire.unchecked_ref(),
                    delay.min(i32::MAX as u32) as i32,
                )
            });
        if let Err(e) = scheduled {
            tracing::warn!("setTimeout failed, relayout now: {:?}", e);
            if self.debouncer.borrow_mut().fire(ticket) {
                self.relayout();
            }
        }
    }

    /// Fan a layout change out to every overlay, then the host's callback
    fn relayout(&self) -> usize {
        let repositioned = self.with_registry("relayout", |r| r.relayout_all()).unwrap_or(0);
        let callback = self.layout_callback.borrow().clone();
        if let Some(callback) = callback {
            if let Err(e) = callback.call0(&JsValue::NULL) {
                tracing::warn!("layout callback failed: {:?}", e);
            }
        }
        repositioned
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(id) = self.frame_request.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        self.registry.get_mut().detach_all();
    }
}

fn pointer_input(event: &PointerEvent) -> PointerInput {
    PointerInput {
        pointer_id: event.pointer_id(),
        client: Point::new(event.client_x() as f64, event.client_y() as f64),
        button: event.button(),
        is_primary: event.is_primary(),
    }
}

fn parse_config(config: JsValue) -> Result<OverlayConfig, JsValue> {
    if config.is_null() || config.is_undefined() {
        return Ok(OverlayConfig::default());
    }
    if let Some(json) = config.as_string() {
        return OverlayConfig::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()));
    }
    let parsed: OverlayConfig = serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsValue::from_str(&format!("Invalid overlay config: {}", e)))?;
    parsed.validate().map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(parsed)
}

/// Trim-rectangle overlays for every page canvas on the page
#[wasm_bindgen]
pub struct TrimPreview {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl TrimPreview {
    /// Create the controller. `config` may be omitted, a config object, or
    /// a JSON string.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<TrimPreview, JsValue> {
        let config = parse_config(config)?;
        Ok(TrimPreview {
            shared: Shared::new(config),
        })
    }

    /// Create (or re-create) the overlay for the element with id
    /// `surface_id`. Returns false if the element is missing.
    pub fn attach(&self, surface_id: &str, channel: JsValue, selection_mode: Option<String>) -> bool {
        let handlers = self.shared.handlers(surface_id);
        let surface = match DomSurface::attach(surface_id, handlers) {
            Ok(surface) => surface,
            Err(e) => {
                tracing::warn!(surface = surface_id, "attach failed: {}", e);
                return false;
            }
        };
        let mode = selection_mode
            .as_deref()
            .map(SelectionMode::parse)
            .unwrap_or_default();
        let channel = JsCallbackChannel::new(channel);
        let attached = self
            .shared
            .with_registry("attach", |r| r.attach(surface_id, surface, channel, mode))
            .is_some();
        if attached {
            self.shared.ensure_viewport_listeners();
        }
        attached
    }

    /// Tear down the overlay. Unknown ids are a successful no-op.
    pub fn detach(&self, surface_id: &str) -> bool {
        let Some(removed) = self.shared.with_registry("detach", |r| r.detach(surface_id)) else {
            return false;
        };
        if !removed {
            tracing::debug!(surface = surface_id, "detach of unknown surface");
        }
        self.shared.release_viewport_listeners_if_idle();
        true
    }

    /// Replace the overlay's rectangle. `rects` holds zero or one
    /// `{x, y, width, height}` in normalized units.
    pub fn render(&self, surface_id: &str, rects: JsValue) -> bool {
        let rects = match parse_rects(rects) {
            Ok(rects) => rects,
            Err(e) => {
                tracing::warn!(surface = surface_id, "{}", e);
                return false;
            }
        };
        match self.shared.with_registry("render", |r| r.render(surface_id, &rects)) {
            Some(Ok(())) => true,
            Some(Err(e)) => {
                tracing::warn!(surface = surface_id, "render failed: {}", e);
                false
            }
            None => false,
        }
    }

    /// Remove the rectangle as the delete button does, notifying `clearRect`.
    /// Returns false if there was nothing to delete or a gesture is running.
    #[wasm_bindgen(js_name = deleteRect)]
    pub fn delete_rect(&self, surface_id: &str) -> bool {
        let Some(effects) = self.shared.with_registry("deleteRect", |r| r.delete(surface_id)) else {
            return false;
        };
        let deleted = !effects.is_empty();
        self.shared.apply(effects);
        deleted
    }

    #[wasm_bindgen(js_name = detachAll)]
    pub fn detach_all(&self) {
        self.shared.with_registry("detachAll", |r| r.detach_all());
        self.shared.release_viewport_listeners_if_idle();
    }

    /// Update the preview zoom factor read at the start of each gesture
    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&self, value: f64) {
        if let Ok(registry) = self.shared.registry.try_borrow() {
            registry.zoom().set(value);
        }
    }

    /// Effective zoom factor (invalid values read as 1)
    pub fn zoom(&self) -> f64 {
        self.shared
            .registry
            .try_borrow()
            .map(|r| r.zoom().scale())
            .unwrap_or(1.0)
    }

    /// Current normalized rectangle, or `undefined`
    pub fn rect(&self, surface_id: &str) -> JsValue {
        let rect = self
            .shared
            .registry
            .try_borrow()
            .ok()
            .and_then(|r| r.get(surface_id).and_then(|i| i.normalized_rect()));
        match rect {
            Some(rect) => serde_wasm_bindgen::to_value(&rect).unwrap_or(JsValue::UNDEFINED),
            None => JsValue::UNDEFINED,
        }
    }

    #[wasm_bindgen(js_name = isSelected)]
    pub fn is_selected(&self, surface_id: &str) -> bool {
        self.shared
            .registry
            .try_borrow()
            .map(|r| r.get(surface_id).is_some_and(|i| i.is_selected()))
            .unwrap_or(false)
    }

    #[wasm_bindgen(js_name = instanceCount)]
    pub fn instance_count(&self) -> usize {
        self.shared.registry.try_borrow().map(|r| r.len()).unwrap_or(0)
    }

    /// Interaction mode name, for debugging
    pub fn mode(&self, surface_id: &str) -> Option<String> {
        self.shared
            .registry
            .try_borrow()
            .ok()
            .and_then(|r| r.get(surface_id).map(|i| i.mode().as_str().to_string()))
    }

    /// Select the rectangle as a body click would
    pub fn select(&self, surface_id: &str) -> bool {
        self.shared
            .with_registry("select", |r| r.select(surface_id))
            .unwrap_or(false)
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&self) {
        self.shared.with_registry("clearSelection", |r| r.clear_selection());
    }

    /// Function called after each debounced relayout; `null` removes it
    #[wasm_bindgen(js_name = setLayoutCallback)]
    pub fn set_layout_callback(&self, callback: Option<Function>) {
        *self.shared.layout_callback.borrow_mut() = callback;
    }

    /// Reposition every overlay now, skipping the debounce
    pub fn relayout(&self) -> usize {
        self.shared.debouncer.borrow_mut().cancel();
        self.shared.relayout()
    }
}
