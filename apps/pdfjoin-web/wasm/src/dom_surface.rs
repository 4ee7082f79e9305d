//! SVG overlay layer over a page canvas
//!
//! The layer is an absolutely positioned `<svg>` appended to the canvas's
//! offset parent, sized to the canvas's layout box. The layer itself never
//! takes pointer events; only its nodes do, so presses outside the rectangle
//! reach the canvas underneath.

use std::rc::Rc;
use trim_core::{HitTarget, OverlayError, OverlaySurface, Scene, SceneNode, SurfaceGeometry};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, EventTarget, HtmlElement, KeyboardEvent, PointerEvent, SvgElement};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

pub const HANDLE_ATTR: &str = "data-trim-handle";
pub const BODY_ATTR: &str = "data-trim-body";
pub const DELETE_ATTR: &str = "data-trim-delete";

/// Event listener that stays registered until removed or dropped
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
    attached: bool,
}

impl Listener {
    /// Create the listener without registering it
    pub fn new(target: &EventTarget, event: &'static str, handler: impl FnMut(Event) + 'static) -> Self {
        Self {
            target: target.clone(),
            event,
            closure: Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>),
            attached: false,
        }
    }

    pub fn attached(target: &EventTarget, event: &'static str, handler: impl FnMut(Event) + 'static) -> Self {
        let mut listener = Self::new(target, event, handler);
        listener.add();
        listener
    }

    pub fn add(&mut self) {
        if self.attached {
            return;
        }
        match self
            .target
            .add_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref())
        {
            Ok(()) => self.attached = true,
            Err(e) => tracing::warn!("addEventListener('{}') failed: {:?}", self.event, e),
        }
    }

    pub fn remove(&mut self) {
        if !self.attached {
            return;
        }
        if let Err(e) = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref())
        {
            tracing::warn!("removeEventListener('{}') failed: {:?}", self.event, e);
        }
        self.attached = false;
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Callbacks into the controller, bound to one surface id
#[derive(Clone)]
pub struct EventHandlers {
    pub pointer_down: Rc<dyn Fn(PointerEvent, HitTarget)>,
    pub pointer_move: Rc<dyn Fn(PointerEvent)>,
    pub pointer_up: Rc<dyn Fn(PointerEvent)>,
    pub key_down: Rc<dyn Fn(KeyboardEvent)>,
}

pub struct DomSurface {
    surface_id: String,
    document: Document,
    base: HtmlElement,
    host: Element,
    layer: Option<SvgElement>,
    handlers: EventHandlers,
    base_down: Listener,
    key_down: Listener,
    layer_down: Option<Listener>,
    /// pointermove/up/cancel on the window, registered only during a gesture
    gesture: Vec<Listener>,
}

impl DomSurface {
    /// Bind to the element with id `surface_id` and register the permanent
    /// listeners.
    ///
    /// # Errors
    /// `MissingTarget` if the element or its positioned host is absent
    pub fn attach(surface_id: &str, handlers: EventHandlers) -> Result<Self, OverlayError> {
        let window = web_sys::window().ok_or_else(|| OverlayError::MissingTarget("window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| OverlayError::MissingTarget("document".to_string()))?;
        let base = document
            .get_element_by_id(surface_id)
            .ok_or_else(|| OverlayError::MissingTarget(surface_id.to_string()))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| OverlayError::MissingTarget(format!("{} is not an HTML element", surface_id)))?;
        let host = base
            .offset_parent()
            .or_else(|| base.parent_element())
            .ok_or_else(|| OverlayError::MissingTarget(format!("{} has no host element", surface_id)))?;

        let base_down = {
            let h = handlers.clone();
            Listener::attached(base.as_ref(), "pointerdown", move |e| dispatch_down(&h, e))
        };
        let key_down = {
            let h = handlers.key_down.clone();
            Listener::attached(document.as_ref(), "keydown", move |e: Event| {
                if let Ok(k) = e.dyn_into::<KeyboardEvent>() {
                    if !is_editable(k.target()) {
                        h(k);
                    }
                }
            })
        };

        let win: &EventTarget = window.as_ref();
        let mut gesture = Vec::with_capacity(4);
        let on_move = handlers.pointer_move.clone();
        gesture.push(Listener::new(win, "pointermove", move |e: Event| {
            if let Ok(p) = e.dyn_into::<PointerEvent>() {
                on_move(p);
            }
        }));
        for event in ["pointerup", "pointercancel", "lostpointercapture"] {
            let on_up = handlers.pointer_up.clone();
            gesture.push(Listener::new(win, event, move |e: Event| {
                if let Ok(p) = e.dyn_into::<PointerEvent>() {
                    on_up(p);
                }
            }));
        }

        Ok(Self {
            surface_id: surface_id.to_string(),
            document,
            base,
            host,
            layer: None,
            handlers,
            base_down,
            key_down,
            layer_down: None,
            gesture,
        })
    }

    fn ensure_layer(&mut self) -> Result<SvgElement, OverlayError> {
        if let Some(layer) = &self.layer {
            return Ok(layer.clone());
        }
        let layer = self
            .document
            .create_element_ns(Some(SVG_NS), "svg")
            .map_err(|e| OverlayError::DrawFailed(format!("{:?}", e)))?
            .dyn_into::<SvgElement>()
            .map_err(|_| OverlayError::DrawFailed("svg element has unexpected type".to_string()))?;
        set_attr(&layer, "class", "trim-overlay")?;
        set_attr(&layer, "data-trim-surface", &self.surface_id)?;
        self.host
            .append_child(&layer)
            .map_err(|e| OverlayError::DrawFailed(format!("{:?}", e)))?;

        let h = self.handlers.clone();
        self.layer_down = Some(Listener::attached(layer.as_ref(), "pointerdown", move |e| {
            dispatch_down(&h, e)
        }));
        self.layer = Some(layer.clone());
        self.position_layer(&layer);
        tracing::debug!(surface = %self.surface_id, "overlay layer created");
        Ok(layer)
    }

    fn position_layer(&self, layer: &SvgElement) {
        let style = layer.style();
        let props = [
            ("position", "absolute".to_string()),
            ("left", format!("{}px", self.base.offset_left())),
            ("top", format!("{}px", self.base.offset_top())),
            ("width", format!("{}px", self.base.offset_width())),
            ("height", format!("{}px", self.base.offset_height())),
            ("pointer-events", "none".to_string()),
            ("overflow", "visible".to_string()),
            ("z-index", "2".to_string()),
        ];
        for (name, value) in props {
            if let Err(e) = style.set_property(name, &value) {
                tracing::warn!(surface = %self.surface_id, "style {} failed: {:?}", name, e);
            }
        }
    }

    fn svg(&self, tag: &str) -> Result<Element, OverlayError> {
        self.document
            .create_element_ns(Some(SVG_NS), tag)
            .map_err(|e| OverlayError::DrawFailed(format!("{:?}", e)))
    }

    fn node(&self, node: &SceneNode, pointer_events: &str) -> Result<Element, OverlayError> {
        match node {
            SceneNode::Body {
                rect,
                fill,
                stroke,
                stroke_width,
            } => {
                let el = self.svg("rect")?;
                set_rect(&el, rect.x, rect.y, rect.width, rect.height)?;
                set_attr(&el, "fill", fill)?;
                set_attr(&el, "stroke", stroke)?;
                set_attr(&el, "stroke-width", &stroke_width.to_string())?;
                set_attr(&el, BODY_ATTR, "")?;
                set_attr(&el, "style", &format!("cursor: move; pointer-events: {}", pointer_events))?;
                Ok(el)
            }
            SceneNode::Handle { handle, rect, color } => {
                let el = self.svg("rect")?;
                set_rect(&el, rect.x, rect.y, rect.width, rect.height)?;
                set_attr(&el, "fill", "#ffffff")?;
                set_attr(&el, "stroke", color)?;
                set_attr(&el, "stroke-width", "1")?;
                set_attr(&el, HANDLE_ATTR, &handle.index().to_string())?;
                set_attr(
                    &el,
                    "style",
                    &format!("cursor: {}; pointer-events: {}", handle.cursor(), pointer_events),
                )?;
                Ok(el)
            }
            SceneNode::Delete { rect, color } => {
                let group = self.svg("g")?;
                set_attr(&group, DELETE_ATTR, "")?;
                set_attr(&group, "style", &format!("cursor: pointer; pointer-events: {}", pointer_events))?;

                let button = self.svg("rect")?;
                set_rect(&button, rect.x, rect.y, rect.width, rect.height)?;
                set_attr(&button, "rx", &(rect.width / 4.0).to_string())?;
                set_attr(&button, "fill", color)?;

                let inset = rect.width * 0.3;
                let (l, t) = (rect.x + inset, rect.y + inset);
                let (r, b) = (rect.right() - inset, rect.bottom() - inset);
                let cross = self.svg("path")?;
                set_attr(&cross, "d", &format!("M{} {} L{} {} M{} {} L{} {}", l, t, r, b, r, t, l, b))?;
                set_attr(&cross, "stroke", "#ffffff")?;
                set_attr(&cross, "stroke-width", "2")?;
                set_attr(&cross, "stroke-linecap", "round")?;

                append(&group, &button)?;
                append(&group, &cross)?;
                Ok(group)
            }
        }
    }

    fn capture_target(&self) -> Element {
        match &self.layer {
            Some(layer) => layer.clone().unchecked_into(),
            None => self.base.clone().unchecked_into(),
        }
    }
}

impl OverlaySurface for DomSurface {
    fn geometry(&self) -> Result<SurfaceGeometry, OverlayError> {
        if !self.base.is_connected() {
            return Err(OverlayError::MissingTarget(self.surface_id.clone()));
        }
        let rect = self.base.get_bounding_client_rect();
        Ok(SurfaceGeometry::new(
            rect.left(),
            rect.top(),
            self.base.offset_width() as f64,
            self.base.offset_height() as f64,
        ))
    }

    fn draw(&mut self, scene: &Scene) -> Result<(), OverlayError> {
        let layer = self.ensure_layer()?;
        set_attr(
            &layer,
            "viewBox",
            &format!("0 0 {} {}", scene.size.width, scene.size.height),
        )?;
        layer.set_inner_html("");

        let pointer_events = if scene.intercepts_pointer { "all" } else { "none" };
        for node in &scene.nodes {
            let el = self.node(node, pointer_events)?;
            append(&layer, &el)?;
        }
        Ok(())
    }

    fn capture_pointer(&mut self, pointer_id: i32) {
        if let Err(e) = self.capture_target().set_pointer_capture(pointer_id) {
            tracing::debug!(surface = %self.surface_id, "setPointerCapture failed: {:?}", e);
        }
    }

    fn release_pointer(&mut self, pointer_id: i32) {
        for el in [self.capture_target(), self.base.clone().unchecked_into()] {
            if el.has_pointer_capture(pointer_id) {
                if let Err(e) = el.release_pointer_capture(pointer_id) {
                    tracing::debug!(surface = %self.surface_id, "releasePointerCapture failed: {:?}", e);
                }
            }
        }
    }

    fn begin_gesture(&mut self) {
        for listener in &mut self.gesture {
            listener.add();
        }
    }

    fn end_gesture(&mut self) {
        for listener in &mut self.gesture {
            listener.remove();
        }
    }

    fn reposition(&mut self) {
        if let Some(layer) = &self.layer {
            self.position_layer(layer);
        }
    }

    fn teardown(&mut self) {
        self.end_gesture();
        self.base_down.remove();
        self.key_down.remove();
        self.layer_down = None;
        if let Some(layer) = self.layer.take() {
            layer.remove();
        }
    }
}

/// Classify the press target by its hit tags and forward it
fn dispatch_down(handlers: &EventHandlers, event: Event) {
    let Ok(pointer) = event.dyn_into::<PointerEvent>() else {
        return;
    };
    let target = pointer
        .target()
        .and_then(|t| t.dyn_into::<Element>().ok())
        .map(|el| classify(&el))
        .unwrap_or(HitTarget::Empty);
    if target == HitTarget::Delete {
        pointer.stop_propagation();
        pointer.prevent_default();
    }
    (handlers.pointer_down)(pointer, target);
}

fn classify(el: &Element) -> HitTarget {
    let selector = format!("[{}],[{}],[{}]", HANDLE_ATTR, BODY_ATTR, DELETE_ATTR);
    match el.closest(&selector) {
        Ok(Some(tagged)) => HitTarget::from_tags(
            tagged.get_attribute(HANDLE_ATTR).as_deref(),
            tagged.has_attribute(BODY_ATTR),
            tagged.has_attribute(DELETE_ATTR),
        ),
        _ => HitTarget::Empty,
    }
}

/// Key presses while typing into a form field are not meant for the overlay
fn is_editable(target: Option<EventTarget>) -> bool {
    let Some(el) = target.and_then(|t| t.dyn_into::<HtmlElement>().ok()) else {
        return false;
    };
    matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT") || el.is_content_editable()
}

fn set_attr(el: &Element, name: &str, value: &str) -> Result<(), OverlayError> {
    el.set_attribute(name, value)
        .map_err(|e| OverlayError::DrawFailed(format!("{}: {:?}", name, e)))
}

fn set_rect(el: &Element, x: f64, y: f64, width: f64, height: f64) -> Result<(), OverlayError> {
    set_attr(el, "x", &x.to_string())?;
    set_attr(el, "y", &y.to_string())?;
    set_attr(el, "width", &width.max(0.0).to_string())?;
    set_attr(el, "height", &height.max(0.0).to_string())
}

fn append(parent: &Element, child: &Element) -> Result<(), OverlayError> {
    parent
        .append_child(child)
        .map(|_| ())
        .map_err(|e| OverlayError::DrawFailed(format!("{:?}", e)))
}
