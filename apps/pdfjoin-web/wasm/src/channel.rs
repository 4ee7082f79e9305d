//! Host callback channel and rectangle input parsing
//!
//! The host passes an object exposing `commitRect(x, y, w, h)` and
//! `clearRect()`. Calls are fire-and-forget: a thrown error becomes a
//! `CallbackError`, and a returned promise that later rejects is logged.

use js_sys::{Array, Function, Promise, Reflect};
use serde::Deserialize;
use trim_core::{CallbackError, NormalizedRect, RectCallbacks};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[derive(Clone)]
pub struct JsCallbackChannel {
    target: JsValue,
}

impl JsCallbackChannel {
    pub fn new(target: JsValue) -> Self {
        Self { target }
    }

    fn invoke(&self, method: &'static str, args: &Array) -> Result<(), CallbackError> {
        if self.target.is_null() || self.target.is_undefined() {
            return Err(CallbackError::new(method, "no callback channel"));
        }
        let func = Reflect::get(&self.target, &JsValue::from_str(method))
            .map_err(|e| CallbackError::new(method, describe(&e)))?
            .dyn_into::<Function>()
            .map_err(|_| CallbackError::new(method, "not a function"))?;
        let result = func
            .apply(&self.target, args)
            .map_err(|e| CallbackError::new(method, describe(&e)))?;

        if let Ok(promise) = result.dyn_into::<Promise>() {
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    tracing::warn!("{}", CallbackError::new(method, describe(&e)));
                }
            });
        }
        Ok(())
    }
}

impl RectCallbacks for JsCallbackChannel {
    fn commit_rect(&self, rect: NormalizedRect) -> Result<(), CallbackError> {
        let args = Array::new();
        args.push(&JsValue::from_f64(rect.x));
        args.push(&JsValue::from_f64(rect.y));
        args.push(&JsValue::from_f64(rect.width));
        args.push(&JsValue::from_f64(rect.height));
        self.invoke("commitRect", &args)
    }

    fn clear_rect(&self) -> Result<(), CallbackError> {
        self.invoke("clearRect", &Array::new())
    }
}

fn describe(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{:?}", value)
}

/// Rectangle as accepted at the boundary: canonical `{x, y, width, height}`
/// plus the older `w`/`h` and capitalised spellings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RectInput {
    #[serde(alias = "X")]
    pub x: f64,
    #[serde(alias = "Y")]
    pub y: f64,
    #[serde(alias = "w", alias = "W", alias = "Width")]
    pub width: f64,
    #[serde(alias = "h", alias = "H", alias = "Height")]
    pub height: f64,
}

impl From<RectInput> for NormalizedRect {
    fn from(r: RectInput) -> Self {
        NormalizedRect::new(r.x, r.y, r.width, r.height)
    }
}

/// Parse the `rects` argument of `render`. `null`/`undefined` means none.
pub fn parse_rects(value: JsValue) -> Result<Vec<NormalizedRect>, String> {
    if value.is_null() || value.is_undefined() {
        return Ok(Vec::new());
    }
    let rects: Vec<RectInput> = serde_wasm_bindgen::from_value(value)
        .map_err(|e| format!("Invalid rectangle list: {}", e))?;
    Ok(rects.into_iter().map(NormalizedRect::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<NormalizedRect> {
        let rects: Vec<RectInput> = serde_json::from_str(json).expect("valid rect json");
        rects.into_iter().map(NormalizedRect::from).collect()
    }

    #[test]
    fn test_canonical_shape() {
        let rects = parse(r#"[{"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.4}]"#);
        assert_eq!(rects, vec![NormalizedRect::new(0.1, 0.2, 0.3, 0.4)]);
    }

    #[test]
    fn test_legacy_short_names() {
        let rects = parse(r#"[{"x": 0.1, "y": 0.2, "w": 0.3, "h": 0.4}]"#);
        assert_eq!(rects, vec![NormalizedRect::new(0.1, 0.2, 0.3, 0.4)]);
    }

    #[test]
    fn test_capitalised_names() {
        let rects = parse(r#"[{"X": 0.5, "Y": 0.5, "Width": 0.25, "Height": 0.25}]"#);
        assert_eq!(rects, vec![NormalizedRect::new(0.5, 0.5, 0.25, 0.25)]);
    }

    #[test]
    fn test_empty_list() {
        assert!(parse("[]").is_empty());
    }

    #[test]
    fn test_missing_field_rejected() {
        let result: Result<Vec<RectInput>, _> = serde_json::from_str(r#"[{"x": 0.1, "y": 0.2}]"#);
        assert!(result.is_err());
    }
}
