//! WASM bindings for the page-trim overlay
//!
//! Draws the trim rectangle editor over each rendered page canvas and
//! reports committed rectangles back to the host application.
//!
//! ## Architecture
//!
//! - Gesture state, hit classification and coordinate math live in
//!   `trim-core`, which has no DOM dependency
//! - `DomSurface` turns the core's scene into SVG and wires DOM events
//! - `TrimPreview` owns the registry and is the only type JavaScript sees
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { TrimPreview, initLogging } from './pkg/pdfjoin_trim_wasm.js';
//!
//! await init();
//! initLogging("debug");
//!
//! const preview = new TrimPreview();
//! preview.attach("page-canvas-1", {
//!     commitRect: (x, y, w, h) => host.invokeMethodAsync("CommitRect", x, y, w, h),
//!     clearRect: () => host.invokeMethodAsync("ClearRect"),
//! }, "single");
//! preview.render("page-canvas-1", [{ x: 0.1, y: 0.1, width: 0.8, height: 0.8 }]);
//! zoomSlider.oninput = (e) => preview.setZoom(Number(e.target.value));
//! ```

pub mod channel;
pub mod controller;
pub mod dom_surface;
pub mod logging;

use tracing_subscriber::filter::LevelFilter;
use wasm_bindgen::prelude::*;

pub use controller::TrimPreview;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::init(LevelFilter::WARN);
}

/// Get the library version
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Set the console log level ("error", "warn", "info", "debug", "trace" or
/// "off"). Returns false for an unknown level.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: &str) -> bool {
    logging::set_level(level)
}
