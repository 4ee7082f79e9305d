//! Trim-rectangle overlay for rendered PDF pages
//!
//! This crate holds everything about the trim overlay that does not touch the
//! DOM: coordinate mapping between viewport, logical and normalized space,
//! the draw/move/resize state machine, the scene the renderer draws, and the
//! registry that coordinates every overlay on the page.
//!
//! The browser bindings live in the `pdfjoin-trim-wasm` crate, which
//! implements [`OverlaySurface`] on top of an SVG layer and
//! [`RectCallbacks`] on top of the host's JavaScript callback object.

pub mod callbacks;
pub mod config;
pub mod coords;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod handle;
pub mod instance;
pub mod registry;
pub mod relayout;
pub mod scene;
pub mod surface;

pub use callbacks::{Notification, NotificationKind, RectCallbacks};
pub use config::{OverlayConfig, OverlayStyle};
pub use coords::{CoordinateMapper, LocalPosition, SurfaceGeometry, ZoomState};
pub use error::{CallbackError, OverlayError};
pub use geometry::{LogicalRect, NormalizedRect, Point, Size};
pub use handle::{Handle, HitTarget};
pub use instance::{DownOutcome, Mode, OverlayInstance, PointerInput, SelectionMode};
pub use registry::{Effects, OverlayRegistry};
pub use relayout::{Debouncer, Ticket};
pub use scene::{Scene, SceneNode};
pub use surface::OverlaySurface;
