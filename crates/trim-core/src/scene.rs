//! Vector scene for the trim overlay
//!
//! The scene is a flat, back-to-front list of nodes sized to the base
//! surface's logical dimensions. Hosts translate it into SVG (or anything
//! else) and tag each node so pointer targets can be classified with
//! `HitTarget::from_tags`.

use crate::config::OverlayStyle;
use crate::geometry::{LogicalRect, Size};
use crate::handle::Handle;

#[derive(Debug, Clone, PartialEq)]
pub enum SceneNode {
    /// Filled and stroked rectangle body
    Body {
        rect: LogicalRect,
        fill: String,
        stroke: String,
        stroke_width: f64,
    },
    /// Square resize handle centred on a corner or edge midpoint
    Handle {
        handle: Handle,
        rect: LogicalRect,
        color: String,
    },
    /// Delete affordance, only present while selected
    Delete { rect: LogicalRect, color: String },
}

impl SceneNode {
    pub fn bounds(&self) -> &LogicalRect {
        match self {
            SceneNode::Body { rect, .. } => rect,
            SceneNode::Handle { rect, .. } => rect,
            SceneNode::Delete { rect, .. } => rect,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub size: Size,
    pub nodes: Vec<SceneNode>,
    /// Whether the layer should receive pointer events at all
    pub intercepts_pointer: bool,
}

impl Scene {
    /// Cleared overlay that lets every pointer event through
    pub fn empty(size: Size) -> Self {
        Self {
            size,
            nodes: Vec::new(),
            intercepts_pointer: false,
        }
    }

    /// Build the scene for an optional rectangle.
    ///
    /// The rectangle must already be clamped and non-negative.
    pub fn build(size: Size, rect: Option<&LogicalRect>, selected: bool, style: &OverlayStyle) -> Self {
        let Some(rect) = rect else {
            return Self::empty(size);
        };

        let stroke_width = if selected {
            style.selected_stroke_width
        } else {
            style.stroke_width
        };
        let mut nodes = Vec::with_capacity(10);
        nodes.push(SceneNode::Body {
            rect: *rect,
            fill: style.fill.clone(),
            stroke: style.accent.clone(),
            stroke_width,
        });

        let hs = style.handle_size;
        for handle in Handle::ALL {
            let anchor = handle.anchor(rect);
            nodes.push(SceneNode::Handle {
                handle,
                rect: LogicalRect::new(anchor.x - hs / 2.0, anchor.y - hs / 2.0, hs, hs),
                color: style.accent.clone(),
            });
        }

        if selected {
            nodes.push(SceneNode::Delete {
                rect: delete_button_rect(size, rect, style),
                color: style.accent.clone(),
            });
        }

        Self {
            size,
            nodes,
            intercepts_pointer: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn has_delete(&self) -> bool {
        self.nodes.iter().any(|n| matches!(n, SceneNode::Delete { .. }))
    }
}

/// Square placed just outside the top-right corner, kept inside the overlay
fn delete_button_rect(size: Size, rect: &LogicalRect, style: &OverlayStyle) -> LogicalRect {
    let s = style.delete_size;
    let x = rect.right() + style.delete_offset;
    let y = rect.top() - style.delete_offset - s;
    LogicalRect::new(
        x.clamp(0.0, (size.width - s).max(0.0)),
        y.clamp(0.0, (size.height - s).max(0.0)),
        s,
        s,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn style() -> OverlayStyle {
        OverlayStyle::default()
    }

    #[test]
    fn test_empty_scene_passes_pointer_through() {
        let scene = Scene::build(Size::new(400.0, 300.0), None, true, &style());
        assert!(scene.is_empty());
        assert!(!scene.intercepts_pointer);
        assert_eq!(scene, Scene::empty(Size::new(400.0, 300.0)));
    }

    #[test]
    fn test_unselected_scene_has_body_and_handles() {
        let rect = LogicalRect::new(40.0, 30.0, 80.0, 60.0);
        let scene = Scene::build(Size::new(400.0, 300.0), Some(&rect), false, &style());
        assert_eq!(scene.nodes.len(), 9);
        assert!(scene.intercepts_pointer);
        assert!(!scene.has_delete());
        match &scene.nodes[0] {
            SceneNode::Body { stroke_width, .. } => assert_eq!(*stroke_width, 1.5),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_selected_scene_has_thicker_stroke_and_delete() {
        let rect = LogicalRect::new(40.0, 30.0, 80.0, 60.0);
        let scene = Scene::build(Size::new(400.0, 300.0), Some(&rect), true, &style());
        assert_eq!(scene.nodes.len(), 10);
        assert!(scene.has_delete());
        match &scene.nodes[0] {
            SceneNode::Body { stroke_width, .. } => assert_eq!(*stroke_width, 3.0),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_delete_button_outside_top_right() {
        let rect = LogicalRect::new(40.0, 100.0, 80.0, 60.0);
        let scene = Scene::build(Size::new(400.0, 300.0), Some(&rect), true, &style());
        let delete = scene.nodes.last().unwrap().bounds();
        assert_eq!(delete.x, 126.0);
        assert_eq!(delete.y, 76.0);
    }

    #[test]
    fn test_delete_button_clamped_into_bounds() {
        let rect = LogicalRect::new(300.0, 0.0, 100.0, 60.0);
        let scene = Scene::build(Size::new(400.0, 300.0), Some(&rect), true, &style());
        let delete = scene.nodes.last().unwrap().bounds();
        assert_eq!(delete.x, 382.0);
        assert_eq!(delete.y, 0.0);
    }
}
