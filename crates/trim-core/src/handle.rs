//! Resize handles and pointer hit targets

use crate::geometry::{LogicalRect, Point};

/// One of the 8 resize handles, in compass order starting top-left, clockwise
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    /// North-West corner
    NW = 0,
    /// North edge
    N = 1,
    /// North-East corner
    NE = 2,
    /// East edge
    E = 3,
    /// South-East corner
    SE = 4,
    /// South edge
    S = 5,
    /// South-West corner
    SW = 6,
    /// West edge
    W = 7,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::NW,
        Handle::N,
        Handle::NE,
        Handle::E,
        Handle::SE,
        Handle::S,
        Handle::SW,
        Handle::W,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn moves_left(self) -> bool {
        matches!(self, Handle::NW | Handle::W | Handle::SW)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, Handle::NE | Handle::E | Handle::SE)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, Handle::NW | Handle::N | Handle::NE)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, Handle::SW | Handle::S | Handle::SE)
    }

    pub fn is_corner(self) -> bool {
        matches!(self, Handle::NW | Handle::NE | Handle::SE | Handle::SW)
    }

    /// Centre of this handle on the given rectangle
    pub fn anchor(self, rect: &LogicalRect) -> Point {
        let c = rect.center();
        let x = if self.moves_left() {
            rect.left()
        } else if self.moves_right() {
            rect.right()
        } else {
            c.x
        };
        let y = if self.moves_top() {
            rect.top()
        } else if self.moves_bottom() {
            rect.bottom()
        } else {
            c.y
        };
        Point::new(x, y)
    }

    /// CSS cursor shown over the handle
    pub fn cursor(self) -> &'static str {
        match self {
            Handle::NW | Handle::SE => "nwse-resize",
            Handle::NE | Handle::SW => "nesw-resize",
            Handle::N | Handle::S => "ns-resize",
            Handle::E | Handle::W => "ew-resize",
        }
    }

    /// Handle reached by mirroring across the vertical and/or horizontal axis.
    ///
    /// Used to report which handle is effectively being dragged after the
    /// pointer crossed the opposite edge.
    pub fn flipped(self, flip_x: bool, flip_y: bool) -> Self {
        let h = if flip_x {
            match self {
                Handle::NW => Handle::NE,
                Handle::NE => Handle::NW,
                Handle::W => Handle::E,
                Handle::E => Handle::W,
                Handle::SW => Handle::SE,
                Handle::SE => Handle::SW,
                other => other,
            }
        } else {
            self
        };
        if flip_y {
            match h {
                Handle::NW => Handle::SW,
                Handle::SW => Handle::NW,
                Handle::N => Handle::S,
                Handle::S => Handle::N,
                Handle::NE => Handle::SE,
                Handle::SE => Handle::NE,
                other => other,
            }
        } else {
            h
        }
    }
}

/// Classification of what a pointer-down landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Handle(Handle),
    Body,
    Delete,
    Empty,
}

impl HitTarget {
    /// Parse the hit-region tags written by the renderer onto scene nodes
    pub fn from_tags(handle: Option<&str>, is_body: bool, is_delete: bool) -> Self {
        if is_delete {
            return HitTarget::Delete;
        }
        if let Some(handle) = handle
            .and_then(|s| s.trim().parse::<u8>().ok())
            .and_then(Handle::from_index)
        {
            return HitTarget::Handle(handle);
        }
        if is_body {
            HitTarget::Body
        } else {
            HitTarget::Empty
        }
    }
}
