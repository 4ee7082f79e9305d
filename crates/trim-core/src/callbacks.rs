//! Host notification channel
//!
//! The state machine never calls the host while it is mutating state.
//! Instead it returns [`Notification`]s which the caller delivers once the
//! registry is no longer borrowed, so a host that re-enters (for example
//! calling `render` from inside `commitRect`) sees consistent state.

use crate::error::CallbackError;
use crate::geometry::NormalizedRect;

/// Commit/clear notifier implemented by the host framework
pub trait RectCallbacks {
    /// A gesture finished with a non-degenerate rectangle
    fn commit_rect(&self, rect: NormalizedRect) -> Result<(), CallbackError>;

    /// The rectangle was explicitly deleted
    fn clear_rect(&self) -> Result<(), CallbackError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotificationKind {
    Commit(NormalizedRect),
    Clear,
}

/// A pending host call, bound to the channel of the instance that produced it
#[derive(Debug, Clone)]
pub struct Notification<C> {
    pub surface_id: String,
    pub channel: C,
    pub kind: NotificationKind,
}

impl<C: RectCallbacks> Notification<C> {
    /// Invoke the host. Failures are logged and swallowed, never retried.
    pub fn deliver(self) -> bool {
        let result = match self.kind {
            NotificationKind::Commit(rect) => self.channel.commit_rect(rect),
            NotificationKind::Clear => self.channel.clear_rect(),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(surface = %self.surface_id, "{}", e);
                false
            }
        }
    }
}
