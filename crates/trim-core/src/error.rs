use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    #[error("No overlay attached for surface: {0}")]
    UnknownSurface(String),

    #[error("Surface element missing: {0}")]
    MissingTarget(String),

    #[error("Overlay draw failed: {0}")]
    DrawFailed(String),

    #[error("Invalid overlay config: {0}")]
    InvalidConfig(String),
}

/// Failure reported by the host's callback channel. Never retried.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Callback '{method}' failed: {message}")]
pub struct CallbackError {
    pub method: &'static str,
    pub message: String,
}

impl CallbackError {
    pub fn new(method: &'static str, message: impl Into<String>) -> Self {
        Self {
            method,
            message: message.into(),
        }
    }
}
