//! Overlay configuration
//!
//! Every field has a default so hosts can pass a partial JSON object
//! (or nothing at all).

use crate::error::OverlayError;
use serde::{Deserialize, Serialize};

/// Interaction and layout tuning for all overlays owned by one registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Distance in logical pixels a pointer must travel before a press on
    /// empty space becomes a draw (default: 8)
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold: f64,
    /// Smallest width/height a resize may produce, in logical pixels (default: 1)
    #[serde(default = "default_min_size")]
    pub min_size: f64,
    /// Debounce delay for window resize/scroll fan-out (default: 120)
    #[serde(default = "default_relayout_debounce_ms")]
    pub relayout_debounce_ms: u32,
    /// Visual styling of the overlay scene
    #[serde(default)]
    pub style: OverlayStyle,
}

fn default_drag_threshold() -> f64 {
    8.0
}

fn default_min_size() -> f64 {
    1.0
}

fn default_relayout_debounce_ms() -> u32 {
    120
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            drag_threshold: default_drag_threshold(),
            min_size: default_min_size(),
            relayout_debounce_ms: default_relayout_debounce_ms(),
            style: OverlayStyle::default(),
        }
    }
}

impl OverlayConfig {
    /// Parse configuration from a JSON string and validate it
    ///
    /// # Errors
    ///
    /// Returns `OverlayError::InvalidConfig` if the JSON is malformed or a
    /// value is out of range
    pub fn from_json(s: &str) -> Result<Self, OverlayError> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| OverlayError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject non-finite or negative tuning values
    pub fn validate(&self) -> Result<(), OverlayError> {
        check_non_negative("drag_threshold", self.drag_threshold)?;
        check_positive("min_size", self.min_size)?;
        self.style.validate()
    }
}

/// Colours and sizes used by the overlay renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub accent: String,
    pub fill: String,
    pub stroke_width: f64,
    pub selected_stroke_width: f64,
    pub handle_size: f64,
    pub delete_size: f64,
    /// Gap between the rectangle's top-right corner and the delete button
    pub delete_offset: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            accent: "#2563eb".to_string(),
            fill: "rgba(37, 99, 235, 0.15)".to_string(),
            stroke_width: 1.5,
            selected_stroke_width: 3.0,
            handle_size: 8.0,
            delete_size: 18.0,
            delete_offset: 6.0,
        }
    }
}

impl OverlayStyle {
    fn validate(&self) -> Result<(), OverlayError> {
        check_positive("style.stroke_width", self.stroke_width)?;
        check_positive("style.selected_stroke_width", self.selected_stroke_width)?;
        check_positive("style.handle_size", self.handle_size)?;
        check_positive("style.delete_size", self.delete_size)?;
        check_non_negative("style.delete_offset", self.delete_offset)
    }
}

fn check_positive(name: &str, v: f64) -> Result<(), OverlayError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(OverlayError::InvalidConfig(format!(
            "{} must be a positive number, got {}",
            name, v
        )))
    }
}

fn check_non_negative(name: &str, v: f64) -> Result<(), OverlayError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(OverlayError::InvalidConfig(format!(
            "{} must be zero or positive, got {}",
            name, v
        )))
    }
}
