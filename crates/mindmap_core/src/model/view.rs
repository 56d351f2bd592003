//! Canvas view state (zoom, pan, theme).
//!
//! View state travels with structured documents but is not part of undo
//! history: zooming or panning never creates a snapshot.

use crate::model::node::Point;

/// Theme tag applied when a document does not carry one.
pub const DEFAULT_THEME: &str = "mac-light";
pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub scale: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub theme: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::with_theme(DEFAULT_THEME)
    }
}

impl ViewState {
    pub fn with_theme(theme: impl Into<String>) -> Self {
        Self {
            scale: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            theme: theme.into(),
        }
    }

    /// Multiplies scale by `factor`, clamped to `[MIN_SCALE, MAX_SCALE]`.
    ///
    /// When `anchor` (viewport coordinates) is given, the canvas point under
    /// the anchor stays under it after zooming.
    pub fn zoom(&mut self, factor: f64, anchor: Option<Point>) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if let Some(anchor) = anchor.filter(|point| point.is_finite()) {
            let ratio = new_scale / self.scale;
            self.pan_x = anchor.x - (anchor.x - self.pan_x) * ratio;
            self.pan_y = anchor.y - (anchor.y - self.pan_y) * ratio;
        }
        self.scale = new_scale;
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.pan_x += dx;
            self.pan_y += dy;
        }
    }

    /// Scale back to 1 and pan back to the origin. Theme is kept.
    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.pan_x = 0.0;
        self.pan_y = 0.0;
    }

    /// Converts a viewport-space delta to canvas units.
    pub fn to_canvas_delta(&self, dx: f64, dy: f64) -> (f64, f64) {
        (dx / self.scale, dy / self.scale)
    }
}
