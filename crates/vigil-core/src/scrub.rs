//! Scrub bar - drag-to-seek and progress rendering
//!
//! During a drag the pointer owns the fraction; the live player is ignored
//! until release, when exactly one seek is issued.

use crate::types::{sanitize_seconds, BarBounds};

/// A seek issued at the end of a drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekRequest {
    pub seconds: f64,
    pub allow_seek_ahead: bool,
}

/// Drag state of the progress bar
#[derive(Debug, Clone, Default)]
pub struct ScrubBar {
    dragging: bool,
    fraction: f64,
}

impl ScrubBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Fraction under the pointer during the current drag
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Enter drag mode and display the pointer position. Never seeks.
    pub fn drag_start(&mut self, pointer_x: f64, bounds: BarBounds) -> f64 {
        self.dragging = true;
        self.fraction = fraction_at(pointer_x, bounds);
        self.fraction
    }

    /// Update the displayed fraction. `None` outside a drag.
    pub fn drag_move(&mut self, pointer_x: f64, bounds: BarBounds) -> Option<f64> {
        if !self.dragging {
            return None;
        }
        self.fraction = fraction_at(pointer_x, bounds);
        Some(self.fraction)
    }

    /// Leave drag mode. Yields the seek to issue, or `None` when the drag
    /// never started or the duration is not yet known.
    pub fn drag_end(&mut self, pointer_x: f64, bounds: BarBounds, duration: f64) -> Option<SeekRequest> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        self.fraction = fraction_at(pointer_x, bounds);

        let duration = sanitize_seconds(duration);
        if duration == 0.0 {
            return None;
        }
        Some(SeekRequest { seconds: self.fraction * duration, allow_seek_ahead: true })
    }

    /// Abandon a drag without seeking
    pub fn cancel(&mut self) {
        self.dragging = false;
    }
}

/// `clamp((x - left) / width, 0, 1)`; a degenerate bar maps to 0
pub fn fraction_at(pointer_x: f64, bounds: BarBounds) -> f64 {
    if !(bounds.width.is_finite() && bounds.width > 0.0) || !pointer_x.is_finite() {
        return 0.0;
    }
    ((pointer_x - bounds.left) / bounds.width).clamp(0.0, 1.0)
}

/// Fill width and thumb offset, in percent of the bar
pub fn bar_percent(fraction: f64) -> f64 {
    if fraction.is_finite() {
        fraction.clamp(0.0, 1.0) * 100.0
    } else {
        0.0
    }
}

/// Format seconds as `M:SS`. Non-finite or negative input renders `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
