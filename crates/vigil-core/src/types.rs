//! Core types for Vigil

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a mounted widget instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WidgetId(pub Uuid);

impl WidgetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WidgetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Semantic playback state owned by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Unstarted,
    Playing,
    Paused,
    Ended,
}

impl PlaybackState {
    /// Map an embed API state code onto the semantic state.
    ///
    /// Buffering (3) and cued (5) have no semantic counterpart and yield `None`.
    pub fn from_embed_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(PlaybackState::Unstarted),
            0 => Some(PlaybackState::Ended),
            1 => Some(PlaybackState::Playing),
            2 => Some(PlaybackState::Paused),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Unstarted => write!(f, "unstarted"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Ended => write!(f, "ended"),
        }
    }
}

/// Error codes reported by the embed's error callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbedErrorCode {
    InvalidParameter,
    Html5Error,
    NotFound,
    EmbedForbidden,
    Other(i32),
}

impl EmbedErrorCode {
    pub fn from_code(code: i32) -> Self {
        match code {
            2 => EmbedErrorCode::InvalidParameter,
            5 => EmbedErrorCode::Html5Error,
            100 => EmbedErrorCode::NotFound,
            101 | 150 => EmbedErrorCode::EmbedForbidden,
            other => EmbedErrorCode::Other(other),
        }
    }
}

impl std::fmt::Display for EmbedErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbedErrorCode::InvalidParameter => write!(f, "invalid parameter"),
            EmbedErrorCode::Html5Error => write!(f, "HTML5 player error"),
            EmbedErrorCode::NotFound => write!(f, "video not found"),
            EmbedErrorCode::EmbedForbidden => write!(f, "embedding not allowed"),
            EmbedErrorCode::Other(code) => write!(f, "error {}", code),
        }
    }
}

/// Lifecycle events forwarded verbatim from the embed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PlayerEvent {
    Ready,
    StateChange(PlaybackState),
    Error(EmbedErrorCode),
}

/// Playback progress as shown on the scrub bar
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub fraction: f64,
}

impl ProgressSnapshot {
    /// Derive a snapshot from live player readings.
    ///
    /// An unknown duration (warm-up) is treated as 0 with the fraction pinned to 0.
    pub fn from_player(position: f64, duration: f64) -> Self {
        let duration = sanitize_seconds(duration);
        let position = sanitize_seconds(position);
        if duration == 0.0 {
            return Self { position_seconds: position, duration_seconds: 0.0, fraction: 0.0 };
        }
        let position = position.min(duration);
        Self {
            position_seconds: position,
            duration_seconds: duration,
            fraction: position / duration,
        }
    }

    /// Derive a snapshot from a driver-authoritative fraction (during a drag)
    pub fn from_fraction(fraction: f64, duration: f64) -> Self {
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        let duration = sanitize_seconds(duration);
        Self {
            position_seconds: fraction * duration,
            duration_seconds: duration,
            fraction,
        }
    }
}

/// Finite and non-negative, else 0
pub(crate) fn sanitize_seconds(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

/// Outer and inner window dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub outer_width: f64,
    pub outer_height: f64,
    pub inner_width: f64,
    pub inner_height: f64,
}

impl WindowMetrics {
    pub fn new(outer_width: f64, outer_height: f64, inner_width: f64, inner_height: f64) -> Self {
        Self { outer_width, outer_height, inner_width, inner_height }
    }

    /// Outer minus inner, per axis
    pub fn divergence(&self) -> (f64, f64) {
        (self.outer_width - self.inner_width, self.outer_height - self.inner_height)
    }
}

/// A keyboard input with its modifier state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyChord {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyChord {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), ..Default::default() }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Chords conventionally bound to browser inspection tooling:
    /// F12, Ctrl/Cmd+Shift+I/C/J and Ctrl/Cmd+U (view source).
    pub fn is_inspection_chord(&self) -> bool {
        if self.key.eq_ignore_ascii_case("F12") {
            return true;
        }
        let command = self.ctrl || self.meta;
        if !command {
            return false;
        }
        let letter = |c: &str| self.key.eq_ignore_ascii_case(c);
        (self.shift && (letter("I") || letter("C") || letter("J"))) || (!self.shift && letter("U"))
    }
}

/// Whether the host should let the browser handle an input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputDisposition {
    Allow,
    PreventDefault,
}

/// Rendered bounding box of the scrub bar, in the same space as pointer x
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarBounds {
    pub left: f64,
    pub width: f64,
}

impl BarBounds {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }
}
