//! Host seams
//!
//! Everything the core needs from its surroundings goes through one of these
//! traits. The browser binding implements them over web-sys; [`crate::sim`]
//! implements them in memory for tests and scenario replay.
//!
//! The execution model is single-threaded, so none of these are `Send`.

use crate::{types::WindowMetrics, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Handle to a scheduled wakeup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(pub u64);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a delivered wakeup is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wakeup {
    HideControls,
    TamperPoll,
    Frame,
}

/// Timer, interval and animation-frame scheduling.
///
/// The host delivers each wakeup back through
/// [`SecureWidget::wake`](crate::widget::SecureWidget::wake) with the id it
/// handed out. Cancelling an id that already fired or was never issued is a
/// no-op.
pub trait Scheduler {
    /// One-shot wakeup after `delay`
    fn schedule(&self, wakeup: Wakeup, delay: Duration) -> TimerId;

    /// Repeating wakeup every `period` until cancelled
    fn repeat(&self, wakeup: Wakeup, period: Duration) -> TimerId;

    /// [`Wakeup::Frame`] on the next animation frame
    fn next_frame(&self) -> TimerId;

    fn cancel(&self, id: TimerId);
}

/// Platform fullscreen for the widget's container element
pub trait FullscreenHost {
    /// True when the document's fullscreen element is the container
    fn is_fullscreen(&self) -> bool;
    fn request(&self) -> Result<()>;
    fn exit(&self) -> Result<()>;
}

/// Durable client-local key/value storage (survives reloads)
pub trait FlagStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// The authentication service, as seen from the widget
pub trait SessionBoundary {
    /// Best-effort logout. Returns immediately; outcome is not reported.
    fn logout(&self);
}

/// Page navigation
pub trait Navigator {
    fn navigate(&self, url: &str);
}

/// Window geometry readings
pub trait WindowProbe {
    fn metrics(&self) -> WindowMetrics;
}
