//! Vigil Core - controller for a gated video widget
//!
//! This crate provides the platform-independent heart of the widget:
//! - Embed adapter over the third-party player API
//! - Playback state machine with control auto-hide and progress polling
//! - Scrub bar with drag-to-seek
//! - Tamper guard that can terminate the surrounding session
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        SecureWidget                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │   ┌──────────────┐        ┌───────────────────────────┐      │
//! │   │ TamperGuard  │        │    PlaybackController     │      │
//! │   │              │        │  ┌──────────┐ ┌────────┐  │      │
//! │   │  poll/resize │        │  │ ScrubBar │ │Adapter │  │      │
//! │   │  key chords  │        │  └──────────┘ └───┬────┘  │      │
//! │   └──────┬───────┘        └───────────────────┼───────┘      │
//! │          │                                    │              │
//! ├──────────┼────────────────────────────────────┼──────────────┤
//! │  FlagStore · SessionBoundary · Navigator   EmbedApi          │
//! │  WindowProbe · Scheduler · FullscreenHost   (host seams)     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Hosts implement the traits in [`host`] and [`adapter`]; [`sim`] provides
//! in-memory versions.

pub mod error;
pub mod types;
pub mod config;
pub mod host;
pub mod adapter;
pub mod scrub;
pub mod controller;
pub mod tamper;
pub mod widget;
pub mod session;
pub mod sim;

pub use error::{Error, Result};
pub use types::*;
pub use config::WidgetConfig;
pub use host::{FlagStore, FullscreenHost, Navigator, Scheduler, SessionBoundary, TimerId, Wakeup, WindowProbe};
pub use adapter::{EmbedApi, EmbedInstance, PlayerAdapter, EMBED_SCRIPT_ID, EMBED_SCRIPT_SRC};
pub use scrub::{format_time, ScrubBar, SeekRequest};
pub use controller::{ControlsView, ControlsVisibility, PlaybackController};
pub use tamper::{clear_tamper_flag, TamperGuard, TamperReason, Verdict};
pub use widget::{Collaborators, Command, SecureWidget};
pub use session::{Credentials, MessageBody, ProtectedBody, SessionUser};
#[cfg(feature = "http")]
pub use session::{HttpSessionBoundary, SessionApi};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log library initialisation
pub fn init() {
    tracing::info!(version = VERSION, "Vigil Core initialized");
}
