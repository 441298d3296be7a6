//! Vigil WASM - Browser binding for the gated video widget
//!
//! Wires the platform-independent core to the page:
//! - YouTube IFrame API as the embed backend
//! - setTimeout / setInterval / requestAnimationFrame scheduling
//! - localStorage tamper flag, fetch-based logout
//! - DOM controls overlay
//! - Core tracing events forwarded to the browser console
//!
//! ## Usage
//!
//! ```javascript
//! import init, { VigilPlayer, clearTamperFlag } from '@vigil/wasm';
//!
//! await init();
//! const player = new VigilPlayer(document.getElementById('lesson'), {
//!   video_id: 'dQw4w9WgXcQ',
//!   entry_point: '/login',
//! });
//!
//! // after a successful login
//! clearTamperFlag();
//! ```

use wasm_bindgen::prelude::*;

mod embed;
mod host;
mod logging;
mod player;
mod session;
mod storage;
mod surface;

pub use embed::{EmbedSignal, YouTubeEmbed};
pub use host::{BrowserFullscreen, BrowserScheduler, BrowserWindow, LocationNavigator};
pub use logging::ConsoleLayer;
pub use player::{clear_flag, VigilPlayer};
pub use session::FetchSessionBoundary;
pub use storage::LocalStorageFlagStore;
pub use surface::Surface;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::install(tracing_subscriber::filter::LevelFilter::INFO);
    web_sys::console::log_1(&"[Vigil WASM] Initialized".into());
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Best-effort text for a thrown JS value
pub(crate) fn describe(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(message) = js_sys::Reflect::get(value, &"message".into()).ok().and_then(|m| m.as_string()) {
        return message;
    }
    js_sys::JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}
