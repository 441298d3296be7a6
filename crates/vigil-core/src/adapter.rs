//! Embedded player adapter
//!
//! Thin facade over the third-party embed API. Owns the only handle to the
//! media element and turns every failure into "command has no effect".

use crate::{types::sanitize_seconds, Error, Result};
use tracing::{debug, info, warn};

/// Fixed DOM id of the injected embed script
pub const EMBED_SCRIPT_ID: &str = "youtube-iframe-api";

/// Embed script source
pub const EMBED_SCRIPT_SRC: &str = "https://www.youtube.com/iframe_api";

/// Entry points of the embed API
pub trait EmbedApi {
    /// Whether a script element with `element_id` already exists
    fn script_present(&self, element_id: &str) -> bool;

    fn inject_script(&self, element_id: &str, src: &str) -> Result<()>;

    /// Whether the loaded script has finished initialising its API
    fn api_ready(&self) -> bool;

    /// Construct the player bound to `container_id`.
    ///
    /// Lifecycle events of the new instance are delivered by the host, not
    /// returned from here.
    fn construct(&self, container_id: &str, video_id: &str) -> Result<Box<dyn EmbedInstance>>;
}

/// A constructed embed player
pub trait EmbedInstance {
    fn play(&self);
    fn pause(&self);
    fn seek(&self, seconds: f64, allow_seek_ahead: bool);
    fn current_time(&self) -> Option<f64>;
    fn duration(&self) -> Option<f64>;
    fn destroy(&self);
}

enum Phase {
    Idle,
    AwaitingApi,
    Live(Box<dyn EmbedInstance>),
    Failed,
    Destroyed,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::AwaitingApi => "awaiting_api",
            Phase::Live(_) => "live",
            Phase::Failed => "failed",
            Phase::Destroyed => "destroyed",
        }
    }
}

/// Adapter over one embed player instance
pub struct PlayerAdapter {
    api: Box<dyn EmbedApi>,
    container_id: String,
    video_id: String,
    phase: Phase,
    ready: bool,
}

impl PlayerAdapter {
    pub fn new(api: Box<dyn EmbedApi>, container_id: impl Into<String>, video_id: impl Into<String>) -> Self {
        Self {
            api,
            container_id: container_id.into(),
            video_id: video_id.into(),
            phase: Phase::Idle,
            ready: false,
        }
    }

    /// Ensure the embed script is present and construct the player as soon
    /// as the API allows. Readiness arrives later as a lifecycle event.
    pub fn initialize(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            debug!(phase = self.phase.name(), "Adapter already initialized");
            return;
        }

        if !self.api.script_present(EMBED_SCRIPT_ID) {
            if let Err(e) = self.api.inject_script(EMBED_SCRIPT_ID, EMBED_SCRIPT_SRC) {
                self.fail(e);
                return;
            }
            debug!(src = EMBED_SCRIPT_SRC, "Embed script injected");
        }

        self.phase = Phase::AwaitingApi;
        if self.api.api_ready() {
            self.on_api_ready();
        }
    }

    /// The embed API finished loading
    pub fn on_api_ready(&mut self) {
        if !matches!(self.phase, Phase::AwaitingApi) {
            return;
        }
        match self.api.construct(&self.container_id, &self.video_id) {
            Ok(instance) => {
                info!(container = %self.container_id, video = %self.video_id, "Embed player constructed");
                self.phase = Phase::Live(instance);
            }
            Err(e) => self.fail(e),
        }
    }

    /// Script load failure reported asynchronously by the host
    pub fn on_load_failed(&mut self, reason: impl Into<String>) {
        if matches!(self.phase, Phase::Idle | Phase::AwaitingApi) {
            self.fail(Error::EmbedLoad(reason.into()));
        }
    }

    fn fail(&mut self, error: Error) {
        warn!(
            code = error.error_code(),
            recoverable = error.is_recoverable(),
            error = %error,
            "Embed unavailable; widget stays disabled"
        );
        self.phase = Phase::Failed;
        self.ready = false;
    }

    /// Record the embed's ready event
    pub fn mark_ready(&mut self) {
        if matches!(self.phase, Phase::Live(_)) {
            self.ready = true;
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready && matches!(self.phase, Phase::Live(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.phase, Phase::Failed)
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self.phase, Phase::Destroyed)
    }

    fn instance(&self) -> Option<&dyn EmbedInstance> {
        match &self.phase {
            Phase::Live(instance) => Some(instance.as_ref()),
            _ => None,
        }
    }

    pub fn play(&self) {
        match self.instance() {
            Some(p) => p.play(),
            None => debug!("play ignored: {}", Error::AdapterNotReady),
        }
    }

    pub fn pause(&self) {
        match self.instance() {
            Some(p) => p.pause(),
            None => debug!("pause ignored: {}", Error::AdapterNotReady),
        }
    }

    pub fn seek(&self, seconds: f64, allow_seek_ahead: bool) {
        match self.instance() {
            Some(p) => p.seek(sanitize_seconds(seconds), allow_seek_ahead),
            None => debug!(seconds, "seek ignored: {}", Error::AdapterNotReady),
        }
    }

    pub fn current_time(&self) -> Option<f64> {
        self.instance()?.current_time().filter(|t| t.is_finite())
    }

    pub fn duration(&self) -> Option<f64> {
        self.instance()?.duration().filter(|d| d.is_finite())
    }

    /// Release the embed instance. Repeated calls are no-ops.
    pub fn destroy(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Destroyed) {
            Phase::Live(instance) => {
                instance.destroy();
                info!("Embed player destroyed");
            }
            Phase::Destroyed => {}
            other => debug!(phase = other.name(), "Adapter destroyed before construction"),
        }
        self.ready = false;
    }
}

impl Drop for PlayerAdapter {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ScriptedEmbed;

    fn adapter(embed: &ScriptedEmbed) -> PlayerAdapter {
        PlayerAdapter::new(Box::new(embed.clone()), "player", "vid")
    }

    #[test]
    fn test_script_injected_once() {
        let embed = ScriptedEmbed::new();
        let mut first = adapter(&embed);
        first.initialize();
        let mut second = adapter(&embed);
        second.initialize();

        assert_eq!(embed.scripts_injected(), 1);
        assert_eq!(embed.constructed(), 2);
    }

    #[test]
    fn test_construction_waits_for_api() {
        let embed = ScriptedEmbed::new().with_api_ready(false);
        let mut adapter = adapter(&embed);
        adapter.initialize();
        assert_eq!(embed.constructed(), 0);

        adapter.on_api_ready();
        assert_eq!(embed.constructed(), 1);
        adapter.mark_ready();
        assert!(adapter.is_ready());
    }

    #[test]
    fn test_commands_before_construction_are_ignored() {
        let embed = ScriptedEmbed::new().with_api_ready(false);
        let mut adapter = adapter(&embed);
        adapter.initialize();

        adapter.play();
        adapter.pause();
        adapter.seek(12.0, true);
        assert_eq!(adapter.current_time(), None);
        assert_eq!(embed.plays(), 0);
        assert!(embed.seeks().is_empty());
    }

    #[test]
    fn test_construct_failure_is_permanent() {
        let embed = ScriptedEmbed::new().with_construct_failure();
        let mut adapter = adapter(&embed);
        adapter.initialize();
        adapter.mark_ready();

        assert!(adapter.is_failed());
        assert!(!adapter.is_ready());
        adapter.on_api_ready();
        assert_eq!(embed.constructed(), 0);
    }

    #[test]
    fn test_load_failure() {
        let embed = ScriptedEmbed::new().with_api_ready(false);
        let mut adapter = adapter(&embed);
        adapter.initialize();
        adapter.on_load_failed("script blocked");
        adapter.on_api_ready();

        assert!(adapter.is_failed());
        assert_eq!(embed.constructed(), 0);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let embed = ScriptedEmbed::new();
        let mut adapter = adapter(&embed);
        adapter.initialize();
        adapter.destroy();
        adapter.destroy();
        drop(adapter);

        assert_eq!(embed.destroyed(), 1);
    }

    #[test]
    fn test_non_finite_readings_dropped() {
        let embed = ScriptedEmbed::new();
        embed.set_duration(f64::NAN);
        let mut adapter = adapter(&embed);
        adapter.initialize();
        assert_eq!(adapter.duration(), None);
    }
}
