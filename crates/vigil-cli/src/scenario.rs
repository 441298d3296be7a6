//! Scenario replay through the core with the simulated host

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vigil_core::{
    sim::SimHost, BarBounds, Command, ControlsView, KeyChord, PlaybackState, PlayerEvent,
    SecureWidget, WidgetConfig, WindowMetrics,
};

/// A scripted sequence of widget inputs
#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: WidgetConfig,
    /// Video duration reported by the simulated embed
    #[serde(default)]
    pub duration: f64,
    #[serde(default = "default_bar")]
    pub bar: BarBounds,
    #[serde(default)]
    pub window: Option<WindowMetrics>,
    /// Start with the tamper flag left by a previous load
    #[serde(default)]
    pub persisted_flag: bool,
    #[serde(default = "default_true")]
    pub api_ready: bool,
    pub steps: Vec<Step>,
}

fn default_bar() -> BarBounds {
    BarBounds::new(0.0, 1000.0)
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    ApiReady,
    LoadFailed { reason: String },
    Ready,
    Embed { state: PlaybackState },
    Play,
    Pause,
    Resume,
    TogglePlay,
    Rewind,
    Fullscreen,
    PointerMove,
    DragStart { x: f64 },
    DragMove { x: f64 },
    DragEnd { x: f64 },
    DragCancel,
    Advance { ms: u64 },
    SetTime { seconds: f64 },
    Window(WindowMetrics),
    Key(KeyChord),
    Unload,
    Unmount,
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::ApiReady => "api_ready",
            Step::LoadFailed { .. } => "load_failed",
            Step::Ready => "ready",
            Step::Embed { .. } => "embed",
            Step::Play => "play",
            Step::Pause => "pause",
            Step::Resume => "resume",
            Step::TogglePlay => "toggle_play",
            Step::Rewind => "rewind",
            Step::Fullscreen => "fullscreen",
            Step::PointerMove => "pointer_move",
            Step::DragStart { .. } => "drag_start",
            Step::DragMove { .. } => "drag_move",
            Step::DragEnd { .. } => "drag_end",
            Step::DragCancel => "drag_cancel",
            Step::Advance { .. } => "advance",
            Step::SetTime { .. } => "set_time",
            Step::Window(_) => "window",
            Step::Key(_) => "key",
            Step::Unload => "unload",
            Step::Unmount => "unmount",
        }
    }
}

/// Widget view after one step
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub step: usize,
    pub op: &'static str,
    pub at_ms: u64,
    pub view: ControlsView,
    pub logouts: u32,
    pub navigated: Vec<String>,
}

impl Scenario {
    pub fn run(self) -> anyhow::Result<Vec<Frame>> {
        let host = SimHost::new();
        host.embed.set_duration(self.duration);
        host.embed.set_api_ready(self.api_ready);
        if let Some(metrics) = self.window {
            host.window.set(metrics);
        }
        let mut config = self.config;
        if config.video_id.is_empty() {
            config.video_id = "scenario".to_string();
        }
        if self.persisted_flag {
            host.store.insert(&config.tamper_flag_key, "true");
        }

        let mut widget = SecureWidget::mount(&config, host.collaborators())?;
        let bounds = self.bar;
        let mut frames = Vec::with_capacity(self.steps.len());

        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Step::ApiReady => {
                    host.embed.set_api_ready(true);
                    widget.on_embed_api_ready();
                }
                Step::LoadFailed { reason } => widget.on_embed_load_failed(reason),
                Step::Ready => widget.on_player_event(PlayerEvent::Ready),
                Step::Embed { state } => widget.on_player_event(PlayerEvent::StateChange(*state)),
                Step::Play => widget.command(Command::Play),
                Step::Pause => widget.command(Command::Pause),
                Step::Resume => widget.command(Command::Resume),
                Step::TogglePlay => widget.command(Command::TogglePlay),
                Step::Rewind => widget.command(Command::Rewind),
                Step::Fullscreen => widget.command(Command::ToggleFullscreen),
                Step::PointerMove => widget.command(Command::PointerMoved),
                Step::DragStart { x } => widget.command(Command::DragStart { x: *x, bounds }),
                Step::DragMove { x } => widget.command(Command::DragMove { x: *x, bounds }),
                Step::DragEnd { x } => widget.command(Command::DragEnd { x: *x, bounds }),
                Step::DragCancel => widget.command(Command::DragCancel),
                Step::Advance { ms } => host.advance(&mut widget, Duration::from_millis(*ms)),
                Step::SetTime { seconds } => host.embed.set_current_time(*seconds),
                Step::Window(metrics) => {
                    host.window.set(*metrics);
                    widget.on_resize();
                }
                Step::Key(chord) => {
                    widget.on_key(chord);
                }
                Step::Unload => widget.unload(),
                Step::Unmount => widget.unmount(),
            }

            frames.push(Frame {
                step: i + 1,
                op: step.name(),
                at_ms: host.scheduler.now().as_millis() as u64,
                view: widget.view(),
                logouts: host.boundary.logouts(),
                navigated: host.navigator.visited(),
            });
        }

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"{
        "duration": 125,
        "config": {"entry_point": "/login"},
        "steps": [
            {"op": "ready"},
            {"op": "toggle_play"},
            {"op": "set_time", "seconds": 30},
            {"op": "advance", "ms": 2500},
            {"op": "drag_start", "x": 500},
            {"op": "drag_end", "x": 500},
            {"op": "key", "key": "F12"},
            {"op": "toggle_play"}
        ]
    }"#;

    #[test]
    fn test_scenario_replay() {
        let scenario: Scenario = serde_json::from_str(SCENARIO).unwrap();
        let frames = scenario.run().unwrap();
        assert_eq!(frames.len(), 8);

        assert_eq!(frames[1].view.state, PlaybackState::Playing);
        assert!(!frames[3].view.controls_visible);
        assert_eq!(frames[3].view.elapsed, "0:30");
        assert_eq!(frames[3].at_ms, 2500);
        assert_eq!(frames[5].view.fraction, 0.5);

        let last = frames.last().unwrap();
        assert!(last.view.terminated);
        assert_eq!(last.logouts, 1);
        assert_eq!(last.navigated, vec!["/login".to_string()]);
    }

    #[test]
    fn test_bundled_scenario_terminates_on_divergence() {
        let raw = include_str!("../scenarios/playback_and_tamper.json");
        let scenario: Scenario = serde_json::from_str(raw).unwrap();
        let frames = scenario.run().unwrap();
        assert_eq!(frames.len(), 19);

        // Play before the embed is ready does nothing
        assert_eq!(frames[0].view.state, PlaybackState::Unstarted);
        assert_eq!(frames[10].view.fraction, 0.5);

        let window = &frames[16];
        assert_eq!(window.op, "window");
        assert!(window.view.terminated);
        assert!(!frames[15].view.terminated);

        let last = frames.last().unwrap();
        assert!(last.view.terminated);
        assert!(!last.view.play_enabled);
        assert_eq!(last.logouts, 1);
        assert_eq!(last.navigated, vec!["/login".to_string()]);
    }

    #[test]
    fn test_window_step_parses_flat() {
        let step: Step = serde_json::from_str(
            r#"{"op": "window", "outer_width": 1280, "outer_height": 800, "inner_width": 1000, "inner_height": 800}"#,
        )
        .unwrap();
        assert!(matches!(step, Step::Window(m) if m.inner_width == 1000.0));
    }
}
