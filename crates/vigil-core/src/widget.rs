//! Secure widget - the mountable unit the host page embeds
//!
//! Composes the tamper guard with the playback controller. The guard is
//! armed before any embed work, so a flag left by an earlier load ends the
//! session without ever constructing a player.

use crate::{
    adapter::{EmbedApi, PlayerAdapter},
    config::WidgetConfig,
    controller::{ControlsView, PlaybackController},
    host::{FlagStore, FullscreenHost, Navigator, Scheduler, SessionBoundary, TimerId, Wakeup, WindowProbe},
    tamper::{GuardHost, TamperGuard, Verdict},
    types::{BarBounds, InputDisposition, KeyChord, PlaybackState, PlayerEvent, WidgetId},
    Result,
};
use std::rc::Rc;
use tracing::{debug, info, instrument};

/// Everything a widget needs from its host
pub struct Collaborators {
    pub embed: Box<dyn EmbedApi>,
    pub scheduler: Rc<dyn Scheduler>,
    pub fullscreen: Box<dyn FullscreenHost>,
    pub store: Box<dyn FlagStore>,
    pub boundary: Box<dyn SessionBoundary>,
    pub navigator: Box<dyn Navigator>,
    pub window: Box<dyn WindowProbe>,
}

/// User-facing commands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Resume,
    TogglePlay,
    Rewind,
    ToggleFullscreen,
    PointerMoved,
    DragStart { x: f64, bounds: BarBounds },
    DragMove { x: f64, bounds: BarBounds },
    DragEnd { x: f64, bounds: BarBounds },
    DragCancel,
}

pub struct SecureWidget {
    id: WidgetId,
    guard: TamperGuard,
    controller: PlaybackController,
    terminated: bool,
    unmounted: bool,
}

impl SecureWidget {
    /// Mount a widget
    #[instrument(skip_all, fields(video = %config.video_id))]
    pub fn mount(config: &WidgetConfig, host: Collaborators) -> Result<Self> {
        config.validate()?;

        let id = WidgetId::new();
        let Collaborators { embed, scheduler, fullscreen, store, boundary, navigator, window } = host;

        let guard = TamperGuard::new(
            config,
            GuardHost { store, boundary, navigator, window, scheduler: scheduler.clone() },
        );
        let adapter = PlayerAdapter::new(embed, config.container_id.clone(), config.video_id.clone());
        let controller = PlaybackController::new(
            adapter,
            scheduler,
            fullscreen,
            config.auto_hide(),
            config.rewind_seconds,
        );

        let mut widget = Self { id, guard, controller, terminated: false, unmounted: false };
        let verdict = widget.guard.arm();
        widget.apply(verdict);
        if !widget.terminated {
            widget.controller.initialize();
        }

        info!(widget = %widget.id, terminated = widget.terminated, "Widget mounted");
        Ok(widget)
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn is_active(&self) -> bool {
        !self.terminated && !self.unmounted
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn guard(&self) -> &TamperGuard {
        &self.guard
    }

    pub fn view(&self) -> ControlsView {
        let mut view = self.controller.view();
        view.terminated = self.terminated;
        if self.terminated {
            view.play_enabled = false;
        }
        view
    }

    fn apply(&mut self, verdict: Verdict) {
        if verdict == Verdict::Terminated && !self.terminated {
            self.terminated = true;
            self.controller.teardown();
            info!(widget = %self.id, "Playback torn down after tamper termination");
        }
    }

    // Embed lifecycle

    pub fn on_embed_api_ready(&mut self) {
        if self.is_active() {
            self.controller.on_api_ready();
        }
    }

    pub fn on_embed_load_failed(&mut self, reason: &str) {
        if self.is_active() {
            self.controller.on_load_failed(reason);
        }
    }

    pub fn on_player_event(&mut self, event: PlayerEvent) {
        if self.is_active() {
            self.controller.on_player_event(event);
        } else {
            debug!(?event, "Player event after teardown ignored");
        }
    }

    /// Deliver a scheduled wakeup
    pub fn wake(&mut self, id: TimerId, wakeup: Wakeup) {
        if self.unmounted {
            return;
        }
        match wakeup {
            Wakeup::HideControls => self.controller.on_hide_timer(id),
            Wakeup::Frame => self.controller.on_frame(id),
            Wakeup::TamperPoll => {
                let verdict = self.guard.on_poll(id);
                self.apply(verdict);
            }
        }
    }

    // User input

    pub fn command(&mut self, command: Command) {
        if !self.is_active() {
            debug!(?command, "Command ignored: widget inactive");
            return;
        }
        let c = &mut self.controller;
        match command {
            Command::Play => {
                c.play();
            }
            Command::Pause => {
                c.pause();
            }
            Command::Resume => {
                c.resume();
            }
            Command::TogglePlay => {
                c.toggle_play();
            }
            Command::Rewind => {
                c.rewind();
            }
            Command::ToggleFullscreen => c.toggle_fullscreen(),
            Command::PointerMoved => c.pointer_moved(),
            Command::DragStart { x, bounds } => c.drag_start(x, bounds),
            Command::DragMove { x, bounds } => c.drag_move(x, bounds),
            Command::DragEnd { x, bounds } => c.drag_end(x, bounds),
            Command::DragCancel => c.drag_cancel(),
        }
    }

    pub fn on_fullscreen_change(&mut self) {
        if self.is_active() {
            self.controller.on_fullscreen_change();
        }
    }

    // Tamper input

    pub fn check_now(&mut self) -> Verdict {
        let verdict = self.guard.check_now();
        self.apply(verdict);
        verdict
    }

    pub fn on_resize(&mut self) -> Verdict {
        let verdict = self.guard.on_resize();
        self.apply(verdict);
        verdict
    }

    pub fn on_key(&mut self, chord: &KeyChord) -> InputDisposition {
        let outcome = self.guard.on_key(chord);
        self.apply(outcome.verdict);
        outcome.disposition
    }

    /// The context menu is always suppressed over the widget
    pub fn on_context_menu(&self) -> InputDisposition {
        InputDisposition::PreventDefault
    }

    // Teardown

    /// Page is unloading normally
    pub fn unload(&mut self) {
        self.guard.on_unload();
    }

    /// Cancel listeners and schedules, release the embed. Safe to repeat.
    pub fn unmount(&mut self) {
        self.guard.disarm();
        self.controller.teardown();
        if !self.unmounted {
            self.unmounted = true;
            info!(widget = %self.id, "Widget unmounted");
        }
    }
}
