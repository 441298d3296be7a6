//! Playback controller - the widget's state machine
//!
//! Coordinates:
//! - Embed lifecycle events and user transport commands
//! - Control auto-hide while playing
//! - Per-frame progress polling
//! - Scrub bar drags routed to the adapter
//!
//! Every transition runs to completion before the next input is delivered,
//! so the controller's own state needs no locking.

use crate::{
    adapter::PlayerAdapter,
    host::{FullscreenHost, Scheduler, TimerId},
    scrub::{bar_percent, format_time, ScrubBar},
    types::{sanitize_seconds, BarBounds, PlaybackState, PlayerEvent, ProgressSnapshot},
};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Control visibility plus its pending hide deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlsVisibility {
    pub visible: bool,
    pub hide_timer: Option<TimerId>,
}

impl Default for ControlsVisibility {
    fn default() -> Self {
        Self { visible: true, hide_timer: None }
    }
}

/// Render model of the control surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlsView {
    pub state: PlaybackState,
    pub ready: bool,
    pub play_enabled: bool,
    pub play_label: String,
    pub controls_visible: bool,
    pub fullscreen: bool,
    pub dragging: bool,
    pub fraction: f64,
    pub fill_percent: f64,
    pub elapsed: String,
    pub total: String,
    pub terminated: bool,
}

/// Controller for one embed player
pub struct PlaybackController {
    adapter: PlayerAdapter,
    scheduler: Rc<dyn Scheduler>,
    fullscreen: Box<dyn FullscreenHost>,
    state: PlaybackState,
    controls: ControlsVisibility,
    frame: Option<TimerId>,
    progress: ProgressSnapshot,
    scrub: ScrubBar,
    fullscreen_on: bool,
    auto_hide: Duration,
    rewind_step: f64,
}

impl PlaybackController {
    pub fn new(
        adapter: PlayerAdapter,
        scheduler: Rc<dyn Scheduler>,
        fullscreen: Box<dyn FullscreenHost>,
        auto_hide: Duration,
        rewind_step: f64,
    ) -> Self {
        let fullscreen_on = fullscreen.is_fullscreen();
        Self {
            adapter,
            scheduler,
            fullscreen,
            state: PlaybackState::Unstarted,
            controls: ControlsVisibility::default(),
            frame: None,
            progress: ProgressSnapshot::default(),
            scrub: ScrubBar::new(),
            fullscreen_on,
            auto_hide,
            rewind_step,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn controls(&self) -> ControlsVisibility {
        self.controls
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.progress
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen_on
    }

    pub fn is_ready(&self) -> bool {
        self.adapter.is_ready()
    }

    pub fn is_polling(&self) -> bool {
        self.frame.is_some()
    }

    pub fn initialize(&mut self) {
        self.adapter.initialize();
    }

    pub fn on_api_ready(&mut self) {
        self.adapter.on_api_ready();
    }

    pub fn on_load_failed(&mut self, reason: &str) {
        self.adapter.on_load_failed(reason);
    }

    fn set_state(&mut self, next: PlaybackState) {
        if self.state != next {
            info!(from = %self.state, to = %next, "State transition");
            self.state = next;
        }
    }

    // ---------------------------------------------------------------------
    // Embed lifecycle
    // ---------------------------------------------------------------------

    /// Apply a lifecycle event from the embed
    pub fn on_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Ready => {
                self.adapter.mark_ready();
                if self.adapter.is_ready() {
                    info!("Embed ready; play enabled");
                    self.poll_progress();
                }
            }
            PlayerEvent::StateChange(PlaybackState::Playing) => {
                self.set_state(PlaybackState::Playing);
                self.show_controls();
                self.arm_hide_timer();
                self.start_polling();
            }
            PlayerEvent::StateChange(PlaybackState::Paused) => {
                if self.state == PlaybackState::Playing {
                    self.enter_paused();
                }
            }
            PlayerEvent::StateChange(PlaybackState::Ended) => {
                if matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
                    self.set_state(PlaybackState::Ended);
                    self.show_controls();
                    self.cancel_hide_timer();
                    self.stop_polling();
                    self.poll_progress();
                }
            }
            PlayerEvent::StateChange(PlaybackState::Unstarted) => {
                debug!(state = %self.state, "Embed reported unstarted");
            }
            PlayerEvent::Error(code) => {
                warn!(code = %code, "Embed reported an error");
            }
        }
    }

    // ---------------------------------------------------------------------
    // Transport commands
    // ---------------------------------------------------------------------

    /// Play from Unstarted, or replay from Ended. Needs a ready adapter.
    pub fn play(&mut self) -> bool {
        if !matches!(self.state, PlaybackState::Unstarted | PlaybackState::Ended) {
            debug!(state = %self.state, "play ignored");
            return false;
        }
        if !self.adapter.is_ready() {
            debug!("play ignored: embed not ready");
            return false;
        }
        if self.state == PlaybackState::Ended {
            self.adapter.seek(0.0, true);
        }
        self.adapter.play();
        self.enter_playing();
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            debug!(state = %self.state, "pause ignored");
            return false;
        }
        self.adapter.pause();
        self.enter_paused();
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != PlaybackState::Paused {
            debug!(state = %self.state, "resume ignored");
            return false;
        }
        self.adapter.play();
        self.enter_playing();
        true
    }

    /// The single play button: play, pause, resume or replay by state
    pub fn toggle_play(&mut self) -> bool {
        match self.state {
            PlaybackState::Unstarted | PlaybackState::Ended => self.play(),
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
        }
    }

    /// Seek back by the rewind step, clamped at 0
    pub fn rewind(&mut self) -> bool {
        let Some(current) = self.adapter.current_time() else {
            debug!("rewind ignored: current time unavailable");
            return false;
        };
        let target = (current - self.rewind_step).max(0.0);
        self.adapter.seek(target, true);
        if !self.scrub.is_dragging() {
            let duration = self.live_duration();
            self.progress = ProgressSnapshot::from_player(target, duration);
        }
        true
    }

    /// Request or exit fullscreen on the container. Never touches playback state.
    pub fn toggle_fullscreen(&mut self) {
        let result = if self.fullscreen.is_fullscreen() {
            self.fullscreen.exit()
        } else {
            self.fullscreen.request()
        };
        if let Err(e) = result {
            warn!(code = e.error_code(), recoverable = e.is_recoverable(), error = %e, "Fullscreen toggle failed");
        }
        self.on_fullscreen_change();
    }

    /// The document's fullscreen element changed
    pub fn on_fullscreen_change(&mut self) {
        self.fullscreen_on = self.fullscreen.is_fullscreen();
    }

    /// Pointer activity over the widget
    pub fn pointer_moved(&mut self) {
        if self.state == PlaybackState::Playing {
            self.show_controls();
            self.arm_hide_timer();
        }
    }

    // ---------------------------------------------------------------------
    // Scrub bar
    // ---------------------------------------------------------------------

    pub fn drag_start(&mut self, pointer_x: f64, bounds: BarBounds) {
        let fraction = self.scrub.drag_start(pointer_x, bounds);
        self.progress = ProgressSnapshot::from_fraction(fraction, self.live_duration());
    }

    pub fn drag_move(&mut self, pointer_x: f64, bounds: BarBounds) {
        if let Some(fraction) = self.scrub.drag_move(pointer_x, bounds) {
            self.progress = ProgressSnapshot::from_fraction(fraction, self.live_duration());
        }
    }

    pub fn drag_end(&mut self, pointer_x: f64, bounds: BarBounds) {
        if !self.scrub.is_dragging() {
            return;
        }
        let duration = self.live_duration();
        match self.scrub.drag_end(pointer_x, bounds, duration) {
            Some(seek) => {
                debug!(seconds = seek.seconds, "Scrub seek");
                self.adapter.seek(seek.seconds, seek.allow_seek_ahead);
            }
            None => debug!("Scrub seek suppressed: duration unknown"),
        }
        self.progress = ProgressSnapshot::from_fraction(self.scrub.fraction(), duration);
    }

    /// Abandon a drag without seeking; progress follows the player again
    pub fn drag_cancel(&mut self) {
        if !self.scrub.is_dragging() {
            return;
        }
        debug!("Scrub drag cancelled");
        self.scrub.cancel();
        self.poll_progress();
    }

    // ---------------------------------------------------------------------
    // Scheduled wakeups
    // ---------------------------------------------------------------------

    /// Auto-hide deadline elapsed
    pub fn on_hide_timer(&mut self, id: TimerId) {
        if self.controls.hide_timer != Some(id) {
            debug!(timer = %id, "Stale hide timer");
            return;
        }
        self.controls.hide_timer = None;
        if self.state == PlaybackState::Playing {
            self.controls.visible = false;
        }
    }

    /// Animation frame tick
    pub fn on_frame(&mut self, id: TimerId) {
        if self.frame != Some(id) {
            return;
        }
        self.frame = None;
        if self.state != PlaybackState::Playing {
            return;
        }
        self.poll_progress();
        self.frame = Some(self.scheduler.next_frame());
    }

    /// Cancel all schedules and release the embed. Safe to repeat.
    pub fn teardown(&mut self) {
        self.cancel_hide_timer();
        self.stop_polling();
        self.scrub.cancel();
        self.adapter.destroy();
    }

    pub fn view(&self) -> ControlsView {
        let ready = self.adapter.is_ready();
        let play_label = match self.state {
            PlaybackState::Unstarted => "Play",
            PlaybackState::Playing => "Pause",
            PlaybackState::Paused => "Resume",
            PlaybackState::Ended => "Replay",
        };
        ControlsView {
            state: self.state,
            ready,
            play_enabled: ready,
            play_label: play_label.to_string(),
            controls_visible: self.controls.visible,
            fullscreen: self.fullscreen_on,
            dragging: self.scrub.is_dragging(),
            fraction: self.progress.fraction,
            fill_percent: bar_percent(self.progress.fraction),
            elapsed: format_time(self.progress.position_seconds),
            total: format_time(self.progress.duration_seconds),
            terminated: self.adapter.is_destroyed(),
        }
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn enter_playing(&mut self) {
        self.set_state(PlaybackState::Playing);
        self.show_controls();
        self.arm_hide_timer();
        self.start_polling();
    }

    fn enter_paused(&mut self) {
        self.set_state(PlaybackState::Paused);
        self.show_controls();
        self.cancel_hide_timer();
        self.stop_polling();
    }

    fn show_controls(&mut self) {
        self.controls.visible = true;
    }

    /// At most one hide timer is outstanding
    fn arm_hide_timer(&mut self) {
        self.cancel_hide_timer();
        let id = self.scheduler.schedule(crate::host::Wakeup::HideControls, self.auto_hide);
        self.controls.hide_timer = Some(id);
    }

    fn cancel_hide_timer(&mut self) {
        if let Some(id) = self.controls.hide_timer.take() {
            self.scheduler.cancel(id);
        }
    }

    fn start_polling(&mut self) {
        if self.frame.is_none() {
            self.frame = Some(self.scheduler.next_frame());
        }
    }

    fn stop_polling(&mut self) {
        if let Some(id) = self.frame.take() {
            self.scheduler.cancel(id);
        }
    }

    fn poll_progress(&mut self) {
        if self.scrub.is_dragging() {
            return;
        }
        let position = self.adapter.current_time().unwrap_or(self.progress.position_seconds);
        let duration = self.live_duration();
        self.progress = ProgressSnapshot::from_player(position, duration);
    }

    /// Adapter duration, falling back to the last known one
    fn live_duration(&self) -> f64 {
        self.adapter
            .duration()
            .map(sanitize_seconds)
            .filter(|d| *d > 0.0)
            .unwrap_or(self.progress.duration_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ManualScheduler, MemoryFullscreen, ScriptedEmbed};

    struct Rig {
        embed: ScriptedEmbed,
        scheduler: Rc<ManualScheduler>,
        fullscreen: MemoryFullscreen,
        controller: PlaybackController,
    }

    impl Rig {
        fn new() -> Self {
            let embed = ScriptedEmbed::new();
            embed.set_duration(120.0);
            let scheduler = Rc::new(ManualScheduler::new());
            let fullscreen = MemoryFullscreen::new();
            let adapter = PlayerAdapter::new(Box::new(embed.clone()), "player", "vid");
            let mut controller = PlaybackController::new(
                adapter,
                scheduler.clone(),
                Box::new(fullscreen.clone()),
                Duration::from_secs(2),
                10.0,
            );
            controller.initialize();
            Self { embed, scheduler, fullscreen, controller }
        }

        fn ready() -> Self {
            let mut rig = Self::new();
            rig.controller.on_player_event(PlayerEvent::Ready);
            rig
        }

        fn advance(&mut self, by: Duration) {
            let until = self.scheduler.now() + by;
            while let Some((id, wakeup)) = self.scheduler.pop_due(until) {
                match wakeup {
                    crate::host::Wakeup::HideControls => self.controller.on_hide_timer(id),
                    crate::host::Wakeup::Frame => self.controller.on_frame(id),
                    crate::host::Wakeup::TamperPoll => {}
                }
            }
            self.scheduler.set_now(until);
        }
    }

    #[test]
    fn test_play_requires_ready() {
        let mut rig = Rig::new();
        assert!(!rig.controller.play());
        assert_eq!(rig.controller.state(), PlaybackState::Unstarted);
        assert!(!rig.controller.view().play_enabled);

        rig.controller.on_player_event(PlayerEvent::Ready);
        assert!(rig.controller.view().play_enabled);
        assert!(rig.controller.play());
        assert_eq!(rig.controller.state(), PlaybackState::Playing);
        assert_eq!(rig.embed.plays(), 1);
    }

    #[test]
    fn test_pause_resume_cycle() {
        let mut rig = Rig::ready();
        rig.controller.play();
        assert!(rig.controller.pause());
        assert_eq!(rig.controller.state(), PlaybackState::Paused);
        assert_eq!(rig.embed.pauses(), 1);
        assert!(rig.controller.controls().visible);
        assert_eq!(rig.controller.controls().hide_timer, None);

        assert!(rig.controller.resume());
        assert_eq!(rig.controller.state(), PlaybackState::Playing);
        assert_eq!(rig.embed.plays(), 2);
    }

    #[test]
    fn test_illegal_commands_are_noops() {
        let mut rig = Rig::ready();
        assert!(!rig.controller.resume());
        assert!(!rig.controller.pause());
        assert_eq!(rig.controller.state(), PlaybackState::Unstarted);

        rig.controller.play();
        assert!(!rig.controller.play());
        assert!(!rig.controller.resume());
        assert_eq!(rig.embed.plays(), 1);
    }

    #[test]
    fn test_replay_seeks_to_start() {
        let mut rig = Rig::ready();
        rig.controller.play();
        rig.controller.on_player_event(PlayerEvent::StateChange(PlaybackState::Ended));
        assert_eq!(rig.controller.state(), PlaybackState::Ended);
        assert_eq!(rig.controller.view().play_label, "Replay");

        assert!(rig.controller.toggle_play());
        assert_eq!(rig.embed.seeks(), vec![(0.0, true)]);
        assert_eq!(rig.controller.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_ended_while_paused() {
        let mut rig = Rig::ready();
        rig.controller.play();
        rig.controller.pause();
        rig.controller.on_player_event(PlayerEvent::StateChange(PlaybackState::Ended));
        assert_eq!(rig.controller.state(), PlaybackState::Ended);
    }

    #[test]
    fn test_ended_ignored_before_start() {
        let mut rig = Rig::ready();
        rig.controller.on_player_event(PlayerEvent::StateChange(PlaybackState::Ended));
        assert_eq!(rig.controller.state(), PlaybackState::Unstarted);
    }

    #[test]
    fn test_auto_hide_after_inactivity() {
        let mut rig = Rig::ready();
        rig.controller.play();
        rig.advance(Duration::from_millis(1999));
        assert!(rig.controller.controls().visible);
        rig.advance(Duration::from_millis(1));
        assert!(!rig.controller.controls().visible);
        assert_eq!(rig.scheduler.pending(crate::host::Wakeup::HideControls), 0);
    }

    #[test]
    fn test_activity_rearms_hide_timer() {
        let mut rig = Rig::ready();
        rig.controller.play();
        rig.advance(Duration::from_millis(1500));
        rig.controller.pointer_moved();
        assert_eq!(rig.scheduler.pending(crate::host::Wakeup::HideControls), 1);
        rig.advance(Duration::from_millis(1500));
        assert!(rig.controller.controls().visible);
        rig.advance(Duration::from_millis(500));
        assert!(!rig.controller.controls().visible);

        rig.controller.pointer_moved();
        assert!(rig.controller.controls().visible);
    }

    #[test]
    fn test_no_auto_hide_while_paused() {
        let mut rig = Rig::ready();
        rig.controller.play();
        rig.controller.pause();
        rig.controller.pointer_moved();
        rig.advance(Duration::from_secs(10));
        assert!(rig.controller.controls().visible);
        assert_eq!(rig.scheduler.pending(crate::host::Wakeup::HideControls), 0);
    }

    #[test]
    fn test_polling_tracks_player_and_stops() {
        let mut rig = Rig::ready();
        rig.controller.play();
        rig.embed.set_current_time(30.0);
        rig.advance(Duration::from_millis(50));
        assert_eq!(rig.controller.progress().position_seconds, 30.0);
        assert_eq!(rig.controller.progress().fraction, 0.25);

        rig.controller.pause();
        assert!(!rig.controller.is_polling());
        assert_eq!(rig.scheduler.pending(crate::host::Wakeup::Frame), 0);
    }

    #[test]
    fn test_rewind_clamps_at_zero() {
        let mut rig = Rig::ready();
        rig.embed.set_current_time(25.0);
        assert!(rig.controller.rewind());
        rig.embed.set_current_time(4.0);
        assert!(rig.controller.rewind());
        assert_eq!(rig.embed.seeks(), vec![(15.0, true), (0.0, true)]);
        assert_eq!(rig.controller.state(), PlaybackState::Unstarted);
    }

    #[test]
    fn test_drag_is_decoupled_from_polling() {
        let mut rig = Rig::ready();
        rig.controller.play();
        let bar = BarBounds::new(0.0, 200.0);
        rig.controller.drag_start(50.0, bar);
        rig.embed.set_current_time(100.0);
        rig.advance(Duration::from_millis(50));
        assert_eq!(rig.controller.progress().fraction, 0.25);
        assert!(rig.embed.seeks().is_empty());

        rig.controller.drag_end(100.0, bar);
        assert_eq!(rig.embed.seeks(), vec![(60.0, true)]);
        assert!(!rig.controller.view().dragging);
    }

    #[test]
    fn test_drag_labels_use_live_duration() {
        let mut rig = Rig::new();
        rig.embed.set_duration(0.0);
        rig.controller.on_player_event(PlayerEvent::Ready);
        assert_eq!(rig.controller.view().total, "0:00");

        // Duration becomes known while still unstarted, so nothing polls
        rig.embed.set_duration(120.0);
        let bar = BarBounds::new(0.0, 100.0);
        rig.controller.drag_start(50.0, bar);
        let view = rig.controller.view();
        assert_eq!(view.elapsed, "1:00");
        assert_eq!(view.total, "2:00");

        rig.controller.drag_move(25.0, bar);
        assert_eq!(rig.controller.view().elapsed, "0:30");
    }

    #[test]
    fn test_cancelled_drag_resumes_polling() {
        let mut rig = Rig::ready();
        rig.controller.play();
        rig.embed.set_current_time(30.0);
        let bar = BarBounds::new(0.0, 200.0);
        rig.controller.drag_start(150.0, bar);
        assert!(rig.controller.view().dragging);

        rig.controller.drag_cancel();
        let view = rig.controller.view();
        assert!(!view.dragging);
        assert_eq!(view.elapsed, "0:30");
        assert!(rig.embed.seeks().is_empty());

        rig.embed.set_current_time(45.0);
        rig.advance(Duration::from_millis(50));
        assert_eq!(rig.controller.view().elapsed, "0:45");

        // A release after the cancel is not a second drag
        rig.controller.drag_end(150.0, bar);
        assert!(rig.embed.seeks().is_empty());
    }

    #[test]
    fn test_fullscreen_is_orthogonal() {
        let mut rig = Rig::ready();
        rig.controller.play();
        rig.controller.toggle_fullscreen();
        assert!(rig.controller.is_fullscreen());
        assert!(rig.fullscreen.is_active());
        assert_eq!(rig.controller.state(), PlaybackState::Playing);

        rig.controller.toggle_fullscreen();
        assert!(!rig.controller.is_fullscreen());
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut rig = Rig::ready();
        rig.controller.play();
        rig.controller.teardown();
        rig.controller.teardown();
        assert_eq!(rig.embed.destroyed(), 1);
        assert_eq!(rig.scheduler.pending_total(), 0);
        assert!(rig.controller.view().terminated);
    }
}
