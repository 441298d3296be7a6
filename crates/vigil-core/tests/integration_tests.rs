//! Integration tests for Vigil Core

use std::time::Duration;
use vigil_core::{
    sim::SimHost, BarBounds, Command, InputDisposition, KeyChord, PlaybackState, PlayerEvent,
    SecureWidget, Verdict, WidgetConfig, WindowMetrics, format_time,
};

fn mounted(host: &SimHost) -> SecureWidget {
    let config = WidgetConfig { entry_point: "/login".into(), ..WidgetConfig::new("dqFY2ijqM-4") };
    SecureWidget::mount(&config, host.collaborators()).unwrap()
}

fn ready(host: &SimHost) -> SecureWidget {
    host.embed.set_duration(125.0);
    let mut widget = mounted(host);
    widget.on_player_event(PlayerEvent::Ready);
    widget
}

// =============================================================================
// State Machine Tests
// =============================================================================

#[test]
fn test_full_playback_cycle() {
    let host = SimHost::new();
    let mut widget = ready(&host);

    widget.command(Command::TogglePlay);
    widget.on_player_event(PlayerEvent::StateChange(PlaybackState::Playing));
    assert_eq!(widget.state(), PlaybackState::Playing);

    widget.command(Command::TogglePlay);
    assert_eq!(widget.state(), PlaybackState::Paused);

    widget.command(Command::TogglePlay);
    assert_eq!(widget.state(), PlaybackState::Playing);

    widget.on_player_event(PlayerEvent::StateChange(PlaybackState::Ended));
    assert_eq!(widget.state(), PlaybackState::Ended);
    assert!(widget.view().controls_visible);

    widget.command(Command::TogglePlay);
    assert_eq!(widget.state(), PlaybackState::Playing);
    assert_eq!(host.embed.seeks(), vec![(0.0, true)]);
    assert_eq!(host.embed.plays(), 3);
    assert_eq!(host.embed.pauses(), 1);
}

#[test]
fn test_illegal_sequences_are_noops() {
    let host = SimHost::new();
    let mut widget = ready(&host);

    widget.command(Command::Resume);
    widget.command(Command::Pause);
    assert_eq!(widget.state(), PlaybackState::Unstarted);

    widget.command(Command::Play);
    widget.command(Command::Resume);
    widget.command(Command::Play);
    assert_eq!(widget.state(), PlaybackState::Playing);
    assert_eq!(host.embed.plays(), 1);
}

#[test]
fn test_ended_while_paused() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    widget.command(Command::Play);
    widget.command(Command::Pause);
    widget.on_player_event(PlayerEvent::StateChange(PlaybackState::Ended));
    assert_eq!(widget.state(), PlaybackState::Ended);
}

#[test]
fn test_load_failure_keeps_widget_disabled() {
    let host = SimHost::new();
    host.embed.set_api_ready(false);
    let mut widget = mounted(&host);
    widget.on_embed_load_failed("blocked by extension");
    widget.on_embed_api_ready();
    widget.on_player_event(PlayerEvent::Ready);
    widget.command(Command::Play);

    let view = widget.view();
    assert!(!view.ready);
    assert!(!view.play_enabled);
    assert_eq!(widget.state(), PlaybackState::Unstarted);
    assert_eq!(host.embed.constructed(), 0);
}

#[test]
fn test_late_api_ready() {
    let host = SimHost::new();
    host.embed.set_api_ready(false);
    let mut widget = mounted(&host);
    assert_eq!(host.embed.scripts_injected(), 1);
    assert_eq!(host.embed.constructed(), 0);

    host.embed.set_api_ready(true);
    widget.on_embed_api_ready();
    widget.on_player_event(PlayerEvent::Ready);
    assert!(widget.view().play_enabled);
}

// =============================================================================
// Auto-hide Tests
// =============================================================================

#[test]
fn test_controls_hide_once_after_inactivity() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    widget.command(Command::Play);

    host.advance(&mut widget, Duration::from_millis(1900));
    assert!(widget.view().controls_visible);
    host.advance(&mut widget, Duration::from_millis(200));
    assert!(!widget.view().controls_visible);

    host.advance(&mut widget, Duration::from_secs(5));
    assert!(!widget.view().controls_visible);
    assert_eq!(host.scheduler.pending(vigil_core::Wakeup::HideControls), 0);
}

#[test]
fn test_pointer_activity_resets_window() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    widget.command(Command::Play);

    for _ in 0..5 {
        host.advance(&mut widget, Duration::from_millis(1500));
        widget.command(Command::PointerMoved);
        assert!(widget.view().controls_visible);
    }
    assert_eq!(host.scheduler.pending(vigil_core::Wakeup::HideControls), 1);

    host.advance(&mut widget, Duration::from_millis(2000));
    assert!(!widget.view().controls_visible);
}

#[test]
fn test_pause_pins_controls() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    widget.command(Command::Play);
    host.advance(&mut widget, Duration::from_secs(3));
    assert!(!widget.view().controls_visible);

    widget.command(Command::Pause);
    assert!(widget.view().controls_visible);
    host.advance(&mut widget, Duration::from_secs(10));
    assert!(widget.view().controls_visible);
}

// =============================================================================
// Progress and Scrub Tests
// =============================================================================

#[test]
fn test_progress_follows_player() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    widget.command(Command::Play);
    host.embed.set_current_time(62.5);
    host.advance(&mut widget, Duration::from_millis(100));

    let view = widget.view();
    assert_eq!(view.elapsed, "1:02");
    assert_eq!(view.total, "2:05");
    assert_eq!(view.fraction, 0.5);
    assert_eq!(view.fill_percent, 50.0);
}

#[test]
fn test_scrub_round_trip() {
    let bar = BarBounds::new(40.0, 500.0);
    for x in [0.0, 40.0, 165.0, 290.0, 540.0, 900.0] {
        let host = SimHost::new();
        let mut widget = ready(&host);
        widget.command(Command::DragStart { x, bounds: bar });
        widget.command(Command::DragMove { x, bounds: bar });
        widget.command(Command::DragEnd { x, bounds: bar });

        let fraction = ((x - bar.left) / bar.width).clamp(0.0, 1.0);
        assert_eq!(widget.view().fraction, fraction);
        assert_eq!(host.embed.seeks(), vec![(fraction * 125.0, true)]);
    }
}

#[test]
fn test_scrub_without_duration_never_seeks() {
    let host = SimHost::new();
    let mut widget = mounted(&host);
    widget.on_player_event(PlayerEvent::Ready);
    let bar = BarBounds::new(0.0, 100.0);

    widget.command(Command::DragStart { x: 30.0, bounds: bar });
    assert_eq!(widget.view().fraction, 0.3);
    widget.command(Command::DragMove { x: 60.0, bounds: bar });
    widget.command(Command::DragEnd { x: 60.0, bounds: bar });

    assert!(host.embed.seeks().is_empty());
    assert_eq!(widget.view().fraction, 0.6);
}

#[test]
fn test_rewind_ten_seconds() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    host.embed.set_current_time(42.0);
    widget.command(Command::Rewind);
    host.embed.set_current_time(6.0);
    widget.command(Command::Rewind);
    assert_eq!(host.embed.seeks(), vec![(32.0, true), (0.0, true)]);
}

#[test]
fn test_format_time_scenarios() {
    assert_eq!(format_time(125.0), "2:05");
    assert_eq!(format_time(f64::NAN), "0:00");
}

// =============================================================================
// Fullscreen Tests
// =============================================================================

#[test]
fn test_fullscreen_toggle_keeps_state() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    widget.command(Command::Play);
    widget.command(Command::Pause);

    widget.command(Command::ToggleFullscreen);
    assert!(widget.view().fullscreen);
    assert_eq!(widget.state(), PlaybackState::Paused);

    widget.command(Command::ToggleFullscreen);
    assert!(!widget.view().fullscreen);
}

// =============================================================================
// Tamper Tests
// =============================================================================

#[test]
fn test_divergence_200px_terminates() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    widget.command(Command::Play);

    host.window.set(WindowMetrics::new(1280.0, 800.0, 1080.0, 800.0));
    assert_eq!(widget.check_now(), Verdict::Terminated);
    assert!(widget.is_terminated());
    assert_eq!(host.boundary.logouts(), 1);
    assert_eq!(host.navigator.visited(), vec!["/login".to_string()]);
    assert_eq!(host.embed.destroyed(), 1);
    assert_eq!(host.store.value("vigil.tampered").as_deref(), Some("true"));
}

#[test]
fn test_divergence_50px_is_clear() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    host.window.set(WindowMetrics::new(1330.0, 850.0, 1280.0, 800.0));
    assert_eq!(widget.check_now(), Verdict::Clear);
    host.advance(&mut widget, Duration::from_secs(5));
    assert!(!widget.is_terminated());
}

#[test]
fn test_poll_detects_docked_tools() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    widget.command(Command::Play);
    host.advance(&mut widget, Duration::from_millis(2500));
    assert!(!widget.is_terminated());

    host.window.set(WindowMetrics::new(1280.0, 800.0, 1280.0, 400.0));
    host.advance(&mut widget, Duration::from_millis(1000));
    assert!(widget.is_terminated());
    assert_eq!(host.scheduler.pending_total(), 0);
}

#[test]
fn test_resize_triggers_check() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    host.window.set(WindowMetrics::new(1920.0, 1080.0, 1500.0, 1020.0));
    assert_eq!(widget.on_resize(), Verdict::Terminated);
}

#[test]
fn test_f12_while_playing() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    widget.command(Command::Play);

    assert_eq!(widget.on_key(&KeyChord::new("F12")), InputDisposition::PreventDefault);
    assert!(widget.is_terminated());
    assert_eq!(host.boundary.logouts(), 1);
    assert!(!widget.view().play_enabled);
}

#[test]
fn test_termination_is_single_shot() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    widget.on_key(&KeyChord::new("C").ctrl().shift());

    host.window.set(WindowMetrics::new(1280.0, 800.0, 900.0, 800.0));
    assert_eq!(widget.check_now(), Verdict::AlreadyTerminated);
    assert_eq!(widget.on_resize(), Verdict::AlreadyTerminated);
    widget.on_key(&KeyChord::new("F12"));

    assert_eq!(host.boundary.logouts(), 1);
    assert_eq!(host.navigator.visited().len(), 1);
    assert_eq!(host.embed.destroyed(), 1);
}

#[test]
fn test_flag_survives_reload() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    widget.on_key(&KeyChord::new("F12"));
    widget.unload();
    drop(widget);

    // Same durable store, fresh page
    let reload = SimHost { store: host.store.clone(), ..SimHost::new() };
    let widget = mounted(&reload);
    assert!(widget.is_terminated());
    assert_eq!(reload.embed.constructed(), 0);
    assert_eq!(reload.boundary.logouts(), 1);
}

#[test]
fn test_clean_unload_clears_flag() {
    let host = SimHost::new();
    host.store.insert("vigil.tampered", "stale");
    let mut widget = ready(&host);
    assert!(!widget.is_terminated());
    widget.unload();
    widget.unmount();
    assert_eq!(host.store.value("vigil.tampered"), None);
}

#[test]
fn test_unmount_releases_everything() {
    let host = SimHost::new();
    let mut widget = ready(&host);
    widget.command(Command::Play);
    assert!(host.scheduler.pending_total() >= 3);

    widget.unmount();
    widget.unmount();
    assert_eq!(host.scheduler.pending_total(), 0);
    assert_eq!(host.embed.destroyed(), 1);
}
