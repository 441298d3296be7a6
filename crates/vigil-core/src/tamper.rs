//! Tamper guard
//!
//! Heuristic detection of browser inspection tooling: a large gap between
//! outer and inner window size, or a keyboard chord that opens the tools.
//! This is a viewing deterrent, not a security boundary. Docked panels,
//! zoom and OS chrome all produce false readings either way.
//!
//! On the first positive signal the guard persists the tamper flag, fires a
//! best-effort logout and navigates to the unauthenticated entry point.
//! After that it is inert.

use crate::{
    config::WidgetConfig,
    host::{FlagStore, Navigator, Scheduler, SessionBoundary, TimerId, Wakeup, WindowProbe},
    types::{InputDisposition, KeyChord},
};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

const FLAG_VALUE: &str = "true";

/// Result of a tamper check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// No tamper signal
    Clear,
    /// This call fired the termination path
    Terminated,
    /// Termination already happened earlier
    AlreadyTerminated,
}

/// What set the guard off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TamperReason {
    PersistedFlag,
    WindowDivergence,
    InspectionChord,
}

impl std::fmt::Display for TamperReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TamperReason::PersistedFlag => write!(f, "persisted flag"),
            TamperReason::WindowDivergence => write!(f, "window divergence"),
            TamperReason::InspectionChord => write!(f, "inspection chord"),
        }
    }
}

/// Outcome of a keyboard input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyOutcome {
    pub disposition: InputDisposition,
    pub verdict: Verdict,
}

/// Collaborators the guard drives
pub struct GuardHost {
    pub store: Box<dyn FlagStore>,
    pub boundary: Box<dyn SessionBoundary>,
    pub navigator: Box<dyn Navigator>,
    pub window: Box<dyn WindowProbe>,
    pub scheduler: Rc<dyn Scheduler>,
}

pub struct TamperGuard {
    host: GuardHost,
    flag_key: String,
    threshold: f64,
    poll_period: Duration,
    entry_point: String,
    poll_timer: Option<TimerId>,
    listening: bool,
    reason: Option<TamperReason>,
}

impl TamperGuard {
    pub fn new(config: &WidgetConfig, host: GuardHost) -> Self {
        Self {
            host,
            flag_key: config.tamper_flag_key.clone(),
            threshold: config.tamper_threshold_px,
            poll_period: config.tamper_poll(),
            entry_point: config.entry_point.clone(),
            poll_timer: None,
            listening: false,
            reason: None,
        }
    }

    /// Start guarding. A flag persisted by an earlier load terminates
    /// immediately; otherwise polling starts and an initial check runs.
    pub fn arm(&mut self) -> Verdict {
        if self.reason.is_some() {
            return Verdict::AlreadyTerminated;
        }
        if self.flag_persisted() {
            return self.trigger(TamperReason::PersistedFlag);
        }
        self.listening = true;
        if self.poll_timer.is_none() {
            self.poll_timer = Some(self.host.scheduler.repeat(Wakeup::TamperPoll, self.poll_period));
        }
        self.check_now()
    }

    /// Stop polling and ignore further resize/key input. Safe to repeat.
    pub fn disarm(&mut self) {
        self.listening = false;
        if let Some(id) = self.poll_timer.take() {
            self.host.scheduler.cancel(id);
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.reason.is_some()
    }

    pub fn reason(&self) -> Option<TamperReason> {
        self.reason
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Compare outer and inner window size against the threshold
    pub fn check_now(&mut self) -> Verdict {
        if self.reason.is_some() {
            return Verdict::AlreadyTerminated;
        }
        let (dw, dh) = self.host.window.metrics().divergence();
        if dw > self.threshold || dh > self.threshold {
            debug!(width_gap = dw, height_gap = dh, threshold = self.threshold, "Window divergence");
            return self.trigger(TamperReason::WindowDivergence);
        }
        Verdict::Clear
    }

    /// Periodic poll
    pub fn on_poll(&mut self, id: TimerId) -> Verdict {
        if self.poll_timer != Some(id) {
            debug!(timer = %id, "Stale tamper poll");
            return if self.is_tripped() { Verdict::AlreadyTerminated } else { Verdict::Clear };
        }
        self.check_now()
    }

    pub fn on_resize(&mut self) -> Verdict {
        if !self.listening {
            return if self.is_tripped() { Verdict::AlreadyTerminated } else { Verdict::Clear };
        }
        self.check_now()
    }

    /// Inspection chords are always swallowed; the first one terminates
    pub fn on_key(&mut self, chord: &KeyChord) -> KeyOutcome {
        if !chord.is_inspection_chord() {
            return KeyOutcome { disposition: InputDisposition::Allow, verdict: Verdict::Clear };
        }
        let verdict = if self.listening {
            self.trigger(TamperReason::InspectionChord)
        } else if self.is_tripped() {
            Verdict::AlreadyTerminated
        } else {
            Verdict::Clear
        };
        KeyOutcome { disposition: InputDisposition::PreventDefault, verdict }
    }

    /// Normal page unload. Clears the flag unless this load tripped.
    pub fn on_unload(&mut self) {
        if self.reason.is_some() {
            return;
        }
        if let Err(e) = self.host.store.remove(&self.flag_key) {
            warn!(code = e.error_code(), recoverable = e.is_recoverable(), error = %e, "Failed to clear tamper flag");
        }
    }

    fn flag_persisted(&self) -> bool {
        match self.host.store.get(&self.flag_key) {
            Ok(value) => value.is_some_and(|v| v == FLAG_VALUE),
            Err(e) => {
                warn!(code = e.error_code(), recoverable = e.is_recoverable(), error = %e, "Failed to read tamper flag");
                false
            }
        }
    }

    /// One-shot termination path
    fn trigger(&mut self, reason: TamperReason) -> Verdict {
        if self.reason.is_some() {
            return Verdict::AlreadyTerminated;
        }
        self.reason = Some(reason);
        warn!(reason = %reason, "Tamper detected; terminating session");

        if let Err(e) = self.host.store.set(&self.flag_key, FLAG_VALUE) {
            warn!(code = e.error_code(), recoverable = e.is_recoverable(), error = %e, "Failed to persist tamper flag");
        }
        self.host.boundary.logout();
        self.host.navigator.navigate(&self.entry_point);
        self.disarm();

        info!(entry_point = %self.entry_point, "Session terminated");
        Verdict::Terminated
    }
}

/// Remove a persisted tamper flag. For the page-level gate after a fresh login.
pub fn clear_tamper_flag(store: &dyn FlagStore, key: &str) -> crate::Result<()> {
    store.remove(key)
}
