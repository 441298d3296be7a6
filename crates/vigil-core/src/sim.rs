//! In-memory host for tests and scenario replay
//!
//! Every type here is a cheap handle over shared state: clone one into the
//! widget and keep another to inspect or drive it.

use crate::{
    adapter::{EmbedApi, EmbedInstance},
    host::{FlagStore, FullscreenHost, Navigator, Scheduler, SessionBoundary, TimerId, Wakeup, WindowProbe},
    types::WindowMetrics,
    widget::{Collaborators, SecureWidget},
    Error, Result,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

/// Simulated display refresh interval
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

// =============================================================================
// Scheduler
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct Pending {
    id: TimerId,
    wakeup: Wakeup,
    due: Duration,
    period: Option<Duration>,
}

#[derive(Debug, Default)]
struct Timeline {
    now: Duration,
    next_id: u64,
    pending: Vec<Pending>,
}

/// Virtual-clock scheduler
#[derive(Debug, Default)]
pub struct ManualScheduler {
    timeline: RefCell<Timeline>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.timeline.borrow().now
    }

    /// Move the clock without firing anything
    pub fn set_now(&self, now: Duration) {
        let mut t = self.timeline.borrow_mut();
        t.now = t.now.max(now);
    }

    /// Pop the earliest wakeup due at or before `until`, moving the clock
    /// to its due time. Repeating wakeups are rescheduled.
    pub fn pop_due(&self, until: Duration) -> Option<(TimerId, Wakeup)> {
        let mut t = self.timeline.borrow_mut();
        let index = t
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= until)
            .min_by_key(|(_, p)| (p.due, p.id))
            .map(|(i, _)| i)?;

        let entry = t.pending[index];
        t.now = t.now.max(entry.due);
        match entry.period {
            Some(period) => t.pending[index].due = entry.due + period,
            None => {
                t.pending.remove(index);
            }
        }
        Some((entry.id, entry.wakeup))
    }

    pub fn pending(&self, wakeup: Wakeup) -> usize {
        self.timeline.borrow().pending.iter().filter(|p| p.wakeup == wakeup).count()
    }

    pub fn pending_total(&self) -> usize {
        self.timeline.borrow().pending.len()
    }

    fn push(&self, wakeup: Wakeup, delay: Duration, period: Option<Duration>) -> TimerId {
        let mut t = self.timeline.borrow_mut();
        t.next_id += 1;
        let id = TimerId(t.next_id);
        let due = t.now + delay;
        t.pending.push(Pending { id, wakeup, due, period });
        id
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, wakeup: Wakeup, delay: Duration) -> TimerId {
        self.push(wakeup, delay, None)
    }

    fn repeat(&self, wakeup: Wakeup, period: Duration) -> TimerId {
        self.push(wakeup, period, Some(period))
    }

    fn next_frame(&self) -> TimerId {
        self.push(Wakeup::Frame, FRAME_INTERVAL, None)
    }

    fn cancel(&self, id: TimerId) {
        self.timeline.borrow_mut().pending.retain(|p| p.id != id);
    }
}

// =============================================================================
// Embed
// =============================================================================

#[derive(Debug)]
struct EmbedLog {
    api_ready: bool,
    fail_construct: bool,
    scripts: Vec<String>,
    constructed: u32,
    destroyed: u32,
    plays: u32,
    pauses: u32,
    seeks: Vec<(f64, bool)>,
    current_time: f64,
    duration: f64,
}

impl Default for EmbedLog {
    fn default() -> Self {
        Self {
            api_ready: true,
            fail_construct: false,
            scripts: Vec::new(),
            constructed: 0,
            destroyed: 0,
            plays: 0,
            pauses: 0,
            seeks: Vec::new(),
            current_time: 0.0,
            duration: 0.0,
        }
    }
}

/// Embed API that records every call. Lifecycle events are fed by the test.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEmbed {
    log: Rc<RefCell<EmbedLog>>,
}

impl ScriptedEmbed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_ready(self, ready: bool) -> Self {
        self.set_api_ready(ready);
        self
    }

    pub fn with_construct_failure(self) -> Self {
        self.log.borrow_mut().fail_construct = true;
        self
    }

    pub fn set_api_ready(&self, ready: bool) {
        self.log.borrow_mut().api_ready = ready;
    }

    pub fn set_current_time(&self, seconds: f64) {
        self.log.borrow_mut().current_time = seconds;
    }

    pub fn set_duration(&self, seconds: f64) {
        self.log.borrow_mut().duration = seconds;
    }

    pub fn scripts_injected(&self) -> usize {
        self.log.borrow().scripts.len()
    }

    pub fn constructed(&self) -> u32 {
        self.log.borrow().constructed
    }

    pub fn destroyed(&self) -> u32 {
        self.log.borrow().destroyed
    }

    pub fn plays(&self) -> u32 {
        self.log.borrow().plays
    }

    pub fn pauses(&self) -> u32 {
        self.log.borrow().pauses
    }

    pub fn seeks(&self) -> Vec<(f64, bool)> {
        self.log.borrow().seeks.clone()
    }
}

impl EmbedApi for ScriptedEmbed {
    fn script_present(&self, element_id: &str) -> bool {
        self.log.borrow().scripts.iter().any(|s| s == element_id)
    }

    fn inject_script(&self, element_id: &str, _src: &str) -> Result<()> {
        self.log.borrow_mut().scripts.push(element_id.to_string());
        Ok(())
    }

    fn api_ready(&self) -> bool {
        self.log.borrow().api_ready
    }

    fn construct(&self, container_id: &str, _video_id: &str) -> Result<Box<dyn EmbedInstance>> {
        let mut log = self.log.borrow_mut();
        if log.fail_construct {
            return Err(Error::EmbedConstruct(format!("no element #{}", container_id)));
        }
        log.constructed += 1;
        Ok(Box::new(ScriptedInstance { log: self.log.clone() }))
    }
}

struct ScriptedInstance {
    log: Rc<RefCell<EmbedLog>>,
}

impl EmbedInstance for ScriptedInstance {
    fn play(&self) {
        self.log.borrow_mut().plays += 1;
    }

    fn pause(&self) {
        self.log.borrow_mut().pauses += 1;
    }

    fn seek(&self, seconds: f64, allow_seek_ahead: bool) {
        let mut log = self.log.borrow_mut();
        log.seeks.push((seconds, allow_seek_ahead));
        log.current_time = seconds;
    }

    fn current_time(&self) -> Option<f64> {
        Some(self.log.borrow().current_time)
    }

    fn duration(&self) -> Option<f64> {
        Some(self.log.borrow().duration)
    }

    fn destroy(&self) {
        self.log.borrow_mut().destroyed += 1;
    }
}

// =============================================================================
// Remaining collaborators
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryFlagStore {
    values: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingBoundary {
    logouts: Rc<Cell<u32>>,
}

impl RecordingBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logouts(&self) -> u32 {
        self.logouts.get()
    }
}

impl SessionBoundary for RecordingBoundary {
    fn logout(&self) {
        self.logouts.set(self.logouts.get() + 1);
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    visited: Rc<RefCell<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.borrow().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &str) {
        self.visited.borrow_mut().push(url.to_string());
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticWindow {
    metrics: Rc<Cell<WindowMetrics>>,
}

impl StaticWindow {
    pub fn new(metrics: WindowMetrics) -> Self {
        Self { metrics: Rc::new(Cell::new(metrics)) }
    }

    pub fn set(&self, metrics: WindowMetrics) {
        self.metrics.set(metrics);
    }
}

impl WindowProbe for StaticWindow {
    fn metrics(&self) -> WindowMetrics {
        self.metrics.get()
    }
}

/// Fullscreen that takes effect synchronously
#[derive(Debug, Clone, Default)]
pub struct MemoryFullscreen {
    active: Rc<Cell<bool>>,
}

impl MemoryFullscreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl FullscreenHost for MemoryFullscreen {
    fn is_fullscreen(&self) -> bool {
        self.active.get()
    }

    fn request(&self) -> Result<()> {
        self.active.set(true);
        Ok(())
    }

    fn exit(&self) -> Result<()> {
        self.active.set(false);
        Ok(())
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// All simulated collaborators with handles kept for inspection
#[derive(Clone)]
pub struct SimHost {
    pub embed: ScriptedEmbed,
    pub scheduler: Rc<ManualScheduler>,
    pub fullscreen: MemoryFullscreen,
    pub store: MemoryFlagStore,
    pub boundary: RecordingBoundary,
    pub navigator: RecordingNavigator,
    pub window: StaticWindow,
}

impl SimHost {
    /// A docked-tools-free 1280x800 window with a 60px browser toolbar
    pub fn new() -> Self {
        Self {
            embed: ScriptedEmbed::new(),
            scheduler: Rc::new(ManualScheduler::new()),
            fullscreen: MemoryFullscreen::new(),
            store: MemoryFlagStore::new(),
            boundary: RecordingBoundary::new(),
            navigator: RecordingNavigator::new(),
            window: StaticWindow::new(WindowMetrics::new(1280.0, 800.0, 1280.0, 740.0)),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            embed: Box::new(self.embed.clone()),
            scheduler: self.scheduler.clone(),
            fullscreen: Box::new(self.fullscreen.clone()),
            store: Box::new(self.store.clone()),
            boundary: Box::new(self.boundary.clone()),
            navigator: Box::new(self.navigator.clone()),
            window: Box::new(self.window.clone()),
        }
    }

    /// Advance the virtual clock, delivering every wakeup that falls due
    pub fn advance(&self, widget: &mut SecureWidget, by: Duration) {
        let until = self.scheduler.now() + by;
        while let Some((id, wakeup)) = self.scheduler.pop_due(until) {
            widget.wake(id, wakeup);
        }
        self.scheduler.set_now(until);
    }
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}
