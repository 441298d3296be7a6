//! Browser implementations of the core host seams

use crate::describe;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;
use vigil_core::{Error, FullscreenHost, Navigator, Result, Scheduler, TimerId, Wakeup, WindowMetrics, WindowProbe};
use wasm_bindgen::{prelude::*, JsCast};
use web_sys::{Document, Element, Node, Window};

pub type WakeSink = Rc<dyn Fn(TimerId, Wakeup)>;

// ============================================================================
// Scheduler
// ============================================================================

#[derive(Clone, Copy)]
enum Handle {
    Timeout(i32),
    Interval(i32),
    Frame(i32),
}

struct Entry {
    handle: Handle,
    _callback: Closure<dyn FnMut()>,
}

#[derive(Default)]
struct Slots {
    entries: HashMap<u64, Entry>,
    // Fired or cancelled, callback not yet released
    finished: Vec<u64>,
    running: Option<u64>,
}

struct SchedulerInner {
    sink: RefCell<Option<WakeSink>>,
    next_id: Cell<u64>,
    slots: RefCell<Slots>,
}

impl SchedulerInner {
    fn fire(&self, id: u64, wakeup: Wakeup, one_shot: bool) {
        self.slots.borrow_mut().running = Some(id);
        let sink = self.sink.borrow().clone();
        if let Some(sink) = sink {
            sink(TimerId(id), wakeup);
        }
        let mut slots = self.slots.borrow_mut();
        slots.running = None;
        if one_shot {
            slots.finished.push(id);
        }
    }

    /// Drop callbacks that can no longer fire. A closure is never released
    /// while it is executing.
    fn reap(&self) {
        let mut slots = self.slots.borrow_mut();
        let running = slots.running;
        let finished = std::mem::take(&mut slots.finished);
        for id in finished {
            if Some(id) == running {
                slots.finished.push(id);
            } else {
                slots.entries.remove(&id);
            }
        }
    }
}

/// setTimeout / setInterval / requestAnimationFrame scheduler
pub struct BrowserScheduler {
    window: Window,
    inner: Rc<SchedulerInner>,
}

impl BrowserScheduler {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            inner: Rc::new(SchedulerInner {
                sink: RefCell::new(None),
                next_id: Cell::new(0),
                slots: RefCell::new(Slots::default()),
            }),
        }
    }

    /// Where fired wakeups are delivered
    pub fn set_sink(&self, sink: WakeSink) {
        *self.inner.sink.borrow_mut() = Some(sink);
    }

    fn register(&self, wakeup: Wakeup, one_shot: bool, arm: impl FnOnce(&js_sys::Function) -> std::result::Result<Handle, JsValue>) -> TimerId {
        self.inner.reap();
        let id = self.inner.next_id.get() + 1;
        self.inner.next_id.set(id);

        let weak: Weak<SchedulerInner> = Rc::downgrade(&self.inner);
        let callback = Closure::<dyn FnMut()>::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.fire(id, wakeup, one_shot);
            }
        });

        match arm(callback.as_ref().unchecked_ref()) {
            Ok(handle) => {
                self.inner.slots.borrow_mut().entries.insert(id, Entry { handle, _callback: callback });
            }
            Err(e) => web_sys::console::warn_1(&format!("[Vigil] scheduling failed: {}", describe(&e)).into()),
        }
        TimerId(id)
    }

    fn clear(&self, handle: Handle) {
        match handle {
            Handle::Timeout(h) => self.window.clear_timeout_with_handle(h),
            Handle::Interval(h) => self.window.clear_interval_with_handle(h),
            Handle::Frame(h) => {
                let _ = self.window.cancel_animation_frame(h);
            }
        }
    }
}

fn millis(duration: Duration) -> i32 {
    duration.as_millis().min(i32::MAX as u128) as i32
}

impl Scheduler for BrowserScheduler {
    fn schedule(&self, wakeup: Wakeup, delay: Duration) -> TimerId {
        let window = self.window.clone();
        self.register(wakeup, true, move |f| {
            window
                .set_timeout_with_callback_and_timeout_and_arguments_0(f, millis(delay))
                .map(Handle::Timeout)
        })
    }

    fn repeat(&self, wakeup: Wakeup, period: Duration) -> TimerId {
        let window = self.window.clone();
        self.register(wakeup, false, move |f| {
            window
                .set_interval_with_callback_and_timeout_and_arguments_0(f, millis(period))
                .map(Handle::Interval)
        })
    }

    fn next_frame(&self) -> TimerId {
        let window = self.window.clone();
        self.register(Wakeup::Frame, true, move |f| window.request_animation_frame(f).map(Handle::Frame))
    }

    fn cancel(&self, id: TimerId) {
        let handle = self.inner.slots.borrow().entries.get(&id.0).map(|e| e.handle);
        if let Some(handle) = handle {
            self.clear(handle);
            self.inner.slots.borrow_mut().finished.push(id.0);
        }
        self.inner.reap();
    }
}

impl Drop for BrowserScheduler {
    fn drop(&mut self) {
        let handles: Vec<Handle> = self.inner.slots.borrow().entries.values().map(|e| e.handle).collect();
        for handle in handles {
            self.clear(handle);
        }
    }
}

// ============================================================================
// Fullscreen, window, navigation
// ============================================================================

/// Fullscreen on the widget container
pub struct BrowserFullscreen {
    document: Document,
    container: Element,
}

impl BrowserFullscreen {
    pub fn new(document: Document, container: Element) -> Self {
        Self { document, container }
    }
}

impl FullscreenHost for BrowserFullscreen {
    fn is_fullscreen(&self) -> bool {
        let container: &Node = &self.container;
        self.document
            .fullscreen_element()
            .is_some_and(|element| element.is_same_node(Some(container)))
    }

    fn request(&self) -> Result<()> {
        self.container.request_fullscreen().map_err(|e| Error::Fullscreen(describe(&e)))
    }

    fn exit(&self) -> Result<()> {
        self.document.exit_fullscreen();
        Ok(())
    }
}

pub struct BrowserWindow {
    window: Window,
}

impl BrowserWindow {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

fn dimension(value: std::result::Result<JsValue, JsValue>) -> f64 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
}

impl WindowProbe for BrowserWindow {
    fn metrics(&self) -> WindowMetrics {
        WindowMetrics::new(
            dimension(self.window.outer_width()),
            dimension(self.window.outer_height()),
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
    }
}

pub struct LocationNavigator {
    window: Window,
}

impl LocationNavigator {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Navigator for LocationNavigator {
    fn navigate(&self, url: &str) {
        if let Err(e) = self.window.location().set_href(url) {
            web_sys::console::warn_1(&format!("[Vigil] navigation failed: {}", describe(&e)).into());
        }
    }
}
