//! Exported widget handle and DOM event wiring
//!
//! Every browser callback is turned into an [`Input`] and queued. The queue
//! is drained while holding the widget, so a callback fired from inside a
//! widget call (a synchronous embed event, say) waits its turn instead of
//! re-entering it.

use crate::embed::{EmbedSignal, YouTubeEmbed};
use crate::host::{BrowserFullscreen, BrowserScheduler, BrowserWindow, LocationNavigator};
use crate::session::FetchSessionBoundary;
use crate::storage::LocalStorageFlagStore;
use crate::surface::Surface;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use vigil_core::{
    clear_tamper_flag, Collaborators, Command, InputDisposition, KeyChord, SecureWidget, TimerId,
    Wakeup, WidgetConfig,
};
use wasm_bindgen::{prelude::*, JsCast};
use web_sys::{Event, EventTarget, HtmlElement, KeyboardEvent, PointerEvent};

enum Input {
    Embed(EmbedSignal),
    Wake(TimerId, Wakeup),
    Command(Command),
    Resize,
    Key(KeyChord),
    FullscreenChange,
    Unload,
}

struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

struct Shared {
    widget: RefCell<Option<SecureWidget>>,
    queue: RefCell<VecDeque<Input>>,
    closed: Cell<bool>,
    surface: Surface,
    listeners: RefCell<Vec<Listener>>,
}

impl Shared {
    fn dispatch(&self, input: Input) {
        if self.closed.get() {
            return;
        }
        self.queue.borrow_mut().push_back(input);
        self.drain();
    }

    fn drain(&self) {
        // Busy: the outer drain picks the queued input up
        let Ok(mut slot) = self.widget.try_borrow_mut() else {
            return;
        };
        let Some(widget) = slot.as_mut() else {
            return;
        };
        loop {
            let next = self.queue.borrow_mut().pop_front();
            match next {
                Some(input) => apply(widget, input),
                None => break,
            }
        }
        self.surface.render(&widget.view());
    }

    fn key(&self, chord: KeyChord) -> InputDisposition {
        let fallback = if chord.is_inspection_chord() {
            InputDisposition::PreventDefault
        } else {
            InputDisposition::Allow
        };
        if self.closed.get() {
            return fallback;
        }
        let disposition = match self.widget.try_borrow_mut() {
            Ok(mut slot) => slot.as_mut().map_or(fallback, |widget| widget.on_key(&chord)),
            Err(_) => {
                self.queue.borrow_mut().push_back(Input::Key(chord));
                fallback
            }
        };
        self.drain();
        disposition
    }

    fn context_menu(&self) -> InputDisposition {
        match self.widget.try_borrow() {
            Ok(slot) => slot.as_ref().map_or(InputDisposition::Allow, |widget| widget.on_context_menu()),
            Err(_) => InputDisposition::PreventDefault,
        }
    }

    fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        self.queue.borrow_mut().clear();
        let widget = match self.widget.try_borrow_mut() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                web_sys::console::warn_1(&"[Vigil] unmount while the widget is busy".into());
                None
            }
        };
        if let Some(mut widget) = widget {
            widget.unmount();
        }
        self.listeners.borrow_mut().clear();
        self.surface.clear();
    }

    fn listen(self: &Rc<Self>, target: &EventTarget, event: &'static str, handler: impl Fn(&Shared, Event) + 'static) {
        let weak: Weak<Shared> = Rc::downgrade(self);
        let callback = Closure::<dyn FnMut(Event)>::new(move |e: Event| {
            if let Some(shared) = weak.upgrade() {
                handler(&shared, e);
            }
        });
        if let Err(e) = target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref()) {
            web_sys::console::warn_1(&format!("[Vigil] could not listen for {}: {}", event, crate::describe(&e)).into());
            return;
        }
        self.listeners.borrow_mut().push(Listener { target: target.clone(), event, callback });
    }
}

fn apply(widget: &mut SecureWidget, input: Input) {
    match input {
        Input::Embed(EmbedSignal::ApiReady) => widget.on_embed_api_ready(),
        Input::Embed(EmbedSignal::LoadFailed(reason)) => widget.on_embed_load_failed(&reason),
        Input::Embed(EmbedSignal::Player(event)) => widget.on_player_event(event),
        Input::Wake(id, wakeup) => widget.wake(id, wakeup),
        Input::Command(command) => widget.command(command),
        Input::Resize => {
            widget.on_resize();
        }
        Input::Key(chord) => {
            widget.on_key(&chord);
        }
        Input::FullscreenChange => widget.on_fullscreen_change(),
        Input::Unload => widget.unload(),
    }
}

/// Build a chord from a keydown event
pub(crate) fn chord_from_event(event: &KeyboardEvent) -> KeyChord {
    KeyChord {
        key: event.key(),
        ctrl: event.ctrl_key(),
        meta: event.meta_key(),
        shift: event.shift_key(),
        alt: event.alt_key(),
    }
}

fn pointer_x(event: &Event) -> Option<f64> {
    event.dyn_ref::<PointerEvent>().map(|e| e.client_x() as f64)
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Gated video widget mounted into a container element
#[wasm_bindgen]
pub struct VigilPlayer {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl VigilPlayer {
    /// Mount into `container`; `config` is a partial widget config object
    #[wasm_bindgen(constructor)]
    pub fn new(container: HtmlElement, config: JsValue) -> Result<VigilPlayer, JsValue> {
        let config: WidgetConfig = if config.is_undefined() || config.is_null() {
            WidgetConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        config.validate().map_err(js_error)?;

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
        let surface = Surface::build(&document, container.clone(), &config.container_id)?;

        let shared = Rc::new(Shared {
            widget: RefCell::new(None),
            queue: RefCell::new(VecDeque::new()),
            closed: Cell::new(false),
            surface,
            listeners: RefCell::new(Vec::new()),
        });

        let weak = Rc::downgrade(&shared);
        let embed_sink = Rc::new(move |signal: EmbedSignal| {
            if let Some(shared) = weak.upgrade() {
                shared.dispatch(Input::Embed(signal));
            }
        });
        let scheduler = Rc::new(BrowserScheduler::new(window.clone()));
        let weak = Rc::downgrade(&shared);
        scheduler.set_sink(Rc::new(move |id: TimerId, wakeup: Wakeup| {
            if let Some(shared) = weak.upgrade() {
                shared.dispatch(Input::Wake(id, wakeup));
            }
        }));

        let collaborators = Collaborators {
            embed: Box::new(YouTubeEmbed::new(window.clone(), document.clone(), embed_sink)),
            scheduler,
            fullscreen: Box::new(BrowserFullscreen::new(document.clone(), container.clone().into())),
            store: Box::new(LocalStorageFlagStore::new(&window)),
            boundary: Box::new(FetchSessionBoundary::new(window.clone(), &config.api_base)),
            navigator: Box::new(LocationNavigator::new(window.clone())),
            window: Box::new(BrowserWindow::new(window.clone())),
        };

        let widget = SecureWidget::mount(&config, collaborators).map_err(|e| {
            shared.surface.clear();
            js_error(e)
        })?;
        *shared.widget.borrow_mut() = Some(widget);

        wire(&shared, &window, &document);
        shared.drain();
        Ok(VigilPlayer { shared })
    }

    /// Tear down the embed, timers, listeners and overlay
    pub fn unmount(&self) {
        self.shared.close();
    }

    /// Current controls view as a plain object
    pub fn view(&self) -> Result<JsValue, JsValue> {
        let slot = self.shared.widget.try_borrow().map_err(js_error)?;
        match slot.as_ref() {
            Some(widget) => Ok(serde_wasm_bindgen::to_value(&widget.view())?),
            None => Ok(JsValue::NULL),
        }
    }

    /// "unstarted", "playing", "paused" or "ended"
    pub fn state(&self) -> Option<String> {
        let slot = self.shared.widget.try_borrow().ok()?;
        slot.as_ref().map(|widget| widget.state().to_string())
    }

    #[wasm_bindgen(js_name = isTerminated)]
    pub fn is_terminated(&self) -> bool {
        self.shared
            .widget
            .try_borrow()
            .ok()
            .and_then(|slot| slot.as_ref().map(SecureWidget::is_terminated))
            .unwrap_or(false)
    }
}

impl Drop for VigilPlayer {
    fn drop(&mut self) {
        self.shared.close();
    }
}

fn wire(shared: &Rc<Shared>, window: &web_sys::Window, document: &web_sys::Document) {
    let root: EventTarget = shared.surface.root().clone().into();
    let play: EventTarget = shared.surface.play_button().clone().into();
    let rewind: EventTarget = shared.surface.rewind_button().clone().into();
    let fullscreen: EventTarget = shared.surface.fullscreen_button().clone().into();
    let bar: EventTarget = shared.surface.bar().clone().into();

    shared.listen(&root, "pointermove", |s, _| s.dispatch(Input::Command(Command::PointerMoved)));
    shared.listen(&play, "click", |s, _| s.dispatch(Input::Command(Command::TogglePlay)));
    shared.listen(&rewind, "click", |s, _| s.dispatch(Input::Command(Command::Rewind)));
    shared.listen(&fullscreen, "click", |s, _| s.dispatch(Input::Command(Command::ToggleFullscreen)));

    shared.listen(&bar, "pointerdown", |s, e| {
        if let Some(pointer) = e.dyn_ref::<PointerEvent>() {
            let _ = s.surface.bar().set_pointer_capture(pointer.pointer_id());
            pointer.prevent_default();
        }
        if let Some(x) = pointer_x(&e) {
            let bounds = s.surface.bar_bounds();
            s.dispatch(Input::Command(Command::DragStart { x, bounds }));
        }
    });
    shared.listen(&bar, "pointermove", |s, e| {
        if let Some(x) = pointer_x(&e) {
            let bounds = s.surface.bar_bounds();
            s.dispatch(Input::Command(Command::DragMove { x, bounds }));
        }
    });
    shared.listen(&bar, "pointerup", |s, e| {
        if let Some(x) = pointer_x(&e) {
            let bounds = s.surface.bar_bounds();
            s.dispatch(Input::Command(Command::DragEnd { x, bounds }));
        }
    });
    // Touch pans end in pointercancel with no pointerup
    for event in ["pointercancel", "lostpointercapture"] {
        shared.listen(&bar, event, |s, _| s.dispatch(Input::Command(Command::DragCancel)));
    }

    let document_target: &EventTarget = document;
    let window_target: &EventTarget = window;

    shared.listen(document_target, "keydown", |s, e| {
        if let Some(key) = e.dyn_ref::<KeyboardEvent>() {
            if s.key(chord_from_event(key)) == InputDisposition::PreventDefault {
                key.prevent_default();
                key.stop_propagation();
            }
        }
    });
    shared.listen(document_target, "contextmenu", |s, e| {
        if s.context_menu() == InputDisposition::PreventDefault {
            e.prevent_default();
        }
    });
    shared.listen(document_target, "fullscreenchange", |s, _| s.dispatch(Input::FullscreenChange));
    shared.listen(window_target, "resize", |s, _| s.dispatch(Input::Resize));
    shared.listen(window_target, "pagehide", |s, _| s.dispatch(Input::Unload));
}

/// Clear the persisted tamper flag; call after a successful login
#[wasm_bindgen(js_name = clearTamperFlag)]
pub fn clear_flag(key: Option<String>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let key = key.unwrap_or_else(|| WidgetConfig::default().tamper_flag_key);
    let store = LocalStorageFlagStore::new(&window);
    clear_tamper_flag(&store, &key).map_err(js_error)
}
