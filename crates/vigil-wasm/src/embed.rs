//! YouTube IFrame API backend for the embed adapter
//!
//! The IFrame API is callback-driven: readiness of the API, of each player
//! and every state change arrive through registered JS callbacks. All of
//! them are turned into [`EmbedSignal`]s and handed to the widget's sink.

use crate::describe;
use js_sys::{Function, Object, Reflect};
use std::rc::Rc;
use vigil_core::{EmbedApi, EmbedErrorCode, EmbedInstance, Error, PlaybackState, PlayerEvent, Result};
use wasm_bindgen::{prelude::*, JsCast};
use web_sys::{Document, HtmlScriptElement, Window};

const API_READY_HOOK: &str = "onYouTubeIframeAPIReady";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = YT, js_name = Player)]
    type YtPlayer;

    #[wasm_bindgen(constructor, catch, js_namespace = YT, js_class = "Player")]
    fn new(element_id: &str, options: &Object) -> std::result::Result<YtPlayer, JsValue>;

    #[wasm_bindgen(method, catch, js_name = playVideo)]
    fn play_video(this: &YtPlayer) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = pauseVideo)]
    fn pause_video(this: &YtPlayer) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = seekTo)]
    fn seek_to(this: &YtPlayer, seconds: f64, allow_seek_ahead: bool) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = getCurrentTime)]
    fn get_current_time(this: &YtPlayer) -> std::result::Result<f64, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getDuration)]
    fn get_duration(this: &YtPlayer) -> std::result::Result<f64, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn destroy(this: &YtPlayer) -> std::result::Result<(), JsValue>;
}

/// Everything the embed reports back
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedSignal {
    ApiReady,
    LoadFailed(String),
    Player(PlayerEvent),
}

pub type EmbedSink = Rc<dyn Fn(EmbedSignal)>;

/// Embed API over the page's `YT` global
pub struct YouTubeEmbed {
    window: Window,
    document: Document,
    sink: EmbedSink,
}

impl YouTubeEmbed {
    pub fn new(window: Window, document: Document, sink: EmbedSink) -> Self {
        let embed = Self { window, document, sink };
        if !embed.api_ready() {
            embed.install_ready_hook();
        }
        embed
    }

    /// Chain onto the global ready hook so several widgets can wait at once
    fn install_ready_hook(&self) {
        let previous = Reflect::get(&self.window, &API_READY_HOOK.into())
            .ok()
            .and_then(|v| v.dyn_into::<Function>().ok());
        let sink = self.sink.clone();
        let hook = Closure::once_into_js(move || {
            if let Some(previous) = previous {
                let _ = previous.call0(&JsValue::NULL);
            }
            sink(EmbedSignal::ApiReady);
        });
        if let Err(e) = Reflect::set(&self.window, &API_READY_HOOK.into(), &hook) {
            web_sys::console::warn_1(&format!("[Vigil] could not install API hook: {}", describe(&e)).into());
        }
    }

    fn player_options(&self, video_id: &str, callbacks: &[(&str, &Closure<dyn FnMut(JsValue)>)]) -> std::result::Result<Object, JsValue> {
        let vars = Object::new();
        for (key, value) in [
            ("controls", 0),
            ("disablekb", 1),
            ("fs", 0),
            ("modestbranding", 1),
            ("rel", 0),
            ("playsinline", 1),
            ("iv_load_policy", 3),
        ] {
            Reflect::set(&vars, &key.into(), &value.into())?;
        }

        let events = Object::new();
        for (name, callback) in callbacks {
            Reflect::set(&events, &(*name).into(), callback.as_ref())?;
        }

        let options = Object::new();
        Reflect::set(&options, &"videoId".into(), &video_id.into())?;
        Reflect::set(&options, &"width".into(), &"100%".into())?;
        Reflect::set(&options, &"height".into(), &"100%".into())?;
        Reflect::set(&options, &"playerVars".into(), &vars)?;
        Reflect::set(&options, &"events".into(), &events)?;
        Ok(options)
    }
}

fn event_code(event: &JsValue) -> Option<i32> {
    Reflect::get(event, &"data".into()).ok()?.as_f64().map(|v| v as i32)
}

impl EmbedApi for YouTubeEmbed {
    fn script_present(&self, element_id: &str) -> bool {
        self.document.get_element_by_id(element_id).is_some()
    }

    fn inject_script(&self, element_id: &str, src: &str) -> Result<()> {
        let script = self
            .document
            .create_element("script")
            .map_err(|e| Error::EmbedLoad(describe(&e)))?
            .dyn_into::<HtmlScriptElement>()
            .map_err(|_| Error::EmbedLoad("not a script element".into()))?;
        script.set_id(element_id);
        script.set_src(src);
        script.set_async(true);

        let sink = self.sink.clone();
        let on_error = Closure::once_into_js(move || {
            sink(EmbedSignal::LoadFailed("embed script failed to load".into()));
        });
        script.set_onerror(Some(on_error.unchecked_ref()));

        let body = self.document.body().ok_or_else(|| Error::EmbedLoad("document has no body".into()))?;
        body.append_child(&script).map_err(|e| Error::EmbedLoad(describe(&e)))?;
        Ok(())
    }

    fn api_ready(&self) -> bool {
        Reflect::get(&self.window, &"YT".into())
            .ok()
            .filter(|yt| yt.is_object())
            .and_then(|yt| Reflect::get(&yt, &"Player".into()).ok())
            .is_some_and(|player| player.is_function())
    }

    fn construct(&self, container_id: &str, video_id: &str) -> Result<Box<dyn EmbedInstance>> {
        let sink = self.sink.clone();
        let on_ready = Closure::<dyn FnMut(JsValue)>::new(move |_event: JsValue| {
            sink(EmbedSignal::Player(PlayerEvent::Ready));
        });

        let sink = self.sink.clone();
        let on_state = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            if let Some(state) = event_code(&event).and_then(PlaybackState::from_embed_code) {
                sink(EmbedSignal::Player(PlayerEvent::StateChange(state)));
            }
        });

        let sink = self.sink.clone();
        let on_error = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            let code = EmbedErrorCode::from_code(event_code(&event).unwrap_or(-1));
            sink(EmbedSignal::Player(PlayerEvent::Error(code)));
        });

        let options = self
            .player_options(
                video_id,
                &[("onReady", &on_ready), ("onStateChange", &on_state), ("onError", &on_error)],
            )
            .map_err(|e| Error::EmbedConstruct(describe(&e)))?;
        let player = YtPlayer::new(container_id, &options).map_err(|e| Error::EmbedConstruct(describe(&e)))?;

        Ok(Box::new(YouTubeInstance { player, _callbacks: vec![on_ready, on_state, on_error] }))
    }
}

struct YouTubeInstance {
    player: YtPlayer,
    _callbacks: Vec<Closure<dyn FnMut(JsValue)>>,
}

impl EmbedInstance for YouTubeInstance {
    fn play(&self) {
        let _ = self.player.play_video();
    }

    fn pause(&self) {
        let _ = self.player.pause_video();
    }

    fn seek(&self, seconds: f64, allow_seek_ahead: bool) {
        let _ = self.player.seek_to(seconds, allow_seek_ahead);
    }

    fn current_time(&self) -> Option<f64> {
        self.player.get_current_time().ok()
    }

    fn duration(&self) -> Option<f64> {
        self.player.get_duration().ok()
    }

    fn destroy(&self) {
        if let Err(e) = self.player.destroy() {
            web_sys::console::warn_1(&format!("[Vigil] embed destroy failed: {}", describe(&e)).into());
        }
    }
}
