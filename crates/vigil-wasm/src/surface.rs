//! DOM controls overlay
//!
//! The surface is a pure projection of [`ControlsView`]; every user input
//! goes through the core and comes back as a new view.

use vigil_core::{BarBounds, ControlsView};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

const HIDDEN: &str = "vigil-hidden";
const FULLSCREEN: &str = "vigil-fullscreen";
const DRAGGING: &str = "vigil-dragging";
const NOT_READY: &str = "vigil-not-ready";
const TERMINATED: &str = "vigil-terminated";

pub struct Surface {
    root: HtmlElement,
    player_host: HtmlElement,
    controls: HtmlElement,
    play: HtmlElement,
    rewind: HtmlElement,
    fullscreen: HtmlElement,
    bar: HtmlElement,
    fill: HtmlElement,
    thumb: HtmlElement,
    time: HtmlElement,
    notice: HtmlElement,
}

fn element(document: &Document, tag: &str, class: &str) -> Result<HtmlElement, JsValue> {
    let el = document.create_element(tag)?.dyn_into::<HtmlElement>()?;
    el.set_class_name(class);
    Ok(el)
}

fn button(document: &Document, class: &str, label: &str) -> Result<HtmlElement, JsValue> {
    let el = element(document, "button", class)?;
    el.set_attribute("type", "button")?;
    el.set_attribute("aria-label", label)?;
    el.set_text_content(Some(label));
    Ok(el)
}

fn toggle(el: &Element, class: &str, on: bool) {
    let _ = el.class_list().toggle_with_force(class, on);
}

impl Surface {
    /// Build the overlay inside `root`; the player host gets `player_id`
    pub fn build(document: &Document, root: HtmlElement, player_id: &str) -> Result<Self, JsValue> {
        root.class_list().add_1("vigil-root")?;

        let player_host = element(document, "div", "vigil-player")?;
        player_host.set_id(player_id);

        let controls = element(document, "div", "vigil-controls")?;
        let play = button(document, "vigil-play", "Play")?;
        let rewind = button(document, "vigil-rewind", "Rewind")?;
        let fullscreen = button(document, "vigil-fullscreen-toggle", "Fullscreen")?;

        let bar = element(document, "div", "vigil-bar")?;
        bar.set_attribute("role", "slider")?;
        bar.set_attribute("aria-valuemin", "0")?;
        bar.set_attribute("aria-valuemax", "100")?;
        bar.style().set_property("touch-action", "none")?;
        let fill = element(document, "div", "vigil-fill")?;
        let thumb = element(document, "div", "vigil-thumb")?;
        bar.append_child(&fill)?;
        bar.append_child(&thumb)?;

        let time = element(document, "span", "vigil-time")?;
        let notice = element(document, "div", "vigil-notice")?;
        notice.set_text_content(Some("Session ended"));

        controls.append_child(&play)?;
        controls.append_child(&rewind)?;
        controls.append_child(&bar)?;
        controls.append_child(&time)?;
        controls.append_child(&fullscreen)?;

        root.append_child(&player_host)?;
        root.append_child(&controls)?;
        root.append_child(&notice)?;

        Ok(Self { root, player_host, controls, play, rewind, fullscreen, bar, fill, thumb, time, notice })
    }

    pub fn root(&self) -> &HtmlElement {
        &self.root
    }

    pub fn play_button(&self) -> &HtmlElement {
        &self.play
    }

    pub fn rewind_button(&self) -> &HtmlElement {
        &self.rewind
    }

    pub fn fullscreen_button(&self) -> &HtmlElement {
        &self.fullscreen
    }

    pub fn bar(&self) -> &HtmlElement {
        &self.bar
    }

    /// Current on-screen extent of the bar
    pub fn bar_bounds(&self) -> BarBounds {
        let rect = self.bar.get_bounding_client_rect();
        BarBounds::new(rect.left(), rect.width())
    }

    pub fn render(&self, view: &ControlsView) {
        toggle(&self.controls, HIDDEN, !view.controls_visible);
        toggle(&self.root, FULLSCREEN, view.fullscreen);
        toggle(&self.root, DRAGGING, view.dragging);
        toggle(&self.root, NOT_READY, !view.ready);
        toggle(&self.root, TERMINATED, view.terminated);
        toggle(&self.notice, HIDDEN, !view.terminated);

        for control in [&self.play, &self.rewind, &self.fullscreen] {
            let _ = if view.play_enabled {
                control.remove_attribute("disabled")
            } else {
                control.set_attribute("disabled", "")
            };
        }
        self.play.set_text_content(Some(&view.play_label));
        let _ = self.play.set_attribute("aria-label", &view.play_label);

        let percent = format!("{:.3}%", view.fill_percent);
        let _ = self.fill.style().set_property("width", &percent);
        let _ = self.thumb.style().set_property("left", &percent);
        let _ = self.bar.set_attribute("aria-valuenow", &format!("{:.0}", view.fill_percent));
        self.time.set_text_content(Some(&format!("{} / {}", view.elapsed, view.total)));
    }

    /// Remove everything `build` added
    pub fn clear(&self) {
        // The embed swaps the host div for its iframe under the same id
        let id = self.player_host.id();
        if let Some(frame) = self.root.owner_document().and_then(|d| d.get_element_by_id(&id)) {
            frame.remove();
        }
        self.player_host.remove();
        self.controls.remove();
        self.notice.remove();
        for class in ["vigil-root", FULLSCREEN, DRAGGING, NOT_READY, TERMINATED] {
            let _ = self.root.class_list().remove_1(class);
        }
    }
}
