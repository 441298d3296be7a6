//! Browser console sink for the core's tracing events

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use wasm_bindgen::JsValue;

/// Writes each event as one console line at the matching console level
pub struct ConsoleLayer;

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: Vec<(&'static str, String)>,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.fields.push((field.name(), value.to_owned()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name(), format!("{value:?}")));
        }
    }
}

pub(crate) fn render_line(level: &Level, target: &str, message: &str, fields: &[(&str, String)]) -> String {
    let mut line = format!("[Vigil] {level} {target}: {message}");
    for (name, value) in fields {
        line.push_str(&format!(" {name}={value}"));
    }
    line
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let meta = event.metadata();
        let level = *meta.level();
        let line = JsValue::from_str(&render_line(&level, meta.target(), &visitor.message, &visitor.fields));
        if level == Level::ERROR {
            web_sys::console::error_1(&line);
        } else if level == Level::WARN {
            web_sys::console::warn_1(&line);
        } else if level == Level::INFO {
            web_sys::console::info_1(&line);
        } else {
            web_sys::console::debug_1(&line);
        }
    }
}

/// Install the console layer as the global subscriber. A second call, or a
/// subscriber set by the page's own bundle, leaves the existing one in place.
pub fn install(max_level: LevelFilter) {
    let subscriber = tracing_subscriber::registry().with(max_level).with(ConsoleLayer);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        web_sys::console::debug_1(&"[Vigil] tracing subscriber already installed".into());
    }
}
