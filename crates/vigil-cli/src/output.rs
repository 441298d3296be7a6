//! Output formatting for CLI

use crate::scenario::Frame;
use serde::Serialize;
use vigil_core::{MessageBody, ProtectedBody};

/// Output format options
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

fn to_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

pub fn print_message(action: &str, body: &MessageBody, format: &str) {
    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(body)),
        OutputFormat::Text => println!("{}: {}", action, body.message),
    }
}

pub fn print_protected(body: &ProtectedBody, format: &str) {
    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(body)),
        OutputFormat::Text => println!("session: {} (user: {})", body.message, body.user.username),
    }
}

pub fn print_rejection(status: u16, message: &str, format: &str) {
    match OutputFormat::from(format) {
        OutputFormat::Json => println!(
            "{}",
            to_json(&serde_json::json!({ "status": status, "message": message }))
        ),
        OutputFormat::Text => println!("session: rejected ({}) {}", status, message),
    }
}

pub fn print_frames(frames: &[Frame], format: &str) {
    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&frames)),
        OutputFormat::Text => {
            for frame in frames {
                println!("{}", frame_line(frame));
            }
        }
    }
}

fn frame_line(frame: &Frame) -> String {
    let v = &frame.view;
    let mut line = format!(
        "{:>3} [{:>7.2}s] {:<12} state={:<9} controls={:<6} {}/{} ({:.1}%)",
        frame.step,
        frame.at_ms as f64 / 1000.0,
        frame.op,
        v.state.to_string(),
        if v.controls_visible { "shown" } else { "hidden" },
        v.elapsed,
        v.total,
        v.fill_percent,
    );
    if !v.play_enabled {
        line.push_str(" disabled");
    }
    if v.dragging {
        line.push_str(" dragging");
    }
    if v.fullscreen {
        line.push_str(" fullscreen");
    }
    if v.terminated {
        line.push_str(&format!(" TERMINATED logouts={} -> {}", frame.logouts, frame.navigated.join(",")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{ControlsView, PlaybackState};

    #[test]
    fn test_frame_line() {
        let frame = Frame {
            step: 4,
            op: "advance",
            at_ms: 2500,
            view: ControlsView {
                state: PlaybackState::Playing,
                ready: true,
                play_enabled: true,
                play_label: "Pause".into(),
                controls_visible: false,
                fullscreen: false,
                dragging: false,
                fraction: 0.24,
                fill_percent: 24.0,
                elapsed: "0:30".into(),
                total: "2:05".into(),
                terminated: false,
            },
            logouts: 0,
            navigated: Vec::new(),
        };
        let line = frame_line(&frame);
        assert!(line.contains("state=playing"));
        assert!(line.contains("controls=hidden"));
        assert!(line.contains("0:30/2:05 (24.0%)"));
        assert!(!line.contains("TERMINATED"));
    }
}
