//! Widget configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a mounted widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Embed video identifier
    pub video_id: String,
    /// DOM id of the node the embed replaces
    pub container_id: String,
    /// Inactivity window before controls hide while playing
    pub auto_hide_ms: u64,
    /// Rewind step in seconds
    pub rewind_seconds: f64,
    /// Outer/inner divergence (px) treated as inspection tooling
    pub tamper_threshold_px: f64,
    /// Tamper poll interval
    pub tamper_poll_ms: u64,
    /// Durable storage key of the tamper flag
    pub tamper_flag_key: String,
    /// Unauthenticated entry point navigated to on termination
    pub entry_point: String,
    /// Base of the session boundary endpoints
    pub api_base: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            video_id: String::new(),
            container_id: "vigil-player".to_string(),
            auto_hide_ms: 2000,
            rewind_seconds: 10.0,
            tamper_threshold_px: 160.0,
            tamper_poll_ms: 1000,
            tamper_flag_key: "vigil.tampered".to_string(),
            entry_point: "/".to_string(),
            api_base: "/api".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Default configuration for a video
    pub fn new(video_id: impl Into<String>) -> Self {
        Self { video_id: video_id.into(), ..Default::default() }
    }

    /// Parse from JSON, filling unspecified fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn auto_hide(&self) -> Duration {
        Duration::from_millis(self.auto_hide_ms)
    }

    pub fn tamper_poll(&self) -> Duration {
        Duration::from_millis(self.tamper_poll_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.video_id.trim().is_empty() {
            return Err(Error::InvalidConfig("video_id is required".into()));
        }
        if self.container_id.trim().is_empty() {
            return Err(Error::InvalidConfig("container_id is required".into()));
        }
        if self.auto_hide_ms == 0 {
            return Err(Error::InvalidConfig("auto_hide_ms must be positive".into()));
        }
        if self.tamper_poll_ms == 0 {
            return Err(Error::InvalidConfig("tamper_poll_ms must be positive".into()));
        }
        if !(self.rewind_seconds.is_finite() && self.rewind_seconds > 0.0) {
            return Err(Error::InvalidConfig("rewind_seconds must be positive".into()));
        }
        if !(self.tamper_threshold_px.is_finite() && self.tamper_threshold_px > 0.0) {
            return Err(Error::InvalidConfig("tamper_threshold_px must be positive".into()));
        }
        if self.tamper_flag_key.is_empty() {
            return Err(Error::InvalidConfig("tamper_flag_key is required".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WidgetConfig::new("dqFY2ijqM-4");
        assert_eq!(config.auto_hide(), Duration::from_secs(2));
        assert_eq!(config.tamper_poll(), Duration::from_secs(1));
        assert_eq!(config.rewind_seconds, 10.0);
        assert_eq!(config.tamper_threshold_px, 160.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = WidgetConfig::from_json(r#"{"video_id": "abc", "entry_point": "/login"}"#).unwrap();
        assert_eq!(config.video_id, "abc");
        assert_eq!(config.entry_point, "/login");
        assert_eq!(config.container_id, "vigil-player");
    }

    #[test]
    fn test_validation() {
        assert!(matches!(WidgetConfig::default().validate(), Err(Error::InvalidConfig(_))));

        let mut config = WidgetConfig::new("abc");
        config.tamper_poll_ms = 0;
        assert!(config.validate().is_err());

        let mut config = WidgetConfig::new("abc");
        config.tamper_threshold_px = -1.0;
        assert!(config.validate().is_err());
    }
}
