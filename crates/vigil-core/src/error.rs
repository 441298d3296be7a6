//! Error types for Vigil Core

use thiserror::Error;

/// Result type alias for widget operations
pub type Result<T> = std::result::Result<T, Error>;

/// Widget error types
///
/// Nothing in here is ever shown to the viewer. The adapter and controller
/// log and swallow these, so a failure degrades to "control has no effect".
#[derive(Error, Debug)]
pub enum Error {
    // Embed errors
    #[error("Failed to load embed script: {0}")]
    EmbedLoad(String),

    #[error("Failed to construct embed player: {0}")]
    EmbedConstruct(String),

    #[error("Embed player not ready")]
    AdapterNotReady,

    // Host errors
    #[error("Durable storage error: {0}")]
    Storage(String),

    #[error("Fullscreen request failed: {0}")]
    Fullscreen(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Session boundary errors
    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Session request rejected ({status}): {message}")]
    SessionRejected { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Returns true if retrying the same operation could succeed
    ///
    /// Embed failures are deliberately not in this list: a widget whose
    /// embed failed stays disabled for its lifetime.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::AdapterNotReady | Error::Storage(_) | Error::Fullscreen(_) => true,
            #[cfg(feature = "http")]
            Error::Network(_) => true,
            _ => false,
        }
    }

    /// Returns the error code used in log fields
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::EmbedLoad(_) => "EMBED_LOAD",
            Error::EmbedConstruct(_) => "EMBED_CONSTRUCT",
            Error::AdapterNotReady => "NOT_READY",
            Error::Storage(_) => "STORAGE",
            Error::Fullscreen(_) => "FULLSCREEN",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            #[cfg(feature = "http")]
            Error::Network(_) => "NETWORK",
            Error::SessionRejected { .. } => "SESSION_REJECTED",
            Error::Url(_) => "URL",
            Error::Serialization(_) => "SERIALIZATION",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::AdapterNotReady.error_code(), "NOT_READY");
        assert_eq!(Error::EmbedLoad("blocked".into()).error_code(), "EMBED_LOAD");
        assert_eq!(
            Error::SessionRejected { status: 401, message: "Unauthorized".into() }.error_code(),
            "SESSION_REJECTED"
        );
    }

    #[test]
    fn test_embed_failures_are_permanent() {
        assert!(!Error::EmbedLoad("x".into()).is_recoverable());
        assert!(!Error::EmbedConstruct("x".into()).is_recoverable());
        assert!(Error::AdapterNotReady.is_recoverable());
    }

    #[test]
    fn test_rejection_message() {
        let err = Error::SessionRejected { status: 400, message: "Username and password are required".into() };
        assert_eq!(
            err.to_string(),
            "Session request rejected (400): Username and password are required"
        );
    }
}
