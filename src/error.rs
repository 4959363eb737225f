//! Error types for the event core engine

use thiserror::Error;

/// Main error type for the event core engine
#[derive(Error, Debug)]
pub enum EventCoreError {
    #[error("Unknown event kind: {0}")]
    UnknownEventKind(String),

    #[error("Malformed content element <{element}>: {message}")]
    MalformedElement { element: String, message: String },

    #[error("No event manager settings match difficulty {0}")]
    SettingsNotFound(f32),

    #[error("No event manager settings loaded")]
    NoSettingsLoaded,

    #[error("Document error: {0}")]
    DocumentError(String),
}

impl From<serde_json::Error> for EventCoreError {
    fn from(err: serde_json::Error) -> Self {
        EventCoreError::DocumentError(err.to_string())
    }
}

/// Result type alias for the event core engine
pub type Result<T> = std::result::Result<T, EventCoreError>;
