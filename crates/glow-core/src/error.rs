//! Error Types

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// Message delivery through the chat gateway failed
    #[error("Chat delivery error: {0}")]
    Chat(String),

    /// Content catalogue missing or malformed
    #[error("Content error: {0}")]
    Content(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Chat(_) => "The message could not be delivered. Please try again.".into(),
            CoreError::Content(_) | CoreError::Config(_) => {
                "The bot is misconfigured. Please contact support.".into()
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}
