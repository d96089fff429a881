//! Error types shared by the housekeeping crates.

use thiserror::Error;

use crate::rooms::RoomId;

/// Result type alias for housekeeping operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by views and the collaborators they call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Network or transport failure before a response was received
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-success HTTP status with the backend's message
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    MalformedPayload(String),

    /// Realtime channel failure
    #[error("Realtime channel error: {0}")]
    Channel(String),

    /// Operation referenced a room that is not in the cache
    #[error("Room {0} is not loaded")]
    UnknownRoom(RoomId),

    /// Missing or rejected credential
    #[error("Authentication error: {0}")]
    Auth(String),

    /// User input rejected before any request was sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload(message.into())
    }

    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Text shown to the user in a notice.
    ///
    /// API errors carry the backend's message verbatim; everything else uses
    /// the display form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}
