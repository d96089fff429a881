//! Error types for the housekeeping client crate.

use thiserror::Error;

/// Result type alias for backend client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to the housekeeping backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API error response from the backend
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Success status with a body of the wrong shape
    #[error("Unexpected response: {0}")]
    MalformedResponse(String),

    /// Invalid request (missing required data, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication error (missing or invalid token)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Websocket transport error on the realtime channel
    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

impl ClientError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Detail of a core payload error, without its display prefix.
pub(crate) fn payload_detail(err: housekeeping_core::Error) -> String {
    match err {
        housekeeping_core::Error::MalformedPayload(detail) => detail,
        other => other.to_string(),
    }
}

impl From<ClientError> for housekeeping_core::Error {
    fn from(err: ClientError) -> Self {
        use housekeeping_core::Error;

        match err {
            ClientError::Http(e) if e.is_decode() => Error::malformed(e.to_string()),
            ClientError::Http(e) => Error::transport(e.to_string()),
            ClientError::Json(e) => Error::malformed(e.to_string()),
            ClientError::MalformedResponse(message) => Error::malformed(message),
            ClientError::Api { status, message } => Error::api(status, message),
            ClientError::InvalidRequest(message) => Error::invalid_input(message),
            ClientError::Auth(message) => Error::auth(message),
            ClientError::WebSocket(message) => Error::channel(message),
        }
    }
}
