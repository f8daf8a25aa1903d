//! Error taxonomy for calls against the number social API.

use shared::error::{ApiErrorBody, ErrorCode};
use thiserror::Error;

/// Shown when the server gave no usable message.
pub const FALLBACK_ERROR_MESSAGE: &str = "An error occurred";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

impl ClientError {
    /// Maps a non-success response into the taxonomy. `body` is the raw
    /// response text; the `{ "error": ... }` message is used when present.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .map(|body| body.error)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string());

        match ErrorCode::from_status(status) {
            ErrorCode::Validation | ErrorCode::Conflict => Self::Validation(message),
            ErrorCode::Unauthorized | ErrorCode::Forbidden => Self::Auth(message),
            ErrorCode::NotFound | ErrorCode::Internal => Self::Server { status, message },
        }
    }

    /// Message suitable for inline display next to the form that failed.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Validation(message) | Self::Auth(message) => message,
            Self::Server { message, .. } => message,
            Self::Network(_) => FALLBACK_ERROR_MESSAGE,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Server {
                status: err.status().map(|s| s.as_u16()).unwrap_or(200),
                message: FALLBACK_ERROR_MESSAGE.to_string(),
            };
        }
        Self::Network(err.to_string())
    }
}
