//! Error types for helmet-client
//!
//! `ClientError` is the normalized error every caller observes. Raw transport
//! failures are only ever inspected by the interceptor pipeline, which folds
//! them into one of `Network`, `Server` or `SessionExpired`.

use crate::realtime::RealtimeState;
use thiserror::Error;

/// Message used when neither the server nor the transport supplied one
pub const FALLBACK_MESSAGE: &str = "request failed";

/// Errors surfaced by the client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport never reached the server (DNS, connect, timeout, ...)
    #[error("{message}")]
    Network { message: String },

    /// Server answered with a status >= 400
    #[error("{message}")]
    Server {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    /// Server answered 401 outside of the login/register entry points
    #[error("{message}")]
    SessionExpired {
        message: String,
        body: Option<serde_json::Value>,
    },

    /// Realtime operation issued in a state that does not allow it
    #[error("Cannot {operation} realtime detection while {state}")]
    InvalidState {
        operation: &'static str,
        state: RealtimeState,
    },

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Payload could not be decoded (e.g. base64 frame image)
    #[error("Decode error: {0}")]
    Decode(String),

    /// Credential store read/write failure
    #[error("Credential store error: {0}")]
    CredentialStore(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Background polling task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),
}

impl ClientError {
    /// Human-readable message, never empty
    pub fn message(&self) -> String {
        match self {
            Self::Network { message }
            | Self::Server { message, .. }
            | Self::SessionExpired { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status code when the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::SessionExpired { .. } => Some(401),
            _ => None,
        }
    }

    /// Structured error body returned by the server, if any
    pub fn raw_response(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Server { body, .. } | Self::SessionExpired { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// True for the 401 variant that triggers credential clearing
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
