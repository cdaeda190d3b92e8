//! Error types for the chatline client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every chatline library crate.
///
/// The first four variants form the gateway taxonomy: each backend call fails
/// with exactly one of `Unauthorized`, `Validation`, `Server` or `Network`.
/// The remaining variants cover local concerns (storage, config, protocol
/// capabilities).
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatError {
    /// The backend rejected the credential or the session (HTTP 401).
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Bad or empty input, rejected locally or by the backend (4xx other than 401).
    #[error("{0}")]
    Validation(String),

    /// Non-2xx response that is neither 401 nor another 4xx.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Transport failure, no HTTP status was received.
    #[error("Network error: {0}")]
    Network(String),

    /// Login succeeded but the backend never confirmed the session.
    #[error("Session not confirmed: {0}")]
    SessionNotConfirmed(String),

    /// The configured backend flavor has no endpoint for the operation.
    #[error("Operation not supported by this backend: {0}")]
    Unsupported(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Server error
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates an Unsupported error naming the missing operation
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported(operation.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this error must force the client back to the login screen.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Only a transport failure is safe to retry: the request never produced a
    /// response, so the backend applied no side effects that we know of.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// The humanized message shown in notifications and error surfaces.
    ///
    /// Validation messages are returned verbatim, since they usually come
    /// straight from the backend.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { message } => message.clone(),
            Self::Validation(message) => message.clone(),
            Self::Server { message, .. } => message.clone(),
            Self::Network(message) => format!("Network unavailable: {message}"),
            Self::SessionNotConfirmed(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ChatError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ChatError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from String (for error messages)
impl From<String> for ChatError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, ChatError>`.
pub type Result<T> = std::result::Result<T, ChatError>;
