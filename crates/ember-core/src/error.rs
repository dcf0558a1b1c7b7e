//! Unified error types for the Ember core.
//!
//! Two layers are distinguished:
//!
//! - [`ApiError`] describes a failed remote call and is produced by the
//!   transport behind [`RestClient`](crate::RestClient).
//! - [`CoreError`] is what manager methods return. Remote failures are wrapped
//!   unchanged in [`CoreError::Remote`].

use thiserror::Error;

// =============================================================================
// API Errors
// =============================================================================

/// Error type for remote API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The transport cannot issue requests.
    #[error("REST transport is not available")]
    NotSupported,
    /// The request timed out.
    #[error("API request timed out")]
    Timeout,
    /// The API answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Platform error code from the response body, if present.
        code: Option<i64>,
        /// Error message from the response body.
        message: String,
    },
    /// Failed to serialize or deserialize a body.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Network-level failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Returns the HTTP status if this error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Core Errors
// =============================================================================

/// Errors returned by managers and entity constructors.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// A required field is missing from a payload.
    #[error("malformed {entity} payload: missing `{field}`")]
    MalformedPayload {
        /// Entity type name.
        entity: &'static str,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A resolvable does not map to any cached entity.
    #[error("could not resolve {expected}")]
    UnresolvedReference {
        /// What the caller was expected to pass, e.g. `StickerResolvable`.
        expected: &'static str,
    },

    /// Caller-supplied data cannot be used for the request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The remote call failed.
    #[error(transparent)]
    Remote(#[from] ApiError),
}

impl CoreError {
    /// Creates a malformed payload error.
    pub fn malformed(entity: &'static str, field: &'static str) -> Self {
        Self::MalformedPayload { entity, field }
    }

    /// Creates an unresolved reference error.
    pub fn unresolved(expected: &'static str) -> Self {
        Self::UnresolvedReference { expected }
    }

    /// Creates an invalid argument error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for remote API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for manager and entity operations.
pub type CoreResult<T> = Result<T, CoreError>;
