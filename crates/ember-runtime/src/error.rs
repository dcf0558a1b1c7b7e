//! Runtime error types.

use ember_core::ApiError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while setting up the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The REST transport could not be built.
    #[error("Failed to build REST transport: {0}")]
    Transport(#[from] ApiError),

    /// No REST transport was supplied and none is compiled in.
    #[error("No REST transport available; enable the http-client feature or supply one")]
    NoTransport,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
