//! Server error types.

use std::io;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that stop the server loop.
///
/// Tool failures never show up here; they are turned into tool results.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Reading stdin or writing stdout failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A response could not be encoded.
    #[error("Protocol error: {0}")]
    Protocol(#[from] gapi_protocol::ProtocolError),

    /// Building the Google services failed.
    #[error("Provider error: {0}")]
    Provider(#[from] gapi_providers::ProviderError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
