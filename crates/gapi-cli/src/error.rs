//! Client error types.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors reported by the `gapi` binary.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Credential or Google API failure.
    #[error("{0}")]
    Provider(#[from] gapi_providers::ProviderError),

    /// The server loop stopped with an error.
    #[error("server error: {0}")]
    Server(#[from] gapi_server::ServerError),

    /// Tracing could not be initialized.
    #[error("{0}")]
    Tracing(#[from] gapi_core::TracingError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
