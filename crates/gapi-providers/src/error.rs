//! Error types for credential and Google API operations.
//!
//! Every failure the tool layer can see is a [`ProviderError`]. The code
//! separates remote-service faults (the API answered with a non-2xx status)
//! from everything else, which is what the tool-boundary adapter needs to
//! pick a message format.

use std::fmt;
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Interactive authorization is required but the application
    /// credential descriptor (client secret file) is missing.
    ClientSecretMissing,
    /// Refreshing an expired access token failed.
    RefreshFailed,
    /// The interactive consent flow failed (denied, timed out, bad callback).
    AuthenticationFailed,
    /// The credential file exists but cannot be parsed.
    CorruptStore,
    /// The remote API rejected the request.
    RemoteFault,
    /// Connection failed, DNS resolution, etc.
    NetworkError,
    /// A request or the callback listener timed out.
    Timeout,
    /// The remote answered with something we could not parse.
    InvalidResponse,
    /// A tool argument failed validation.
    InvalidInput,
    /// Configuration error - missing or invalid config.
    ConfigurationError,
    /// Unexpected state, bug.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true for the authentication family of errors.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::ClientSecretMissing | Self::RefreshFailed | Self::AuthenticationFailed
        )
    }

    /// Returns a stable snake_case name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientSecretMissing => "client_secret_missing",
            Self::RefreshFailed => "refresh_failed",
            Self::AuthenticationFailed => "authentication_failed",
            Self::CorruptStore => "corrupt_store",
            Self::RemoteFault => "remote_fault",
            Self::NetworkError => "network_error",
            Self::Timeout => "timeout",
            Self::InvalidResponse => "invalid_response",
            Self::InvalidInput => "invalid_input",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while authenticating or calling a Google API.
#[derive(Debug, Error)]
pub struct ProviderError {
    /// The error code categorizing this error.
    code: ProviderErrorCode,
    /// A human-readable message; the service reason for remote faults.
    message: String,
    /// HTTP status for remote faults.
    status: Option<u16>,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Creates a missing client secret error.
    pub fn client_secret_missing(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ClientSecretMissing, message)
    }

    /// Creates a refresh failure.
    pub fn refresh_failed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RefreshFailed, message)
    }

    /// Creates an authentication (consent flow) error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    /// Creates a corrupt credential store error.
    pub fn corrupt_store(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::CorruptStore, message)
    }

    /// Creates a remote-service fault with the HTTP status and the
    /// service-provided reason.
    pub fn remote(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(ProviderErrorCode::RemoteFault, reason)
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Timeout, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidInput, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status of a remote fault.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns true if the remote API rejected the request.
    pub fn is_remote(&self) -> bool {
        self.code == ProviderErrorCode::RemoteFault
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) if self.is_remote() => {
                write!(f, "Google API error {}: {}", status, self.message)
            }
            _ => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl From<gapi_core::TimeError> for ProviderError {
    fn from(err: gapi_core::TimeError) -> Self {
        Self::invalid_input(err.to_string())
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
