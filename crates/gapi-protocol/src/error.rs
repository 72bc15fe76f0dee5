//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while framing or decoding messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Message exceeds maximum allowed size.
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// Failed to serialize or parse JSON.
    #[error("invalid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The `jsonrpc` member is not "2.0".
    #[error("unsupported JSON-RPC version: {0}")]
    UnsupportedVersion(String),

    /// Empty line received.
    #[error("empty message")]
    EmptyMessage,
}
