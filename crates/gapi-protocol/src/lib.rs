//! JSON-RPC 2.0 framing and Model Context Protocol types for gapi.
//!
//! # Wire format
//!
//! The server speaks MCP over stdio: one JSON-RPC message per line,
//! UTF-8, terminated by `\n`. Messages never contain raw newlines because
//! JSON escapes them inside strings.
//!
//! # Example
//!
//! ```rust
//! use gapi_protocol::{Request, RequestId, encode_message, decode_message};
//!
//! let request = Request::new(RequestId::Number(1), "ping", None);
//! let bytes = encode_message(&request).unwrap();
//! let decoded: Request = decode_message(&bytes).unwrap();
//! assert_eq!(decoded.method, "ping");
//! ```

mod error;
mod framing;
pub mod mcp;
mod types;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{decode_message, encode_message};
pub use mcp::{
    CallToolParams, CallToolResult, Content, Implementation, InitializeParams, InitializeResult,
    ListToolsResult, ServerCapabilities, Tool, ToolsCapability, negotiate_version,
};
pub use types::{ErrorCode, ErrorObject, Request, RequestId, Response};

/// JSON-RPC version string carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// Maximum size of a single line (4 MiB).
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;
