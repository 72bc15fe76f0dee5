//! MCP tool server for Google Calendar and Google Tasks.
//!
//! This crate provides:
//! - the twelve Calendar and Tasks tools
//! - the error adapter that turns every tool failure into text
//! - JSON-RPC dispatch and the stdio loop
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use gapi_providers::google::{GoogleConfig, GoogleServices};
//! use gapi_server::{RequestHandler, ServerConfig, StdioServer, Toolbox};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let services = GoogleServices::new(GoogleConfig::default())?;
//!     let handler = RequestHandler::new(ServerConfig::default(), Toolbox::new(Arc::new(services)));
//!     StdioServer::new(handler).run().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod handler;
mod stdio;
pub mod tools;

pub use config::{DEFAULT_INSTRUCTIONS, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use handler::RequestHandler;
pub use stdio::StdioServer;
pub use tools::{ToolDef, Toolbox, all_tools};
