//! Command-line entry point for gapi.
//!
//! This crate provides the `gapi` binary: the stdio MCP server plus the
//! `auth`, `status` and `config` helpers.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use config::AppConfig;
pub use error::{ClientError, ClientResult};
