//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// gapi - Google Calendar and Tasks tools for MCP agents
#[derive(Debug, Parser)]
#[command(name = "gapi")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "GAPI_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output (on stderr)
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Path to the stored OAuth credentials
    #[arg(long, env = "GAPI_CREDENTIALS", global = true)]
    pub credentials: Option<PathBuf>,

    /// Path to the client secret JSON downloaded from Google Cloud Console
    #[arg(long, env = "GAPI_CLIENT_SECRET", global = true)]
    pub client_secret: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the MCP server on stdin/stdout (default)
    Serve,

    /// Authorize access to Google Calendar and Tasks
    Auth {
        /// Run the consent flow even if valid credentials exist
        #[arg(long, short)]
        force: bool,
    },

    /// Show the state of the stored credentials
    Status,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show configuration file path
    Path,

    /// Dump the effective configuration as TOML
    Dump,
}
