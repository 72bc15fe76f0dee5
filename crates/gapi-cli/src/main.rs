//! gapi CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use gapi_cli::cli::{Cli, Command, ConfigAction};
use gapi_cli::commands;
use gapi_cli::config::AppConfig;
use gapi_cli::error::ClientResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let source = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = match cli.config {
        Some(ref path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    }
    .with_paths(cli.credentials, cli.client_secret);

    // stdout belongs to the MCP transport, so logs go to stderr
    gapi_core::init_tracing(config.tracing_config(cli.debug)?)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => commands::serve::run(&config).await,
        Command::Auth { force } => commands::auth::run(&config, force).await,
        Command::Status => commands::status::run(&config),
        Command::Config { action } => match action {
            ConfigAction::Path => commands::config::path(&source),
            ConfigAction::Dump => commands::config::dump(&config, &source),
        },
    }
}
