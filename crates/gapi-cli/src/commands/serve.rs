//! Serve command: the MCP server on stdio.
//!
//! Credentials are not touched here. The first tool call that needs a
//! Google handle runs the authorization sequence.

use std::sync::Arc;

use tracing::info;

use gapi_providers::google::GoogleServices;
use gapi_server::{RequestHandler, StdioServer, Toolbox};

use crate::config::AppConfig;
use crate::error::ClientResult;

/// Runs the server until stdin closes or Ctrl-C.
pub async fn run(config: &AppConfig) -> ClientResult<()> {
    let google = config.google_config();
    info!(
        credentials = %google.credentials_path.display(),
        client_secret = %google.client_secret_path.display(),
        "starting gapi MCP server"
    );

    let services = GoogleServices::new(google)?;
    let toolbox = Toolbox::new(Arc::new(services));
    let handler = RequestHandler::new(config.server_config(), toolbox);

    StdioServer::new(handler).run().await?;
    info!("server stopped");
    Ok(())
}
