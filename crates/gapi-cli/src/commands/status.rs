//! Status command: describes the stored credential without network access.

use std::path::Path;

use gapi_providers::google::{CredentialStatus, GoogleServices};

use crate::config::AppConfig;
use crate::error::ClientResult;

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Renders the status report.
pub fn render(status: &CredentialStatus, client_secret: &Path, client_secret_found: bool) -> String {
    let mut lines = vec![
        format!("Credentials: {}", status.path.display()),
        format!(
            "Client secret: {} ({})",
            client_secret.display(),
            if client_secret_found { "found" } else { "missing" }
        ),
    ];

    if !status.exists {
        lines.push("State: not authorized (run `gapi auth`)".to_string());
        return lines.join("\n");
    }

    let state = if !status.has_required_scopes {
        "re-authorization needed (missing scopes)"
    } else if !status.expired {
        "authorized"
    } else if status.has_refresh_token {
        "authorized (token expired, will refresh)"
    } else {
        "re-authorization needed (expired, no refresh token)"
    };
    lines.push(format!("State: {}", state));
    lines.push(format!(
        "Expiry: {}",
        status
            .expiry
            .map(|e| e.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string())
    ));
    lines.push(format!("Refresh token: {}", yes_no(status.has_refresh_token)));
    lines.push(format!("Required scopes: {}", yes_no(status.has_required_scopes)));
    lines.join("\n")
}

pub fn run(config: &AppConfig) -> ClientResult<()> {
    let services = GoogleServices::new(config.google_config())?;
    let authenticator = services.authenticator();
    let client_secret = &authenticator.config().client_secret_path;

    let status = authenticator.status()?;
    println!("{}", render(&status, client_secret, client_secret.exists()));
    Ok(())
}
