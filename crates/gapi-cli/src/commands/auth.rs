//! Authentication command.

use tracing::info;

use gapi_providers::google::GoogleServices;

use crate::config::AppConfig;
use crate::error::ClientResult;

/// Makes sure usable credentials are stored.
///
/// Without `force` a valid or refreshable credential is reused. With
/// `force` the browser consent always runs.
pub async fn run(config: &AppConfig, force: bool) -> ClientResult<()> {
    let services = GoogleServices::new(config.google_config())?;
    let authenticator = services.authenticator();

    if force {
        println!("Starting Google authorization...");
        println!("A browser window will open; if it does not, open the URL printed on stderr.");
        authenticator.authorize().await?;
    } else {
        let status = authenticator.status()?;
        if !status.exists {
            println!("No stored credentials; starting Google authorization...");
            println!("A browser window will open; if it does not, open the URL printed on stderr.");
        }
        authenticator.credential().await?;
    }

    let path = authenticator.store().path();
    info!(path = %path.display(), "authorization complete");
    println!("Authorized. Credentials saved to {}", path.display());
    Ok(())
}
