//! Paths, scopes and timeouts for the Google integration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};

/// Scopes every stored credential must carry.
pub const REQUIRED_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/calendar.events",
    "https://www.googleapis.com/auth/tasks",
];

/// Token endpoint used when a stored credential does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Returns [`REQUIRED_SCOPES`] as owned strings.
pub fn required_scopes() -> Vec<String> {
    REQUIRED_SCOPES.iter().map(|s| s.to_string()).collect()
}

/// The OAuth client identity read from the application-credential
/// descriptor (`client_secret.json`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID from Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret from Google Cloud Console.
    pub client_secret: String,
}

/// Layout of the descriptor file.
///
/// Google Cloud Console downloads carry an `installed` or `web` section;
/// some tools write `client_id`/`client_secret` at the root.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSection>,
    web: Option<ClientSection>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSection {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Reads the descriptor file.
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to read client secret file {}: {}",
                path.display(),
                e
            ))
            .with_source(e)
        })?;
        Self::from_json(&content)
    }

    /// Parses descriptor JSON in any of the supported layouts.
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let file: ClientSecretFile = serde_json::from_str(json).map_err(|e| {
            ProviderError::configuration(format!("failed to parse client secret JSON: {}", e))
        })?;

        if let Some(section) = file.installed.or(file.web) {
            return Ok(Self::new(section.client_id, section.client_secret));
        }

        if let (Some(client_id), Some(client_secret)) = (file.client_id, file.client_secret) {
            return Ok(Self::new(client_id, client_secret));
        }

        Err(ProviderError::configuration(
            "client secret file must contain an 'installed'/'web' section or root-level 'client_id'/'client_secret'",
        ))
    }

    /// Checks that the identity looks like a Google OAuth client.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.client_id.is_empty() {
            return Err(ProviderError::configuration("client_id is required"));
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err(ProviderError::configuration(
                "client_id should end with .apps.googleusercontent.com",
            ));
        }
        if self.client_secret.is_empty() {
            return Err(ProviderError::configuration("client_secret is required"));
        }
        Ok(())
    }
}

/// Configuration of the credential lifecycle and API clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleConfig {
    /// Where the credential set is persisted.
    pub credentials_path: PathBuf,

    /// The application-credential descriptor, read only when interactive
    /// authorization is needed.
    pub client_secret_path: PathBuf,

    /// Scopes requested during authorization; must include
    /// [`REQUIRED_SCOPES`].
    pub scopes: Vec<String>,

    /// Timeout of every remote call.
    pub timeout: Duration,

    /// How long the loopback listener waits for the consent redirect.
    pub callback_timeout: Duration,

    /// Inclusive port range for the loopback listener. `(0, 0)` lets the
    /// OS pick a free port.
    pub loopback_port_range: (u16, u16),

    /// Keep the last credential in memory between calls.
    pub cache_credentials: bool,

    /// User agent string for API requests.
    pub user_agent: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            credentials_path: Self::default_credentials_path(),
            client_secret_path: Self::default_client_secret_path(),
            scopes: required_scopes(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            callback_timeout: Duration::from_secs(Self::DEFAULT_CALLBACK_TIMEOUT_SECS),
            loopback_port_range: (0, 0),
            cache_credentials: true,
            user_agent: format!("gapi/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl GoogleConfig {
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default consent callback timeout in seconds.
    pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;

    /// The directory holding `credentials.json` and `client_secret.json`.
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gapi")
    }

    pub fn default_credentials_path() -> PathBuf {
        Self::default_dir().join("credentials.json")
    }

    pub fn default_client_secret_path() -> PathBuf {
        Self::default_dir().join("client_secret.json")
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    pub fn with_client_secret_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.client_secret_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    pub fn with_loopback_port_range(mut self, start: u16, end: u16) -> Self {
        self.loopback_port_range = (start, end);
        self
    }

    pub fn with_cache_credentials(mut self, enabled: bool) -> Self {
        self.cache_credentials = enabled;
        self
    }

    /// Replaces the requested scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ProviderResult<()> {
        let missing: Vec<&str> = REQUIRED_SCOPES
            .iter()
            .copied()
            .filter(|required| !self.scopes.iter().any(|s| s == required))
            .collect();
        if !missing.is_empty() {
            return Err(ProviderError::configuration(format!(
                "scopes must include {}",
                missing.join(", ")
            )));
        }

        if self.loopback_port_range.0 > self.loopback_port_range.1 {
            return Err(ProviderError::configuration("invalid loopback port range"));
        }

        if self.timeout.is_zero() {
            return Err(ProviderError::configuration("timeout must be non-zero"));
        }

        Ok(())
    }
}
