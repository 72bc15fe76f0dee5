//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/gapi/config.toml` by default. Every key is optional:
//!
//! ```toml
//! [google]
//! credentials_path = "/home/me/.config/gapi/credentials.json"
//! client_secret_path = "/home/me/.config/gapi/client_secret.json"
//! timeout_secs = 30
//! callback_timeout_secs = 300
//! loopback_port_start = 0
//! loopback_port_end = 0
//!
//! [server]
//! name = "gapi"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```
//!
//! Command-line flags take precedence over the file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::Level;

use gapi_core::{TracingConfig, TracingOutputFormat};
use gapi_providers::google::GoogleConfig;
use gapi_server::ServerConfig;

use crate::error::{ClientError, ClientResult};

/// Configuration for the gapi binary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Google credential and HTTP settings.
    pub google: GoogleSettings,

    /// MCP server identity.
    pub server: ServerSettings,

    /// Log output on stderr.
    pub logging: LoggingSettings,
}

/// Google settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// Where authorized credentials are stored.
    pub credentials_path: Option<PathBuf>,

    /// The client secret downloaded from Google Cloud Console.
    pub client_secret_path: Option<PathBuf>,

    /// Timeout for every Google API request, in seconds.
    pub timeout_secs: u64,

    /// How long to wait for the browser consent, in seconds.
    pub callback_timeout_secs: u64,

    /// First loopback port for the consent redirect. 0 lets the OS choose.
    pub loopback_port_start: u16,

    /// Last loopback port for the consent redirect.
    pub loopback_port_end: u16,

    /// Keep the last credential in memory between tool calls.
    pub cache_credentials: bool,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            credentials_path: None,
            client_secret_path: None,
            timeout_secs: GoogleConfig::DEFAULT_TIMEOUT_SECS,
            callback_timeout_secs: GoogleConfig::DEFAULT_CALLBACK_TIMEOUT_SECS,
            loopback_port_start: 0,
            loopback_port_end: 0,
            cache_credentials: true,
        }
    }
}

/// Server settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Name reported to the client. Defaults to "gapi".
    pub name: Option<String>,

    /// Replaces the built-in instructions sent with `initialize`.
    pub instructions: Option<String>,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is unset.
    pub level: String,

    /// One of "compact", "pretty", "json".
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the default path, or defaults when the
    /// file does not exist.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| ClientError::config(format!("{}: {}", path.display(), e)))
    }

    /// Parses TOML content.
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        GoogleConfig::default_dir().join("config.toml")
    }

    /// Applies command-line path overrides.
    pub fn with_paths(
        mut self,
        credentials_path: Option<PathBuf>,
        client_secret_path: Option<PathBuf>,
    ) -> Self {
        if credentials_path.is_some() {
            self.google.credentials_path = credentials_path;
        }
        if client_secret_path.is_some() {
            self.google.client_secret_path = client_secret_path;
        }
        self
    }

    /// Builds the provider configuration.
    pub fn google_config(&self) -> GoogleConfig {
        let settings = &self.google;
        let mut config = GoogleConfig::default()
            .with_timeout(Duration::from_secs(settings.timeout_secs))
            .with_callback_timeout(Duration::from_secs(settings.callback_timeout_secs))
            .with_loopback_port_range(settings.loopback_port_start, settings.loopback_port_end)
            .with_cache_credentials(settings.cache_credentials);

        if let Some(path) = &settings.credentials_path {
            config = config.with_credentials_path(path);
        }
        if let Some(path) = &settings.client_secret_path {
            config = config.with_client_secret_path(path);
        }
        config
    }

    /// Builds the server configuration.
    pub fn server_config(&self) -> ServerConfig {
        let mut config = ServerConfig::default();
        if let Some(name) = &self.server.name {
            config = config.with_name(name);
        }
        if let Some(instructions) = &self.server.instructions {
            config = config.with_instructions(Some(instructions.clone()));
        }
        config
    }

    /// Builds the tracing configuration. `debug` forces debug level.
    pub fn tracing_config(&self, debug: bool) -> ClientResult<TracingConfig> {
        let format = TracingOutputFormat::from_name(&self.logging.format).ok_or_else(|| {
            ClientError::config(format!("unknown log format {:?}", self.logging.format))
        })?;
        if debug {
            return Ok(TracingConfig::debug().with_format(format));
        }

        let level = Level::from_str(&self.logging.level).map_err(|_| {
            ClientError::config(format!("unknown log level {:?}", self.logging.level))
        })?;
        Ok(TracingConfig::default()
            .with_level(level)
            .with_format(format))
    }
}
