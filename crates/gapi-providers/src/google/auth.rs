//! The authenticator: hands out a credential that is usable right now.
//!
//! ```text
//!            ┌──────────── cache hit (usable) ─────────────┐
//! credential()                                             ▼
//!   └─ load() ─┬─ usable ───────────────────────────────▶ return
//!              ├─ scopes ok + expired + refresh token ─▶ refresh ─▶ save ─▶ return
//!              └─ otherwise ──▶ client_secret.json? ─no─▶ client_secret_missing
//!                                        │ yes
//!                                        └─▶ consent flow ─▶ save ─▶ return
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};

use super::config::{GoogleConfig, OAuthCredentials};
use super::credentials::{CredentialSet, CredentialStore};
use super::oauth::TokenEndpoint;

/// State of the stored credential, as reported by `gapi status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStatus {
    pub path: PathBuf,
    pub exists: bool,
    pub expiry: Option<DateTime<Utc>>,
    pub expired: bool,
    pub has_refresh_token: bool,
    pub has_required_scopes: bool,
}

/// Owns the credential set for the whole process.
pub struct Authenticator {
    config: GoogleConfig,
    store: CredentialStore,
    endpoint: Arc<dyn TokenEndpoint>,
    /// Last credential handed out. The lock also serializes refreshes.
    cache: Mutex<Option<CredentialSet>>,
}

impl Authenticator {
    pub fn new(config: GoogleConfig, endpoint: Arc<dyn TokenEndpoint>) -> Self {
        let store = CredentialStore::new(&config.credentials_path);
        Self {
            config,
            store,
            endpoint,
            cache: Mutex::new(None),
        }
    }

    /// Returns a credential usable for an immediate remote call.
    pub async fn credential(&self) -> ProviderResult<CredentialSet> {
        let mut cache = self.cache.lock().await;

        if self.config.cache_credentials
            && let Some(cached) = cache.as_ref()
            && cached.is_usable(&self.config.scopes)
        {
            return Ok(cached.clone());
        }

        let stored = self.store.load()?;

        let credentials = match stored {
            Some(creds) if creds.is_usable(&self.config.scopes) => {
                debug!("using stored credentials");
                creds
            }
            Some(creds)
                if creds.has_scopes(&self.config.scopes)
                    && creds.is_expired()
                    && creds.can_refresh() =>
            {
                self.refresh(creds).await?
            }
            Some(creds) => {
                if !creds.has_scopes(&self.config.scopes) {
                    warn!("stored credentials lack required scopes, re-authorizing");
                } else {
                    warn!("stored credentials expired without refresh token, re-authorizing");
                }
                self.consent().await?
            }
            None => {
                info!("no stored credentials, authorization required");
                self.consent().await?
            }
        };

        self.remember(&mut cache, &credentials);
        Ok(credentials)
    }

    /// Runs the consent flow regardless of what is stored.
    pub async fn authorize(&self) -> ProviderResult<CredentialSet> {
        let mut cache = self.cache.lock().await;
        let credentials = self.consent().await?;
        self.remember(&mut cache, &credentials);
        Ok(credentials)
    }

    /// Describes the stored credential without any network access.
    pub fn status(&self) -> ProviderResult<CredentialStatus> {
        let stored = self.store.load()?;
        Ok(CredentialStatus {
            path: self.store.path().to_path_buf(),
            exists: stored.is_some(),
            expiry: stored.as_ref().and_then(|c| c.expiry),
            expired: stored.as_ref().is_some_and(CredentialSet::is_expired),
            has_refresh_token: stored.as_ref().is_some_and(CredentialSet::can_refresh),
            has_required_scopes: stored
                .as_ref()
                .is_some_and(|c| c.has_scopes(&self.config.scopes)),
        })
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    async fn refresh(&self, mut credentials: CredentialSet) -> ProviderResult<CredentialSet> {
        info!("access token expired, refreshing");
        let grant = self.endpoint.refresh(&credentials).await.map_err(|e| {
            ProviderError::refresh_failed(format!("token refresh failed: {}", e)).with_source(e)
        })?;
        credentials.apply_grant(grant);
        self.store.save(&credentials)?;
        Ok(credentials)
    }

    async fn consent(&self) -> ProviderResult<CredentialSet> {
        let path = &self.config.client_secret_path;
        if !path.exists() {
            return Err(ProviderError::client_secret_missing(format!(
                "no valid credentials and no client secret file at {}",
                path.display()
            )));
        }

        let client = OAuthCredentials::from_file(path)?;
        if let Err(e) = client.validate() {
            warn!("client secret file looks unusual: {}", e.message());
        }

        let credentials = self.endpoint.authorize(&client, &self.config.scopes).await?;
        self.store.save(&credentials)?;
        info!("authorization complete");
        Ok(credentials)
    }

    fn remember(&self, cache: &mut Option<CredentialSet>, credentials: &CredentialSet) {
        if self.config.cache_credentials {
            *cache = Some(credentials.clone());
        }
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
