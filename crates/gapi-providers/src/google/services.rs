//! The live [`ServiceClients`] implementation.

use std::sync::Arc;

use tracing::debug;

use crate::api::{BoxFuture, CalendarApi, ServiceClients, TasksApi};
use crate::error::ProviderResult;

use super::auth::Authenticator;
use super::calendar::GoogleCalendar;
use super::config::GoogleConfig;
use super::http::build_client;
use super::oauth::OAuthClient;
use super::tasks::GoogleTasks;

/// Builds Calendar and Tasks handles from the current credential.
#[derive(Debug, Clone)]
pub struct GoogleServices {
    authenticator: Arc<Authenticator>,
    http_client: reqwest::Client,
}

impl GoogleServices {
    /// Wires the HTTP client, OAuth endpoint and authenticator together.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate()?;
        let http_client = build_client(&config)?;
        let endpoint = Arc::new(OAuthClient::new(http_client.clone(), &config));
        let authenticator = Arc::new(Authenticator::new(config, endpoint));
        Ok(Self {
            authenticator,
            http_client,
        })
    }

    pub fn authenticator(&self) -> &Arc<Authenticator> {
        &self.authenticator
    }
}

impl ServiceClients for GoogleServices {
    fn calendar_client(&self) -> BoxFuture<'_, ProviderResult<Box<dyn CalendarApi>>> {
        Box::pin(async move {
            let credentials = self.authenticator.credential().await?;
            debug!("calendar v3 handle ready");
            Ok(Box::new(GoogleCalendar::new(self.http_client.clone(), credentials.token))
                as Box<dyn CalendarApi>)
        })
    }

    fn tasks_client(&self) -> BoxFuture<'_, ProviderResult<Box<dyn TasksApi>>> {
        Box::pin(async move {
            let credentials = self.authenticator.credential().await?;
            debug!("tasks v1 handle ready");
            Ok(Box::new(GoogleTasks::new(self.http_client.clone(), credentials.token))
                as Box<dyn TasksApi>)
        })
    }
}
