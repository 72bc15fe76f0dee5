//! Google Calendar v3 and Tasks v1 over REST, with OAuth 2.0.
//!
//! # Authentication
//!
//! Users supply their own OAuth client (`client_secret.json` from Google
//! Cloud Console). The first call without a usable stored credential opens
//! the browser on Google's consent page, receives the redirect on a
//! loopback listener and stores the resulting tokens. Later calls reuse the
//! stored access token and refresh it when it expires.
//!
//! # Example
//!
//! ```ignore
//! use gapi_providers::ServiceClients;
//! use gapi_providers::google::{GoogleConfig, GoogleServices};
//!
//! let services = GoogleServices::new(GoogleConfig::default())?;
//! let calendar = services.calendar_client().await?;
//! for entry in calendar.list_calendars().await? {
//!     println!("{}", entry.id);
//! }
//! ```

mod auth;
mod calendar;
mod config;
mod credentials;
mod http;
mod oauth;
mod services;
mod tasks;

pub use auth::{Authenticator, CredentialStatus};
pub use calendar::{CALENDAR_API_BASE, GoogleCalendar};
pub use config::{DEFAULT_TOKEN_URI, GoogleConfig, OAuthCredentials, REQUIRED_SCOPES, required_scopes};
pub use credentials::{CredentialSet, CredentialStore};
pub use http::build_client;
pub use oauth::{OAuthClient, PkceFlow, TokenEndpoint, TokenGrant};
pub use services::GoogleServices;
pub use tasks::{GoogleTasks, TASKS_API_BASE};
