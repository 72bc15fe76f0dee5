//! Credential lifecycle and Google API clients for gapi.
//!
//! - [`google::CredentialStore`] - persists the OAuth credential set
//! - [`google::Authenticator`] - always hands out a usable credential,
//!   refreshing or re-authorizing as needed
//! - [`ServiceClients`] - factories for authenticated [`CalendarApi`] and
//!   [`TasksApi`] handles
//! - [`ProviderError`] - the error taxonomy surfaced to the tool layer
//!
//! # Architecture
//!
//! ```text
//!   tool layer
//!       │  calendar_client() / tasks_client()
//!       ▼
//! ┌──────────────────┐   credential()   ┌───────────────┐
//! │  GoogleServices  │ ───────────────▶ │ Authenticator │
//! └────────┬─────────┘                  └───┬───────┬───┘
//!          │ bearer token          load/save │       │ refresh/consent
//!          ▼                                 ▼       ▼
//!   Calendar v3 / Tasks v1         CredentialStore  OAuthClient
//! ```

pub mod api;
pub mod error;
pub mod google;
pub mod resources;

pub use api::{BoxFuture, CalendarApi, ServiceClients, TasksApi};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use resources::{
    Attendee, BusyError, CalendarListEntry, ConferenceData, CreateConferenceRequest, Event,
    EventDateTime, EventQuery, FreeBusyCalendar, FreeBusyItem, FreeBusyRequest,
    FreeBusyResponse, Task, TaskList, TaskQuery, TaskStatus, TimePeriod,
};
