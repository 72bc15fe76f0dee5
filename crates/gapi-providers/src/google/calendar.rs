//! Calendar v3 REST handle.

use serde::Deserialize;
use tracing::debug;

use crate::api::{BoxFuture, CalendarApi};
use crate::error::ProviderResult;
use crate::resources::{
    CalendarListEntry, Event, EventQuery, FreeBusyRequest, FreeBusyResponse,
};

use super::http::{send_empty, send_json};

/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// Calendar handle bound to one access token.
#[derive(Debug, Clone)]
pub struct GoogleCalendar {
    http_client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl GoogleCalendar {
    pub fn new(http_client: reqwest::Client, access_token: impl Into<String>) -> Self {
        Self {
            http_client,
            access_token: access_token.into(),
            base_url: CALENDAR_API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        )
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(event_id)
        )
    }

    async fn fetch_calendars(&self) -> ProviderResult<Vec<CalendarListEntry>> {
        let url = format!("{}/users/me/calendarList", self.base_url);
        let list: ListResponse<CalendarListEntry> =
            send_json(self.http_client.get(&url).bearer_auth(&self.access_token)).await?;
        debug!("listed {} calendars", list.items.len());
        Ok(list.items)
    }

    async fn fetch_events(&self, query: &EventQuery) -> ProviderResult<Vec<Event>> {
        let mut params = vec![
            ("timeMin", query.time_min.clone()),
            ("timeMax", query.time_max.clone()),
            ("maxResults", query.max_results.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        if let Some(q) = query.query.as_deref().filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }

        let request = self
            .http_client
            .get(self.events_url(&query.calendar_id))
            .bearer_auth(&self.access_token)
            .query(&params);
        let list: ListResponse<Event> = send_json(request).await?;
        debug!(
            "fetched {} events from calendar {}",
            list.items.len(),
            query.calendar_id
        );
        Ok(list.items)
    }

    async fn fetch_event(&self, calendar_id: &str, event_id: &str) -> ProviderResult<Event> {
        send_json(
            self.http_client
                .get(self.event_url(calendar_id, event_id))
                .bearer_auth(&self.access_token),
        )
        .await
    }

    async fn create_event(
        &self,
        calendar_id: &str,
        event: &Event,
        with_conference_data: bool,
    ) -> ProviderResult<Event> {
        let mut request = self
            .http_client
            .post(self.events_url(calendar_id))
            .bearer_auth(&self.access_token)
            .json(event);
        if with_conference_data {
            request = request.query(&[("conferenceDataVersion", "1")]);
        }
        send_json(request).await
    }

    async fn replace_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &Event,
    ) -> ProviderResult<Event> {
        send_json(
            self.http_client
                .put(self.event_url(calendar_id, event_id))
                .bearer_auth(&self.access_token)
                .json(event),
        )
        .await
    }

    async fn remove_event(&self, calendar_id: &str, event_id: &str) -> ProviderResult<()> {
        send_empty(
            self.http_client
                .delete(self.event_url(calendar_id, event_id))
                .bearer_auth(&self.access_token),
        )
        .await
    }

    async fn query_free_busy(&self, request: &FreeBusyRequest) -> ProviderResult<FreeBusyResponse> {
        send_json(
            self.http_client
                .post(format!("{}/freeBusy", self.base_url))
                .bearer_auth(&self.access_token)
                .json(request),
        )
        .await
    }
}

impl CalendarApi for GoogleCalendar {
    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarListEntry>>> {
        Box::pin(self.fetch_calendars())
    }

    fn list_events<'a>(&'a self, query: &'a EventQuery) -> BoxFuture<'a, ProviderResult<Vec<Event>>> {
        Box::pin(self.fetch_events(query))
    }

    fn get_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Event>> {
        Box::pin(self.fetch_event(calendar_id, event_id))
    }

    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a Event,
        with_conference_data: bool,
    ) -> BoxFuture<'a, ProviderResult<Event>> {
        Box::pin(self.create_event(calendar_id, event, with_conference_data))
    }

    fn update_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
        event: &'a Event,
    ) -> BoxFuture<'a, ProviderResult<Event>> {
        Box::pin(self.replace_event(calendar_id, event_id, event))
    }

    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(self.remove_event(calendar_id, event_id))
    }

    fn free_busy<'a>(
        &'a self,
        request: &'a FreeBusyRequest,
    ) -> BoxFuture<'a, ProviderResult<FreeBusyResponse>> {
        Box::pin(self.query_free_busy(request))
    }
}
