//! Remote API handles and the factory the tool layer calls.
//!
//! The tool layer only sees these traits. [`crate::google::GoogleServices`]
//! implements them against the live REST APIs; tests substitute an
//! in-memory remote.

use std::future::Future;
use std::pin::Pin;

use crate::error::ProviderResult;
use crate::resources::{
    CalendarListEntry, Event, EventQuery, FreeBusyRequest, FreeBusyResponse, Task, TaskList,
    TaskQuery,
};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the traits object-safe so handles can be passed
/// around as `Box<dyn CalendarApi>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An authenticated Calendar v3 handle.
pub trait CalendarApi: Send + Sync {
    /// `calendarList.list` for the signed-in user.
    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarListEntry>>>;

    /// `events.list`, expanding recurring events and ordering by start time.
    fn list_events<'a>(&'a self, query: &'a EventQuery) -> BoxFuture<'a, ProviderResult<Vec<Event>>>;

    /// `events.get`.
    fn get_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Event>>;

    /// `events.insert`. `with_conference_data` sends `conferenceDataVersion=1`.
    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a Event,
        with_conference_data: bool,
    ) -> BoxFuture<'a, ProviderResult<Event>>;

    /// `events.update`: replaces the whole event body.
    fn update_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
        event: &'a Event,
    ) -> BoxFuture<'a, ProviderResult<Event>>;

    /// `events.delete`.
    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>>;

    /// `freebusy.query`.
    fn free_busy<'a>(
        &'a self,
        request: &'a FreeBusyRequest,
    ) -> BoxFuture<'a, ProviderResult<FreeBusyResponse>>;
}

/// An authenticated Tasks v1 handle.
pub trait TasksApi: Send + Sync {
    /// `tasklists.list`.
    fn list_task_lists(&self, max_results: u32) -> BoxFuture<'_, ProviderResult<Vec<TaskList>>>;

    /// `tasks.list`.
    fn list_tasks<'a>(&'a self, query: &'a TaskQuery) -> BoxFuture<'a, ProviderResult<Vec<Task>>>;

    /// `tasks.get`.
    fn get_task<'a>(
        &'a self,
        task_list_id: &'a str,
        task_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Task>>;

    /// `tasks.insert`, optionally as a subtask of `parent`.
    fn insert_task<'a>(
        &'a self,
        task_list_id: &'a str,
        task: &'a Task,
        parent: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<Task>>;

    /// `tasks.update`: replaces the whole task body.
    fn update_task<'a>(
        &'a self,
        task_list_id: &'a str,
        task_id: &'a str,
        task: &'a Task,
    ) -> BoxFuture<'a, ProviderResult<Task>>;

    /// `tasks.delete`.
    fn delete_task<'a>(
        &'a self,
        task_list_id: &'a str,
        task_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}

/// Produces authenticated API handles.
///
/// Every call goes through the credential lifecycle first, so a handle is
/// always bound to a token that is usable right now.
pub trait ServiceClients: Send + Sync {
    /// Returns a Calendar v3 handle.
    fn calendar_client(&self) -> BoxFuture<'_, ProviderResult<Box<dyn CalendarApi>>>;

    /// Returns a Tasks v1 handle.
    fn tasks_client(&self) -> BoxFuture<'_, ProviderResult<Box<dyn TasksApi>>>;
}
