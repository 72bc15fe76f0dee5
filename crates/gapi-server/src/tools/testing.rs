//! In-memory Calendar/Tasks remote used by the tool tests.

use std::future::ready;
use std::sync::{Arc, Mutex, MutexGuard};

use gapi_providers::{
    BoxFuture, CalendarApi, CalendarListEntry, Event, EventQuery, FreeBusyRequest,
    FreeBusyResponse, ProviderError, ProviderResult, ServiceClients, Task, TaskList, TaskQuery,
    TaskStatus, TasksApi,
};

/// State of the fake remote, plus a log of what the tools asked for.
#[derive(Debug, Default)]
pub struct Remote {
    pub calendars: Vec<CalendarListEntry>,
    pub events: Vec<(String, Event)>,
    pub task_lists: Vec<TaskList>,
    pub tasks: Vec<(String, Task)>,
    pub free_busy: FreeBusyResponse,
    /// When set, every call fails with this status and reason.
    pub fault: Option<(u16, String)>,
    pub calls: Vec<String>,
    pub event_query: Option<EventQuery>,
    pub task_query: Option<TaskQuery>,
    pub free_busy_request: Option<FreeBusyRequest>,
    pub conference_data_version: Option<bool>,
    pub parent: Option<String>,
    pub task_list_limit: Option<u32>,
    pub next_id: u32,
}

impl Remote {
    fn enter(&mut self, call: &str) -> ProviderResult<()> {
        self.calls.push(call.to_string());
        match &self.fault {
            Some((status, reason)) => Err(ProviderError::remote(*status, reason.clone())),
            None => Ok(()),
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn not_found() -> ProviderError {
        ProviderError::remote(404, "Not Found")
    }

    fn find_event(&self, calendar_id: &str, event_id: &str) -> Option<usize> {
        self.events
            .iter()
            .position(|(cal, ev)| cal == calendar_id && ev.id.as_deref() == Some(event_id))
    }

    fn find_task(&self, task_list_id: &str, task_id: &str) -> Option<usize> {
        self.tasks
            .iter()
            .position(|(list, t)| list == task_list_id && t.id.as_deref() == Some(task_id))
    }
}

/// [`ServiceClients`] backed by a shared [`Remote`].
#[derive(Debug, Clone, Default)]
pub struct FakeServices {
    remote: Arc<Mutex<Remote>>,
}

impl FakeServices {
    pub fn new(remote: Remote) -> Self {
        Self {
            remote: Arc::new(Mutex::new(remote)),
        }
    }

    pub fn remote(&self) -> MutexGuard<'_, Remote> {
        self.remote.lock().unwrap()
    }
}

impl ServiceClients for FakeServices {
    fn calendar_client(&self) -> BoxFuture<'_, ProviderResult<Box<dyn CalendarApi>>> {
        let handle: Box<dyn CalendarApi> = Box::new(FakeHandle {
            remote: self.remote.clone(),
        });
        Box::pin(ready(Ok(handle)))
    }

    fn tasks_client(&self) -> BoxFuture<'_, ProviderResult<Box<dyn TasksApi>>> {
        let handle: Box<dyn TasksApi> = Box::new(FakeHandle {
            remote: self.remote.clone(),
        });
        Box::pin(ready(Ok(handle)))
    }
}

struct FakeHandle {
    remote: Arc<Mutex<Remote>>,
}

impl FakeHandle {
    fn with<T: Send + 'static>(
        &self,
        call: &str,
        f: impl FnOnce(&mut Remote) -> ProviderResult<T>,
    ) -> BoxFuture<'static, ProviderResult<T>> {
        let mut remote = self.remote.lock().unwrap();
        let result = remote.enter(call).and_then(|()| f(&mut *remote));
        Box::pin(ready(result))
    }
}

impl CalendarApi for FakeHandle {
    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarListEntry>>> {
        self.with("calendarList.list", |r| Ok(r.calendars.clone()))
    }

    fn list_events<'a>(&'a self, query: &'a EventQuery) -> BoxFuture<'a, ProviderResult<Vec<Event>>> {
        let query = query.clone();
        self.with("events.list", move |r| {
            let events = r
                .events
                .iter()
                .filter(|(cal, _)| *cal == query.calendar_id)
                .map(|(_, ev)| ev.clone())
                .take(query.max_results as usize)
                .collect();
            r.event_query = Some(query);
            Ok(events)
        })
    }

    fn get_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Event>> {
        self.with("events.get", |r| {
            let index = r.find_event(calendar_id, event_id).ok_or_else(Remote::not_found)?;
            Ok(r.events[index].1.clone())
        })
    }

    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a Event,
        with_conference_data: bool,
    ) -> BoxFuture<'a, ProviderResult<Event>> {
        self.with("events.insert", |r| {
            let mut event = event.clone();
            let id = r.next_id("E");
            event.html_link = Some(format!("https://calendar.google.com/event?eid={}", id));
            event.id = Some(id);
            r.conference_data_version = Some(with_conference_data);
            r.events.push((calendar_id.to_string(), event.clone()));
            Ok(event)
        })
    }

    fn update_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
        event: &'a Event,
    ) -> BoxFuture<'a, ProviderResult<Event>> {
        self.with("events.update", |r| {
            let index = r.find_event(calendar_id, event_id).ok_or_else(Remote::not_found)?;
            r.events[index].1 = event.clone();
            Ok(event.clone())
        })
    }

    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        self.with("events.delete", |r| {
            let index = r.find_event(calendar_id, event_id).ok_or_else(Remote::not_found)?;
            r.events.remove(index);
            Ok(())
        })
    }

    fn free_busy<'a>(
        &'a self,
        request: &'a FreeBusyRequest,
    ) -> BoxFuture<'a, ProviderResult<FreeBusyResponse>> {
        self.with("freebusy.query", |r| {
            r.free_busy_request = Some(request.clone());
            Ok(r.free_busy.clone())
        })
    }
}

impl TasksApi for FakeHandle {
    fn list_task_lists(&self, max_results: u32) -> BoxFuture<'_, ProviderResult<Vec<TaskList>>> {
        self.with("tasklists.list", move |r| {
            r.task_list_limit = Some(max_results);
            Ok(r.task_lists.clone())
        })
    }

    fn list_tasks<'a>(&'a self, query: &'a TaskQuery) -> BoxFuture<'a, ProviderResult<Vec<Task>>> {
        let query = query.clone();
        self.with("tasks.list", move |r| {
            let tasks = r
                .tasks
                .iter()
                .filter(|(list, _)| *list == query.task_list_id)
                .map(|(_, t)| t.clone())
                .collect();
            r.task_query = Some(query);
            Ok(tasks)
        })
    }

    fn get_task<'a>(
        &'a self,
        task_list_id: &'a str,
        task_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Task>> {
        self.with("tasks.get", |r| {
            let index = r.find_task(task_list_id, task_id).ok_or_else(Remote::not_found)?;
            Ok(r.tasks[index].1.clone())
        })
    }

    fn insert_task<'a>(
        &'a self,
        task_list_id: &'a str,
        task: &'a Task,
        parent: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<Task>> {
        self.with("tasks.insert", |r| {
            let mut task = task.clone();
            task.id = Some(r.next_id("T"));
            task.status.get_or_insert(TaskStatus::NeedsAction);
            task.parent = parent.map(str::to_string);
            r.parent = task.parent.clone();
            r.tasks.push((task_list_id.to_string(), task.clone()));
            Ok(task)
        })
    }

    fn update_task<'a>(
        &'a self,
        task_list_id: &'a str,
        task_id: &'a str,
        task: &'a Task,
    ) -> BoxFuture<'a, ProviderResult<Task>> {
        self.with("tasks.update", |r| {
            let index = r.find_task(task_list_id, task_id).ok_or_else(Remote::not_found)?;
            r.tasks[index].1 = task.clone();
            Ok(task.clone())
        })
    }

    fn delete_task<'a>(
        &'a self,
        task_list_id: &'a str,
        task_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        self.with("tasks.delete", |r| {
            let index = r.find_task(task_list_id, task_id).ok_or_else(Remote::not_found)?;
            r.tasks.remove(index);
            Ok(())
        })
    }
}
