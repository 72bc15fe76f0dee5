//! Calendar and Tasks resources as exchanged with the REST APIs.
//!
//! Events and tasks are read, modified and written back whole, so each
//! struct keeps the fields it does not name in `extra`. Nothing the remote
//! sent is lost on an update.

use std::collections::BTreeMap;
use std::fmt;

use gapi_core::EventTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An entry of the user's calendar list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    /// The calendar ID.
    pub id: String,
    /// The calendar name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Whether this is the primary calendar.
    #[serde(default)]
    pub primary: bool,
}

/// Start or end of an event: either `date` (all-day) or `dateTime`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    /// Builds the wire value for a caller-supplied time. The time zone only
    /// applies to timed values.
    pub fn from_input(time: &EventTime, time_zone: Option<&str>) -> Self {
        match time {
            EventTime::AllDay(date) => Self {
                date: Some(date.format("%Y-%m-%d").to_string()),
                ..Self::default()
            },
            EventTime::Timed(value) => Self {
                date_time: Some(value.clone()),
                time_zone: time_zone.map(str::to_string),
                ..Self::default()
            },
        }
    }

    /// `dateTime`, falling back to `date`.
    pub fn display_value(&self) -> Option<&str> {
        self.date_time.as_deref().or(self.date.as_deref())
    }
}

/// An event attendee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Attendee {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            extra: Map::new(),
        }
    }
}

/// Request to attach a new conference (Meet link) to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConferenceRequest {
    pub request_id: String,
}

/// Conference information of an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_request: Option<CreateConferenceRequest>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConferenceData {
    /// Conference data asking the service to create a Meet link.
    pub fn create(request_id: impl Into<String>) -> Self {
        Self {
            create_request: Some(CreateConferenceRequest {
                request_id: request_id.into(),
            }),
            extra: Map::new(),
        }
    }
}

/// A calendar event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conference_data: Option<ConferenceData>,
    /// Remote fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parameters of `events.list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub calendar_id: String,
    /// Lower bound (RFC 3339) for an event's end time.
    pub time_min: String,
    /// Upper bound (RFC 3339) for an event's start time.
    pub time_max: String,
    /// Free text search.
    pub query: Option<String>,
    pub max_results: u32,
}

/// A calendar to include in a free/busy query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeBusyItem {
    pub id: String,
}

/// Body of `freebusy.query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBusyRequest {
    pub time_min: String,
    pub time_max: String,
    pub items: Vec<FreeBusyItem>,
}

impl FreeBusyRequest {
    pub fn new(time_min: String, time_max: String, calendar_ids: &[String]) -> Self {
        Self {
            time_min,
            time_max,
            items: calendar_ids
                .iter()
                .map(|id| FreeBusyItem { id: id.clone() })
                .collect(),
        }
    }
}

/// A busy interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub start: String,
    pub end: String,
}

/// A per-calendar error in a free/busy response, e.g. `notFound`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyError {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub reason: String,
}

/// Free/busy information of one calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeBusyCalendar {
    #[serde(default)]
    pub busy: Vec<TimePeriod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BusyError>,
}

/// Response of `freebusy.query`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeBusyResponse {
    #[serde(default)]
    pub calendars: BTreeMap<String, FreeBusyCalendar>,
}

impl FreeBusyResponse {
    /// Calendars in request order, followed by any the service added.
    pub fn ordered<'a>(
        &'a self,
        requested: &'a [String],
    ) -> impl Iterator<Item = (&'a str, &'a FreeBusyCalendar)> + 'a {
        let listed = requested
            .iter()
            .filter_map(|id| self.calendars.get_key_value(id));
        let rest = self
            .calendars
            .iter()
            .filter(|(id, _)| !requested.contains(id));
        listed.chain(rest).map(|(id, cal)| (id.as_str(), cal))
    }
}

/// A task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Completion state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "needsAction")]
    NeedsAction,
    #[serde(rename = "completed")]
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NeedsAction => "needsAction",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
    /// Remote fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parameters of `tasks.list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub task_list_id: String,
    pub max_results: u32,
    pub show_completed: bool,
    pub show_hidden: bool,
    pub due_min: Option<String>,
    pub due_max: Option<String>,
}
