//! Calendar tools.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use gapi_core::{EventTime, expand_timestamp};
use gapi_providers::{
    Attendee, ConferenceData, Event, EventDateTime, EventQuery, FreeBusyRequest, ProviderResult,
    ServiceClients,
};

use super::ToolDef;
use super::adapter::parse_args;

const PRIMARY: &str = "primary";
const DEFAULT_MAX_EVENTS: u32 = 25;

pub fn tool_defs() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "list_calendars",
            description: "List all calendars accessible to the user.",
            input_schema: json!({"type": "object", "properties": {}}),
        },
        ToolDef {
            name: "get_events",
            description: "Get calendar events in a time range.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "time_min": {"type": "string", "description": "Start time (RFC 3339, e.g. '2026-02-28T00:00:00Z' or '2026-02-28')"},
                    "time_max": {"type": "string", "description": "End time (RFC 3339, e.g. '2026-02-28T23:59:59Z' or '2026-03-01')"},
                    "calendar_id": {"type": "string", "description": "Calendar ID (default: 'primary')"},
                    "query": {"type": "string", "description": "Optional keyword search in event fields"},
                    "max_results": {"type": "integer", "minimum": 1, "description": "Maximum events to return (default: 25)"}
                },
                "required": ["time_min", "time_max"]
            }),
        },
        ToolDef {
            name: "create_event",
            description: "Create a calendar event.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "summary": {"type": "string", "description": "Event title"},
                    "start": {"type": "string", "description": "Start time (RFC 3339, e.g. '2026-02-28T10:00:00+01:00', or '2026-02-28' for all-day)"},
                    "end": {"type": "string", "description": "End time (RFC 3339, e.g. '2026-02-28T11:00:00+01:00', or '2026-03-01' for all-day)"},
                    "description": {"type": "string", "description": "Event description"},
                    "location": {"type": "string", "description": "Event location"},
                    "attendees": {"type": "array", "items": {"type": "string"}, "description": "Attendee email addresses"},
                    "timezone": {"type": "string", "description": "Time zone (e.g. 'Europe/Amsterdam')"},
                    "add_meet": {"type": "boolean", "description": "Add a Google Meet link"},
                    "calendar_id": {"type": "string", "description": "Calendar ID (default: 'primary')"}
                },
                "required": ["summary", "start", "end"]
            }),
        },
        ToolDef {
            name: "modify_event",
            description: "Update fields on an existing calendar event. Only provided fields are changed.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "event_id": {"type": "string", "description": "The event ID to modify"},
                    "summary": {"type": "string", "description": "New event title"},
                    "start": {"type": "string", "description": "New start time (RFC 3339 or YYYY-MM-DD)"},
                    "end": {"type": "string", "description": "New end time (RFC 3339 or YYYY-MM-DD)"},
                    "description": {"type": "string", "description": "New description"},
                    "location": {"type": "string", "description": "New location"},
                    "attendees": {"type": "array", "items": {"type": "string"}, "description": "New attendee email list (replaces existing)"},
                    "timezone": {"type": "string", "description": "Time zone for start/end"},
                    "calendar_id": {"type": "string", "description": "Calendar ID (default: 'primary')"}
                },
                "required": ["event_id"]
            }),
        },
        ToolDef {
            name: "delete_event",
            description: "Delete a calendar event.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "event_id": {"type": "string", "description": "The event ID to delete"},
                    "calendar_id": {"type": "string", "description": "Calendar ID (default: 'primary')"}
                },
                "required": ["event_id"]
            }),
        },
        ToolDef {
            name: "freebusy",
            description: "Check free/busy information for calendars.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "time_min": {"type": "string", "description": "Start of interval (RFC 3339 or YYYY-MM-DD)"},
                    "time_max": {"type": "string", "description": "End of interval (RFC 3339 or YYYY-MM-DD)"},
                    "calendar_ids": {"type": "array", "items": {"type": "string"}, "description": "Calendar IDs to query (default: ['primary'])"}
                },
                "required": ["time_min", "time_max"]
            }),
        },
    ]
}

fn calendar_or_primary(calendar_id: &Option<String>) -> &str {
    calendar_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .unwrap_or(PRIMARY)
}

fn attendee_list(emails: &[String]) -> Vec<Attendee> {
    emails.iter().map(Attendee::new).collect()
}

/// Formats one event as an indented block.
pub fn format_event(event: &Event) -> String {
    let time = |t: &Option<EventDateTime>| {
        t.as_ref()
            .and_then(EventDateTime::display_value)
            .unwrap_or("?")
            .to_string()
    };

    let mut lines = vec![
        format!("- {}", event.summary.as_deref().unwrap_or("(no title)")),
        format!("  Start: {}", time(&event.start)),
        format!("  End: {}", time(&event.end)),
        format!("  ID: {}", event.id.as_deref().unwrap_or_default()),
    ];
    if let Some(link) = event.html_link.as_deref().filter(|l| !l.is_empty()) {
        lines.push(format!("  Link: {}", link));
    }
    if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
        lines.push(format!("  Location: {}", location));
    }
    lines.join("\n")
}

pub async fn list_calendars(
    services: &dyn ServiceClients,
    _arguments: Map<String, Value>,
) -> ProviderResult<String> {
    let calendar = services.calendar_client().await?;
    let calendars = calendar.list_calendars().await?;
    if calendars.is_empty() {
        return Ok("No calendars found.".to_string());
    }

    let lines: Vec<String> = calendars
        .iter()
        .map(|cal| {
            format!(
                "- {}{}\n  ID: {}",
                cal.summary.as_deref().unwrap_or("?"),
                if cal.primary { " (primary)" } else { "" },
                cal.id
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

#[derive(Debug, Deserialize)]
struct GetEventsArgs {
    time_min: String,
    time_max: String,
    #[serde(default)]
    calendar_id: Option<String>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    max_results: Option<u32>,
}

pub async fn get_events(
    services: &dyn ServiceClients,
    arguments: Map<String, Value>,
) -> ProviderResult<String> {
    let args: GetEventsArgs = parse_args(arguments)?;
    let query = EventQuery {
        calendar_id: calendar_or_primary(&args.calendar_id).to_string(),
        time_min: expand_timestamp(&args.time_min)?,
        time_max: expand_timestamp(&args.time_max)?,
        query: args.query.filter(|q| !q.is_empty()),
        max_results: args.max_results.unwrap_or(DEFAULT_MAX_EVENTS),
    };

    let calendar = services.calendar_client().await?;
    let events = calendar.list_events(&query).await?;
    if events.is_empty() {
        return Ok("No events found in the specified range.".to_string());
    }

    let blocks: Vec<String> = events.iter().map(format_event).collect();
    Ok(blocks.join("\n\n"))
}

#[derive(Debug, Deserialize)]
struct CreateEventArgs {
    summary: String,
    start: String,
    end: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    attendees: Option<Vec<String>>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    add_meet: Option<bool>,
    #[serde(default)]
    calendar_id: Option<String>,
}

/// Request id for a new Meet conference.
fn meet_request_id() -> String {
    format!("meet-{}", Utc::now().format("%Y%m%d%H%M%S"))
}

pub async fn create_event(
    services: &dyn ServiceClients,
    arguments: Map<String, Value>,
) -> ProviderResult<String> {
    let args: CreateEventArgs = parse_args(arguments)?;
    let timezone = args.timezone.as_deref().filter(|tz| !tz.is_empty());
    let add_meet = args.add_meet.unwrap_or(false);

    let event = Event {
        summary: Some(args.summary.clone()),
        start: Some(EventDateTime::from_input(&EventTime::parse(&args.start)?, timezone)),
        end: Some(EventDateTime::from_input(&EventTime::parse(&args.end)?, timezone)),
        description: args.description.filter(|d| !d.is_empty()),
        location: args.location.filter(|l| !l.is_empty()),
        attendees: args
            .attendees
            .filter(|a| !a.is_empty())
            .map(|a| attendee_list(&a)),
        conference_data: add_meet.then(|| ConferenceData::create(meet_request_id())),
        ..Event::default()
    };

    let calendar = services.calendar_client().await?;
    let created = calendar
        .insert_event(calendar_or_primary(&args.calendar_id), &event, add_meet)
        .await?;

    Ok(format!(
        "Event created: {}\nLink: {}\nID: {}",
        created.summary.as_deref().unwrap_or_default(),
        created.html_link.as_deref().unwrap_or_default(),
        created.id.as_deref().unwrap_or_default()
    ))
}

/// Changes requested by `modify_event`. `None` leaves a field alone.
#[derive(Debug, Default, Deserialize)]
pub struct EventChanges {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Option<Vec<String>>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl EventChanges {
    /// Overwrites every provided field of `event`.
    pub fn apply(&self, event: &mut Event) -> ProviderResult<()> {
        let timezone = self.timezone.as_deref().filter(|tz| !tz.is_empty());

        if let Some(summary) = &self.summary {
            event.summary = Some(summary.clone());
        }
        if let Some(description) = &self.description {
            event.description = Some(description.clone());
        }
        if let Some(location) = &self.location {
            event.location = Some(location.clone());
        }
        if let Some(attendees) = &self.attendees {
            event.attendees = Some(attendee_list(attendees));
        }
        if let Some(start) = &self.start {
            event.start = Some(EventDateTime::from_input(&EventTime::parse(start)?, timezone));
        }
        if let Some(end) = &self.end {
            event.end = Some(EventDateTime::from_input(&EventTime::parse(end)?, timezone));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ModifyEventArgs {
    event_id: String,
    #[serde(default)]
    calendar_id: Option<String>,
    #[serde(flatten)]
    changes: EventChanges,
}

pub async fn modify_event(
    services: &dyn ServiceClients,
    arguments: Map<String, Value>,
) -> ProviderResult<String> {
    let args: ModifyEventArgs = parse_args(arguments)?;
    let calendar_id = calendar_or_primary(&args.calendar_id);

    let calendar = services.calendar_client().await?;
    let mut event = calendar.get_event(calendar_id, &args.event_id).await?;
    args.changes.apply(&mut event)?;
    let updated = calendar
        .update_event(calendar_id, &args.event_id, &event)
        .await?;

    Ok(format!(
        "Event updated: {}\nLink: {}",
        updated.summary.as_deref().unwrap_or_default(),
        updated.html_link.as_deref().unwrap_or_default()
    ))
}

#[derive(Debug, Deserialize)]
struct DeleteEventArgs {
    event_id: String,
    #[serde(default)]
    calendar_id: Option<String>,
}

pub async fn delete_event(
    services: &dyn ServiceClients,
    arguments: Map<String, Value>,
) -> ProviderResult<String> {
    let args: DeleteEventArgs = parse_args(arguments)?;
    let calendar = services.calendar_client().await?;
    calendar
        .delete_event(calendar_or_primary(&args.calendar_id), &args.event_id)
        .await?;
    Ok(format!("Event {} deleted.", args.event_id))
}

#[derive(Debug, Deserialize)]
struct FreeBusyArgs {
    time_min: String,
    time_max: String,
    #[serde(default)]
    calendar_ids: Option<Vec<String>>,
}

pub async fn freebusy(
    services: &dyn ServiceClients,
    arguments: Map<String, Value>,
) -> ProviderResult<String> {
    let args: FreeBusyArgs = parse_args(arguments)?;
    let ids = args
        .calendar_ids
        .filter(|ids| !ids.is_empty())
        .unwrap_or_else(|| vec![PRIMARY.to_string()]);
    let request = FreeBusyRequest::new(
        expand_timestamp(&args.time_min)?,
        expand_timestamp(&args.time_max)?,
        &ids,
    );

    let calendar = services.calendar_client().await?;
    let response = calendar.free_busy(&request).await?;

    let mut lines = Vec::new();
    for (id, info) in response.ordered(&ids) {
        if let Some(err) = info.errors.first() {
            lines.push(format!("{}: Error ({})", id, err.reason));
        } else if info.busy.is_empty() {
            lines.push(format!("{}: Free", id));
        } else {
            lines.push(format!("{}:", id));
            for period in &info.busy {
                lines.push(format!("  Busy: {} → {}", period.start, period.end));
            }
        }
    }

    if lines.is_empty() {
        return Ok("No calendars returned.".to_string());
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{FakeServices, Remote};
    use gapi_providers::{
        BusyError, CalendarListEntry, FreeBusyCalendar, FreeBusyResponse, TimePeriod,
    };

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("arguments must be an object"),
        }
    }

    fn stored_event() -> Event {
        serde_json::from_value(json!({
            "id": "E1",
            "summary": "Planning",
            "description": "Quarterly",
            "location": "Room 1",
            "start": {"dateTime": "2026-02-28T10:00:00+01:00"},
            "end": {"dateTime": "2026-02-28T11:00:00+01:00"},
            "htmlLink": "https://calendar.google.com/event?eid=E1",
            "attendees": [{"email": "a@example.com", "responseStatus": "accepted"}],
            "reminders": {"useDefault": true}
        }))
        .unwrap()
    }

    fn services_with_event() -> FakeServices {
        FakeServices::new(Remote {
            events: vec![("primary".to_string(), stored_event())],
            ..Remote::default()
        })
    }

    #[tokio::test]
    async fn list_calendars_marks_primary() {
        let services = FakeServices::new(Remote {
            calendars: vec![
                CalendarListEntry {
                    id: "me@example.com".to_string(),
                    summary: Some("Me".to_string()),
                    primary: true,
                },
                CalendarListEntry {
                    id: "team@group.calendar.google.com".to_string(),
                    summary: None,
                    primary: false,
                },
            ],
            ..Remote::default()
        });

        let text = list_calendars(&services, Map::new()).await.unwrap();
        insta::assert_snapshot!(text, @r"
- Me (primary)
  ID: me@example.com
- ?
  ID: team@group.calendar.google.com
");
    }

    #[tokio::test]
    async fn list_calendars_empty() {
        let services = FakeServices::default();
        let text = list_calendars(&services, Map::new()).await.unwrap();
        assert_eq!(text, "No calendars found.");
    }

    #[tokio::test]
    async fn get_events_with_zero_items() {
        let services = FakeServices::default();
        let text = get_events(
            &services,
            args(json!({"time_min": "2026-02-28", "time_max": "2026-03-01"})),
        )
        .await
        .unwrap();

        assert_eq!(text, "No events found in the specified range.");
        let query = services.remote().event_query.clone().unwrap();
        assert_eq!(query.time_min, "2026-02-28T00:00:00Z");
        assert_eq!(query.time_max, "2026-03-01T00:00:00Z");
        assert_eq!(query.calendar_id, "primary");
        assert_eq!(query.max_results, 25);
        assert_eq!(query.query, None);
    }

    #[tokio::test]
    async fn get_events_formats_blocks() {
        let all_day = Event {
            id: Some("E2".to_string()),
            start: Some(EventDateTime {
                date: Some("2026-03-01".to_string()),
                ..EventDateTime::default()
            }),
            end: Some(EventDateTime {
                date: Some("2026-03-02".to_string()),
                ..EventDateTime::default()
            }),
            ..Event::default()
        };
        let services = FakeServices::new(Remote {
            events: vec![
                ("primary".to_string(), stored_event()),
                ("primary".to_string(), all_day),
            ],
            ..Remote::default()
        });

        let text = get_events(
            &services,
            args(json!({
                "time_min": "2026-02-28T00:00:00Z",
                "time_max": "2026-03-07T00:00:00Z",
                "query": "plan",
                "max_results": 10
            })),
        )
        .await
        .unwrap();

        insta::assert_snapshot!(text, @r"
- Planning
  Start: 2026-02-28T10:00:00+01:00
  End: 2026-02-28T11:00:00+01:00
  ID: E1
  Link: https://calendar.google.com/event?eid=E1
  Location: Room 1

- (no title)
  Start: 2026-03-01
  End: 2026-03-02
  ID: E2
");
        let query = services.remote().event_query.clone().unwrap();
        assert_eq!(query.query.as_deref(), Some("plan"));
        assert_eq!(query.max_results, 10);
    }

    #[tokio::test]
    async fn get_events_rejects_bad_timestamp() {
        let services = FakeServices::default();
        let err = get_events(
            &services,
            args(json!({"time_min": "tomorrow", "time_max": "2026-03-01"})),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), gapi_providers::ProviderErrorCode::InvalidInput);
        assert!(services.remote().calls.is_empty());
    }

    #[tokio::test]
    async fn create_event_all_day_with_meet() {
        let services = FakeServices::default();
        let text = create_event(
            &services,
            args(json!({
                "summary": "Offsite",
                "start": "2026-03-10",
                "end": "2026-03-11",
                "attendees": ["a@example.com", "b@example.com"],
                "timezone": "Europe/Amsterdam",
                "add_meet": true
            })),
        )
        .await
        .unwrap();

        assert_eq!(
            text,
            "Event created: Offsite\nLink: https://calendar.google.com/event?eid=E1\nID: E1"
        );

        let remote = services.remote();
        assert_eq!(remote.conference_data_version, Some(true));
        let (calendar_id, event) = &remote.events[0];
        assert_eq!(calendar_id, "primary");
        assert_eq!(
            serde_json::to_value(&event.start).unwrap(),
            json!({"date": "2026-03-10"})
        );
        assert_eq!(event.attendees.as_ref().map(Vec::len), Some(2));
        let request_id = event
            .conference_data
            .as_ref()
            .and_then(|c| c.create_request.as_ref())
            .map(|r| r.request_id.clone())
            .unwrap();
        assert!(request_id.starts_with("meet-"));
        assert_eq!(request_id.len(), "meet-".len() + 14);
        assert!(event.description.is_none());
    }

    #[tokio::test]
    async fn create_event_timed_with_timezone() {
        let services = FakeServices::default();
        create_event(
            &services,
            args(json!({
                "summary": "Call",
                "start": "2026-03-10T09:00:00",
                "end": "2026-03-10T09:30:00",
                "timezone": "Europe/Amsterdam",
                "calendar_id": "work@example.com"
            })),
        )
        .await
        .unwrap();

        let remote = services.remote();
        assert_eq!(remote.conference_data_version, Some(false));
        let (calendar_id, event) = &remote.events[0];
        assert_eq!(calendar_id, "work@example.com");
        assert_eq!(
            serde_json::to_value(&event.end).unwrap(),
            json!({"dateTime": "2026-03-10T09:30:00", "timeZone": "Europe/Amsterdam"})
        );
        assert!(event.conference_data.is_none());
    }

    #[tokio::test]
    async fn modify_event_changes_only_provided_fields() {
        let services = services_with_event();
        let text = modify_event(
            &services,
            args(json!({"event_id": "E1", "summary": "Planning v2"})),
        )
        .await
        .unwrap();
        assert_eq!(
            text,
            "Event updated: Planning v2\nLink: https://calendar.google.com/event?eid=E1"
        );

        let mut expected = stored_event();
        expected.summary = Some("Planning v2".to_string());
        let remote = services.remote();
        assert_eq!(remote.events[0].1, expected);
        assert_eq!(remote.calls, vec!["events.get", "events.update"]);
    }

    #[tokio::test]
    async fn modify_event_is_idempotent() {
        let services = services_with_event();
        let arguments = json!({
            "event_id": "E1",
            "description": "",
            "attendees": [],
            "start": "2026-03-01",
            "end": "2026-03-02"
        });

        modify_event(&services, args(arguments.clone())).await.unwrap();
        let once = services.remote().events[0].1.clone();
        modify_event(&services, args(arguments)).await.unwrap();
        let twice = services.remote().events[0].1.clone();

        assert_eq!(once, twice);
        assert_eq!(once.description.as_deref(), Some(""));
        assert_eq!(once.attendees, Some(Vec::new()));
        assert_eq!(once.location.as_deref(), Some("Room 1"));
        assert!(once.extra.contains_key("reminders"));
        assert_eq!(
            serde_json::to_value(&once.start).unwrap(),
            json!({"date": "2026-03-01"})
        );
    }

    #[tokio::test]
    async fn modify_event_without_changes_leaves_event_alone() {
        let services = services_with_event();
        let text = modify_event(&services, args(json!({"event_id": "E1"})))
            .await
            .unwrap();

        assert_eq!(
            text,
            "Event updated: Planning\nLink: https://calendar.google.com/event?eid=E1"
        );
        let remote = services.remote();
        assert_eq!(remote.events[0].1, stored_event());
        assert_eq!(remote.calls, vec!["events.get", "events.update"]);
    }

    #[tokio::test]
    async fn modify_missing_event_is_remote_fault() {
        let services = FakeServices::default();
        let err = modify_event(&services, args(json!({"event_id": "nope"})))
            .await
            .unwrap_err();
        assert!(err.is_remote());
        assert_eq!(err.status(), Some(404));
        assert_eq!(services.remote().calls, vec!["events.get"]);
    }

    #[tokio::test]
    async fn delete_event_text() {
        let services = services_with_event();
        let text = delete_event(&services, args(json!({"event_id": "E1"})))
            .await
            .unwrap();
        assert_eq!(text, "Event E1 deleted.");
        assert!(services.remote().events.is_empty());
    }

    #[tokio::test]
    async fn freebusy_lists_busy_and_free() {
        let mut calendars = std::collections::BTreeMap::new();
        calendars.insert(
            "primary".to_string(),
            FreeBusyCalendar {
                busy: vec![TimePeriod {
                    start: "2026-02-28T09:00:00Z".to_string(),
                    end: "2026-02-28T10:00:00Z".to_string(),
                }],
                errors: Vec::new(),
            },
        );
        calendars.insert("b@example.com".to_string(), FreeBusyCalendar::default());
        calendars.insert(
            "c@example.com".to_string(),
            FreeBusyCalendar {
                busy: Vec::new(),
                errors: vec![BusyError {
                    domain: "global".to_string(),
                    reason: "notFound".to_string(),
                }],
            },
        );
        let services = FakeServices::new(Remote {
            free_busy: FreeBusyResponse { calendars },
            ..Remote::default()
        });

        let text = freebusy(
            &services,
            args(json!({
                "time_min": "2026-02-28",
                "time_max": "2026-03-01T00:00:00Z",
                "calendar_ids": ["primary", "b@example.com", "c@example.com"]
            })),
        )
        .await
        .unwrap();

        insta::assert_snapshot!(text, @r"
primary:
  Busy: 2026-02-28T09:00:00Z → 2026-02-28T10:00:00Z
b@example.com: Free
c@example.com: Error (notFound)
");
        let request = services.remote().free_busy_request.clone().unwrap();
        assert_eq!(request.time_min, "2026-02-28T00:00:00Z");
        assert_eq!(request.items.len(), 3);
    }

    #[tokio::test]
    async fn freebusy_defaults_to_primary() {
        let services = FakeServices::default();
        let text = freebusy(
            &services,
            args(json!({"time_min": "2026-02-28", "time_max": "2026-03-01"})),
        )
        .await
        .unwrap();

        assert_eq!(text, "No calendars returned.");
        let request = services.remote().free_busy_request.clone().unwrap();
        assert_eq!(request.items[0].id, "primary");
    }
}
