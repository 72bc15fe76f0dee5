//! Tasks tools.

use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use gapi_core::expand_timestamp;
use gapi_providers::{ProviderResult, ServiceClients, Task, TaskQuery, TaskStatus};

use super::ToolDef;
use super::adapter::parse_args;

const MAX_TASK_LISTS: u32 = 100;
const DEFAULT_MAX_TASKS: u32 = 100;
/// Notes longer than this are cut in task blocks.
const NOTES_PREVIEW: usize = 200;

pub fn tool_defs() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "list_task_lists",
            description: "List all task lists.",
            input_schema: json!({"type": "object", "properties": {}}),
        },
        ToolDef {
            name: "list_tasks",
            description: "List tasks in a task list.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_list_id": {"type": "string", "description": "The task list ID"},
                    "max_results": {"type": "integer", "minimum": 1, "description": "Maximum tasks to return (default: 100)"},
                    "show_completed": {"type": "boolean", "description": "Include completed tasks (default: true)"},
                    "show_hidden": {"type": "boolean", "description": "Include hidden tasks (default: false)"},
                    "due_max": {"type": "string", "description": "Upper bound for due date (RFC 3339 or YYYY-MM-DD)"},
                    "due_min": {"type": "string", "description": "Lower bound for due date (RFC 3339 or YYYY-MM-DD)"}
                },
                "required": ["task_list_id"]
            }),
        },
        ToolDef {
            name: "get_task",
            description: "Get details of a specific task.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_list_id": {"type": "string", "description": "The task list ID"},
                    "task_id": {"type": "string", "description": "The task ID"}
                },
                "required": ["task_list_id", "task_id"]
            }),
        },
        ToolDef {
            name: "create_task",
            description: "Create a new task.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_list_id": {"type": "string", "description": "The task list ID to create in"},
                    "title": {"type": "string", "description": "Task title"},
                    "notes": {"type": "string", "description": "Task notes"},
                    "due": {"type": "string", "description": "Due date (RFC 3339, e.g. '2026-02-28T00:00:00Z', or YYYY-MM-DD)"},
                    "parent": {"type": "string", "description": "Parent task ID (for subtasks)"}
                },
                "required": ["task_list_id", "title"]
            }),
        },
        ToolDef {
            name: "update_task",
            description: "Update an existing task. Only provided fields are changed.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_list_id": {"type": "string", "description": "The task list ID"},
                    "task_id": {"type": "string", "description": "The task ID to update"},
                    "title": {"type": "string", "description": "New title"},
                    "notes": {"type": "string", "description": "New notes"},
                    "status": {"type": "string", "enum": ["needsAction", "completed"], "description": "New status"},
                    "due": {"type": "string", "description": "New due date (RFC 3339 or YYYY-MM-DD)"}
                },
                "required": ["task_list_id", "task_id"]
            }),
        },
        ToolDef {
            name: "delete_task",
            description: "Delete a task.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_list_id": {"type": "string", "description": "The task list ID"},
                    "task_id": {"type": "string", "description": "The task ID to delete"}
                },
                "required": ["task_list_id", "task_id"]
            }),
        },
    ]
}

fn status_text(task: &Task) -> String {
    task.status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn preview(notes: &str) -> String {
    if notes.chars().count() > NOTES_PREVIEW {
        let cut: String = notes.chars().take(NOTES_PREVIEW).collect();
        format!("{}...", cut)
    } else {
        notes.to_string()
    }
}

/// Formats one task as an indented block.
pub fn format_task(task: &Task) -> String {
    let mut lines = vec![
        format!(
            "- [{}] {}",
            status_text(task),
            task.title.as_deref().unwrap_or("(no title)")
        ),
        format!("  ID: {}", task.id.as_deref().unwrap_or_default()),
    ];
    if let Some(due) = non_empty(&task.due) {
        lines.push(format!("  Due: {}", due));
    }
    if let Some(notes) = non_empty(&task.notes) {
        lines.push(format!("  Notes: {}", preview(notes)));
    }
    lines.join("\n")
}

pub async fn list_task_lists(
    services: &dyn ServiceClients,
    _arguments: Map<String, Value>,
) -> ProviderResult<String> {
    let tasks = services.tasks_client().await?;
    let lists = tasks.list_task_lists(MAX_TASK_LISTS).await?;
    if lists.is_empty() {
        return Ok("No task lists found.".to_string());
    }

    let lines: Vec<String> = lists
        .iter()
        .map(|list| {
            format!(
                "- {}\n  ID: {}",
                list.title.as_deref().unwrap_or("?"),
                list.id
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

#[derive(Debug, Deserialize)]
struct ListTasksArgs {
    task_list_id: String,
    #[serde(default)]
    max_results: Option<u32>,
    #[serde(default)]
    show_completed: Option<bool>,
    #[serde(default)]
    show_hidden: Option<bool>,
    #[serde(default)]
    due_min: Option<String>,
    #[serde(default)]
    due_max: Option<String>,
}

fn due_bound(value: &Option<String>) -> ProviderResult<Option<String>> {
    match non_empty(value) {
        Some(v) => Ok(Some(expand_timestamp(v)?)),
        None => Ok(None),
    }
}

pub async fn list_tasks(
    services: &dyn ServiceClients,
    arguments: Map<String, Value>,
) -> ProviderResult<String> {
    let args: ListTasksArgs = parse_args(arguments)?;
    let query = TaskQuery {
        max_results: args.max_results.unwrap_or(DEFAULT_MAX_TASKS),
        show_completed: args.show_completed.unwrap_or(true),
        show_hidden: args.show_hidden.unwrap_or(false),
        due_min: due_bound(&args.due_min)?,
        due_max: due_bound(&args.due_max)?,
        task_list_id: args.task_list_id,
    };

    let tasks = services.tasks_client().await?;
    let items = tasks.list_tasks(&query).await?;
    if items.is_empty() {
        return Ok("No tasks found.".to_string());
    }

    let blocks: Vec<String> = items.iter().map(format_task).collect();
    Ok(blocks.join("\n\n"))
}

#[derive(Debug, Deserialize)]
struct TaskRef {
    task_list_id: String,
    task_id: String,
}

pub async fn get_task(
    services: &dyn ServiceClients,
    arguments: Map<String, Value>,
) -> ProviderResult<String> {
    let args: TaskRef = parse_args(arguments)?;
    let tasks = services.tasks_client().await?;
    let task = tasks.get_task(&args.task_list_id, &args.task_id).await?;

    let mut lines = vec![
        format!("Title: {}", task.title.as_deref().unwrap_or("?")),
        format!("Status: {}", status_text(&task)),
        format!("ID: {}", task.id.as_deref().unwrap_or("?")),
    ];
    let optional = [
        ("Due", &task.due),
        ("Notes", &task.notes),
        ("Completed", &task.completed),
        ("Parent", &task.parent),
    ];
    for (label, value) in optional {
        if let Some(value) = non_empty(value) {
            lines.push(format!("{}: {}", label, value));
        }
    }
    Ok(lines.join("\n"))
}

#[derive(Debug, Deserialize)]
struct CreateTaskArgs {
    task_list_id: String,
    title: String,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    due: Option<String>,
    #[serde(default)]
    parent: Option<String>,
}

pub async fn create_task(
    services: &dyn ServiceClients,
    arguments: Map<String, Value>,
) -> ProviderResult<String> {
    let args: CreateTaskArgs = parse_args(arguments)?;
    let task = Task {
        title: Some(args.title.clone()),
        notes: non_empty(&args.notes).map(str::to_string),
        due: due_bound(&args.due)?,
        ..Task::default()
    };

    let tasks = services.tasks_client().await?;
    let created = tasks
        .insert_task(&args.task_list_id, &task, non_empty(&args.parent))
        .await?;

    Ok(format!(
        "Task created: {}\nID: {}",
        created.title.as_deref().unwrap_or_default(),
        created.id.as_deref().unwrap_or_default()
    ))
}

/// Changes requested by `update_task`. `None` leaves a field alone.
#[derive(Debug, Default, Deserialize)]
pub struct TaskChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub due: Option<String>,
}

impl TaskChanges {
    /// Overwrites every provided field of `task`.
    ///
    /// Completing a task stamps `completed` with the current time; reopening
    /// it clears the stamp.
    pub fn apply(&self, task: &mut Task) -> ProviderResult<()> {
        if let Some(title) = &self.title {
            task.title = Some(title.clone());
        }
        if let Some(notes) = &self.notes {
            task.notes = Some(notes.clone());
        }
        if let Some(status) = self.status {
            task.status = Some(status);
            task.completed = match status {
                TaskStatus::Completed => {
                    Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
                }
                TaskStatus::NeedsAction => None,
            };
        }
        if let Some(due) = &self.due {
            task.due = Some(if due.is_empty() {
                String::new()
            } else {
                expand_timestamp(due)?
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct UpdateTaskArgs {
    task_list_id: String,
    task_id: String,
    #[serde(flatten)]
    changes: TaskChanges,
}

pub async fn update_task(
    services: &dyn ServiceClients,
    arguments: Map<String, Value>,
) -> ProviderResult<String> {
    let args: UpdateTaskArgs = parse_args(arguments)?;
    let tasks = services.tasks_client().await?;

    let mut task = tasks.get_task(&args.task_list_id, &args.task_id).await?;
    args.changes.apply(&mut task)?;
    let updated = tasks
        .update_task(&args.task_list_id, &args.task_id, &task)
        .await?;

    Ok(format!(
        "Task updated: {}\nStatus: {}",
        updated.title.as_deref().unwrap_or_default(),
        updated.status.map(|s| s.as_str()).unwrap_or_default()
    ))
}

pub async fn delete_task(
    services: &dyn ServiceClients,
    arguments: Map<String, Value>,
) -> ProviderResult<String> {
    let args: TaskRef = parse_args(arguments)?;
    let tasks = services.tasks_client().await?;
    tasks.delete_task(&args.task_list_id, &args.task_id).await?;
    Ok(format!("Task {} deleted.", args.task_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{FakeServices, Remote};
    use gapi_providers::{ProviderErrorCode, TaskList};

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("arguments must be an object"),
        }
    }

    fn stored_task() -> Task {
        serde_json::from_value(json!({
            "id": "T9",
            "title": "Write report",
            "status": "needsAction",
            "notes": "Draft first",
            "due": "2026-03-01T00:00:00.000Z",
            "etag": "\"v1\"",
            "position": "00000000000000000001"
        }))
        .unwrap()
    }

    fn services_with_task() -> FakeServices {
        FakeServices::new(Remote {
            tasks: vec![("L1".to_string(), stored_task())],
            ..Remote::default()
        })
    }

    #[tokio::test]
    async fn list_task_lists_text() {
        let services = FakeServices::new(Remote {
            task_lists: vec![
                TaskList {
                    id: "L1".to_string(),
                    title: Some("My Tasks".to_string()),
                },
                TaskList {
                    id: "L2".to_string(),
                    title: None,
                },
            ],
            ..Remote::default()
        });

        let text = list_task_lists(&services, Map::new()).await.unwrap();
        insta::assert_snapshot!(text, @r"
- My Tasks
  ID: L1
- ?
  ID: L2
");
        assert_eq!(services.remote().task_list_limit, Some(100));
    }

    #[tokio::test]
    async fn list_task_lists_empty() {
        let services = FakeServices::default();
        let text = list_task_lists(&services, Map::new()).await.unwrap();
        assert_eq!(text, "No task lists found.");
    }

    #[tokio::test]
    async fn list_tasks_defaults_and_blocks() {
        let long_notes = "x".repeat(250);
        let services = FakeServices::new(Remote {
            tasks: vec![
                ("L1".to_string(), stored_task()),
                (
                    "L1".to_string(),
                    Task {
                        id: Some("T10".to_string()),
                        notes: Some(long_notes),
                        ..Task::default()
                    },
                ),
            ],
            ..Remote::default()
        });

        let text = list_tasks(&services, args(json!({"task_list_id": "L1"})))
            .await
            .unwrap();

        let blocks: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        insta::assert_snapshot!(blocks[0], @r"
- [needsAction] Write report
  ID: T9
  Due: 2026-03-01T00:00:00.000Z
  Notes: Draft first
");
        assert!(blocks[1].starts_with("- [?] (no title)\n  ID: T10\n  Notes: xxx"));
        assert!(blocks[1].ends_with(&format!("{}...", "x".repeat(3))));
        assert_eq!(blocks[1].lines().last().unwrap().len(), "  Notes: ".len() + 203);

        let query = services.remote().task_query.clone().unwrap();
        assert_eq!(
            query,
            TaskQuery {
                task_list_id: "L1".to_string(),
                max_results: 100,
                show_completed: true,
                show_hidden: false,
                due_min: None,
                due_max: None,
            }
        );
    }

    #[tokio::test]
    async fn list_tasks_expands_due_bounds() {
        let services = FakeServices::default();
        let text = list_tasks(
            &services,
            args(json!({
                "task_list_id": "L1",
                "due_min": "2026-03-01",
                "due_max": "2026-03-31T23:59:59Z",
                "show_completed": false,
                "max_results": 5
            })),
        )
        .await
        .unwrap();

        assert_eq!(text, "No tasks found.");
        let query = services.remote().task_query.clone().unwrap();
        assert_eq!(query.due_min.as_deref(), Some("2026-03-01T00:00:00Z"));
        assert_eq!(query.due_max.as_deref(), Some("2026-03-31T23:59:59Z"));
        assert!(!query.show_completed);
        assert_eq!(query.max_results, 5);
    }

    #[tokio::test]
    async fn get_task_lines() {
        let services = services_with_task();
        let text = get_task(&services, args(json!({"task_list_id": "L1", "task_id": "T9"})))
            .await
            .unwrap();
        insta::assert_snapshot!(text, @r"
Title: Write report
Status: needsAction
ID: T9
Due: 2026-03-01T00:00:00.000Z
Notes: Draft first
");
    }

    #[tokio::test]
    async fn create_task_echoes_remote() {
        let services = FakeServices::default();
        let text = create_task(
            &services,
            args(json!({"task_list_id": "L1", "title": "Buy milk"})),
        )
        .await
        .unwrap();

        assert_eq!(text, "Task created: Buy milk\nID: T1");
        let remote = services.remote();
        assert_eq!(remote.parent, None);
        assert_eq!(
            serde_json::to_value(&remote.tasks[0].1).unwrap(),
            json!({"id": "T1", "title": "Buy milk", "status": "needsAction"})
        );
    }

    #[tokio::test]
    async fn create_subtask_with_due_date() {
        let services = FakeServices::default();
        create_task(
            &services,
            args(json!({
                "task_list_id": "L1",
                "title": "Step 1",
                "notes": "",
                "due": "2026-03-02",
                "parent": "T9"
            })),
        )
        .await
        .unwrap();

        let remote = services.remote();
        assert_eq!(remote.parent.as_deref(), Some("T9"));
        let task = &remote.tasks[0].1;
        assert_eq!(task.due.as_deref(), Some("2026-03-02T00:00:00Z"));
        assert_eq!(task.notes, None);
    }

    #[tokio::test]
    async fn complete_then_reopen() {
        let services = services_with_task();
        let text = update_task(
            &services,
            args(json!({"task_list_id": "L1", "task_id": "T9", "status": "completed"})),
        )
        .await
        .unwrap();
        assert_eq!(text, "Task updated: Write report\nStatus: completed");
        let completed = services.remote().tasks[0].1.completed.clone().unwrap();
        assert!(completed.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&completed).is_ok());

        let text = update_task(
            &services,
            args(json!({"task_list_id": "L1", "task_id": "T9", "status": "needsAction"})),
        )
        .await
        .unwrap();
        assert_eq!(text, "Task updated: Write report\nStatus: needsAction");
        assert_eq!(services.remote().tasks[0].1.completed, None);
    }

    #[tokio::test]
    async fn update_task_is_idempotent() {
        let services = services_with_task();
        let arguments = json!({
            "task_list_id": "L1",
            "task_id": "T9",
            "notes": "",
            "due": "2026-03-05"
        });

        update_task(&services, args(arguments.clone())).await.unwrap();
        let once = services.remote().tasks[0].1.clone();
        update_task(&services, args(arguments)).await.unwrap();
        let twice = services.remote().tasks[0].1.clone();

        assert_eq!(once, twice);
        assert_eq!(once.notes.as_deref(), Some(""));
        assert_eq!(once.due.as_deref(), Some("2026-03-05T00:00:00Z"));
        assert_eq!(once.title.as_deref(), Some("Write report"));
        assert_eq!(once.extra.get("etag"), Some(&json!("\"v1\"")));
    }

    #[tokio::test]
    async fn update_task_without_changes_leaves_task_alone() {
        let services = services_with_task();
        let text = update_task(&services, args(json!({"task_list_id": "L1", "task_id": "T9"})))
            .await
            .unwrap();

        assert_eq!(text, "Task updated: Write report\nStatus: needsAction");
        assert_eq!(services.remote().tasks[0].1, stored_task());
    }

    #[test]
    fn task_block_without_id() {
        let task = Task {
            title: Some("Loose end".to_string()),
            status: Some(TaskStatus::Completed),
            ..Task::default()
        };
        assert_eq!(format_task(&task), "- [completed] Loose end\n  ID: ");
    }

    #[tokio::test]
    async fn update_task_rejects_unknown_status() {
        let services = services_with_task();
        let err = update_task(
            &services,
            args(json!({"task_list_id": "L1", "task_id": "T9", "status": "done"})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidInput);
        assert!(services.remote().calls.is_empty());
    }

    #[tokio::test]
    async fn delete_task_text() {
        let services = services_with_task();
        let text = delete_task(&services, args(json!({"task_list_id": "L1", "task_id": "T9"})))
            .await
            .unwrap();
        assert_eq!(text, "Task T9 deleted.");
        assert!(services.remote().tasks.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_task_is_remote_fault() {
        let services = FakeServices::default();
        let err = delete_task(&services, args(json!({"task_list_id": "L1", "task_id": "T9"})))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
