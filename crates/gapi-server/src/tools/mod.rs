//! The tool layer.
//!
//! Each tool is an async function taking the service factory and its raw
//! JSON arguments and returning the text shown to the agent. [`Toolbox`]
//! owns the registry and routes every call through [`adapter::adapt`], so
//! a failing tool still produces a text result.

pub mod adapter;
pub mod calendar;
pub mod tasks;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use gapi_protocol::{CallToolResult, Tool};
use gapi_providers::ServiceClients;

/// Static description of one tool.
#[derive(Debug, Clone)]
pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

impl From<ToolDef> for Tool {
    fn from(def: ToolDef) -> Self {
        Tool {
            name: def.name.to_string(),
            description: def.description.to_string(),
            input_schema: def.input_schema,
        }
    }
}

/// All tools, calendar first.
pub fn all_tools() -> Vec<ToolDef> {
    let mut tools = calendar::tool_defs();
    tools.extend(tasks::tool_defs());
    tools
}

/// The tool registry bound to a service factory.
#[derive(Clone)]
pub struct Toolbox {
    services: Arc<dyn ServiceClients>,
    tools: Vec<ToolDef>,
}

impl std::fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolbox")
            .field("tools", &self.tools.len())
            .finish_non_exhaustive()
    }
}

impl Toolbox {
    pub fn new(services: Arc<dyn ServiceClients>) -> Self {
        Self {
            services,
            tools: all_tools(),
        }
    }

    /// The tools advertised by `tools/list`.
    pub fn list(&self) -> Vec<Tool> {
        self.tools.iter().cloned().map(Tool::from).collect()
    }

    /// Runs a tool. Returns `None` for an unknown name.
    pub async fn call(&self, name: &str, arguments: Map<String, Value>) -> Option<CallToolResult> {
        let services = self.services.as_ref();
        debug!(tool = name, "calling tool");

        let result = match name {
            "list_calendars" => {
                adapter::adapt(name, calendar::list_calendars(services, arguments)).await
            }
            "get_events" => adapter::adapt(name, calendar::get_events(services, arguments)).await,
            "create_event" => {
                adapter::adapt(name, calendar::create_event(services, arguments)).await
            }
            "modify_event" => {
                adapter::adapt(name, calendar::modify_event(services, arguments)).await
            }
            "delete_event" => {
                adapter::adapt(name, calendar::delete_event(services, arguments)).await
            }
            "freebusy" => adapter::adapt(name, calendar::freebusy(services, arguments)).await,
            "list_task_lists" => {
                adapter::adapt(name, tasks::list_task_lists(services, arguments)).await
            }
            "list_tasks" => adapter::adapt(name, tasks::list_tasks(services, arguments)).await,
            "get_task" => adapter::adapt(name, tasks::get_task(services, arguments)).await,
            "create_task" => adapter::adapt(name, tasks::create_task(services, arguments)).await,
            "update_task" => adapter::adapt(name, tasks::update_task(services, arguments)).await,
            "delete_task" => adapter::adapt(name, tasks::delete_task(services, arguments)).await,
            _ => return None,
        };
        Some(result)
    }
}
