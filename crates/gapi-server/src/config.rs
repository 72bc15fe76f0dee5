//! Server identity advertised during `initialize`.

/// Default guidance sent to the client with `initialize`.
pub const DEFAULT_INSTRUCTIONS: &str = "Google Calendar and Google Tasks tools. \
Times are RFC 3339 (e.g. 2026-02-28T10:00:00+01:00); a bare YYYY-MM-DD date is \
accepted for ranges and makes events all-day. Use list_calendars and \
list_task_lists to discover IDs.";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Name reported in `serverInfo`.
    pub name: String,

    /// Version reported in `serverInfo`.
    pub version: String,

    /// Free-form guidance for the calling agent.
    pub instructions: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "gapi".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            instructions: Some(DEFAULT_INSTRUCTIONS.to_string()),
        }
    }
}

impl ServerConfig {
    /// Builder: set the advertised name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: set or clear the instructions.
    pub fn with_instructions(mut self, instructions: Option<String>) -> Self {
        self.instructions = instructions;
        self
    }
}
