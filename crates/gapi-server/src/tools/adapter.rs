//! The tool boundary: every failure becomes a text result.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{error, warn};

use gapi_protocol::CallToolResult;
use gapi_providers::{ProviderError, ProviderResult};

/// Text returned when a tool body panics.
pub const PANIC_TEXT: &str = "Error: internal_error: tool panicked";

/// Runs a tool body and converts its outcome into a tool result.
///
/// Remote faults read `Google API error {status}: {reason}`, anything else
/// `Error: {description}`. Panics are caught as well.
pub async fn adapt<F>(tool: &str, body: F) -> CallToolResult
where
    F: Future<Output = ProviderResult<String>>,
{
    match AssertUnwindSafe(body).catch_unwind().await {
        Ok(Ok(text)) => CallToolResult::text(text),
        Ok(Err(err)) if err.code().is_auth() => {
            error!(
                tool,
                code = %err.code(),
                error = %err,
                "tool needs authorization, run `gapi auth`"
            );
            CallToolResult::text(describe(&err))
        }
        Ok(Err(err)) => {
            warn!(tool, code = %err.code(), error = %err, "tool failed");
            CallToolResult::text(describe(&err))
        }
        Err(_) => {
            error!(tool, "tool panicked");
            CallToolResult::text(PANIC_TEXT)
        }
    }
}

/// The user-facing text for a failure.
pub fn describe(err: &ProviderError) -> String {
    if err.is_remote() {
        err.to_string()
    } else {
        format!("Error: {}", err)
    }
}

/// Deserializes tool arguments; mismatches are `invalid_input`.
pub fn parse_args<T: DeserializeOwned>(arguments: Map<String, Value>) -> ProviderResult<T> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| ProviderError::invalid_input(format!("invalid arguments: {}", e)))
}
