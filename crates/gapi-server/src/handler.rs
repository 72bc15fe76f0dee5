//! Request/response dispatch handler.
//!
//! Turns one JSON-RPC line into at most one response. Notifications never
//! get a response; every request does, even when it cannot be parsed.

use serde::Serialize;
use serde_json::Value;
use tracing::{Span, debug, info, warn};

use gapi_protocol::mcp::methods;
use gapi_protocol::{
    CallToolParams, CallToolResult, ErrorCode, ErrorObject, Implementation, InitializeParams,
    InitializeResult, ListToolsResult, ProtocolError, Request, RequestId, Response,
    ServerCapabilities, ToolsCapability, negotiate_version,
};

use crate::config::ServerConfig;
use crate::tools::Toolbox;

/// Routes MCP requests to the toolbox.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    config: ServerConfig,
    toolbox: Toolbox,
}

impl RequestHandler {
    pub fn new(config: ServerConfig, toolbox: Toolbox) -> Self {
        Self { config, toolbox }
    }

    /// Handles one raw line. Returns `None` when no response is due.
    pub async fn handle_line(&self, line: &[u8]) -> Option<Response> {
        let value: Value = match gapi_protocol::decode_message(line) {
            Ok(value) => value,
            Err(ProtocolError::EmptyMessage) => return None,
            Err(err) => {
                warn!(error = %err, "unparsable message");
                return Some(Response::error(None, ErrorObject::from(err)));
            }
        };

        let request = match parse_request(value) {
            Ok(request) => request,
            Err((id, error)) => {
                warn!(message = %error.message, "invalid request");
                return Some(Response::error(id, error));
            }
        };

        self.handle(request).await
    }

    /// Handles a parsed request.
    #[tracing::instrument(skip(self, request), fields(method = %request.method, duration_ms))]
    pub async fn handle(&self, request: Request) -> Option<Response> {
        let start = std::time::Instant::now();

        if let Err(err) = request.validate() {
            warn!(error = %err, "rejecting request");
            return request
                .id
                .clone()
                .map(|id| Response::error(Some(id), ErrorObject::from(err)));
        }

        let Some(id) = request.id.clone() else {
            debug!("notification received");
            return None;
        };

        let outcome = match request.method.as_str() {
            methods::INITIALIZE => self.initialize(request.params),
            methods::PING => Ok(Value::Object(Default::default())),
            methods::TOOLS_LIST => to_value(&ListToolsResult {
                tools: self.toolbox.list(),
            }),
            methods::TOOLS_CALL => self.call_tool(request.params).await,
            other => {
                debug!(method = other, "unknown method");
                Err(ErrorObject::new(
                    ErrorCode::MethodNotFound,
                    format!("Method not found: {}", other),
                ))
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        Span::current().record("duration_ms", duration_ms);

        Some(match outcome {
            Ok(result) => Response::success(Some(id), result),
            Err(error) => Response::error(Some(id), error),
        })
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, ErrorObject> {
        let params: InitializeParams = parse_params(params)?;
        let version = negotiate_version(&params.protocol_version);
        if let Some(client) = &params.client_info {
            info!(
                client = %client.name,
                client_version = %client.version,
                protocol = version,
                "client initialized"
            );
        }

        to_value(&InitializeResult {
            protocol_version: version.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: Implementation {
                name: self.config.name.clone(),
                version: self.config.version.clone(),
            },
            instructions: self.config.instructions.clone(),
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, ErrorObject> {
        let params: CallToolParams = parse_params(params)?;
        let arguments = params.arguments.unwrap_or_default();

        let result = match self.toolbox.call(&params.name, arguments).await {
            Some(result) => result,
            None => {
                warn!(tool = %params.name, "unknown tool");
                CallToolResult::error(format!("Unknown tool: {}", params.name))
            }
        };
        to_value(&result)
    }
}

/// Splits a decoded line into a request, or an error response carrying
/// whatever id could be recovered.
fn parse_request(value: Value) -> Result<Request, (Option<RequestId>, ErrorObject)> {
    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

    if !value.is_object() {
        return Err((
            None,
            ErrorObject::new(ErrorCode::InvalidRequest, "Invalid Request: expected an object"),
        ));
    }

    serde_json::from_value(value).map_err(|err| {
        (
            id,
            ErrorObject::new(ErrorCode::InvalidRequest, format!("Invalid Request: {}", err)),
        )
    })
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, ErrorObject> {
    let params = params.unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(params)
        .map_err(|err| ErrorObject::new(ErrorCode::InvalidParams, format!("Invalid params: {}", err)))
}

fn to_value<T: Serialize>(result: &T) -> Result<Value, ErrorObject> {
    serde_json::to_value(result)
        .map_err(|err| ErrorObject::new(ErrorCode::InternalError, err.to_string()))
}
