//! JSON-RPC 2.0 over newline-delimited stdio.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use super::{handle_method, SharedState};
use crate::error::{AppError, ErrorKind};

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod rpc_tests;

/// Parse error code
pub const PARSE_ERROR: i32 = -32700;
/// Method not found code
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid params code
pub const INVALID_PARAMS: i32 = -32602;
/// Internal error code
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request identifier (None for notifications).
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    /// Request identifier (null when the request could not be read).
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Server identification returned by `initialize`.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Result of the `initialize` handshake.
#[derive(Debug, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
    /// Methods this server answers.
    pub methods: Vec<String>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Error response carrying the application error kind as data
    pub fn app_error(id: Option<Value>, error: &AppError) -> Self {
        let code = match error.kind() {
            ErrorKind::Validation => INVALID_PARAMS,
            _ => INTERNAL_ERROR,
        };
        let mut response = Self::error(id, code, error.to_string());
        if let Some(err) = response.error.as_mut() {
            err.data = serde_json::to_value(error.kind())
                .ok()
                .map(|kind| serde_json::json!({ "kind": kind }));
        }
        response
    }
}

/// Chat server speaking JSON-RPC over stdio.
pub struct ChatServer {
    state: SharedState,
}

impl ChatServer {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Run the server on stdin/stdout until EOF
    pub async fn run(&self) -> std::io::Result<()> {
        info!("Bookmark agent server starting...");
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.serve(reader, writer).await
    }

    /// Serve newline-delimited requests from `reader`, writing responses to `writer`
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            // EOF reached
            if bytes_read == 0 {
                info!("EOF received, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!(request = %trimmed, "Received request");

            let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    error!(error = %e, "Failed to parse request");
                    Some(JsonRpcResponse::error(
                        None,
                        PARSE_ERROR,
                        format!("Parse error: {}", e),
                    ))
                }
            };

            // Notifications get no response
            if let Some(response) = response {
                let response_json = serde_json::to_string(&response)?;
                debug!(response = %response_json, "Sending response");

                writer.write_all(response_json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request; `None` for notifications
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let is_notification = request.id.is_none();

        match request.method.as_str() {
            "initialize" => return Some(self.handle_initialize(request.id)),
            "initialized" => {
                debug!("Received initialized notification");
                return None;
            }
            "ping" => {
                return Some(JsonRpcResponse::success(
                    request.id,
                    Value::Object(Default::default()),
                ))
            }
            _ => {}
        }

        match handle_method(&self.state, &request.method, request.params).await {
            Some(_) if is_notification => None,
            Some(Ok(result)) => Some(JsonRpcResponse::success(request.id, result)),
            Some(Err(e)) => {
                error!(method = %request.method, error = %e, "Method failed");
                Some(JsonRpcResponse::app_error(request.id, &e))
            }
            None if is_notification => {
                debug!(method = %request.method, "Unknown notification, ignoring");
                None
            }
            None => {
                error!(method = %request.method, "Unknown method");
                Some(JsonRpcResponse::error(
                    request.id,
                    METHOD_NOT_FOUND,
                    format!("Method not found: {}", request.method),
                ))
            }
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling initialize request");

        let result = InitializeResult {
            server_info: ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            methods: [
                "initialize",
                "ping",
                "chat/respond",
                "bookmarks/list",
                "categories/tree",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        };

        match serde_json::to_value(result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize initialize result");
                JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Internal error: {}", e))
            }
        }
    }
}
