//! MCP server implementation.
//!
//! Wraps a `ToolRegistry` and exposes its tools over the MCP protocol.
//! Handles JSON-RPC requests and dispatches them to the appropriate handlers.
//!
//! The server itself is immutable after construction and can be shared across
//! HTTP handlers. Per-connection lifecycle lives in a [`Session`] owned by the
//! caller.

use serde_json::{json, Value};

use sqlmcp_core::config::McpConfig;
use sqlmcp_tool_runtime::ToolRegistry;

use crate::error::McpError;
use crate::transport::McpTransport;
use crate::types::*;

/// Lifecycle of one client connection. Tracked for logging only; requests
/// are served in every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Initialized,
    Ready,
}

/// Per-connection state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
    client_name: Option<String>,
    protocol_version: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    /// Protocol version negotiated by the last `initialize`.
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }
}

/// MCP server that bridges a `ToolRegistry` to MCP clients.
pub struct McpServer {
    registry: ToolRegistry,
    identity: McpConfig,
}

impl McpServer {
    /// Create a new MCP server wrapping the given tool registry.
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            identity: McpConfig::default(),
        }
    }

    /// Set the advertised name, version, and default protocol version.
    pub fn with_identity(mut self, identity: McpConfig) -> Self {
        self.identity = identity;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn identity(&self) -> &McpConfig {
        &self.identity
    }

    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: self.identity.server_name.clone(),
            version: Some(self.identity.server_version.clone()),
        }
    }

    /// Tool descriptors in registration order.
    pub fn tools(&self) -> Vec<ToolInfo> {
        self.registry.list().into_iter().map(ToolInfo::from).collect()
    }

    /// Run the server loop, reading from and writing to the transport.
    ///
    /// Processes messages until the transport is closed. Every line gets exactly
    /// one response line; a malformed line gets an error response and the loop
    /// carries on. A request without an `id` is answered with `id: null`.
    pub async fn run<T: McpTransport>(&self, transport: &mut T) -> Result<(), McpError> {
        tracing::info!(
            server = %self.identity.server_name,
            tools = self.registry.len(),
            "MCP server starting"
        );
        let mut session = Session::new();

        while let Some(line) = transport.receive().await? {
            tracing::debug!(message = %line, "Received message");

            let response = self.handle_message(&line, &mut session).await;

            let json = serde_json::to_string(&response)?;
            tracing::debug!(response = %json, "Sending response");
            transport.send(&json).await?;
        }

        tracing::info!("Transport closed, shutting down");
        Ok(())
    }

    /// Parse and handle one raw message. Always yields a response, which is
    /// what a request/response transport like HTTP needs.
    pub async fn handle_message(&self, raw: &str, session: &mut Session) -> JsonRpcResponse {
        match parse_message(raw) {
            Ok(request) => self.handle_request(&request, session).await,
            Err(response) => response,
        }
    }

    /// Handle a single JSON-RPC request and produce a response.
    pub async fn handle_request(
        &self,
        request: &JsonRpcRequest,
        session: &mut Session,
    ) -> JsonRpcResponse {
        let id = request.id.clone();
        let params = request.params.as_ref();

        let outcome = match request.method.as_str() {
            "initialize" => object_params(params).and_then(|p| self.handle_initialize(p, session)),
            "tools/list" => object_params(params).and_then(|_| self.handle_list_tools()),
            "tools/call" => match object_params(params) {
                Ok(p) => self.handle_call_tool(p).await,
                Err(e) => Err(e),
            },
            "notifications/initialized" => Ok(self.handle_initialized(session)),
            method => Err(McpError::MethodNotFound(method.to_string())),
        };

        match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                tracing::warn!(method = %request.method, error = %e, "Request failed");
                let err = e.to_rpc_error();
                JsonRpcResponse::error(id, err.code, err.message)
            }
        }
    }

    fn handle_initialize(&self, params: Value, session: &mut Session) -> Result<Value, McpError> {
        // An object of the wrong shape reads as empty params.
        let params: InitializeParams = serde_json::from_value(params).unwrap_or_default();

        let protocol_version = params
            .protocol_version
            .unwrap_or_else(|| self.identity.protocol_version.clone());
        let client_name = params.client_info.map(|c| c.name);

        tracing::info!(
            client = client_name.as_deref().unwrap_or("unknown"),
            protocol_version = %protocol_version,
            previous = ?session.state,
            "Handling initialize"
        );
        session.state = SessionState::Initialized;
        session.client_name = client_name;
        session.protocol_version = Some(protocol_version.clone());

        let result = InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: self.server_info(),
        };
        Ok(serde_json::to_value(result)?)
    }

    fn handle_initialized(&self, session: &mut Session) -> Value {
        if session.state == SessionState::Uninitialized {
            tracing::debug!("initialized notification before initialize");
        }
        tracing::info!("Client confirmed initialization");
        session.state = SessionState::Ready;
        json!({})
    }

    fn handle_list_tools(&self) -> Result<Value, McpError> {
        tracing::debug!("Handling tools/list");
        let result = ListToolsResult { tools: self.tools() };
        Ok(serde_json::to_value(result)?)
    }

    async fn handle_call_tool(&self, params: Value) -> Result<Value, McpError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::InvalidParams("missing tool name".to_string()))?;

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(args) if args.is_object() => args.clone(),
            Some(_) => {
                return Err(McpError::InvalidParams(
                    "arguments must be an object".to_string(),
                ))
            }
        };

        tracing::debug!(tool = %name, "Handling tools/call");
        let result = self.call_tool(name, arguments).await?;
        Ok(serde_json::to_value(result)?)
    }

    /// Invoke a tool and wrap its payload as a single JSON text block.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, McpError> {
        let payload = self.registry.invoke(name, arguments).await?;
        Ok(CallToolResult::from_payload(&payload)?)
    }
}

/// Absent or `null` params read as `{}`; anything else must be an object.
fn object_params(params: Option<&Value>) -> Result<Value, McpError> {
    match params {
        None | Some(Value::Null) => Ok(json!({})),
        Some(p) if p.is_object() => Ok(p.clone()),
        Some(_) => Err(McpError::InvalidParams("params must be an object".to_string())),
    }
}

/// Parse one raw message into a request, or into the error response to send
/// back. Invalid JSON answers with a `null` id; a JSON value that is not a
/// request echoes its `id` when one can be read.
pub fn parse_message(raw: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse JSON");
        let err = McpError::JsonParse(e).to_rpc_error();
        JsonRpcResponse::error(None, err.code, err.message)
    })?;

    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RpcId>(id.clone()).ok());

    serde_json::from_value::<JsonRpcRequest>(value).map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse JSON-RPC request");
        let err = McpError::InvalidRequest(e.to_string()).to_rpc_error();
        JsonRpcResponse::error(id, err.code, err.message)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ChannelTransport, LineTransport};
    use sqlmcp_storage::Database;
    use sqlmcp_tool_runtime::{sqlite_registry, SampleQueries};
    use tempfile::TempDir;

    fn fixture() -> (TempDir, McpServer) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.db");
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE t (a INTEGER);
             INSERT INTO t (a) VALUES (1), (2), (3);",
        )
        .unwrap();
        drop(conn);

        let registry = sqlite_registry(Database::new(&path), SampleQueries::builtin()).unwrap();
        (dir, McpServer::new(registry))
    }

    async fn call(server: &McpServer, raw: &str) -> Value {
        let response = server.handle_message(raw, &mut Session::new()).await;
        serde_json::to_value(response).unwrap()
    }

    fn tool_payload(response: &Value) -> Value {
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_echoes_client_version() {
        let (_dir, server) = fixture();
        let mut session = Session::new();
        let resp = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","clientInfo":{"name":"inspector"}}}"#,
                &mut session,
            )
            .await;

        let result: InitializeResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.protocol_version, "2025-03-26");
        assert_eq!(result.server_info.name, "sqlmcp");
        assert!(result.capabilities.tools.is_some());
        assert_eq!(session.state(), SessionState::Initialized);
        assert_eq!(session.client_name(), Some("inspector"));
        assert_eq!(session.protocol_version(), Some("2025-03-26"));
    }

    #[tokio::test]
    async fn test_initialize_defaults_version() {
        let (_dir, server) = fixture();
        let resp = call(&server, r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#).await;
        assert_eq!(resp["result"]["protocolVersion"], json!("2024-11-05"));
        assert_eq!(resp["result"]["capabilities"], json!({"tools": {"listChanged": false}}));
    }

    #[tokio::test]
    async fn test_initialize_uses_configured_identity() {
        let (_dir, server) = fixture();
        let server = server.with_identity(McpConfig {
            server_name: "incidents".to_string(),
            server_version: "9.9.9".to_string(),
            protocol_version: "2025-06-18".to_string(),
        });
        let resp = call(&server, r#"{"id":1,"method":"initialize","params":{}}"#).await;
        assert_eq!(resp["result"]["protocolVersion"], json!("2025-06-18"));
        assert_eq!(resp["result"]["serverInfo"], json!({"name": "incidents", "version": "9.9.9"}));
    }

    #[tokio::test]
    async fn test_list_tools_in_fixed_order() {
        let (_dir, server) = fixture();
        let first = call(&server, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        let second = call(
            &server,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list","params":{}}"#,
        )
        .await;

        let names: Vec<&str> = first["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["execute_sql", "get_schema", "get_sample_queries"]);
        assert_eq!(first, second);
        assert!(first["result"]["tools"][0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_call_execute_sql_end_to_end() {
        let (_dir, server) = fixture();
        let resp = call(
            &server,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"execute_sql","arguments":{"query":"SELECT COUNT(*) as c FROM t"}}}"#,
        )
        .await;

        assert_eq!(resp["id"], json!(3));
        assert!(resp.get("error").is_none());
        assert_eq!(resp["result"]["content"][0]["type"], json!("text"));
        assert_eq!(
            tool_payload(&resp),
            json!({"success": true, "data": [{"c": 3}], "row_count": 1})
        );
    }

    #[tokio::test]
    async fn test_sql_error_is_embedded_in_result() {
        let (_dir, server) = fixture();
        let resp = call(
            &server,
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"execute_sql","arguments":{"query":"SELEC 1"}}}"#,
        )
        .await;

        assert!(resp.get("error").is_none());
        let payload = tool_payload(&resp);
        assert!(payload["error"].as_str().unwrap().contains("syntax error"));
        assert!(payload.get("success").is_none());
    }

    #[tokio::test]
    async fn test_call_get_schema() {
        let (_dir, server) = fixture();
        let resp = call(
            &server,
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"get_schema"}}"#,
        )
        .await;
        let payload = tool_payload(&resp);
        assert_eq!(payload["schema"]["tables"], json!([{"name": "t"}]));
        assert_eq!(payload["schema"]["views"], json!([]));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_protocol_error() {
        let (_dir, server) = fixture();
        let resp = call(
            &server,
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"drop_everything","arguments":{}}}"#,
        )
        .await;
        assert!(resp.get("result").is_none());
        assert_eq!(resp["error"]["code"], json!(-32603));
        assert_eq!(resp["error"]["message"], json!("Unknown tool: drop_everything"));
        assert_eq!(resp["id"], json!(6));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let (_dir, server) = fixture();
        let resp = call(&server, r#"{"jsonrpc":"2.0","id":"x","method":"resources/list"}"#).await;
        assert_eq!(resp["error"]["code"], json!(-32603));
        assert_eq!(resp["error"]["message"], json!("Unknown method: resources/list"));
        assert_eq!(resp["id"], json!("x"));
    }

    #[tokio::test]
    async fn test_invalid_call_params() {
        let (_dir, server) = fixture();
        for raw in [
            r#"{"id":7,"method":"tools/call"}"#,
            r#"{"id":7,"method":"tools/call","params":{"arguments":{}}}"#,
            r#"{"id":7,"method":"tools/call","params":[1,2]}"#,
            r#"{"id":7,"method":"tools/call","params":{"name":"execute_sql","arguments":"SELECT 1"}}"#,
        ] {
            let resp = call(&server, raw).await;
            assert_eq!(resp["error"]["code"], json!(-32602), "{raw}");
            assert_eq!(resp["id"], json!(7));
        }
    }

    #[tokio::test]
    async fn test_parse_error_has_null_id() {
        let (_dir, server) = fixture();
        let resp = call(&server, "{not json").await;
        assert_eq!(resp["id"], Value::Null);
        assert_eq!(resp["error"]["code"], json!(-32700));
        assert_eq!(resp["jsonrpc"], json!("2.0"));
    }

    #[tokio::test]
    async fn test_envelope_without_method() {
        let (_dir, server) = fixture();
        let resp = call(&server, r#"{"jsonrpc":"2.0","id":8}"#).await;
        assert_eq!(resp["error"]["code"], json!(-32700));
        assert_eq!(resp["id"], json!(8));

        let resp = call(&server, "[1,2,3]").await;
        assert_eq!(resp["error"]["code"], json!(-32700));
        assert_eq!(resp["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_ids_echoed_verbatim() {
        let (_dir, server) = fixture();
        let resp = call(&server, r#"{"jsonrpc":"2.0","id":"abc-1","method":"tools/list"}"#).await;
        assert_eq!(resp["id"], json!("abc-1"));

        let resp = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":12.5,"method":"tools/list"}"#,
                &mut Session::new(),
            )
            .await;
        assert_eq!(serde_json::to_string(&resp.id).unwrap(), "12.5");

        let resp = call(&server, r#"{"jsonrpc":"2.0","method":"tools/list"}"#).await;
        assert_eq!(resp["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_initialized_notification_marks_ready() {
        let (_dir, server) = fixture();
        let mut session = Session::new();
        let resp = server
            .handle_message(
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                &mut session,
            )
            .await;
        assert_eq!(resp.result, Some(json!({})));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_non_object_params_rejected_for_every_method() {
        let (_dir, server) = fixture();
        for method in ["initialize", "tools/list", "tools/call"] {
            let raw = format!(r#"{{"id":9,"method":"{method}","params":"oops"}}"#);
            let resp = call(&server, &raw).await;
            assert_eq!(resp["error"]["code"], json!(-32602), "{method}");
        }
        let resp = call(&server, r#"{"id":9,"method":"tools/list","params":null}"#).await;
        assert!(resp.get("error").is_none());
    }

    #[tokio::test]
    async fn test_requests_served_before_initialize() {
        let (_dir, server) = fixture();
        let mut session = Session::new();
        let resp = server
            .handle_message(r#"{"id":1,"method":"tools/list"}"#, &mut session)
            .await;
        assert!(!resp.is_error());
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_tool_set_is_fixed_across_calls() {
        let (_dir, server) = fixture();
        let before = server.tools();
        call(
            &server,
            r#"{"id":1,"method":"tools/call","params":{"name":"execute_sql","arguments":{"query":"CREATE TABLE extra (x)"}}}"#,
        )
        .await;
        call(&server, r#"{"id":2,"method":"tools/call","params":{"name":"nope"}}"#).await;
        assert_eq!(server.tools(), before);
    }

    #[tokio::test]
    async fn test_run_over_lines() {
        let (_dir, server) = fixture();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            "garbage\n",
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"execute_sql","arguments":{"query":"SELECT COUNT(*) as c FROM t"}}}"#,
            "\n",
        );
        let mut transport = LineTransport::new(input.as_bytes(), Vec::new());
        server.run(&mut transport).await.unwrap();

        let (_, written) = transport.into_inner();
        let lines: Vec<Value> = String::from_utf8(written)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["id"], json!(1));
        assert_eq!(lines[1]["id"], Value::Null);
        assert_eq!(lines[1]["result"], json!({}));
        assert_eq!(lines[2]["id"], Value::Null);
        assert_eq!(lines[2]["error"]["code"], json!(-32700));
        assert_eq!(lines[3]["id"], json!(2));
        assert_eq!(tool_payload(&lines[3])["data"], json!([{"c": 3}]));
    }

    #[tokio::test]
    async fn test_run_answers_null_and_missing_ids() {
        let (_dir, server) = fixture();
        let input = concat!(
            r#"{"id":null,"method":"tools/list"}"#,
            "\n",
            r#"{"method":"tools/call","params":{"name":"execute_sql","arguments":{"query":"SELECT COUNT(*) AS c FROM t"}}}"#,
            "\n",
            r#"{"id":null,"method":"bogus"}"#,
            "\n",
            r#"{"method":"notifications/initialized"}"#,
            "\n",
        );
        let mut transport = LineTransport::new(input.as_bytes(), Vec::new());
        server.run(&mut transport).await.unwrap();

        let (_, written) = transport.into_inner();
        let lines: Vec<Value> = String::from_utf8(written)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 4);
        for line in &lines {
            assert_eq!(line["id"], Value::Null);
        }
        assert_eq!(lines[0]["result"]["tools"].as_array().unwrap().len(), 3);
        assert_eq!(tool_payload(&lines[1])["data"], json!([{"c": 3}]));
        assert_eq!(lines[2]["error"]["code"], json!(-32603));
        assert_eq!(lines[2]["error"]["message"], json!("Unknown method: bogus"));
        assert_eq!(lines[3]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_server_run_with_channel_transport() {
        let (_dir, server) = fixture();
        let (mut client_side, mut server_side) = ChannelTransport::pair();

        let server_handle = tokio::spawn(async move { server.run(&mut server_side).await });

        let init_req = JsonRpcRequest::new(1i64, "initialize", Some(json!({"capabilities": {}})));
        client_side
            .send(&serde_json::to_string(&init_req).unwrap())
            .await
            .unwrap();
        let resp: JsonRpcResponse =
            serde_json::from_str(&client_side.receive().await.unwrap().unwrap()).unwrap();
        assert!(!resp.is_error());

        let notif = JsonRpcRequest::notification("notifications/initialized", None);
        client_side
            .send(&serde_json::to_string(&notif).unwrap())
            .await
            .unwrap();
        let resp: JsonRpcResponse =
            serde_json::from_str(&client_side.receive().await.unwrap().unwrap()).unwrap();
        assert_eq!(resp.id, None);
        assert_eq!(resp.result, Some(json!({})));

        let call_req = JsonRpcRequest::new(
            "two",
            "tools/call",
            Some(json!({
                "name": "execute_sql",
                "arguments": {"query": "SELECT a FROM t ORDER BY a"},
            })),
        );
        client_side
            .send(&serde_json::to_string(&call_req).unwrap())
            .await
            .unwrap();

        let resp: JsonRpcResponse =
            serde_json::from_str(&client_side.receive().await.unwrap().unwrap()).unwrap();
        assert_eq!(resp.id, Some(RpcId::from("two")));
        let result: CallToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.payload().unwrap()["row_count"], json!(3));

        drop(client_side);
        server_handle.await.unwrap().unwrap();
    }
}
