//! MCP Server Core
//!
//! Routes JSON-RPC methods to the scheduling tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use cadence_core::AdaptiveDispatcher;

use crate::protocol::messages::{
    CallToolRequest, CallToolResult, InitializeRequest, InitializeResult, ListToolsResult,
    ServerCapabilities, ServerInfo, ToolDescription,
};
use crate::protocol::types::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_VERSION, SUPPORTED_VERSIONS,
};
use crate::tools;

const INSTRUCTIONS: &str = "Cadence schedules spaced-repetition reviews. Call schedule_review after \
every answer with the item's current state and the learner's feedback (forgot, hard, good, easy); \
store the returned state and show the item again at nextReviewDate. Attach a learner profile and \
competencies in context to get contextual intervals and study recommendations.";

/// MCP server over one adaptive dispatcher
pub struct McpServer {
    dispatcher: Arc<AdaptiveDispatcher>,
    initialized: bool,
}

impl McpServer {
    pub fn new(dispatcher: Arc<AdaptiveDispatcher>) -> Self {
        Self {
            dispatcher,
            initialized: false,
        }
    }

    /// Handle an incoming JSON-RPC message; notifications yield `None`
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("Handling request: {}", request.method);

        if !self.initialized
            && request.method != "initialize"
            && request.method != "notifications/initialized"
        {
            warn!("Rejecting request '{}': server not initialized", request.method);
            return Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::server_not_initialized(),
            ));
        }

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params),
            "notifications/initialized" => return None,
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(request.params).await,
            "ping" => Ok(serde_json::json!({})),
            method if request.is_notification() => {
                debug!("Ignoring notification: {}", method);
                return None;
            }
            method => {
                warn!("Unknown method: {}", method);
                Err(JsonRpcError::method_not_found(method))
            }
        };

        Some(match result {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(error) => JsonRpcResponse::error(request.id, error),
        })
    }

    fn handle_initialize(&mut self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let request: InitializeRequest = match params {
            Some(p) => serde_json::from_value(p)
                .map_err(|e| JsonRpcError::invalid_params(&e.to_string()))?,
            None => InitializeRequest::default(),
        };

        let negotiated_version = if SUPPORTED_VERSIONS.contains(&request.protocol_version.as_str()) {
            request.protocol_version.clone()
        } else {
            MCP_VERSION.to_string()
        };

        self.initialized = true;
        info!(
            client = request.client_info.as_ref().map(|c| c.name.as_str()).unwrap_or("unknown"),
            "MCP session initialized with protocol version {}",
            negotiated_version
        );

        let mut tools = HashMap::new();
        tools.insert("listChanged".to_string(), serde_json::json!(false));

        let result = InitializeResult {
            protocol_version: negotiated_version,
            server_info: ServerInfo {
                name: "cadence".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: ServerCapabilities { tools: Some(tools) },
            instructions: Some(INSTRUCTIONS.to_string()),
        };

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(&e.to_string()))
    }

    fn handle_tools_list(&self) -> Result<Value, JsonRpcError> {
        let tool = |name: &str, description: &str, input_schema: Value| ToolDescription {
            name: name.to_string(),
            description: Some(description.to_string()),
            input_schema,
        };

        let tools = vec![
            tool(
                "schedule_review",
                "Schedule the next review of an item after the learner answered. Uses contextual \
                 scheduling when a learner profile with competencies and prior reviews is present, \
                 plain SM-2 otherwise.",
                tools::schedule::schema(),
            ),
            tool(
                "create_item",
                "Create the initial practice state for a new item.",
                tools::schedule::create_schema(),
            ),
            tool(
                "due_items",
                "List the items of a deck that are due, most overdue and hardest first.",
                tools::deck::due_schema(),
            ),
            tool(
                "forecast",
                "Count how many items fall due on each of the coming days.",
                tools::deck::forecast_schema(),
            ),
            tool(
                "streak",
                "Number of consecutive days with at least one review.",
                tools::deck::streak_schema(),
            ),
            tool(
                "estimate_retention",
                "Estimate the probability the learner still remembers an item.",
                tools::deck::retention_schema(),
            ),
            tool(
                "dispatcher_stats",
                "Contextual vs base usage counters and telemetry status.",
                tools::engine::stats_schema(),
            ),
            tool(
                "set_contextual",
                "Enable or disable contextual scheduling at runtime.",
                tools::engine::toggle_schema(),
            ),
            tool(
                "flush_telemetry",
                "Write buffered training records out immediately.",
                tools::engine::flush_schema(),
            ),
        ];

        serde_json::to_value(ListToolsResult { tools })
            .map_err(|e| JsonRpcError::internal_error(&e.to_string()))
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let request: CallToolRequest = match params {
            Some(p) => serde_json::from_value(p)
                .map_err(|e| JsonRpcError::invalid_params(&e.to_string()))?,
            None => return Err(JsonRpcError::invalid_params("Missing tool call parameters")),
        };

        let dispatcher = self.dispatcher.as_ref();
        let args = request.arguments;
        let result = match request.name.as_str() {
            "schedule_review" => tools::schedule::execute(dispatcher, args).await,
            "create_item" => tools::schedule::execute_create(dispatcher, args).await,
            "due_items" => tools::deck::execute_due(dispatcher, args).await,
            "forecast" => tools::deck::execute_forecast(dispatcher, args).await,
            "streak" => tools::deck::execute_streak(dispatcher, args).await,
            "estimate_retention" => tools::deck::execute_retention(dispatcher, args).await,
            "dispatcher_stats" => tools::engine::execute_stats(dispatcher).await,
            "set_contextual" => tools::engine::execute_toggle(dispatcher, args).await,
            "flush_telemetry" => tools::engine::execute_flush(dispatcher).await,
            name => {
                return Err(JsonRpcError::method_not_found(&format!("tool '{}'", name)));
            }
        };

        let call_result = match result {
            Ok(content) => CallToolResult::success(
                serde_json::to_string_pretty(&content).unwrap_or_else(|_| content.to_string()),
            ),
            Err(e) => {
                debug!(tool = %request.name, error = %e, "Tool call failed");
                CallToolResult::failure(serde_json::json!({ "error": e }).to_string())
            }
        };

        serde_json::to_value(call_result).map_err(|e| JsonRpcError::internal_error(&e.to_string()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
