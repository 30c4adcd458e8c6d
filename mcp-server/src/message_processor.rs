use std::sync::Arc;

use appbridge_core::dispatch::DispatchOutcome;
use appbridge_core::dispatch::Dispatcher;
use appbridge_mcp_types::CallToolRequestParams;
use appbridge_mcp_types::CallToolResult;
use appbridge_mcp_types::ContentBlock;
use appbridge_mcp_types::Implementation;
use appbridge_mcp_types::InitializeRequestParams;
use appbridge_mcp_types::InitializeResult;
use appbridge_mcp_types::JSONRPCError;
use appbridge_mcp_types::JSONRPCErrorError;
use appbridge_mcp_types::JSONRPCNotification;
use appbridge_mcp_types::JSONRPCRequest;
use appbridge_mcp_types::JSONRPCResponse;
use appbridge_mcp_types::ListToolsResult;
use appbridge_mcp_types::MCP_PROTOCOL_VERSION;
use appbridge_mcp_types::RequestId;
use appbridge_mcp_types::ServerCapabilities;
use appbridge_mcp_types::ServerCapabilitiesTools;
use appbridge_mcp_types::INTERNAL_ERROR_CODE;
use appbridge_mcp_types::INVALID_REQUEST_ERROR_CODE;
use appbridge_mcp_types::METHOD_NOT_FOUND_ERROR_CODE;
use appbridge_mcp_types::methods;
use serde_json::json;
use tracing::debug;
use tracing::warn;

use crate::elicitation::ElicitationChannel;
use crate::outgoing_message::OutgoingMessageSender;
use crate::tool_catalog;

pub(crate) struct MessageProcessor {
    outgoing: Arc<OutgoingMessageSender>,
    dispatcher: Arc<Dispatcher>,
    initialized: bool,
}

impl MessageProcessor {
    pub(crate) fn new(outgoing: OutgoingMessageSender, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            outgoing: Arc::new(outgoing),
            dispatcher,
            initialized: false,
        }
    }

    pub(crate) async fn process_request(&mut self, request: JSONRPCRequest) {
        let JSONRPCRequest {
            id, method, params, ..
        } = request;

        match method.as_str() {
            methods::INITIALIZE => self.handle_initialize(id, params),
            methods::PING => self.outgoing.send_response(id, json!({})),
            methods::TOOLS_LIST => self.handle_list_tools(id),
            methods::TOOLS_CALL => self.handle_call_tool(id, params),
            other => {
                debug!("unsupported method: {other}");
                self.outgoing.send_error(
                    id,
                    JSONRPCErrorError {
                        code: METHOD_NOT_FOUND_ERROR_CODE,
                        message: format!("method not found: {other}"),
                        data: None,
                    },
                );
            }
        }
    }

    /// A standalone response from the peer answers one of our own requests
    /// (elicitation).
    pub(crate) async fn process_response(&mut self, response: JSONRPCResponse) {
        let JSONRPCResponse { id, result, .. } = response;
        self.outgoing.notify_client_response(id, result).await;
    }

    pub(crate) fn process_notification(&mut self, notification: JSONRPCNotification) {
        debug!("<- notification: {}", notification.method);
    }

    pub(crate) fn process_error(&mut self, err: JSONRPCError) {
        warn!("<- error: {:?}", err.error);
    }

    fn handle_initialize(&mut self, id: RequestId, params: Option<serde_json::Value>) {
        if self.initialized {
            self.outgoing.send_error(
                id,
                JSONRPCErrorError {
                    code: INVALID_REQUEST_ERROR_CODE,
                    message: "initialize called more than once".to_string(),
                    data: None,
                },
            );
            return;
        }
        self.initialized = true;

        let protocol_version = params
            .and_then(|params| {
                serde_json::from_value::<InitializeRequestParams>(params)
                    .ok()
                    .map(|params| params.protocol_version)
            })
            .unwrap_or_else(|| MCP_PROTOCOL_VERSION.to_string());

        let result = InitializeResult {
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools {
                    list_changed: Some(true),
                }),
            },
            instructions: None,
            protocol_version,
            server_info: Implementation {
                name: "appbridge-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("appbridge".to_string()),
            },
        };
        match serde_json::to_value(result) {
            Ok(result) => self.outgoing.send_response(id, result),
            Err(e) => self.send_internal_error(id, format!("failed to serialize result: {e}")),
        }
    }

    /// Only tools enabled for the current mode are advertised.
    fn handle_list_tools(&self, id: RequestId) {
        let enabled = self.dispatcher.mode_manager().enabled_tools();
        let result = ListToolsResult {
            tools: tool_catalog::tools_for(&enabled),
        };
        match serde_json::to_value(result) {
            Ok(result) => self.outgoing.send_response(id, result),
            Err(e) => self.send_internal_error(id, format!("failed to serialize result: {e}")),
        }
    }

    /// Each call runs on its own task so a slow executor does not block the
    /// message loop (or the elicitation round trip it may depend on).
    fn handle_call_tool(&self, id: RequestId, params: Option<serde_json::Value>) {
        let params = match params
            .ok_or_else(|| "tools/call requires params".to_string())
            .and_then(|params| {
                serde_json::from_value::<CallToolRequestParams>(params)
                    .map_err(|e| format!("invalid tools/call params: {e}"))
            }) {
            Ok(params) => params,
            Err(message) => {
                self.outgoing.send_error(
                    id,
                    JSONRPCErrorError {
                        code: INVALID_REQUEST_ERROR_CODE,
                        message,
                        data: None,
                    },
                );
                return;
            }
        };

        let outgoing = self.outgoing.clone();
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            let channel = ElicitationChannel::new(outgoing.clone());
            let outcome = dispatcher
                .handle(&params.name, params.arguments, &channel)
                .await;
            let result = call_tool_result(outcome);
            match serde_json::to_value(result) {
                Ok(result) => outgoing.send_response(id, result),
                Err(e) => outgoing.send_error(
                    id,
                    JSONRPCErrorError {
                        code: INTERNAL_ERROR_CODE,
                        message: format!("failed to serialize result: {e}"),
                        data: None,
                    },
                ),
            }
        });
    }

    fn send_internal_error(&self, id: RequestId, message: String) {
        self.outgoing.send_error(
            id,
            JSONRPCErrorError {
                code: INTERNAL_ERROR_CODE,
                message,
                data: None,
            },
        );
    }
}

/// Shape a dispatch outcome for the caller. A pending confirmation is a
/// successful result carrying an actionable token, distinguishable from both
/// success-with-result and hard failure.
fn call_tool_result(outcome: DispatchOutcome) -> CallToolResult {
    match outcome {
        DispatchOutcome::Completed(value) => CallToolResult {
            content: vec![ContentBlock::text(value.to_string())],
            is_error: None,
            structured_content: Some(value),
        },
        DispatchOutcome::ConfirmationRequired { token, message } => CallToolResult {
            content: vec![ContentBlock::text(message)],
            is_error: None,
            structured_content: Some(json!({
                "confirmationRequired": true,
                "confirmationToken": token,
            })),
        },
        DispatchOutcome::Failed(error) => CallToolResult {
            content: vec![ContentBlock::text(error.to_value().to_string())],
            is_error: Some(true),
            structured_content: Some(error.to_value()),
        },
    }
}
