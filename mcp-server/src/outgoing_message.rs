//! Outgoing half of the stdio transport: responses, errors, notifications,
//! and server-initiated requests whose replies are routed back through
//! oneshot callbacks.

use std::collections::HashMap;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use appbridge_mcp_types::JSONRPC_VERSION;
use appbridge_mcp_types::JSONRPCError;
use appbridge_mcp_types::JSONRPCErrorError;
use appbridge_mcp_types::JSONRPCMessage;
use appbridge_mcp_types::JSONRPCNotification;
use appbridge_mcp_types::JSONRPCRequest;
use appbridge_mcp_types::JSONRPCResponse;
use appbridge_mcp_types::RequestId;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tracing::warn;

#[derive(Debug)]
pub(crate) enum OutgoingMessage {
    Request {
        id: RequestId,
        method: String,
        params: Option<Value>,
    },
    Response {
        id: RequestId,
        result: Value,
    },
    Error {
        id: RequestId,
        error: JSONRPCErrorError,
    },
    Notification {
        method: String,
        params: Option<Value>,
    },
}

impl From<OutgoingMessage> for JSONRPCMessage {
    fn from(message: OutgoingMessage) -> Self {
        match message {
            OutgoingMessage::Request { id, method, params } => {
                JSONRPCMessage::Request(JSONRPCRequest {
                    jsonrpc: JSONRPC_VERSION.to_string(),
                    id,
                    method,
                    params,
                })
            }
            OutgoingMessage::Response { id, result } => {
                JSONRPCMessage::Response(JSONRPCResponse {
                    jsonrpc: JSONRPC_VERSION.to_string(),
                    id,
                    result,
                })
            }
            OutgoingMessage::Error { id, error } => JSONRPCMessage::Error(JSONRPCError {
                jsonrpc: JSONRPC_VERSION.to_string(),
                id,
                error,
            }),
            OutgoingMessage::Notification { method, params } => {
                JSONRPCMessage::Notification(JSONRPCNotification {
                    jsonrpc: JSONRPC_VERSION.to_string(),
                    method,
                    params,
                })
            }
        }
    }
}

pub(crate) struct OutgoingMessageSender {
    next_request_id: AtomicI64,
    sender: mpsc::UnboundedSender<OutgoingMessage>,
    request_id_to_callback: Mutex<HashMap<RequestId, oneshot::Sender<Value>>>,
}

impl OutgoingMessageSender {
    pub(crate) fn new(sender: mpsc::UnboundedSender<OutgoingMessage>) -> Self {
        Self {
            next_request_id: AtomicI64::new(0),
            sender,
            request_id_to_callback: Mutex::new(HashMap::new()),
        }
    }

    /// Send a server-initiated request; the returned receiver resolves when
    /// the client answers.
    pub(crate) async fn send_request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> (RequestId, oneshot::Receiver<Value>) {
        let id = RequestId::Integer(self.next_request_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        {
            let mut callbacks = self.request_id_to_callback.lock().await;
            callbacks.insert(id.clone(), tx);
        }
        let _ = self.sender.send(OutgoingMessage::Request {
            id: id.clone(),
            method: method.to_string(),
            params,
        });
        (id, rx)
    }

    pub(crate) async fn notify_client_response(&self, id: RequestId, result: Value) {
        let entry = {
            let mut callbacks = self.request_id_to_callback.lock().await;
            callbacks.remove(&id)
        };
        match entry {
            Some(tx) => {
                let _ = tx.send(result);
            }
            None => warn!("no callback registered for client response with id {id:?}"),
        }
    }

    /// Drop the callback for an abandoned request (e.g. elicitation timeout).
    pub(crate) async fn abandon_request(&self, id: &RequestId) {
        let mut callbacks = self.request_id_to_callback.lock().await;
        callbacks.remove(id);
    }

    pub(crate) fn send_response(&self, id: RequestId, result: Value) {
        let _ = self.sender.send(OutgoingMessage::Response { id, result });
    }

    pub(crate) fn send_error(&self, id: RequestId, error: JSONRPCErrorError) {
        let _ = self.sender.send(OutgoingMessage::Error { id, error });
    }
}
