//! Interactive confirmation over MCP elicitation.
//!
//! The server asks the client to show a confirmation dialog. The wait is
//! bounded and every failure mode (no support, malformed answer, timeout)
//! collapses to `Unavailable`, which the confirmation manager turns into a
//! token round trip.

use std::sync::Arc;
use std::time::Duration;

use appbridge_core::confirmation::ChannelOutcome;
use appbridge_core::confirmation::ConfirmationChannel;
use appbridge_mcp_types::ElicitAction;
use appbridge_mcp_types::ElicitRequestParams;
use appbridge_mcp_types::ElicitResult;
use appbridge_mcp_types::methods;
use serde_json::json;
use tracing::debug;

use crate::outgoing_message::OutgoingMessageSender;

const ELICITATION_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) struct ElicitationChannel {
    outgoing: Arc<OutgoingMessageSender>,
}

impl ElicitationChannel {
    pub(crate) fn new(outgoing: Arc<OutgoingMessageSender>) -> Self {
        Self { outgoing }
    }
}

#[async_trait::async_trait]
impl ConfirmationChannel for ElicitationChannel {
    async fn request(&self, action: &str, details: &str) -> ChannelOutcome {
        let params = ElicitRequestParams {
            message: format!("Destructive action: {action}\n\n{details}\n\nDo you want to proceed?"),
            requested_schema: json!({
                "type": "object",
                "properties": {
                    "confirm": {
                        "type": "boolean",
                        "title": "Confirm this action",
                        "description": details,
                    }
                }
            }),
        };
        let params = match serde_json::to_value(&params) {
            Ok(params) => params,
            Err(_) => return ChannelOutcome::Unavailable,
        };

        let (request_id, receiver) = self
            .outgoing
            .send_request(methods::ELICITATION_CREATE, Some(params))
            .await;

        let answer = match tokio::time::timeout(ELICITATION_TIMEOUT, receiver).await {
            Ok(Ok(value)) => value,
            Ok(Err(_)) => {
                debug!("elicitation callback dropped; falling back to token");
                return ChannelOutcome::Unavailable;
            }
            Err(_) => {
                debug!("elicitation timed out; falling back to token");
                self.outgoing.abandon_request(&request_id).await;
                return ChannelOutcome::Unavailable;
            }
        };

        match serde_json::from_value::<ElicitResult>(answer) {
            Ok(result) => match result.action {
                ElicitAction::Accept
                    if result
                        .content
                        .as_ref()
                        .and_then(|content| content.get("confirm"))
                        .and_then(serde_json::Value::as_bool)
                        == Some(true) =>
                {
                    ChannelOutcome::Approved
                }
                // Accepted without confirming, declined, or cancelled.
                _ => ChannelOutcome::Declined,
            },
            Err(err) => {
                debug!("unparseable elicitation response: {err}");
                ChannelOutcome::Unavailable
            }
        }
    }
}
