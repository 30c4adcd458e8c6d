//! Request handling: decode, validate, render, run, respond.
//!
//! Every path ends in exactly one [`ExecutorResponse`]; the process exit
//! code never carries status.

use appbridge_protocol::ExecMode;
use appbridge_protocol::ExecutorRequest;
use appbridge_protocol::ExecutorResponse;
use serde_json::Map;
use serde_json::Value;
use tracing::info;

use crate::ExecutorError;
use crate::engine::ScriptRunner;
use crate::json_escape;
use crate::targeting;
use crate::templates;

/// Request id used when the request itself could not be decoded.
const UNKNOWN_REQUEST_ID: &str = "unknown";

pub async fn process(input: &[u8], runner: &dyn ScriptRunner) -> ExecutorResponse {
    let request = match decode_request(input) {
        Ok(request) => request,
        Err(err) => {
            return ExecutorResponse::failure(UNKNOWN_REQUEST_ID, err.into_payload());
        }
    };
    let request_id = request.request_id.clone();
    info!(
        request_id = %request_id,
        bundle_id = %request.bundle_id,
        mode = ?request.mode,
        dry_run = request.dry_run,
        "received request"
    );

    match handle_request(&request, runner).await {
        Ok(result) => {
            info!(request_id = %request_id, "request completed");
            ExecutorResponse::success(request_id, result, "", "")
        }
        Err(err) => {
            info!(request_id = %request_id, code = %err.code(), "request failed");
            ExecutorResponse::failure(request_id, err.into_payload())
        }
    }
}

fn decode_request(input: &[u8]) -> Result<ExecutorRequest, ExecutorError> {
    if input.is_empty() {
        return Err(ExecutorError::InvalidRequest(
            "Empty stdin: no request data received".to_string(),
        ));
    }
    serde_json::from_slice(input).map_err(|err| {
        ExecutorError::InvalidRequest(format!("Failed to parse request JSON: {err}"))
    })
}

async fn handle_request(
    request: &ExecutorRequest,
    runner: &dyn ScriptRunner,
) -> Result<Map<String, Value>, ExecutorError> {
    if !targeting::validate_bundle_id(&request.bundle_id) {
        return Err(ExecutorError::InvalidRequest(format!(
            "Invalid bundle ID format: {}",
            request.bundle_id
        )));
    }

    let script = match request.mode {
        ExecMode::Template => {
            let template_id = request.template_id.as_deref().ok_or_else(|| {
                ExecutorError::InvalidRequest("Template mode requires 'templateId'".to_string())
            })?;
            let rendered =
                templates::build_script(template_id, &request.bundle_id, &request.parameters)?;
            json_escape::wrap_script(&rendered)
        }
        ExecMode::Raw => request
            .script
            .clone()
            .ok_or_else(|| {
                ExecutorError::InvalidRequest("Raw mode requires 'script'".to_string())
            })?,
    };

    if request.dry_run {
        let mut result = Map::new();
        result.insert("script".to_string(), Value::String(script));
        result.insert("dryRun".to_string(), Value::Bool(true));
        return Ok(result);
    }

    let output = runner.run(&script).await?;

    let mut result = Map::new();
    result.insert(
        "value".to_string(),
        Value::String(output.stdout.trim_end().to_string()),
    );
    Ok(json_escape::reserialize(result))
}
