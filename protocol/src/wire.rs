use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::ErrorPayload;

/// How the executor should interpret the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecMode {
    /// Render a registered template by id, then run it.
    Template,
    /// Run the caller-supplied script verbatim.
    Raw,
}

/// One JSON document written to the executor's stdin. Constructed per call,
/// serialized once, discarded after the matching response arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorRequest {
    pub request_id: String,
    pub bundle_id: String,
    pub mode: ExecMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    pub parameters: Map<String, Value>,
    pub timeout_ms: u64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
}

/// One JSON document read from the executor's stdout, discriminated by the
/// `ok` flag. The variants are distinguished structurally on decode; the
/// constructors pin `ok` so a hand-built value cannot disagree with its
/// variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecutorResponse {
    Success {
        #[serde(rename = "requestId")]
        request_id: String,
        ok: bool,
        result: Map<String, Value>,
        #[serde(default)]
        stdout: String,
        #[serde(default)]
        stderr: String,
    },
    Failure {
        #[serde(rename = "requestId")]
        request_id: String,
        ok: bool,
        error: ErrorPayload,
    },
}

impl ExecutorResponse {
    pub fn success(
        request_id: impl Into<String>,
        result: Map<String, Value>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        ExecutorResponse::Success {
            request_id: request_id.into(),
            ok: true,
            result,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn failure(request_id: impl Into<String>, error: ErrorPayload) -> Self {
        ExecutorResponse::Failure {
            request_id: request_id.into(),
            ok: false,
            error,
        }
    }

    pub fn request_id(&self) -> &str {
        match self {
            ExecutorResponse::Success { request_id, .. } => request_id,
            ExecutorResponse::Failure { request_id, .. } => request_id,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ExecutorResponse::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn request_serializes_to_camel_case_wire_format() {
        let mut parameters = Map::new();
        parameters.insert("title".to_string(), json!("Groceries"));
        parameters.insert("body".to_string(), json!("milk\neggs"));
        let request = ExecutorRequest {
            request_id: "req-1".to_string(),
            bundle_id: "com.apple.Notes".to_string(),
            mode: ExecMode::Template,
            template_id: Some("notes.create_note".to_string()),
            script: None,
            parameters,
            timeout_ms: 12_000,
            dry_run: false,
        };
        let got = match serde_json::to_value(&request) {
            Ok(v) => v,
            Err(e) => panic!("failed to serialize request: {e}"),
        };
        let expected = json!({
            "requestId": "req-1",
            "bundleId": "com.apple.Notes",
            "mode": "template",
            "templateId": "notes.create_note",
            "parameters": { "title": "Groceries", "body": "milk\neggs" },
            "timeoutMs": 12000
        });
        assert_eq!(got, expected);
    }

    #[test]
    fn raw_request_round_trips_with_dry_run() {
        let request = ExecutorRequest {
            request_id: "req-2".to_string(),
            bundle_id: "com.apple.systemevents".to_string(),
            mode: ExecMode::Raw,
            template_id: None,
            script: Some("return 1".to_string()),
            parameters: Map::new(),
            timeout_ms: 5000,
            dry_run: true,
        };
        let json = match serde_json::to_string(&request) {
            Ok(s) => s,
            Err(e) => panic!("failed to serialize request: {e}"),
        };
        assert!(json.contains("\"dryRun\":true"));
        let back: ExecutorRequest = match serde_json::from_str(&json) {
            Ok(r) => r,
            Err(e) => panic!("failed to deserialize request: {e}"),
        };
        assert_eq!(back, request);
    }

    #[test]
    fn success_response_decodes_from_wire_json() {
        let wire = json!({
            "requestId": "req-3",
            "ok": true,
            "result": { "value": "done", "count": 2 },
            "stdout": "",
            "stderr": ""
        });
        let response: ExecutorResponse = match serde_json::from_value(wire) {
            Ok(r) => r,
            Err(e) => panic!("failed to deserialize response: {e}"),
        };
        assert!(response.is_ok());
        assert_eq!(response.request_id(), "req-3");
        match response {
            ExecutorResponse::Success { result, .. } => {
                assert_eq!(result.get("count"), Some(&json!(2)));
            }
            ExecutorResponse::Failure { .. } => panic!("expected success variant"),
        }
    }

    #[test]
    fn success_response_tolerates_missing_stream_fields() {
        let wire = json!({
            "requestId": "req-3b",
            "ok": true,
            "result": { "x": 1 }
        });
        let response: ExecutorResponse = match serde_json::from_value(wire) {
            Ok(r) => r,
            Err(e) => panic!("failed to deserialize response: {e}"),
        };
        match response {
            ExecutorResponse::Success { result, stdout, .. } => {
                assert_eq!(result.get("x"), Some(&json!(1)));
                assert_eq!(stdout, "");
            }
            ExecutorResponse::Failure { .. } => panic!("expected success variant"),
        }
    }

    #[test]
    fn failure_response_decodes_from_wire_json() {
        let wire = json!({
            "requestId": "req-4",
            "ok": false,
            "error": {
                "code": "SCRIPT_ERROR",
                "message": "syntax error",
                "details": { "errorNumber": "-2741" }
            }
        });
        let response: ExecutorResponse = match serde_json::from_value(wire) {
            Ok(r) => r,
            Err(e) => panic!("failed to deserialize response: {e}"),
        };
        assert!(!response.is_ok());
        match response {
            ExecutorResponse::Failure { error, .. } => {
                assert_eq!(error.code, ErrorCode::ScriptError);
            }
            ExecutorResponse::Success { .. } => panic!("expected failure variant"),
        }
    }

    #[test]
    fn constructors_pin_the_ok_flag() {
        let success = ExecutorResponse::success("r", Map::new(), "", "");
        let got = match serde_json::to_value(&success) {
            Ok(v) => v,
            Err(e) => panic!("failed to serialize response: {e}"),
        };
        assert_eq!(got["ok"], json!(true));

        let failure = ExecutorResponse::failure(
            "r",
            ErrorPayload::new(ErrorCode::Timeout, "timed out"),
        );
        let got = match serde_json::to_value(&failure) {
            Ok(v) => v,
            Err(e) => panic!("failed to serialize response: {e}"),
        };
        assert_eq!(got["ok"], json!(false));
    }
}
