use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use std::collections::BTreeMap;

/// Stable failure kinds used uniformly on both sides of the executor
/// transport. These are identifiers for API consumers and test assertions,
/// not localized text.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The host denied the privileged automation action.
    AutomationDenied,
    AppNotRunning,
    /// The generated script itself failed.
    ScriptError,
    Timeout,
    /// Malformed or missing request fields.
    InvalidRequest,
    /// The executor process could not be spawned or produced unparseable
    /// output.
    ExecutorFailed,
    PolicyDenied,
    ConfigError,
    UnknownError,
}

/// A failure propagated as data across the transport boundary, never as an
/// uncaught fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, Value>>,
}

impl ErrorPayload {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach one detail entry, creating the map on first use.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

impl From<serde_json::Error> for ErrorPayload {
    fn from(err: serde_json::Error) -> Self {
        ErrorPayload::new(ErrorCode::InvalidRequest, err.to_string())
    }
}

impl ErrorPayload {
    /// The JSON object form used inside executor responses and tool results.
    pub fn to_value(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(v) => v,
            Err(_) => json!({
                "code": "UNKNOWN_ERROR",
                "message": "failed to serialize error payload",
            }),
        }
    }
}
