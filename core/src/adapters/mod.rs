//! The adapter contract: each supported application implements
//! [`ResourceAdapter`], mapping generic CRUD-shaped operations to an
//! app-specific `(templateId, parameters)` pair the executor can render.
//! Adapters are pure, stateless string builders; apps supporting only a
//! subset of operations surface the rest as unsupported.

mod calendar;
mod mail;
mod notes;
mod registry;

pub use calendar::CalendarAdapter;
pub use mail::MailAdapter;
pub use notes::NotesAdapter;
pub use registry::AdapterRegistry;

use appbridge_protocol::ErrorCode;
use appbridge_protocol::ErrorPayload;
use serde_json::Map;
use serde_json::Value;

/// What the executor needs to render one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCall {
    pub template_id: String,
    pub parameters: Map<String, Value>,
}

impl RenderedCall {
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            parameters: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    #[error("{app} does not support the \"{operation}\" operation")]
    Unsupported { app: String, operation: String },

    #[error("{0}")]
    InvalidParams(String),
}

impl AdapterError {
    pub fn unsupported(app: &str, operation: &str) -> Self {
        AdapterError::Unsupported {
            app: app.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn into_payload(self) -> ErrorPayload {
        ErrorPayload::new(ErrorCode::InvalidRequest, self.to_string())
    }
}

pub type AdapterResult = Result<RenderedCall, AdapterError>;

/// Identifies an app and its adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    /// Short name used for registry lookup (e.g. "notes").
    pub name: &'static str,
    /// Display name (e.g. "Apple Notes").
    pub display_name: &'static str,
    pub bundle_id: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub container_id: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub container_id: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateParams {
    pub container_id: Option<String>,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct UpdateParams {
    pub id: String,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct ActionParams {
    pub action: String,
    pub parameters: Map<String, Value>,
}

/// Every operation defaults to unsupported; adapters override what their app
/// can actually do.
pub trait ResourceAdapter: Send + Sync {
    fn info(&self) -> &AppInfo;

    fn list_containers(&self) -> AdapterResult {
        Err(AdapterError::unsupported(self.info().name, "list_containers"))
    }

    fn list(&self, _params: ListParams) -> AdapterResult {
        Err(AdapterError::unsupported(self.info().name, "list"))
    }

    fn get(&self, _id: &str) -> AdapterResult {
        Err(AdapterError::unsupported(self.info().name, "get"))
    }

    fn search(&self, _params: SearchParams) -> AdapterResult {
        Err(AdapterError::unsupported(self.info().name, "search"))
    }

    fn create(&self, _params: CreateParams) -> AdapterResult {
        Err(AdapterError::unsupported(self.info().name, "create"))
    }

    fn update(&self, _params: UpdateParams) -> AdapterResult {
        Err(AdapterError::unsupported(self.info().name, "update"))
    }

    fn delete(&self, _id: &str) -> AdapterResult {
        Err(AdapterError::unsupported(self.info().name, "delete"))
    }

    fn action(&self, params: ActionParams) -> AdapterResult {
        Err(AdapterError::unsupported(
            self.info().name,
            &format!("action:{}", params.action),
        ))
    }
}

pub(crate) fn string_prop(properties: &Map<String, Value>, key: &str) -> Option<String> {
    properties
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}
