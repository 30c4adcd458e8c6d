use appbridge_protocol::ErrorCode;
use appbridge_protocol::ErrorPayload;

use crate::adapters::AdapterError;
use crate::policy::PolicyDenial;

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Dispatch-side failures. Everything here eventually crosses the tool-call
/// boundary as an [`ErrorPayload`]; executor-reported failures are carried
/// verbatim and never conflated with locally synthesized ones.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Policy(#[from] PolicyDenial),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("config error: {0}")]
    Config(String),

    /// A failure synthesized by the transport (spawn failure, timeout,
    /// unparseable output) or reported by the executor itself.
    #[error(transparent)]
    Executor(#[from] ErrorPayload),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl BridgeError {
    pub fn into_payload(self) -> ErrorPayload {
        match self {
            BridgeError::Policy(denial) => denial.into_payload(),
            BridgeError::Adapter(err) => err.into_payload(),
            BridgeError::Config(message) => ErrorPayload::new(ErrorCode::ConfigError, message),
            BridgeError::Executor(payload) => payload,
            BridgeError::InvalidRequest(message) => {
                ErrorPayload::new(ErrorCode::InvalidRequest, message)
            }
        }
    }
}
