use appbridge_protocol::ErrorCode;
use appbridge_protocol::ErrorPayload;

/// Executor-side failures, each mapped to one stable error code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    #[error("{message}")]
    AutomationDenied {
        message: String,
        os_status: Option<i64>,
    },

    #[error("{0}")]
    AppNotRunning(String),

    #[error("{message}")]
    ScriptError {
        message: String,
        error_number: Option<i64>,
    },

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ExecutorError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ExecutorError::AutomationDenied { .. } => ErrorCode::AutomationDenied,
            ExecutorError::AppNotRunning(_) => ErrorCode::AppNotRunning,
            ExecutorError::ScriptError { .. } => ErrorCode::ScriptError,
            ExecutorError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            ExecutorError::Internal(_) => ErrorCode::UnknownError,
        }
    }

    pub fn into_payload(self) -> ErrorPayload {
        let payload = ErrorPayload::new(self.code(), self.to_string());
        match self {
            ExecutorError::AutomationDenied {
                os_status: Some(status),
                ..
            } => payload.with_detail("osStatus", status.to_string()),
            ExecutorError::ScriptError {
                error_number: Some(number),
                ..
            } => payload.with_detail("errorNumber", number.to_string()),
            _ => payload,
        }
    }

    /// Maps an osascript failure line to the taxonomy by its trailing error
    /// number: -1743 is the TCC automation denial, -600 and -10810 mean the
    /// target app is unavailable, anything else is a script error.
    pub fn from_osascript_stderr(stderr: &str) -> Self {
        let message = stderr.trim().to_string();
        let message = if message.is_empty() {
            "osascript failed without diagnostics".to_string()
        } else {
            message
        };

        match trailing_error_number(&message) {
            Some(-1743) => ExecutorError::AutomationDenied {
                message,
                os_status: Some(-1743),
            },
            Some(-600) | Some(-10810) => ExecutorError::AppNotRunning(message),
            number => ExecutorError::ScriptError {
                message,
                error_number: number,
            },
        }
    }
}

/// osascript reports failures as `... (-1743)`.
fn trailing_error_number(message: &str) -> Option<i64> {
    let re = match regex_lite::Regex::new(r"\((-?\d+)\)\s*$") {
        Ok(re) => re,
        Err(_) => return None,
    };
    re.captures(message)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn automation_denial_maps_by_error_number() {
        let err = ExecutorError::from_osascript_stderr(
            "execution error: Not authorized to send Apple events to Notes. (-1743)",
        );
        assert_eq!(err.code(), ErrorCode::AutomationDenied);
        let payload = err.into_payload();
        let details = match payload.details {
            Some(details) => details,
            None => panic!("expected details"),
        };
        assert_eq!(details.get("osStatus"), Some(&serde_json::json!("-1743")));
    }

    #[test]
    fn missing_apps_map_to_app_not_running() {
        for number in [-600, -10810] {
            let err = ExecutorError::from_osascript_stderr(&format!(
                "execution error: Application isn't running. ({number})"
            ));
            assert_eq!(err.code(), ErrorCode::AppNotRunning);
        }
    }

    #[test]
    fn other_failures_are_script_errors_with_the_number_attached() {
        let err = ExecutorError::from_osascript_stderr(
            "syntax error: Expected end of line but found identifier. (-2741)",
        );
        assert_eq!(err.code(), ErrorCode::ScriptError);
        let payload = err.into_payload();
        let details = match payload.details {
            Some(details) => details,
            None => panic!("expected details"),
        };
        assert_eq!(
            details.get("errorNumber"),
            Some(&serde_json::json!("-2741"))
        );
    }

    #[test]
    fn numberless_failures_still_map_to_script_errors() {
        let err = ExecutorError::from_osascript_stderr("something odd happened");
        assert_eq!(err.code(), ErrorCode::ScriptError);
        assert_eq!(err.into_payload().details, None);
    }
}
