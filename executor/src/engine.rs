//! Script execution through `osascript`.
//!
//! The transport on the other side of the pipe enforces the request timeout
//! by killing this whole process, so no second timer runs here.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::ExecutorError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Seam between request handling and the host automation engine.
#[async_trait::async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, script: &str) -> Result<ScriptOutput, ExecutorError>;
}

/// Runs scripts with the system `osascript` interpreter.
pub struct OsaScriptRunner;

#[async_trait::async_trait]
impl ScriptRunner for OsaScriptRunner {
    async fn run(&self, script: &str) -> Result<ScriptOutput, ExecutorError> {
        debug!(script_bytes = script.len(), "running osascript");
        let output = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| ExecutorError::Internal(format!("failed to run osascript: {err}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(ExecutorError::from_osascript_stderr(&stderr));
        }

        Ok(ScriptOutput { stdout, stderr })
    }
}
