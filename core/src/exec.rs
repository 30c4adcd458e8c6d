//! Executor transport: one child process per call, one JSON request written
//! to its stdin, one JSON response read from its stdout.
//!
//! Exactly one of {spawn-failure, timeout, parse-failure, parse-success}
//! resolves each call. The child's stderr is diagnostic only: logged, never
//! parsed for control flow.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use appbridge_protocol::ErrorCode;
use appbridge_protocol::ErrorPayload;
use appbridge_protocol::ExecutorRequest;
use appbridge_protocol::ExecutorResponse;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

// I/O buffer sizing
const READ_CHUNK_SIZE: usize = 8192; // bytes per read
const AGGREGATE_BUFFER_INITIAL_CAPACITY: usize = 8 * 1024; // 8 KiB

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    pub executable_path: PathBuf,
    pub args: Vec<String>,
}

impl ExecutorOptions {
    pub fn new(executable_path: impl Into<PathBuf>) -> Self {
        Self {
            executable_path: executable_path.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

/// Spawn the executor, feed it `request`, and decode its response.
///
/// The decoded response is returned regardless of its own `ok` flag:
/// success/failure is a property of the payload, not of the transport call.
pub async fn run_executor(
    request: &ExecutorRequest,
    options: &ExecutorOptions,
) -> Result<ExecutorResponse, ErrorPayload> {
    let timeout = Duration::from_millis(request.timeout_ms);
    debug!(
        request_id = %request.request_id,
        executable = %options.executable_path.display(),
        bundle_id = %request.bundle_id,
        timeout_ms = request.timeout_ms,
        "spawning executor"
    );

    let request_json = serde_json::to_string(request).map_err(|err| {
        ErrorPayload::new(
            ErrorCode::ExecutorFailed,
            format!("failed to serialize executor request: {err}"),
        )
        .with_detail("requestId", request.request_id.clone())
    })?;

    let mut child = Command::new(&options.executable_path)
        .args(&options.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| {
            ErrorPayload::new(
                ErrorCode::ExecutorFailed,
                format!("failed to spawn executor: {err}"),
            )
            .with_detail("requestId", request.request_id.clone())
            .with_detail("spawnError", err.to_string())
        })?;

    // Write the request and close stdin so the child sees EOF. Write errors
    // are swallowed: the child may exit before reading all input, and its
    // own close/exit is authoritative.
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(request_json.as_bytes()).await;
        let _ = stdin.shutdown().await;
    }

    let mut stdout_reader = match child.stdout.take() {
        Some(stdout) => stdout,
        None => {
            return Err(ErrorPayload::new(
                ErrorCode::ExecutorFailed,
                "stdout pipe was unexpectedly not available",
            ));
        }
    };
    let mut stderr_reader = match child.stderr.take() {
        Some(stderr) => stderr,
        None => {
            return Err(ErrorPayload::new(
                ErrorCode::ExecutorFailed,
                "stderr pipe was unexpectedly not available",
            ));
        }
    };

    let mut out_stdout: Vec<u8> = Vec::with_capacity(AGGREGATE_BUFFER_INITIAL_CAPACITY);
    let mut out_stderr: Vec<u8> = Vec::with_capacity(AGGREGATE_BUFFER_INITIAL_CAPACITY);
    let mut tmp_stdout = [0u8; READ_CHUNK_SIZE];
    let mut tmp_stderr = [0u8; READ_CHUNK_SIZE];
    let mut stdout_open = true;
    let mut stderr_open = true;
    let mut child_finished = false;
    let mut exit_code: Option<i32> = None;
    let mut timed_out = false;

    let timeout_fut = tokio::time::sleep(timeout);
    tokio::pin!(timeout_fut);

    // Drive the process, the timeout, and both pipes concurrently; the first
    // terminal condition wins.
    while (stdout_open || stderr_open) || !child_finished {
        tokio::select! {
            // Timeout: forcibly terminate. The kill closes the pipes, which
            // lets the remaining reads drain and the loop exit.
            _ = &mut timeout_fut, if !child_finished => {
                let _ = child.start_kill();
                timed_out = true;
                child_finished = true;
            }

            // Process exit
            res = child.wait(), if !child_finished => {
                match res {
                    Ok(status) => exit_code = status.code(),
                    Err(err) => {
                        return Err(ErrorPayload::new(
                            ErrorCode::ExecutorFailed,
                            format!("failed to wait for executor: {err}"),
                        )
                        .with_detail("requestId", request.request_id.clone()));
                    }
                }
                child_finished = true;
            }

            // Stdout chunk
            read = stdout_reader.read(&mut tmp_stdout), if stdout_open => {
                match read {
                    Ok(0) => stdout_open = false,
                    Ok(n) => out_stdout.extend_from_slice(&tmp_stdout[..n]),
                    Err(_) => stdout_open = false,
                }
            }

            // Stderr chunk
            read = stderr_reader.read(&mut tmp_stderr), if stderr_open => {
                match read {
                    Ok(0) => stderr_open = false,
                    Ok(n) => out_stderr.extend_from_slice(&tmp_stderr[..n]),
                    Err(_) => stderr_open = false,
                }
            }
        }
    }

    if timed_out {
        debug!(request_id = %request.request_id, timeout_ms = request.timeout_ms, "executor timed out");
        return Err(ErrorPayload::new(
            ErrorCode::Timeout,
            format!("executor timed out after {}ms", request.timeout_ms),
        )
        .with_detail("requestId", request.request_id.clone())
        .with_detail("timeoutMs", request.timeout_ms));
    }

    if !out_stderr.is_empty() {
        debug!(
            request_id = %request.request_id,
            stderr = %String::from_utf8_lossy(&out_stderr),
            "executor stderr"
        );
    }

    let stdout_text = String::from_utf8_lossy(&out_stdout);
    let response: ExecutorResponse = serde_json::from_str(&stdout_text).map_err(|err| {
        ErrorPayload::new(
            ErrorCode::ExecutorFailed,
            format!(
                "invalid JSON from executor (exit code {}): {err}",
                exit_code.unwrap_or(-1)
            ),
        )
        .with_detail("requestId", request.request_id.clone())
        .with_detail("exitCode", exit_code.unwrap_or(-1))
        .with_detail("parseError", err.to_string())
    })?;

    // A response for a different request is a protocol violation, treated
    // as a transport failure rather than surfaced to the caller.
    if response.request_id() != request.request_id {
        return Err(ErrorPayload::new(
            ErrorCode::ExecutorFailed,
            format!(
                "executor answered request {} but {} was sent",
                response.request_id(),
                request.request_id
            ),
        )
        .with_detail("requestId", request.request_id.clone()));
    }

    debug!(request_id = %request.request_id, ok = response.is_ok(), "executor response");
    Ok(response)
}
