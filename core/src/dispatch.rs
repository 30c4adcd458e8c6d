//! Dispatch layer: binds an incoming tool call to policy check → optional
//! confirmation → adapter rendering → executor transport → response shaping.
//!
//! Policy and confirmation denials resolve before any process is spawned;
//! they never reach the executor and never start its timeout clock. A
//! pending confirmation is a normal response carrying an actionable token,
//! not an error.

use std::sync::Arc;

use appbridge_protocol::ErrorPayload;
use appbridge_protocol::ExecMode;
use appbridge_protocol::ExecutorRequest;
use appbridge_protocol::ExecutorResponse;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tracing::debug;
use tracing::info;
use uuid::Uuid;

use crate::BridgeError;
use crate::Result;
use crate::adapters::AdapterRegistry;
use crate::adapters::CreateParams;
use crate::config::Config;
use crate::confirmation::Confirmation;
use crate::confirmation::ConfirmationChannel;
use crate::confirmation::ConfirmationManager;
use crate::exec::ExecutorOptions;
use crate::exec::run_executor;
use crate::logging::redact;
use crate::mode::ModeManager;
use crate::mode::OperationMode;
use crate::policy::PolicyEngine;

/// Fallback target for raw scripts that do not name an app.
const SYSTEM_EVENTS_BUNDLE_ID: &str = "com.apple.systemevents";

/// One advertised tool call, parsed into its typed arguments. The tag is the
/// tool name as the caller sees it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name", content = "arguments")]
pub enum ToolCallParams {
    #[serde(rename = "applescript.ping")]
    Ping,
    #[serde(rename = "applescript.list_apps")]
    ListApps,
    #[serde(rename = "applescript.get_mode")]
    GetMode,
    #[serde(rename = "applescript.set_mode")]
    SetMode(SetModeArgs),
    #[serde(rename = "notes.create_note")]
    CreateNote(CreateNoteArgs),
    #[serde(rename = "calendar.create_event")]
    CreateEvent(CreateEventArgs),
    #[serde(rename = "mail.compose_draft")]
    ComposeDraft(ComposeDraftArgs),
    #[serde(rename = "applescript.run_template")]
    RunTemplate(RunTemplateArgs),
    #[serde(rename = "applescript.run_script")]
    RunScript(RunScriptArgs),
}

impl ToolCallParams {
    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolCallParams::Ping => "applescript.ping",
            ToolCallParams::ListApps => "applescript.list_apps",
            ToolCallParams::GetMode => "applescript.get_mode",
            ToolCallParams::SetMode(_) => "applescript.set_mode",
            ToolCallParams::CreateNote(_) => "notes.create_note",
            ToolCallParams::CreateEvent(_) => "calendar.create_event",
            ToolCallParams::ComposeDraft(_) => "mail.compose_draft",
            ToolCallParams::RunTemplate(_) => "applescript.run_template",
            ToolCallParams::RunScript(_) => "applescript.run_script",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
pub struct SetModeArgs {
    /// New operation mode: readonly, create, or full.
    pub mode: OperationMode,
}

#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteArgs {
    /// Title of the note.
    pub title: String,
    /// Body content.
    pub body: String,
    /// Target folder id (default: the app's default folder).
    #[serde(default)]
    pub folder_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventArgs {
    /// Event title.
    pub title: String,
    /// Start date/time (ISO 8601).
    pub start: String,
    /// End date/time (ISO 8601).
    pub end: String,
    /// Calendar name (default: Calendar).
    #[serde(default)]
    pub calendar_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComposeDraftArgs {
    /// Recipient email address.
    pub to: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunTemplateArgs {
    /// Template identifier (e.g. notes.create_note).
    pub template_id: String,
    /// Target app bundle id (e.g. com.apple.Notes).
    pub bundle_id: String,
    #[serde(default)]
    pub parameters: Option<Map<String, Value>>,
    /// Token from a previous not-confirmed response.
    #[serde(default)]
    pub confirmation_token: Option<String>,
    /// Render the script without executing it.
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunScriptArgs {
    /// AppleScript source to execute verbatim.
    pub script: String,
    /// Target app bundle id for the policy check.
    #[serde(default)]
    pub bundle_id: Option<String>,
    /// Token from a previous not-confirmed response.
    #[serde(default)]
    pub confirmation_token: Option<String>,
    /// Render-only; the script is returned, not executed.
    #[serde(default)]
    pub dry_run: bool,
}

/// The three caller-visible shapes of a finished dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Completed(Value),
    ConfirmationRequired { token: String, message: String },
    Failed(ErrorPayload),
}

pub struct Dispatcher {
    config: Arc<Config>,
    mode_manager: Arc<ModeManager>,
    policy: PolicyEngine,
    confirmations: ConfirmationManager,
    adapters: AdapterRegistry,
    executor: ExecutorOptions,
}

impl Dispatcher {
    pub fn new(
        config: Arc<Config>,
        mode_manager: Arc<ModeManager>,
        executor: ExecutorOptions,
    ) -> Self {
        let policy = PolicyEngine::new(config.clone()).with_mode_manager(mode_manager.clone());
        Self {
            config,
            mode_manager,
            policy,
            confirmations: ConfirmationManager::new(),
            adapters: AdapterRegistry::with_builtin_adapters(),
            executor,
        }
    }

    pub fn mode_manager(&self) -> &Arc<ModeManager> {
        &self.mode_manager
    }

    /// Serve one tool call end to end.
    pub async fn handle(
        &self,
        name: &str,
        arguments: Option<Value>,
        channel: &dyn ConfirmationChannel,
    ) -> DispatchOutcome {
        let outcome = match parse_call(name, arguments) {
            Ok(call) => {
                debug!(tool = call.tool_name(), "dispatching tool call");
                match call {
                    ToolCallParams::Ping => self.handle_ping(),
                    ToolCallParams::ListApps => self.handle_list_apps(),
                    ToolCallParams::GetMode => self.handle_get_mode(),
                    ToolCallParams::SetMode(args) => self.handle_set_mode(args),
                    ToolCallParams::CreateNote(args) => self.handle_create_note(args).await,
                    ToolCallParams::CreateEvent(args) => self.handle_create_event(args).await,
                    ToolCallParams::ComposeDraft(args) => self.handle_compose_draft(args).await,
                    ToolCallParams::RunTemplate(args) => {
                        self.handle_run_template(args, channel).await
                    }
                    ToolCallParams::RunScript(args) => self.handle_run_script(args, channel).await,
                }
            }
            Err(err) => Err(err),
        };
        outcome.unwrap_or_else(|err| DispatchOutcome::Failed(err.into_payload()))
    }

    fn handle_ping(&self) -> Result<DispatchOutcome> {
        self.policy.assert_allowed("applescript.ping", None)?;
        Ok(DispatchOutcome::Completed(json!({
            "ok": true,
            "version": env!("CARGO_PKG_VERSION"),
        })))
    }

    fn handle_list_apps(&self) -> Result<DispatchOutcome> {
        self.policy.assert_allowed("applescript.list_apps", None)?;
        let apps: Vec<Value> = self
            .policy
            .configured_apps()
            .map(|(bundle_id, app)| {
                json!({
                    "bundleId": bundle_id,
                    "enabled": app.enabled,
                    "allowedTools": app.allowed_tools,
                })
            })
            .collect();
        Ok(DispatchOutcome::Completed(json!({ "apps": apps })))
    }

    fn handle_get_mode(&self) -> Result<DispatchOutcome> {
        self.policy.assert_allowed("applescript.get_mode", None)?;
        let mode = self.mode_manager.current_mode();
        Ok(DispatchOutcome::Completed(json!({
            "mode": mode.as_str(),
            "enabledTools": self.mode_manager.enabled_tools(),
        })))
    }

    /// Mode changes synchronously recompute the advertised tool partitions;
    /// registered listeners propagate the change to the hosting protocol.
    fn handle_set_mode(&self, args: SetModeArgs) -> Result<DispatchOutcome> {
        self.policy.assert_allowed("applescript.set_mode", None)?;
        let (old_mode, new_mode) = self.mode_manager.set_mode(args.mode);
        info!(%old_mode, %new_mode, "operation mode changed");
        Ok(DispatchOutcome::Completed(json!({
            "oldMode": old_mode.as_str(),
            "newMode": new_mode.as_str(),
            "enabledTools": self.mode_manager.enabled_tools(),
            "disabledTools": self.mode_manager.disabled_tools(),
        })))
    }

    async fn handle_create_note(&self, args: CreateNoteArgs) -> Result<DispatchOutcome> {
        let mut properties = Map::new();
        properties.insert("title".to_string(), Value::String(args.title));
        properties.insert("body".to_string(), Value::String(args.body));
        self.adapter_call("notes.create_note", "notes", |adapter| {
            adapter.create(CreateParams {
                container_id: args.folder_id.clone(),
                properties: properties.clone(),
            })
        })
        .await
    }

    async fn handle_create_event(&self, args: CreateEventArgs) -> Result<DispatchOutcome> {
        let mut properties = Map::new();
        properties.insert("title".to_string(), Value::String(args.title));
        properties.insert("start".to_string(), Value::String(args.start));
        properties.insert("end".to_string(), Value::String(args.end));
        if let Some(location) = args.location {
            properties.insert("location".to_string(), Value::String(location));
        }
        if let Some(notes) = args.notes {
            properties.insert("notes".to_string(), Value::String(notes));
        }
        self.adapter_call("calendar.create_event", "calendar", |adapter| {
            adapter.create(CreateParams {
                container_id: args.calendar_name.clone(),
                properties: properties.clone(),
            })
        })
        .await
    }

    async fn handle_compose_draft(&self, args: ComposeDraftArgs) -> Result<DispatchOutcome> {
        let mut properties = Map::new();
        properties.insert("to".to_string(), Value::String(args.to));
        if let Some(subject) = args.subject {
            properties.insert("subject".to_string(), Value::String(subject));
        }
        if let Some(body) = args.body {
            properties.insert("body".to_string(), Value::String(body));
        }
        self.adapter_call("mail.compose_draft", "mail", |adapter| {
            adapter.create(CreateParams {
                container_id: None,
                properties: properties.clone(),
            })
        })
        .await
    }

    async fn handle_run_template(
        &self,
        args: RunTemplateArgs,
        channel: &dyn ConfirmationChannel,
    ) -> Result<DispatchOutcome> {
        const TOOL: &str = "applescript.run_template";
        self.policy.assert_allowed(TOOL, Some(&args.bundle_id))?;

        let details = format!(
            "Run template {} against {}",
            args.template_id, args.bundle_id
        );
        if let Some(pending) = self
            .confirm_if_destructive(TOOL, &details, args.confirmation_token.as_deref(), channel)
            .await
        {
            return Ok(pending);
        }

        let request = self.build_request(
            args.bundle_id,
            ExecMode::Template,
            Some(args.template_id),
            None,
            args.parameters.unwrap_or_default(),
            args.dry_run,
        );
        self.run(request).await
    }

    async fn handle_run_script(
        &self,
        args: RunScriptArgs,
        channel: &dyn ConfirmationChannel,
    ) -> Result<DispatchOutcome> {
        const TOOL: &str = "applescript.run_script";
        self.policy.assert_allowed(TOOL, args.bundle_id.as_deref())?;

        let bundle_id = args
            .bundle_id
            .unwrap_or_else(|| SYSTEM_EVENTS_BUNDLE_ID.to_string());
        let details = format!("Run raw AppleScript against {bundle_id}");
        if let Some(pending) = self
            .confirm_if_destructive(TOOL, &details, args.confirmation_token.as_deref(), channel)
            .await
        {
            return Ok(pending);
        }

        let request = self.build_request(
            bundle_id,
            ExecMode::Raw,
            None,
            Some(args.script),
            Map::new(),
            args.dry_run,
        );
        self.run(request).await
    }

    /// Runs the adapter path shared by the app-specific creation tools:
    /// policy → render → execute.
    async fn adapter_call<F>(&self, tool: &str, app: &str, render: F) -> Result<DispatchOutcome>
    where
        F: Fn(&dyn crate::adapters::ResourceAdapter) -> crate::adapters::AdapterResult,
    {
        let adapter = self.adapters.get(app).ok_or_else(|| {
            BridgeError::Config(format!("no adapter registered for app {app}"))
        })?;
        let bundle_id = adapter.info().bundle_id;

        self.policy.assert_allowed(tool, Some(bundle_id))?;
        let rendered = render(adapter.as_ref())?;

        let request = self.build_request(
            bundle_id.to_string(),
            ExecMode::Template,
            Some(rendered.template_id),
            None,
            rendered.parameters,
            false,
        );
        self.run(request).await
    }

    /// Destructive tools gate on confirmation; everything else skips this
    /// entirely. Returns the outcome to short-circuit with, if any.
    async fn confirm_if_destructive(
        &self,
        tool: &str,
        details: &str,
        supplied_token: Option<&str>,
        channel: &dyn ConfirmationChannel,
    ) -> Option<DispatchOutcome> {
        if !self.mode_manager.is_destructive_tool(tool) {
            return None;
        }
        match self
            .confirmations
            .request_confirmation(tool, details, supplied_token, channel)
            .await
        {
            Confirmation::Confirmed => None,
            Confirmation::NotConfirmed { token, message } => {
                Some(DispatchOutcome::ConfirmationRequired { token, message })
            }
        }
    }

    fn build_request(
        &self,
        bundle_id: String,
        mode: ExecMode,
        template_id: Option<String>,
        script: Option<String>,
        parameters: Map<String, Value>,
        dry_run: bool,
    ) -> ExecutorRequest {
        let redacted_parameters = Value::Object(redact(&parameters, &self.config.logging.redact));
        debug!(
            bundle_id = %bundle_id,
            template_id = template_id.as_deref().unwrap_or("-"),
            parameters = %redacted_parameters,
            "rendered executor request"
        );
        ExecutorRequest {
            request_id: Uuid::new_v4().to_string(),
            bundle_id,
            mode,
            template_id,
            script,
            parameters,
            timeout_ms: self.config.default_timeout_ms,
            dry_run,
        }
    }

    /// Transport-synthesized failures and executor-reported failures both
    /// end as `Failed`, but the former arrive as `Err` here and the latter
    /// inside an `Ok` response; they are never conflated upstream.
    async fn run(&self, request: ExecutorRequest) -> Result<DispatchOutcome> {
        let response = run_executor(&request, &self.executor).await?;
        match response {
            ExecutorResponse::Success {
                result,
                stdout,
                stderr,
                ..
            } => {
                if !stderr.is_empty() {
                    debug!(request_id = %request.request_id, stderr = %stderr, "executor diagnostics");
                }
                let mut body = Map::new();
                body.insert("result".to_string(), Value::Object(result));
                if !stdout.is_empty() {
                    body.insert("stdout".to_string(), Value::String(stdout));
                }
                Ok(DispatchOutcome::Completed(Value::Object(body)))
            }
            ExecutorResponse::Failure { error, .. } => Ok(DispatchOutcome::Failed(error)),
        }
    }
}

fn parse_call(name: &str, arguments: Option<Value>) -> Result<ToolCallParams> {
    let mut envelope = Map::new();
    envelope.insert("name".to_string(), Value::String(name.to_string()));
    // Clients send `{}` or null for argument-less tools; both mean "none".
    match arguments {
        Some(Value::Null) | None => {}
        Some(Value::Object(map)) if map.is_empty() => {}
        Some(arguments) => {
            envelope.insert("arguments".to_string(), arguments);
        }
    }
    serde_json::from_value(Value::Object(envelope)).map_err(|err| {
        BridgeError::InvalidRequest(format!("invalid arguments for tool {name}: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::confirmation::NoChannel;
    use crate::mode::ModeRegistry;
    use appbridge_protocol::ErrorCode;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    /// Executor stub that echoes a success response with the request's id.
    const ECHO_OK: &str = r#"REQ=$(cat); ID=$(printf '%s' "$REQ" | sed -n 's/.*"requestId":"\([^"]*\)".*/\1/p'); printf '{"requestId":"%s","ok":true,"result":{"done":true},"stdout":"","stderr":""}' "$ID""#;

    fn shell_executor(script: &str) -> ExecutorOptions {
        ExecutorOptions::new("/bin/sh").with_args(vec!["-c".to_string(), script.to_string()])
    }

    fn dispatcher_with(
        mode: OperationMode,
        executor: ExecutorOptions,
        mutate: impl FnOnce(&mut Config),
    ) -> Dispatcher {
        let mut config = Config::default();
        config
            .apps
            .insert("com.apple.Notes".to_string(), AppConfig::default());
        config
            .apps
            .insert("com.apple.iCal".to_string(), AppConfig::default());
        config
            .apps
            .insert("com.apple.mail".to_string(), AppConfig::default());
        mutate(&mut config);
        let config = Arc::new(config);
        let mode_manager = Arc::new(ModeManager::new(
            mode,
            ModeRegistry::from_modes_config(&config.modes),
        ));
        Dispatcher::new(config, mode_manager, executor)
    }

    fn marker_executor(marker: &Path) -> ExecutorOptions {
        // Spawning this stub at all leaves a marker file behind.
        shell_executor(&format!(
            r#"touch {}; cat > /dev/null; printf 'not json'"#,
            marker.display()
        ))
    }

    #[tokio::test]
    async fn ping_answers_locally() {
        let dispatcher = dispatcher_with(
            OperationMode::Readonly,
            shell_executor("exit 1"),
            |_| {},
        );
        let outcome = dispatcher.handle("applescript.ping", None, &NoChannel).await;
        match outcome {
            DispatchOutcome::Completed(value) => assert_eq!(value["ok"], json!(true)),
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn readonly_mode_denies_create_tools_before_any_spawn() {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => panic!("create tempdir: {e}"),
        };
        let marker = dir.path().join("spawned");
        let dispatcher = dispatcher_with(
            OperationMode::Readonly,
            marker_executor(&marker),
            |_| {},
        );

        let outcome = dispatcher
            .handle(
                "notes.create_note",
                Some(json!({ "title": "t", "body": "b" })),
                &NoChannel,
            )
            .await;
        match outcome {
            DispatchOutcome::Failed(err) => {
                assert_eq!(err.code, ErrorCode::PolicyDenied);
            }
            other => panic!("expected policy denial, got {other:?}"),
        }
        assert!(!marker.exists(), "executor must not have been spawned");
    }

    #[tokio::test]
    async fn create_note_renders_and_runs_in_create_mode() {
        let dispatcher = dispatcher_with(
            OperationMode::Create,
            shell_executor(ECHO_OK),
            |_| {},
        );
        let outcome = dispatcher
            .handle(
                "notes.create_note",
                Some(json!({ "title": "Groceries", "body": "milk" })),
                &NoChannel,
            )
            .await;
        match outcome {
            DispatchOutcome::Completed(value) => {
                assert_eq!(value["result"]["done"], json!(true));
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_template_requires_a_confirmation_round_trip() {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => panic!("create tempdir: {e}"),
        };
        let marker = dir.path().join("spawned");
        // First call: the executor must not run; second call uses the echo stub.
        let dispatcher = dispatcher_with(
            OperationMode::Create,
            shell_executor(ECHO_OK),
            |_| {},
        );
        let blocked = dispatcher_with(
            OperationMode::Create,
            marker_executor(&marker),
            |_| {},
        );

        let args = json!({
            "templateId": "notes.create_note",
            "bundleId": "com.apple.Notes",
            "parameters": { "title": "t", "body": "b" }
        });

        let first = blocked
            .handle("applescript.run_template", Some(args.clone()), &NoChannel)
            .await;
        let token = match first {
            DispatchOutcome::ConfirmationRequired { token, message } => {
                assert!(message.contains("notes.create_note"));
                token
            }
            other => panic!("expected confirmation prompt, got {other:?}"),
        };
        assert!(!marker.exists(), "pending confirmation must not spawn");

        // Replaying against the same dispatcher with the token opens the gate.
        let confirmed_args = json!({
            "templateId": "notes.create_note",
            "bundleId": "com.apple.Notes",
            "parameters": { "title": "t", "body": "b" },
            "confirmationToken": token,
        });
        let second = blocked
            .handle("applescript.run_template", Some(confirmed_args), &NoChannel)
            .await;
        // `blocked`'s executor writes garbage, so a confirmed call reaches the
        // transport and surfaces EXECUTOR_FAILED: proof the gate opened.
        match second {
            DispatchOutcome::Failed(err) => assert_eq!(err.code, ErrorCode::ExecutorFailed),
            other => panic!("expected executor failure after confirmation, got {other:?}"),
        }
        assert!(marker.exists(), "confirmed call must spawn the executor");

        // An unrelated dispatcher still prompts: tokens are not shared.
        let third = dispatcher
            .handle("applescript.run_template", Some(args), &NoChannel)
            .await;
        assert!(matches!(
            third,
            DispatchOutcome::ConfirmationRequired { .. }
        ));
    }

    #[tokio::test]
    async fn run_script_denied_while_disabled_even_in_full_mode() {
        let dispatcher = dispatcher_with(
            OperationMode::Full,
            shell_executor(ECHO_OK),
            |_| {},
        );
        let outcome = dispatcher
            .handle(
                "applescript.run_script",
                Some(json!({ "script": "return 1" })),
                &NoChannel,
            )
            .await;
        match outcome {
            DispatchOutcome::Failed(err) => assert_eq!(err.code, ErrorCode::PolicyDenied),
            other => panic!("expected policy denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn executor_reported_failures_surface_verbatim() {
        let stub = r#"REQ=$(cat); ID=$(printf '%s' "$REQ" | sed -n 's/.*"requestId":"\([^"]*\)".*/\1/p'); printf '{"requestId":"%s","ok":false,"error":{"code":"APP_NOT_RUNNING","message":"Notes is not running"}}' "$ID""#;
        let dispatcher = dispatcher_with(OperationMode::Create, shell_executor(stub), |_| {});
        let outcome = dispatcher
            .handle(
                "notes.create_note",
                Some(json!({ "title": "t", "body": "b" })),
                &NoChannel,
            )
            .await;
        match outcome {
            DispatchOutcome::Failed(err) => {
                assert_eq!(err.code, ErrorCode::AppNotRunning);
                assert_eq!(err.message, "Notes is not running");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn set_mode_recomputes_the_advertised_partitions() {
        let dispatcher = dispatcher_with(
            OperationMode::Readonly,
            shell_executor(ECHO_OK),
            |_| {},
        );
        let outcome = dispatcher
            .handle(
                "applescript.set_mode",
                Some(json!({ "mode": "create" })),
                &NoChannel,
            )
            .await;
        match outcome {
            DispatchOutcome::Completed(value) => {
                assert_eq!(value["oldMode"], json!("readonly"));
                assert_eq!(value["newMode"], json!("create"));
                let enabled = match value["enabledTools"].as_array() {
                    Some(enabled) => enabled,
                    None => panic!("expected enabledTools array"),
                };
                assert!(enabled.contains(&json!("notes.create_note")));
                let disabled = match value["disabledTools"].as_array() {
                    Some(disabled) => disabled,
                    None => panic!("expected disabledTools array"),
                };
                assert!(disabled.contains(&json!("applescript.run_script")));
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_tools_are_invalid_requests() {
        let dispatcher = dispatcher_with(
            OperationMode::Full,
            shell_executor(ECHO_OK),
            |_| {},
        );
        let outcome = dispatcher
            .handle("photos.delete_all", Some(json!({})), &NoChannel)
            .await;
        match outcome {
            DispatchOutcome::Failed(err) => assert_eq!(err.code, ErrorCode::InvalidRequest),
            other => panic!("expected invalid request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_arguments_are_invalid_requests() {
        let dispatcher = dispatcher_with(
            OperationMode::Create,
            shell_executor(ECHO_OK),
            |_| {},
        );
        let outcome = dispatcher
            .handle("notes.create_note", Some(json!({ "title": "t" })), &NoChannel)
            .await;
        match outcome {
            DispatchOutcome::Failed(err) => {
                assert_eq!(err.code, ErrorCode::InvalidRequest);
                assert!(err.message.contains("notes.create_note"));
            }
            other => panic!("expected invalid request, got {other:?}"),
        }
    }
}
