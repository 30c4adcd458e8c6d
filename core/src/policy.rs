//! Layered policy: mode gating, the dedicated raw-execution gate, and
//! per-app allow/deny configuration. Every denial carries a machine-readable
//! reason so callers and tests can discriminate them without parsing prose.

use std::sync::Arc;

use appbridge_protocol::ErrorCode;
use appbridge_protocol::ErrorPayload;
use serde::Serialize;
use tracing::warn;

use crate::config::Config;
use crate::mode::ModeManager;

pub const RUN_SCRIPT_TOOL: &str = "applescript.run_script";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenialReason {
    ModeInsufficient { tool: String, mode: String },
    RunScriptDisabled,
    RunScriptBundleNotAllowed { bundle_id: String },
    AppNotConfigured { bundle_id: String },
    AppDisabled { bundle_id: String },
    ToolNotAllowedForApp { bundle_id: String, tool: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PolicyDenial {
    pub reason: DenialReason,
    pub message: String,
}

impl PolicyDenial {
    fn new(reason: DenialReason, message: String) -> Self {
        Self { reason, message }
    }

    pub fn into_payload(self) -> ErrorPayload {
        let payload = ErrorPayload::new(ErrorCode::PolicyDenied, self.message);
        match serde_json::to_value(&self.reason) {
            Ok(reason) => payload.with_detail("reason", reason),
            Err(_) => payload,
        }
    }
}

pub struct PolicyEngine {
    config: Arc<Config>,
    mode_manager: Option<Arc<ModeManager>>,
}

impl PolicyEngine {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            mode_manager: None,
        }
    }

    /// Attach a mode manager for mode-based enforcement.
    pub fn with_mode_manager(mut self, mode_manager: Arc<ModeManager>) -> Self {
        self.mode_manager = Some(mode_manager);
        self
    }

    /// Short-circuiting evaluation: mode, then the raw-execution gate (which
    /// bypasses per-app checks), then the per-app allow-list. Tools without a
    /// bundle id are target-agnostic and pass once the mode check clears.
    pub fn assert_allowed(
        &self,
        tool: &str,
        bundle_id: Option<&str>,
    ) -> Result<(), PolicyDenial> {
        if let Some(mode_manager) = &self.mode_manager {
            if !mode_manager.is_tool_allowed(tool) {
                let mode = mode_manager.current_mode();
                warn!(tool, %mode, "policy denied: tool not allowed in current mode");
                return Err(PolicyDenial::new(
                    DenialReason::ModeInsufficient {
                        tool: tool.to_string(),
                        mode: mode.to_string(),
                    },
                    format!(
                        "Tool {tool} is not available in \"{mode}\" mode. \
                         Change mode with applescript.set_mode."
                    ),
                ));
            }
        }

        if tool == RUN_SCRIPT_TOOL {
            return self.assert_run_script_allowed(bundle_id);
        }

        let Some(bundle_id) = bundle_id else {
            return Ok(());
        };

        self.assert_app_allowed(bundle_id, tool)
    }

    pub fn configured_apps(&self) -> impl Iterator<Item = (&String, &crate::config::AppConfig)> {
        self.config.apps.iter()
    }

    fn assert_run_script_allowed(&self, bundle_id: Option<&str>) -> Result<(), PolicyDenial> {
        if !self.config.run_script.enabled {
            warn!("run_script denied: globally disabled");
            return Err(PolicyDenial::new(
                DenialReason::RunScriptDisabled,
                format!("{RUN_SCRIPT_TOOL} is disabled. Enable it in config to use."),
            ));
        }

        if let Some(bundle_id) = bundle_id {
            let allowed = &self.config.run_script.allowed_bundle_ids;
            if !allowed.is_empty() && !allowed.iter().any(|id| id == bundle_id) {
                warn!(bundle_id, "run_script denied: bundle not in allowlist");
                return Err(PolicyDenial::new(
                    DenialReason::RunScriptBundleNotAllowed {
                        bundle_id: bundle_id.to_string(),
                    },
                    format!("{RUN_SCRIPT_TOOL} is not allowed for app {bundle_id}"),
                ));
            }
        }

        Ok(())
    }

    fn assert_app_allowed(&self, bundle_id: &str, tool: &str) -> Result<(), PolicyDenial> {
        let Some(app) = self.config.apps.get(bundle_id) else {
            warn!(bundle_id, tool, "policy denied: app not configured");
            return Err(PolicyDenial::new(
                DenialReason::AppNotConfigured {
                    bundle_id: bundle_id.to_string(),
                },
                format!("App {bundle_id} is not configured. Add it to config to use."),
            ));
        };

        if !app.enabled {
            warn!(bundle_id, tool, "policy denied: app disabled");
            return Err(PolicyDenial::new(
                DenialReason::AppDisabled {
                    bundle_id: bundle_id.to_string(),
                },
                format!("App {bundle_id} is disabled in config."),
            ));
        }

        if !app.allowed_tools.is_empty() && !app.allowed_tools.iter().any(|name| name == tool) {
            warn!(bundle_id, tool, "policy denied: tool not in allowlist");
            return Err(PolicyDenial::new(
                DenialReason::ToolNotAllowedForApp {
                    bundle_id: bundle_id.to_string(),
                    tool: tool.to_string(),
                },
                format!("Tool {tool} is not allowed for app {bundle_id}"),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::config::ModesConfig;
    use crate::mode::ModeRegistry;
    use crate::mode::OperationMode;
    use pretty_assertions::assert_eq;

    fn config_with_apps(apps: Vec<(&str, AppConfig)>) -> Arc<Config> {
        let mut config = Config::default();
        for (bundle_id, app) in apps {
            config.apps.insert(bundle_id.to_string(), app);
        }
        Arc::new(config)
    }

    fn full_mode_manager() -> Arc<ModeManager> {
        Arc::new(ModeManager::new(
            OperationMode::Full,
            ModeRegistry::from_modes_config(&ModesConfig::default()),
        ))
    }

    #[test]
    fn mode_check_runs_first() {
        let config = config_with_apps(vec![("com.apple.Notes", AppConfig::default())]);
        let manager = Arc::new(ModeManager::new(
            OperationMode::Readonly,
            ModeRegistry::from_modes_config(&ModesConfig::default()),
        ));
        let policy = PolicyEngine::new(config).with_mode_manager(manager);

        let denial = match policy.assert_allowed("notes.create_note", Some("com.apple.Notes")) {
            Err(denial) => denial,
            Ok(()) => panic!("expected mode denial"),
        };
        assert_eq!(
            denial.reason,
            DenialReason::ModeInsufficient {
                tool: "notes.create_note".to_string(),
                mode: "readonly".to_string(),
            }
        );
    }

    #[test]
    fn target_agnostic_tools_pass_without_a_bundle_id() {
        let policy = PolicyEngine::new(Arc::new(Config::default()));
        assert!(policy.assert_allowed("applescript.list_apps", None).is_ok());
    }

    #[test]
    fn empty_allowed_tools_means_everything_is_permitted() {
        let config = config_with_apps(vec![(
            "com.apple.Notes",
            AppConfig {
                enabled: true,
                allowed_tools: Vec::new(),
            },
        )]);
        let policy = PolicyEngine::new(config);
        assert!(
            policy
                .assert_allowed("notes.create_note", Some("com.apple.Notes"))
                .is_ok()
        );
        assert!(
            policy
                .assert_allowed("notes.delete_note", Some("com.apple.Notes"))
                .is_ok()
        );
    }

    #[test]
    fn non_empty_allowed_tools_denies_everything_else() {
        let config = config_with_apps(vec![(
            "com.apple.Notes",
            AppConfig {
                enabled: true,
                allowed_tools: vec!["a".to_string()],
            },
        )]);
        let policy = PolicyEngine::new(config);
        assert!(policy.assert_allowed("a", Some("com.apple.Notes")).is_ok());
        let denial = match policy.assert_allowed("b", Some("com.apple.Notes")) {
            Err(denial) => denial,
            Ok(()) => panic!("expected allow-list denial"),
        };
        assert_eq!(
            denial.reason,
            DenialReason::ToolNotAllowedForApp {
                bundle_id: "com.apple.Notes".to_string(),
                tool: "b".to_string(),
            }
        );
    }

    #[test]
    fn unconfigured_and_disabled_apps_are_distinguishable() {
        let config = config_with_apps(vec![(
            "com.apple.mail",
            AppConfig {
                enabled: false,
                allowed_tools: Vec::new(),
            },
        )]);
        let policy = PolicyEngine::new(config);

        let denial = match policy.assert_allowed("mail.compose_draft", Some("com.apple.mail")) {
            Err(denial) => denial,
            Ok(()) => panic!("expected disabled denial"),
        };
        assert!(matches!(denial.reason, DenialReason::AppDisabled { .. }));

        let denial = match policy.assert_allowed("notes.create_note", Some("com.apple.Notes")) {
            Err(denial) => denial,
            Ok(()) => panic!("expected not-configured denial"),
        };
        assert!(matches!(denial.reason, DenialReason::AppNotConfigured { .. }));
    }

    #[test]
    fn run_script_disabled_wins_over_the_app_allow_list() {
        // The app allow-list would permit it, but the global gate is off.
        let config = config_with_apps(vec![(
            "com.apple.Notes",
            AppConfig {
                enabled: true,
                allowed_tools: vec![RUN_SCRIPT_TOOL.to_string()],
            },
        )]);
        let policy = PolicyEngine::new(config).with_mode_manager(full_mode_manager());
        let denial = match policy.assert_allowed(RUN_SCRIPT_TOOL, Some("com.apple.Notes")) {
            Err(denial) => denial,
            Ok(()) => panic!("expected run_script denial"),
        };
        assert_eq!(denial.reason, DenialReason::RunScriptDisabled);
        assert_eq!(denial.clone().into_payload().code, ErrorCode::PolicyDenied);
    }

    #[test]
    fn run_script_allow_list_gates_targets_but_bypasses_app_config() {
        let mut config = Config::default();
        config.run_script.enabled = true;
        config.run_script.allowed_bundle_ids = vec!["com.apple.Notes".to_string()];
        let policy = PolicyEngine::new(Arc::new(config)).with_mode_manager(full_mode_manager());

        // Allowed bundle passes even though no app entry exists for it.
        assert!(
            policy
                .assert_allowed(RUN_SCRIPT_TOOL, Some("com.apple.Notes"))
                .is_ok()
        );

        let denial = match policy.assert_allowed(RUN_SCRIPT_TOOL, Some("com.apple.mail")) {
            Err(denial) => denial,
            Ok(()) => panic!("expected allow-list denial"),
        };
        assert!(matches!(
            denial.reason,
            DenialReason::RunScriptBundleNotAllowed { .. }
        ));
    }

    #[test]
    fn run_script_with_empty_allow_list_accepts_any_target() {
        let mut config = Config::default();
        config.run_script.enabled = true;
        let policy = PolicyEngine::new(Arc::new(config)).with_mode_manager(full_mode_manager());
        assert!(
            policy
                .assert_allowed(RUN_SCRIPT_TOOL, Some("com.apple.systemevents"))
                .is_ok()
        );
        assert!(policy.assert_allowed(RUN_SCRIPT_TOOL, None).is_ok());
    }

    #[test]
    fn denial_payload_carries_the_reason_in_details() {
        let policy = PolicyEngine::new(Arc::new(Config::default()));
        let denial = match policy.assert_allowed("notes.create_note", Some("com.apple.Notes")) {
            Err(denial) => denial,
            Ok(()) => panic!("expected denial"),
        };
        let payload = denial.into_payload();
        assert_eq!(payload.code, ErrorCode::PolicyDenied);
        let details = match payload.details {
            Some(details) => details,
            None => panic!("expected details"),
        };
        assert_eq!(
            details.get("reason").and_then(|r| r.get("kind")),
            Some(&serde_json::json!("app_not_configured"))
        );
    }
}
