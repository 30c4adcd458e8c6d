//! On-disk configuration, loaded once at process start.
//!
//! The file lives at `$XDG_CONFIG_HOME/appbridge/config.toml` unless the
//! `APPBRIDGE_CONFIG` environment variable points elsewhere. Every field has
//! a default so an absent file yields a usable (conservative) configuration.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::BridgeError;
use crate::mode::OperationMode;

pub const CONFIG_ENV_VAR: &str = "APPBRIDGE_CONFIG";

const DEFAULT_TIMEOUT_MS: u64 = 12_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the executor binary spawned per call.
    pub executor_path: PathBuf,
    pub default_timeout_ms: u64,
    pub default_mode: OperationMode,
    pub modes: ModesConfig,
    /// Per-app policy entries keyed by bundle id.
    pub apps: BTreeMap<String, AppConfig>,
    pub run_script: RunScriptConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executor_path: PathBuf::from("appbridge-executor"),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            default_mode: OperationMode::Readonly,
            modes: ModesConfig::default(),
            apps: BTreeMap::new(),
            run_script: RunScriptConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// The tools introduced at each mode level. Modes are cumulative: `create`
/// includes everything in `readonly`, `full` includes everything below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModesConfig {
    pub readonly: Vec<String>,
    pub create: Vec<String>,
    pub full: Vec<String>,
}

impl Default for ModesConfig {
    fn default() -> Self {
        Self {
            readonly: vec![
                "applescript.ping".to_string(),
                "applescript.list_apps".to_string(),
                "applescript.get_mode".to_string(),
                "applescript.set_mode".to_string(),
            ],
            create: vec![
                "notes.create_note".to_string(),
                "calendar.create_event".to_string(),
                "mail.compose_draft".to_string(),
                "applescript.run_template".to_string(),
            ],
            full: vec!["applescript.run_script".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub enabled: bool,
    /// Empty means every tool is permitted for this app.
    pub allowed_tools: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_tools: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunScriptConfig {
    pub enabled: bool,
    /// Non-empty restricts raw execution to these bundle ids.
    pub allowed_bundle_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Parameter keys scrubbed before logging.
    pub redact: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            redact: Vec::new(),
        }
    }
}

/// Resolve the config path: env var wins (and must exist when set), then the
/// per-user default, then no file at all.
pub fn resolve_config_path() -> Result<Option<PathBuf>, BridgeError> {
    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(BridgeError::Config(format!(
            "config file not found at {CONFIG_ENV_VAR} path: {env_path}"
        )));
    }

    let default_path = dirs::config_dir().map(|dir| dir.join("appbridge").join("config.toml"));
    Ok(default_path.filter(|path| path.exists()))
}

pub fn load_config_from_file(path: &Path) -> Result<Config, BridgeError> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        BridgeError::Config(format!("failed to read config {}: {err}", path.display()))
    })?;
    toml::from_str(&raw).map_err(|err| {
        BridgeError::Config(format!("invalid config at {}: {err}", path.display()))
    })
}

pub fn load_config() -> Result<Config, BridgeError> {
    match resolve_config_path()? {
        Some(path) => load_config_from_file(&path),
        None => Ok(Config::default()),
    }
}
