//! Operation modes and the registry mapping tools to their minimum mode.
//!
//! Three cumulative tiers control which tools are available: `readonly`
//! holds query tools only, `create` adds creation tools, `full` unlocks
//! everything including raw script execution. The registry is built once
//! from configuration and only ever replaced as a whole map.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use arc_swap::ArcSwap;
use serde::Deserialize;
use serde::Serialize;

use crate::config::ModesConfig;

/// Tools whose effects are irreversible or data-losing. Destructive status
/// is inherent to the tool, never configured.
const DESTRUCTIVE_TOOLS: &[&str] = &["applescript.run_template", "applescript.run_script"];

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    Readonly,
    Create,
    Full,
}

impl OperationMode {
    pub const ALL: [OperationMode; 3] = [
        OperationMode::Readonly,
        OperationMode::Create,
        OperationMode::Full,
    ];

    pub fn level(self) -> u8 {
        match self {
            OperationMode::Readonly => 0,
            OperationMode::Create => 1,
            OperationMode::Full => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationMode::Readonly => "readonly",
            OperationMode::Create => "create",
            OperationMode::Full => "full",
        }
    }
}

impl std::fmt::Display for OperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "readonly" => Ok(OperationMode::Readonly),
            "create" => Ok(OperationMode::Create),
            "full" => Ok(OperationMode::Full),
            other => Err(format!(
                "unknown mode {other:?}; expected readonly, create, or full"
            )),
        }
    }
}

/// Minimum mode required and whether the tool is destructive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolModeEntry {
    pub min_mode: OperationMode,
    pub destructive: bool,
}

/// Immutable map from tool name to its mode entry. Rebuilt as a whole on
/// configuration reload; partial mutation is not expressible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeRegistry {
    entries: BTreeMap<String, ToolModeEntry>,
}

impl ModeRegistry {
    pub fn from_modes_config(modes: &ModesConfig) -> Self {
        let mut entries = BTreeMap::new();
        let levels = [
            (OperationMode::Readonly, &modes.readonly),
            (OperationMode::Create, &modes.create),
            (OperationMode::Full, &modes.full),
        ];
        for (min_mode, tools) in levels {
            for tool in tools {
                entries.insert(
                    tool.clone(),
                    ToolModeEntry {
                        min_mode,
                        destructive: DESTRUCTIVE_TOOLS.contains(&tool.as_str()),
                    },
                );
            }
        }
        Self { entries }
    }

    /// Unknown tool names are never allowed.
    pub fn is_allowed(&self, tool: &str, mode: OperationMode) -> bool {
        match self.entries.get(tool) {
            Some(entry) => mode.level() >= entry.min_mode.level(),
            None => false,
        }
    }

    pub fn is_destructive(&self, tool: &str) -> bool {
        self.entries
            .get(tool)
            .map(|entry| entry.destructive)
            .unwrap_or(false)
    }

    pub fn min_mode(&self, tool: &str) -> Option<OperationMode> {
        self.entries.get(tool).map(|entry| entry.min_mode)
    }

    pub fn enabled_tools(&self, mode: OperationMode) -> Vec<String> {
        self.entries
            .keys()
            .filter(|name| self.is_allowed(name, mode))
            .cloned()
            .collect()
    }

    pub fn disabled_tools(&self, mode: OperationMode) -> Vec<String> {
        self.entries
            .keys()
            .filter(|name| !self.is_allowed(name, mode))
            .cloned()
            .collect()
    }
}

pub type ModeChangeListener = Box<dyn Fn(OperationMode, OperationMode) + Send + Sync>;

/// Owns the process-wide current mode and the tool registry.
///
/// The mode scalar sits behind its own mutex; the registry behind an
/// atomically swappable handle so a rebuild can never be observed half
/// applied. The two are never locked together.
pub struct ModeManager {
    mode: Mutex<OperationMode>,
    registry: ArcSwap<ModeRegistry>,
    listeners: Mutex<Vec<ModeChangeListener>>,
}

impl ModeManager {
    pub fn new(default_mode: OperationMode, registry: ModeRegistry) -> Self {
        Self {
            mode: Mutex::new(default_mode),
            registry: ArcSwap::from_pointee(registry),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn current_mode(&self) -> OperationMode {
        match self.mode.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Update the mode, then notify listeners outside the lock.
    pub fn set_mode(&self, new_mode: OperationMode) -> (OperationMode, OperationMode) {
        let old_mode = {
            let mut guard = match self.mode.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::replace(&mut *guard, new_mode)
        };
        if old_mode != new_mode {
            let listeners = match self.listeners.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            for listener in listeners.iter() {
                listener(old_mode, new_mode);
            }
        }
        (old_mode, new_mode)
    }

    pub fn on_mode_change(&self, listener: ModeChangeListener) {
        let mut listeners = match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        listeners.push(listener);
    }

    pub fn registry(&self) -> Arc<ModeRegistry> {
        self.registry.load_full()
    }

    /// Atomic whole-map replacement; in-flight calls keep the snapshot they
    /// already loaded.
    pub fn replace_registry(&self, registry: ModeRegistry) {
        self.registry.store(Arc::new(registry));
    }

    pub fn is_tool_allowed(&self, tool: &str) -> bool {
        self.registry.load().is_allowed(tool, self.current_mode())
    }

    pub fn is_destructive_tool(&self, tool: &str) -> bool {
        self.registry.load().is_destructive(tool)
    }

    pub fn enabled_tools(&self) -> Vec<String> {
        self.registry.load().enabled_tools(self.current_mode())
    }

    pub fn disabled_tools(&self) -> Vec<String> {
        self.registry.load().disabled_tools(self.current_mode())
    }
}
