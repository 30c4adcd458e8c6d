//! The advertised tool surface. Schemas for argument-taking tools are
//! derived from the dispatch layer's typed argument structs, so the catalog
//! cannot drift from what the dispatcher actually accepts.

use appbridge_core::dispatch::ComposeDraftArgs;
use appbridge_core::dispatch::CreateEventArgs;
use appbridge_core::dispatch::CreateNoteArgs;
use appbridge_core::dispatch::RunScriptArgs;
use appbridge_core::dispatch::RunTemplateArgs;
use appbridge_core::dispatch::SetModeArgs;
use appbridge_mcp_types::Tool;
use schemars::JsonSchema;
use serde_json::Value;
use serde_json::json;

fn schema_for<T: JsonSchema>() -> Value {
    // The root schema flattens to a plain object schema; definitions ride
    // along for enum-typed fields.
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema).unwrap_or_else(|_| json!({ "type": "object" }))
}

fn empty_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

fn tool(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}

/// Every tool the server can ever advertise, unfiltered.
pub fn all_tools() -> Vec<Tool> {
    vec![
        tool(
            "applescript.ping",
            "Check if the appbridge server is running",
            empty_schema(),
        ),
        tool(
            "applescript.list_apps",
            "List configured apps and their policy status",
            empty_schema(),
        ),
        tool(
            "applescript.get_mode",
            "Report the current operation mode and enabled tools",
            empty_schema(),
        ),
        tool(
            "applescript.set_mode",
            "Change the operation mode (readonly, create, or full)",
            schema_for::<SetModeArgs>(),
        ),
        tool(
            "notes.create_note",
            "Create a new note in Apple Notes",
            schema_for::<CreateNoteArgs>(),
        ),
        tool(
            "calendar.create_event",
            "Create a new event in Apple Calendar",
            schema_for::<CreateEventArgs>(),
        ),
        tool(
            "mail.compose_draft",
            "Compose a new email draft in Apple Mail",
            schema_for::<ComposeDraftArgs>(),
        ),
        tool(
            "applescript.run_template",
            "Execute a registered AppleScript template by id (policy-gated, needs confirmation)",
            schema_for::<RunTemplateArgs>(),
        ),
        tool(
            "applescript.run_script",
            "Execute raw AppleScript (disabled by default, needs confirmation)",
            schema_for::<RunScriptArgs>(),
        ),
    ]
}

/// The catalog restricted to the tool names enabled for the current mode.
pub fn tools_for(enabled: &[String]) -> Vec<Tool> {
    all_tools()
        .into_iter()
        .filter(|tool| enabled.iter().any(|name| name == &tool.name))
        .collect()
}
