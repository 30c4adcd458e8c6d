//! Script templates, dispatched by the template id's `<app>.` prefix.
//!
//! Each builder is a pure function from parameters to AppleScript source.
//! Values interpolated at build time go through [`crate::json_escape::esc`];
//! values read back out of the app at run time go through the `jsonEsc`
//! handler appended to every script.

mod calendar;
mod mail;
mod notes;

use serde_json::Map;
use serde_json::Value;

use crate::ExecutorError;

pub fn build_script(
    template_id: &str,
    bundle_id: &str,
    parameters: &Map<String, Value>,
) -> Result<String, ExecutorError> {
    let prefix = template_id.split('.').next().unwrap_or("");
    match prefix {
        "notes" => notes::build(template_id, bundle_id, parameters),
        "calendar" => calendar::build(template_id, bundle_id, parameters),
        "mail" => mail::build(template_id, bundle_id, parameters),
        _ => Err(ExecutorError::InvalidRequest(format!(
            "Unknown template prefix: {prefix} (template: {template_id})"
        ))),
    }
}

pub(crate) fn str_param<'a>(parameters: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    parameters.get(key).and_then(Value::as_str)
}

pub(crate) fn required_str<'a>(
    parameters: &'a Map<String, Value>,
    key: &str,
    template_id: &str,
) -> Result<&'a str, ExecutorError> {
    match str_param(parameters, key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ExecutorError::InvalidRequest(format!(
            "{template_id} requires '{key}' parameter"
        ))),
    }
}

pub(crate) fn u64_param(parameters: &Map<String, Value>, key: &str, default: u64) -> u64 {
    parameters
        .get(key)
        .and_then(Value::as_u64)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn unknown_prefixes_are_invalid_requests() {
        let err = build_script("photos.export", "com.apple.Photos", &Map::new());
        match err {
            Err(ExecutorError::InvalidRequest(message)) => {
                assert!(message.contains("photos"));
            }
            other => panic!("expected invalid request, got {other:?}"),
        }
    }

    #[test]
    fn unknown_template_within_a_known_prefix_is_rejected() {
        let err = build_script("notes.incinerate", "com.apple.Notes", &Map::new());
        assert!(matches!(err, Err(ExecutorError::InvalidRequest(_))));
    }

    #[test]
    fn create_note_interpolates_escaped_values() {
        let script = match build_script(
            "notes.create_note",
            "com.apple.Notes",
            &params(&[
                ("title", json!(r#"Say "hi""#)),
                ("body", json!("line1\\line2")),
            ]),
        ) {
            Ok(script) => script,
            Err(e) => panic!("build failed: {e}"),
        };
        assert!(script.contains(r#"tell application id "com.apple.Notes""#));
        assert!(script.contains(r#"name:"Say \"hi\"""#));
        assert!(script.contains(r#"body:"line1\\line2""#));
    }

    #[test]
    fn get_note_requires_an_id() {
        let err = build_script("notes.get_note", "com.apple.Notes", &Map::new());
        assert!(matches!(err, Err(ExecutorError::InvalidRequest(_))));
    }

    #[test]
    fn list_notes_paginates_from_parameters() {
        let script = match build_script(
            "notes.list_notes",
            "com.apple.Notes",
            &params(&[("limit", json!(10)), ("offset", json!(20))]),
        ) {
            Ok(script) => script,
            Err(e) => panic!("build failed: {e}"),
        };
        assert!(script.contains("set startIdx to 21"));
        assert!(script.contains("set endIdx to 30"));
    }

    #[test]
    fn calendar_create_event_requires_the_date_range() {
        let err = build_script(
            "calendar.create_event",
            "com.apple.iCal",
            &params(&[("title", json!("Standup"))]),
        );
        assert!(matches!(err, Err(ExecutorError::InvalidRequest(_))));
    }

    #[test]
    fn mail_compose_draft_builds_an_outgoing_message() {
        let script = match build_script(
            "mail.compose_draft",
            "com.apple.mail",
            &params(&[("to", json!("ops@example.com")), ("subject", json!("Hi"))]),
        ) {
            Ok(script) => script,
            Err(e) => panic!("build failed: {e}"),
        };
        assert!(script.contains("make new outgoing message"));
        assert!(script.contains(r#"address:"ops@example.com""#));
    }
}
