//! AppleScript escape handlers and the JSON safety net.
//!
//! Templates assemble pseudo-JSON strings inside AppleScript, escaping
//! embedded values with the `jsonEsc` handler appended to every script.
//! Because that escaping runs in an untrusted interpreter, the executor
//! re-parses and re-serializes the resulting text before it crosses the
//! transport, so malformed escapes cannot leak into the response document.

use serde_json::Map;
use serde_json::Value;

/// AppleScript handlers that escape string values for safe JSON embedding.
/// Appended to every template script.
///
/// `jsonEsc(s)` escapes: \ -> \\, " -> \", CR -> \n, LF -> \n, tab -> \t.
/// `replaceText(theString, old, new)` is the text-item-delimiter helper.
const HANDLERS: &str = r#"

on jsonEsc(s)
    set s to s as text
    set s to my replaceText(s, "\\", "\\\\")
    set s to my replaceText(s, "\"", "\\" & quote)
    set s to my replaceText(s, return, "\\n")
    set s to my replaceText(s, linefeed, "\\n")
    set s to my replaceText(s, tab, "\\t")
    return s
end jsonEsc

on replaceText(theString, old, new)
    set AppleScript's text item delimiters to old
    set theItems to every text item of theString
    set AppleScript's text item delimiters to new
    set theString to theItems as string
    set AppleScript's text item delimiters to ""
    return theString
end replaceText
"#;

/// Append the escape handlers to a rendered template script.
pub fn wrap_script(script: &str) -> String {
    format!("{script}{HANDLERS}")
}

/// Escape a value interpolated into a script at build time.
pub fn esc(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Re-serialize a result whose `value` looks like JSON.
///
/// If `value` is a string starting with `{` or `[` and parses as JSON, it is
/// replaced with a canonical re-serialization (sorted keys); otherwise the
/// map is returned unchanged and the raw text travels as-is.
pub fn reserialize(result: Map<String, Value>) -> Map<String, Value> {
    let Some(Value::String(text)) = result.get("value") else {
        return result;
    };
    if !text.starts_with('{') && !text.starts_with('[') {
        return result;
    }

    let Ok(parsed) = serde_json::from_str::<Value>(text) else {
        return result;
    };
    let Ok(normalized) = serde_json::to_string(&parsed) else {
        return result;
    };

    let mut out = Map::new();
    out.insert("value".to_string(), Value::String(normalized));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn result_with_value(value: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("value".to_string(), Value::String(value.to_string()));
        map
    }

    #[test]
    fn wrapped_scripts_carry_the_handlers() {
        let wrapped = wrap_script("tell application id \"com.apple.Notes\"\nend tell");
        assert!(wrapped.starts_with("tell application"));
        assert!(wrapped.contains("on jsonEsc(s)"));
        assert!(wrapped.contains("on replaceText(theString, old, new)"));
    }

    #[test]
    fn esc_handles_backslashes_and_quotes() {
        assert_eq!(esc(r#"say "hi" \ bye"#), r#"say \"hi\" \\ bye"#);
    }

    #[test]
    fn json_looking_values_are_reserialized() {
        let input = result_with_value(r#"{"name": "note \"quoted\"", "count": 2}"#);
        let out = reserialize(input);
        let value = match out.get("value") {
            Some(Value::String(s)) => s,
            other => panic!("expected string value, got {other:?}"),
        };
        // Canonical form: parseable, same content.
        let parsed: Value = match serde_json::from_str(value) {
            Ok(v) => v,
            Err(e) => panic!("reserialized value must parse: {e}"),
        };
        assert_eq!(parsed["count"], json!(2));
        assert_eq!(parsed["name"], json!("note \"quoted\""));
    }

    #[test]
    fn arrays_are_reserialized_too() {
        let out = reserialize(result_with_value(r#"[1, 2, 3]"#));
        assert_eq!(out.get("value"), Some(&json!("[1,2,3]")));
    }

    #[test]
    fn non_json_values_pass_through_unchanged() {
        let input = result_with_value("plain text result");
        assert_eq!(reserialize(input.clone()), input);
    }

    #[test]
    fn broken_pseudo_json_passes_through_for_the_caller_to_see() {
        let input = result_with_value(r#"{"name": "unterminated"#);
        assert_eq!(reserialize(input.clone()), input);
    }

    #[test]
    fn results_without_a_string_value_pass_through() {
        let mut map = Map::new();
        map.insert("intValue".to_string(), json!(7));
        assert_eq!(reserialize(map.clone()), map);
    }
}
