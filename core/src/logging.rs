//! Log hygiene helpers. The binaries install their own `tracing` subscriber
//! (stderr only — stdout carries the protocol); this module supplies the
//! redaction pass applied to parameter maps before they are logged.

use serde_json::Map;
use serde_json::Value;

pub const REDACTED: &str = "[REDACTED]";

/// Replace the values of configured keys, recursing into nested objects.
pub fn redact(map: &Map<String, Value>, redact_keys: &[String]) -> Map<String, Value> {
    if redact_keys.is_empty() {
        return map.clone();
    }

    map.iter()
        .map(|(key, value)| {
            if redact_keys.iter().any(|k| k == key) {
                (key.clone(), Value::String(REDACTED.to_string()))
            } else if let Value::Object(inner) = value {
                (key.clone(), Value::Object(redact(inner, redact_keys)))
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}
