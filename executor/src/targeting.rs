//! App-target validation.

use regex_lite::Regex;
use std::sync::OnceLock;

/// Bundle ids follow reverse-DNS convention: `com.apple.Notes`.
pub fn validate_bundle_id(bundle_id: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z][a-zA-Z0-9\-]*(\.[a-zA-Z][a-zA-Z0-9\-]*)+$").ok()
    });
    match pattern {
        Some(re) => re.is_match(bundle_id),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reverse_dns_identifiers() {
        for id in [
            "com.apple.Notes",
            "com.apple.systemevents",
            "org.mozilla.firefox-nightly",
        ] {
            assert!(validate_bundle_id(id), "{id} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for id in [
            "",
            "Notes",
            "com.",
            ".apple",
            "com..apple",
            "com.apple.Notes; rm -rf /",
            "1com.apple.Notes",
        ] {
            assert!(!validate_bundle_id(id), "{id:?} should be invalid");
        }
    }
}
