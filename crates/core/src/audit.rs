//! Audit trail constants and snapshot redaction.
//!
//! The audit log is append-only and is never read by control flow; these
//! helpers keep the action vocabulary consistent between writers.

/// Known actions for audit log entries.
pub mod actions {
    pub const CREATE: &str = "CREATE";
    pub const UPDATE: &str = "UPDATE";
    pub const DELETE: &str = "DELETE";
    pub const SUBSCRIBE: &str = "SUBSCRIBE";
    pub const UNSUBSCRIBE: &str = "UNSUBSCRIBE";
}

/// Entity type labels stored alongside audit entries.
pub mod entity_types {
    pub const USER: &str = "user";
    pub const MANAGED_PLAYLIST: &str = "managed_playlist";
    pub const SOURCE_PLAYLIST: &str = "source_playlist";
    pub const SUBSCRIPTION: &str = "subscription";
}

/// Keys whose values never reach the audit table.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "authorization",
    "credential",
];

/// Redact sensitive keys from a JSON snapshot, recursing into nested values.
///
/// Any object key containing one of [`SENSITIVE_FIELDS`] (case-insensitive)
/// has its value replaced with `"[REDACTED]"`.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let redacted = map
                .iter()
                .map(|(key, val)| {
                    let lower = key.to_lowercase();
                    let new_val = if SENSITIVE_FIELDS.iter().any(|f| lower.contains(f)) {
                        serde_json::Value::String("[REDACTED]".to_string())
                    } else {
                        redact_sensitive_fields(val)
                    };
                    (key.clone(), new_val)
                })
                .collect();
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_top_level_and_nested_keys() {
        let input = json!({
            "name": "Road trip",
            "access_token": "abc",
            "nested": { "refresh_token": "def", "keep": 1 },
            "list": [{ "client_secret": "x" }]
        });
        let out = redact_sensitive_fields(&input);
        assert_eq!(out["name"], "Road trip");
        assert_eq!(out["access_token"], "[REDACTED]");
        assert_eq!(out["nested"]["refresh_token"], "[REDACTED]");
        assert_eq!(out["nested"]["keep"], 1);
        assert_eq!(out["list"][0]["client_secret"], "[REDACTED]");
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(redact_sensitive_fields(&json!(42)), json!(42));
        assert_eq!(redact_sensitive_fields(&json!(null)), json!(null));
    }
}
