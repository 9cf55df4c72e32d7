use serde_json::Value as JsonValue;

const REDACTED: &str = "[REDACTED]";

/// Masks contact details and credentials before a payload is logged.
pub fn redact_sensitive_data(data: &JsonValue) -> JsonValue {
    match data {
        JsonValue::Object(map) => {
            let mut redacted_map = serde_json::Map::new();
            for (key, val) in map {
                let redacted_val = if is_sensitive_field(key) {
                    redact_scalar(val)
                } else {
                    redact_sensitive_data(val)
                };
                redacted_map.insert(key.clone(), redacted_val);
            }
            JsonValue::Object(redacted_map)
        }
        JsonValue::Array(arr) => JsonValue::Array(arr.iter().map(redact_sensitive_data).collect()),
        _ => data.clone(),
    }
}

/// Keeps the last four characters of a token so log lines stay correlatable.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

fn is_sensitive_field(field_name: &str) -> bool {
    let lower = field_name.to_lowercase();
    matches!(
        lower.as_str(),
        "call" | "phone" | "mobile" | "email" | "message" | "token" | "password" | "authorization"
    )
}

fn redact_scalar(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::String(s) if !s.is_empty() => JsonValue::String(REDACTED.to_string()),
        JsonValue::Number(_) => JsonValue::String(REDACTED.to_string()),
        _ => value.clone(),
    }
}
