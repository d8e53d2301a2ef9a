//! Field coercions shared by the transforms.
//!
//! Every helper is total: an absent or malformed field yields a defined
//! default instead of an error.

use crate::types::Record;
use serde_json::{Number, Value};

/// Convert a `json!` object literal into a [`Record`].
pub(crate) fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

/// The field as-is, `null` when absent.
pub(crate) fn opt(item: &Value, key: &str) -> Value {
    item.get(key).cloned().unwrap_or(Value::Null)
}

/// The field, or `default` when absent or null.
pub(crate) fn or_default(item: &Value, key: &str, default: &str) -> Value {
    match item.get(key) {
        None | Some(Value::Null) => Value::String(default.to_string()),
        Some(value) => value.clone(),
    }
}

/// Monetary amount: absent or null is `0`, numbers pass through, numeric
/// strings are parsed and anything unparseable is `null`.
pub(crate) fn amount(item: &Value, key: &str) -> Value {
    match item.get(key) {
        None | Some(Value::Null) => Value::from(0.0),
        Some(Value::Number(n)) => n.as_f64().map_or(Value::Null, float),
        Some(Value::String(raw)) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map_or(Value::Null, float),
        Some(_) => Value::Null,
    }
}

fn float(n: f64) -> Value {
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// The field rendered as a string id; `null` when absent.
pub(crate) fn string_id(item: &Value, key: &str) -> Value {
    match item.get(key) {
        None | Some(Value::Null) => Value::Null,
        Some(Value::String(s)) => Value::String(s.clone()),
        Some(other) => Value::String(other.to_string()),
    }
}

/// Integer view of a numeric or numeric-string field.
pub(crate) fn int(item: &Value, key: &str) -> Option<i64> {
    match item.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Map a numeric status id to its label, `"unknown"` otherwise.
pub(crate) fn status_label(item: &Value, key: &str, labels: &[(i64, &str)]) -> Value {
    let label = int(item, key)
        .and_then(|id| labels.iter().find(|(code, _)| *code == id))
        .map_or("unknown", |(_, label)| *label);
    Value::String(label.to_string())
}

/// Whether a group-id list contains `group`. The list may be a JSON array of
/// numbers or strings, or a comma-separated string.
pub(crate) fn has_group(item: &Value, key: &str, group: i64) -> bool {
    match item.get(key) {
        Some(Value::Array(ids)) => ids.iter().any(|id| match id {
            Value::Number(n) => n.as_i64() == Some(group),
            Value::String(s) => s.trim().parse::<i64>().ok() == Some(group),
            _ => false,
        }),
        Some(Value::String(list)) => list
            .split(',')
            .any(|id| id.trim().parse::<i64>().ok() == Some(group)),
        _ => false,
    }
}

/// Boolean field, `false` when absent.
pub(crate) fn flag(item: &Value, key: &str) -> bool {
    match item.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        Some(Value::String(s)) => matches!(s.as_str(), "true" | "1"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn amount_coercion() {
        let item = json!({
            "gross": "120.50",
            "net": 100,
            "bad": "n/a",
            "nothing": null,
        });
        assert_eq!(amount(&item, "gross"), json!(120.5));
        assert_eq!(amount(&item, "net"), json!(100.0));
        assert_eq!(amount(&item, "bad"), Value::Null);
        assert_eq!(amount(&item, "nothing"), json!(0.0));
        assert_eq!(amount(&item, "absent"), json!(0.0));
    }

    #[test]
    fn status_labels() {
        let labels = [(7, "draft"), (9, "paid")];
        assert_eq!(status_label(&json!({"s": 9}), "s", &labels), "paid");
        assert_eq!(status_label(&json!({"s": "7"}), "s", &labels), "draft");
        assert_eq!(status_label(&json!({"s": 42}), "s", &labels), "unknown");
        assert_eq!(status_label(&json!({}), "s", &labels), "unknown");
    }

    #[test]
    fn group_membership_forms() {
        assert!(has_group(&json!({"g": [1, 3]}), "g", 1));
        assert!(has_group(&json!({"g": ["2"]}), "g", 2));
        assert!(has_group(&json!({"g": "1,2"}), "g", 2));
        assert!(!has_group(&json!({"g": "12"}), "g", 1));
        assert!(!has_group(&json!({}), "g", 1));
    }

    #[test]
    fn defaults_and_ids() {
        let item = json!({"code": null, "id": 17, "uid": "b-1"});
        assert_eq!(or_default(&item, "code", "CHF"), "CHF");
        assert_eq!(string_id(&item, "id"), "17");
        assert_eq!(string_id(&item, "uid"), "b-1");
        assert_eq!(string_id(&item, "missing"), Value::Null);
        assert_eq!(opt(&item, "missing"), Value::Null);
    }

    #[test]
    fn flags() {
        assert!(flag(&json!({"f": true}), "f"));
        assert!(flag(&json!({"f": 1}), "f"));
        assert!(!flag(&json!({"f": "no"}), "f"));
        assert!(!flag(&json!({}), "f"));
    }
}
