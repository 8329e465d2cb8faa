use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::CoreError;

/// A record asserting that a student's absence or lateness is excused.
///
/// Only approved justifications change canonical status.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Justification {
    pub student_id: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_ref: Option<String>,
    #[serde(default)]
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Normalize any stored justification shape into a list keyed by student.
///
/// Accepted shapes:
/// - `null` or missing: no justifications
/// - a list of objects (`{id | studentId | student_id, reason, approved | status, ...}`)
/// - an object map `{studentId: {...} | true | "reason"}`
///
/// Entries without a student ID are dropped. A later entry for the same
/// student replaces an earlier one, keeping the first position.
///
/// # Errors
///
/// Returns `CoreError::Validation` when the value is a scalar, which cannot
/// describe any justification.
pub fn normalize_justifications(value: &Value) -> Result<Vec<Justification>, CoreError> {
    let mut out: Vec<Justification> = Vec::new();
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                if let Some(j) = from_entry(None, item) {
                    upsert(&mut out, j);
                }
            }
        }
        Value::Object(map) => {
            for (student_id, item) in map {
                if let Some(j) = from_entry(Some(student_id), item) {
                    upsert(&mut out, j);
                }
            }
        }
        other => {
            return Err(CoreError::validation(format!(
                "justifications must be a list or a map, got {other}"
            )));
        }
    }
    Ok(out)
}

fn upsert(list: &mut Vec<Justification>, j: Justification) {
    match list.iter_mut().find(|e| e.student_id == j.student_id) {
        Some(existing) => *existing = j,
        None => list.push(j),
    }
}

fn from_entry(map_key: Option<&str>, item: &Value) -> Option<Justification> {
    let (student_id, reason, attachment_ref, approved, timestamp) = match item {
        Value::Object(obj) => {
            let student_id = ["studentId", "student_id", "id"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(id_string))
                .or_else(|| map_key.map(str::to_string));
            let reason = ["reason", "motivo"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str))
                .unwrap_or_default()
                .to_string();
            let attachment_ref = ["attachmentRef", "attachment_ref", "attachment"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str))
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            let approved = is_approved(obj.get("approved")) || is_approved(obj.get("status"));
            let timestamp = ["timestamp", "createdAt"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str))
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc));
            (student_id, reason, attachment_ref, approved, timestamp)
        }
        // Map form only: `{ "s1": true }` or `{ "s1": "doctor's note" }`.
        Value::Bool(approved) => (map_key.map(str::to_string), String::new(), None, *approved, None),
        Value::String(reason) => (map_key.map(str::to_string), reason.clone(), None, false, None),
        _ => return None,
    };

    let student_id = student_id?.trim().to_string();
    if student_id.is_empty() {
        return None;
    }
    Some(Justification {
        student_id,
        reason,
        attachment_ref,
        approved,
        timestamp,
    })
}

fn is_approved(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("approved") || s.eq_ignore_ascii_case("true")
        }
        _ => false,
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `deserialize_with` adapter used by the session document.
pub(crate) fn deserialize_justifications<'de, D>(d: D) -> Result<Vec<Justification>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?.unwrap_or(Value::Null);
    normalize_justifications(&value).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn list_and_map_normalize_identically() {
        let list = json!([
            {"id": "s3", "approved": true, "reason": "doctor"},
            {"studentId": "s4", "status": "pending"}
        ]);
        let map = json!({
            "s3": {"approved": true, "reason": "doctor"},
            "s4": {"status": "pending"}
        });
        assert_eq!(
            normalize_justifications(&list).unwrap(),
            normalize_justifications(&map).unwrap()
        );
    }

    #[test]
    fn status_approved_counts_as_approved() {
        let value = json!([{"id": "s1", "status": "Approved"}]);
        let out = normalize_justifications(&value).unwrap();
        assert!(out[0].approved);
    }

    #[test]
    fn map_shorthand_values() {
        let value = json!({"s1": true, "s2": "bus strike", "s3": 7});
        let out = normalize_justifications(&value).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out[0].approved);
        assert_eq!(out[1].reason, "bus strike");
        assert!(!out[1].approved);
    }

    #[test]
    fn entries_without_student_are_dropped() {
        let value = json!([{"reason": "no id"}, {"id": "  "}, "s9", {"id": 12, "approved": true}]);
        let out = normalize_justifications(&value).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].student_id, "12");
    }

    #[test]
    fn later_entry_replaces_earlier() {
        let value = json!([
            {"id": "s1", "approved": false, "reason": "first"},
            {"id": "s2"},
            {"id": "s1", "approved": true, "reason": "second"}
        ]);
        let out = normalize_justifications(&value).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].student_id, "s1");
        assert_eq!(out[0].reason, "second");
        assert!(out[0].approved);
    }

    #[test]
    fn scalar_is_rejected() {
        assert!(matches!(
            normalize_justifications(&json!("s1")),
            Err(CoreError::Validation(_))
        ));
        assert!(normalize_justifications(&Value::Null).unwrap().is_empty());
    }
}
