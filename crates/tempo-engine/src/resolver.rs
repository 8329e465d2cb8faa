//! Status resolution.
//!
//! Turns a session's categorical lists and justification set into one
//! canonical status per student. Precedence, highest first:
//!
//! 1. approved justification → `Justified`
//! 2. in `present` → `Present`
//! 3. in `late` → `Late`
//! 4. in `absent` → `Absent`
//! 5. anything else → `Absent`
//!
//! A student listed in several categories (a race in the source data) is
//! resolved by the same order. Resolution is total and has no side effects.

use std::collections::BTreeMap;

use tempo_core::entities::Session;
use tempo_core::enums::CanonicalStatus;

/// Canonical status of every student referenced by a session.
pub type StatusMap = BTreeMap<String, CanonicalStatus>;

/// Resolve every student referenced by the lists, justifications, or roster.
#[must_use]
pub fn resolve(session: &Session) -> StatusMap {
    session
        .referenced_students()
        .into_iter()
        .map(|student| (student.to_string(), resolve_student(session, student)))
        .collect()
}

/// Resolve one student. Students the session never mentions are `Absent`.
#[must_use]
pub fn resolve_student(session: &Session, student_id: &str) -> CanonicalStatus {
    let listed = |list: &[String]| list.iter().any(|s| s == student_id);

    if session
        .justification_for(student_id)
        .is_some_and(|j| j.approved)
    {
        CanonicalStatus::Justified
    } else if listed(&session.present) {
        CanonicalStatus::Present
    } else if listed(&session.late) {
        CanonicalStatus::Late
    } else {
        // Listed as absent, or not recorded at all.
        CanonicalStatus::Absent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn session(value: serde_json::Value) -> Session {
        Session::from_json(value).unwrap()
    }

    #[test]
    fn mixed_categories_with_approved_justification() {
        let s = session(json!({
            "classId": "c1", "date": "2025-03-04",
            "present": ["s1"], "absent": ["s2"], "late": ["s3"],
            "justifications": [{"id": "s3", "approved": true}]
        }));
        let expected: StatusMap = [
            ("s1".to_string(), CanonicalStatus::Present),
            ("s2".to_string(), CanonicalStatus::Absent),
            ("s3".to_string(), CanonicalStatus::Justified),
        ]
        .into_iter()
        .collect();
        assert_eq!(resolve(&s), expected);
    }

    #[test]
    fn duplicate_membership_uses_precedence() {
        let s = session(json!({
            "classId": "c1", "date": "2025-03-04",
            "present": ["s1", "s2"], "late": ["s1", "s3"], "absent": ["s2", "s3", "s4"]
        }));
        let map = resolve(&s);
        assert_eq!(map["s1"], CanonicalStatus::Present);
        assert_eq!(map["s2"], CanonicalStatus::Present);
        assert_eq!(map["s3"], CanonicalStatus::Late);
        assert_eq!(map["s4"], CanonicalStatus::Absent);
    }

    #[test]
    fn approved_justification_beats_present() {
        let s = session(json!({
            "classId": "c1", "date": "2025-03-04",
            "present": ["s1"],
            "justifications": {"s1": {"status": "approved"}}
        }));
        assert_eq!(resolve_student(&s, "s1"), CanonicalStatus::Justified);
    }

    #[test]
    fn unapproved_justification_does_not_change_status() {
        let s = session(json!({
            "classId": "c1", "date": "2025-03-04",
            "late": ["s1"],
            "justifications": [{"id": "s1", "approved": false}, {"id": "s2", "status": "pending"}]
        }));
        let map = resolve(&s);
        assert_eq!(map["s1"], CanonicalStatus::Late);
        // Referenced only by a pending justification: unrecorded, so absent.
        assert_eq!(map["s2"], CanonicalStatus::Absent);
    }

    #[test]
    fn unlisted_roster_students_default_to_absent() {
        let s = session(json!({
            "classId": "c1", "date": "2025-03-04",
            "present": ["s1"], "roster": ["s1", "s2"]
        }));
        let map = resolve(&s);
        assert_eq!(map.len(), 2);
        assert_eq!(map["s2"], CanonicalStatus::Absent);
        assert_eq!(resolve_student(&s, "never-seen"), CanonicalStatus::Absent);
    }
}
