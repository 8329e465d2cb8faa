//! Which classes a teacher must account for on a given day.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use tempo_core::dates::weekday_index;
use tempo_core::entities::{ScheduleSlot, ScheduledClass};
use tempo_core::enums::ClassRole;

/// One class on a teacher's agenda for the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayClassItem {
    pub class: ScheduledClass,
    pub role: ClassRole,
    pub can_take_attendance: bool,
    pub can_edit_class: bool,
    /// Included because of its one-off emergency date.
    pub is_emergency: bool,
    /// The weekly slot that matched, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<ScheduleSlot>,
}

/// Classes scheduled on `date` that `teacher_id` teaches or collaborates on,
/// ordered by start time then name.
///
/// Slots whose day name cannot be read never match; a class without any
/// usable slot or emergency date is skipped.
#[must_use]
pub fn classes_for_day(
    catalog: &[ScheduledClass],
    date: NaiveDate,
    teacher_id: &str,
) -> Vec<DayClassItem> {
    let weekday = weekday_index(date);

    let mut items: Vec<DayClassItem> = catalog
        .iter()
        .filter_map(|class| {
            let slot = class
                .schedule
                .iter()
                .find(|s| s.weekday() == Some(weekday))
                .cloned();
            let is_emergency = class.emergency_date == Some(date);
            if slot.is_none() && !is_emergency {
                return None;
            }

            let (role, can_take_attendance, can_edit_class) = if class.teacher_id == teacher_id {
                (ClassRole::Primary, true, true)
            } else {
                let entry = class.collaborator(teacher_id)?;
                (
                    ClassRole::Collaborator,
                    entry.can_take_attendance(),
                    entry.can_edit_class(),
                )
            };

            Some(DayClassItem {
                class: class.clone(),
                role,
                can_take_attendance,
                can_edit_class,
                is_emergency,
                slot,
            })
        })
        .collect();

    items.sort_by(|a, b| {
        let start = |i: &DayClassItem| i.slot.as_ref().and_then(|s| s.start.clone());
        start(a)
            .cmp(&start(b))
            .then_with(|| a.class.name.cmp(&b.class.name))
            .then_with(|| a.class.id.cmp(&b.class.id))
    });
    items
}

/// Decode raw catalog entries, skipping (and logging) the ones that lack an
/// identity.
#[must_use]
pub fn decode_catalog(entries: Vec<Value>) -> Vec<ScheduledClass> {
    entries
        .into_iter()
        .filter_map(|entry| match ScheduledClass::from_json(entry) {
            Ok(class) => Some(class),
            Err(error) => {
                tracing::warn!(%error, "skipping catalog entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn class(value: Value) -> ScheduledClass {
        ScheduledClass::from_json(value).unwrap()
    }

    // 2025-03-02 is a Sunday, 2025-03-04 a Tuesday.
    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[rstest]
    #[case("martes")]
    #[case("Martes")]
    #[case("MARTES")]
    #[case(" martes ")]
    #[case("Tuesday")]
    fn day_name_variants_match(#[case] day: &str) {
        let catalog = vec![class(json!({
            "id": "c1", "name": "Piano", "teacherId": "t1",
            "schedule": [{"day": day}]
        }))];
        assert_eq!(classes_for_day(&catalog, date(4), "t1").len(), 1);
        assert!(classes_for_day(&catalog, date(2), "t1").is_empty());
    }

    #[rstest]
    #[case("Miércoles")]
    #[case("Mie\u{301}rcoles")]
    #[case("miercoles")]
    fn accented_day_names_match(#[case] day: &str) {
        let catalog = vec![class(json!({
            "id": "c1", "teacherId": "t1", "schedule": [day]
        }))];
        assert_eq!(classes_for_day(&catalog, date(5), "t1").len(), 1);
    }

    #[test]
    fn emergency_date_includes_off_schedule_class() {
        let catalog = vec![class(json!({
            "id": "makeup", "teacherId": "t1", "emergencyDate": "20250302"
        }))];
        let items = classes_for_day(&catalog, date(2), "t1");
        assert_eq!(items.len(), 1);
        assert!(items[0].is_emergency);
        assert!(items[0].slot.is_none());
        assert!(classes_for_day(&catalog, date(4), "t1").is_empty());
    }

    #[test]
    fn collaborator_roles_and_permissions() {
        let catalog = vec![
            class(json!({
                "id": "choir", "teacherId": "t1", "schedule": ["martes"],
                "collaborators": ["t2", {"teacherId": "t3", "permissions": {"canTakeAttendance": false}}]
            })),
            class(json!({"id": "violin", "teacherId": "t9", "schedule": ["martes"]})),
        ];

        let primary = classes_for_day(&catalog, date(4), "t1");
        assert_eq!(primary.len(), 1);
        assert_eq!(primary[0].role, ClassRole::Primary);
        assert!(primary[0].can_take_attendance && primary[0].can_edit_class);

        let bare = &classes_for_day(&catalog, date(4), "t2")[0];
        assert_eq!(bare.role, ClassRole::Collaborator);
        assert!(bare.can_take_attendance);
        assert!(!bare.can_edit_class);

        let restricted = &classes_for_day(&catalog, date(4), "t3")[0];
        assert!(!restricted.can_take_attendance);

        assert!(classes_for_day(&catalog, date(4), "nobody").is_empty());
    }

    #[test]
    fn malformed_schedule_is_excluded_not_errored() {
        let catalog = vec![
            class(json!({"id": "a", "teacherId": "t1", "schedule": "every tuesday"})),
            class(json!({"id": "b", "teacherId": "t1", "schedule": [{"day": "funday"}]})),
            class(json!({"id": "c", "teacherId": "t1"})),
        ];
        assert!(classes_for_day(&catalog, date(4), "t1").is_empty());
    }

    #[test]
    fn ordered_by_start_time() {
        let catalog = vec![
            class(json!({"id": "late", "name": "B", "teacherId": "t1",
                "schedule": [{"day": "martes", "start": "18:00"}]})),
            class(json!({"id": "early", "name": "A", "teacherId": "t1",
                "schedule": [{"day": "martes", "start": "09:00"}]})),
        ];
        let items = classes_for_day(&catalog, date(4), "t1");
        let ids: Vec<&str> = items.iter().map(|i| i.class.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[test]
    fn decode_catalog_skips_entries_without_identity() {
        let decoded = decode_catalog(vec![
            json!({"id": "ok", "teacherId": "t1"}),
            json!({"name": "no id"}),
            json!("not an object"),
        ]);
        assert_eq!(decoded.len(), 1);
    }
}
