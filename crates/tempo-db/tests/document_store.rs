//! `TempoDb` as a document store and class catalog, on its own and behind
//! an `AttendanceService`.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use tempo_config::TempoConfig;
use tempo_core::entities::{MutationKind, Session, SessionKey};
use tempo_core::enums::CanonicalStatus;
use tempo_db::TempoDb;
use tempo_db::error::DatabaseError;
use tempo_engine::clock::ManualClock;
use tempo_engine::resolver::resolve_student;
use tempo_engine::store::{ClassCatalog, DocumentStore};
use tempo_engine::{AttendanceService, DateRange, StoreError};

async fn db() -> TempoDb {
    TempoDb::open_local(":memory:").await.unwrap()
}

fn key(class: &str, date: &str) -> SessionKey {
    SessionKey::parse(class, date).unwrap()
}

fn session(class: &str, date: &str, teacher: &str, version: u64) -> Session {
    let mut session = Session::skeleton(key(class, date));
    session.teacher_id = Some(teacher.to_string());
    session.present = vec!["s1".to_string()];
    session.version = version;
    session.updated_at = Some(Utc.with_ymd_and_hms(2025, 3, 4, 17, 0, 0).unwrap());
    session
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn missing_session_reads_as_none() {
    let db = db().await;
    assert!(db.get_session(&key("c1", "2025-03-04")).await.unwrap().is_none());
}

#[tokio::test]
async fn create_then_update_with_matching_version() {
    let db = db().await;
    let first = session("c1", "2025-03-04", "t1", 1);
    db.put_session(&first, 0).await.unwrap();
    assert_eq!(db.get_session(&first.key).await.unwrap().unwrap(), first);

    let mut second = first.clone();
    second.absent = vec!["s2".to_string()];
    second.version = 2;
    db.put_session(&second, 1).await.unwrap();
    assert_eq!(db.get_session(&first.key).await.unwrap().unwrap(), second);
}

#[tokio::test]
async fn creating_an_existing_session_conflicts() {
    let db = db().await;
    db.put_session(&session("c1", "2025-03-04", "t1", 1), 0)
        .await
        .unwrap();

    let err = db
        .put_session(&session("c1", "2025-03-04", "t2", 1), 0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DatabaseError::VersionConflict { expected: 0, found: 1, .. }
    ));
}

#[rstest]
#[case::stale(1)]
#[case::ahead(5)]
#[tokio::test]
async fn mismatched_version_conflicts(#[case] expected: u64) {
    let db = db().await;
    let mut s = session("c1", "2025-03-04", "t1", 1);
    db.put_session(&s, 0).await.unwrap();
    s.version = 2;
    db.put_session(&s, 1).await.unwrap();

    s.version = expected + 1;
    let err = db.put_document(&s, expected).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::VersionConflict {
            key: "c1/2025-03-04".to_string(),
            expected,
            found: 2,
        }
    );
}

#[tokio::test]
async fn updating_a_deleted_session_reports_zero() {
    let db = db().await;
    let s = session("c1", "2025-03-04", "t1", 1);
    db.put_session(&s, 0).await.unwrap();
    assert!(db.delete_session(&s.key).await.unwrap());
    assert!(!db.delete_session(&s.key).await.unwrap());

    let err = db.put_session(&s, 1).await.unwrap_err();
    assert!(matches!(err, DatabaseError::VersionConflict { found: 0, .. }));
}

#[tokio::test]
async fn range_query_filters_and_orders() {
    let db = db().await;
    for s in [
        session("piano", "2025-03-11", "t1", 1),
        session("choir", "2025-03-04", "t2", 1),
        session("piano", "2025-03-04", "t1", 1),
        session("piano", "2025-04-01", "t1", 1),
    ] {
        db.put_session(&s, 0).await.unwrap();
    }

    let all = db
        .query_by_date_range(day("2025-03-01"), day("2025-03-31"), None)
        .await
        .unwrap();
    let keys: Vec<String> = all.iter().map(|s| s.key.to_string()).collect();
    assert_eq!(
        keys,
        vec!["choir/2025-03-04", "piano/2025-03-04", "piano/2025-03-11"]
    );

    let t1 = db
        .query_by_date_range(day("2025-03-01"), day("2025-03-31"), Some("t1"))
        .await
        .unwrap();
    assert_eq!(t1.len(), 2);
    assert!(t1.iter().all(|s| s.teacher_id.as_deref() == Some("t1")));

    // Bounds are inclusive.
    let edge = db
        .query_by_date_range(day("2025-03-04"), day("2025-03-04"), None)
        .await
        .unwrap();
    assert_eq!(edge.len(), 2);
}

#[tokio::test]
async fn catalog_import_skips_bad_entries_and_upserts() {
    let db = db().await;
    let imported = db
        .import_catalog(vec![
            json!({ "id": "piano", "name": "Piano", "teacherId": "t1", "schedule": ["Martes"] }),
            json!({ "name": "no id" }),
            json!({ "id": "choir", "teacherId": "t2" }),
        ])
        .await
        .unwrap();
    assert_eq!(imported, 2);

    db.import_catalog(vec![
        json!({ "id": "piano", "name": "Piano II", "teacherId": "t3" }),
    ])
    .await
    .unwrap();

    let classes = ClassCatalog::list_classes(&db).await.unwrap();
    let ids: Vec<&str> = classes.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["choir", "piano"]);
    assert_eq!(classes[1].teacher_id, "t3");
}

#[tokio::test]
async fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attendance.db");
    let path = path.to_str().unwrap();

    let s = session("c1", "2025-03-04", "t1", 1);
    {
        let db = TempoDb::open_local(path).await.unwrap();
        db.put_session(&s, 0).await.unwrap();
    }
    let db = TempoDb::open_local(path).await.unwrap();
    assert_eq!(db.get_session(&s.key).await.unwrap().unwrap(), s);
}

#[tokio::test]
async fn service_records_and_reports_over_libsql() {
    let mut config = TempoConfig::default();
    config.queue.journal_path = String::new();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 3, 4, 17, 0, 0).unwrap(),
    ));
    let svc = AttendanceService::new(db().await, &config, clock);
    let k = key("piano", "2025-03-04");

    svc.start_session(&k, Some("t1".to_string()), vec!["s1".into(), "s2".into()])
        .await
        .unwrap();
    svc.record(k.clone(), MutationKind::set_status("s1", CanonicalStatus::Present))
        .await
        .unwrap();
    let outcome = svc
        .record(k.clone(), MutationKind::justify("s2", "dentist"))
        .await
        .unwrap();
    assert!(!outcome.is_queued());

    let stored = svc.store().get_session(&k).await.unwrap().unwrap();
    assert_eq!(stored.version, 3);
    assert_eq!(resolve_student(&stored, "s2"), CanonicalStatus::Justified);

    // Not on the roster: rejected by the session, nothing written.
    assert!(
        svc.record(k.clone(), MutationKind::set_status("s9", CanonicalStatus::Present))
            .await
            .is_err()
    );
    assert_eq!(svc.store().get_session(&k).await.unwrap().unwrap().version, 3);

    let report = svc
        .report(DateRange::parse("2025-03-01", "2025-03-31").unwrap(), Some("t1"))
        .await
        .unwrap();
    assert_eq!(report.sessions, 1);
    assert_eq!(report.per_student["s1"].tally.present, 1);
    assert_eq!(report.per_student["s2"].tally.justified, 1);
}
