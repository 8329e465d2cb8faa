//! Row decoding helpers.

use serde_json::Value;

use tempo_core::entities::{ScheduledClass, Session};

use crate::error::DatabaseError;

/// SQLite integers are signed; versions are not.
pub fn version_to_sql(version: u64) -> Result<i64, DatabaseError> {
    i64::try_from(version)
        .map_err(|_| DatabaseError::InvalidState(format!("version {version} out of range")))
}

pub fn version_from_sql(raw: i64) -> Result<u64, DatabaseError> {
    u64::try_from(raw).map_err(|_| DatabaseError::InvalidState(format!("negative version {raw}")))
}

/// Decode a stored session document. The `version` column is authoritative
/// over whatever the document body claims.
pub fn decode_session(document: &str, version: i64) -> Result<Session, DatabaseError> {
    let value: Value = serde_json::from_str(document)
        .map_err(|e| DatabaseError::Query(format!("Invalid JSON in session document: {e}")))?;
    let mut session = Session::from_json(value)
        .map_err(|e| DatabaseError::InvalidState(format!("stored session: {e}")))?;
    session.version = version_from_sql(version)?;
    Ok(session)
}

pub fn encode_session(session: &Session) -> Result<String, DatabaseError> {
    let value = session
        .to_json()
        .map_err(|e| DatabaseError::InvalidState(format!("encode session: {e}")))?;
    Ok(value.to_string())
}

pub fn decode_class(document: &str) -> Result<ScheduledClass, DatabaseError> {
    let value: Value = serde_json::from_str(document)
        .map_err(|e| DatabaseError::Query(format!("Invalid JSON in class document: {e}")))?;
    ScheduledClass::from_json(value)
        .map_err(|e| DatabaseError::InvalidState(format!("stored class: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_column_wins() {
        let session = decode_session(
            r#"{"classId":"c1","date":"2025-03-04","present":["s1"],"version":1}"#,
            7,
        )
        .unwrap();
        assert_eq!(session.version, 7);
        assert_eq!(session.present, vec!["s1".to_string()]);
    }

    #[test]
    fn negative_version_is_invalid() {
        assert!(matches!(
            version_from_sql(-1),
            Err(DatabaseError::InvalidState(_))
        ));
    }

    #[test]
    fn garbage_document_is_a_query_error() {
        assert!(matches!(
            decode_session("not json", 1),
            Err(DatabaseError::Query(_))
        ));
    }
}
