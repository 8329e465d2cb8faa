//! Database error types for tempo-db.

use thiserror::Error;

use tempo_engine::StoreError;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned data that cannot be decoded.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., a stored document that no longer decodes).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A versioned write found a different stored version.
    #[error("Version conflict on {key}: expected {expected}, found {found}")]
    VersionConflict {
        key: String,
        expected: u64,
        found: u64,
    },

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Lock contention and timeouts clear up on their own; everything else
    /// will fail the same way again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::LibSql(e) => is_transient_libsql_error(e),
            _ => false,
        }
    }
}

/// Detect transient libSQL errors: a busy or locked database file, or a
/// timed-out remote call.
///
/// The predicate is intentionally narrow to avoid retrying genuine SQL or
/// constraint errors.
pub fn is_transient_libsql_error(e: &libsql::Error) -> bool {
    let msg = e.to_string().to_lowercase();
    msg.contains("database is locked")
        || msg.contains("database is busy")
        || msg.contains("sqlite_busy")
        || msg.contains("timed out")
        || msg.contains("timeout")
}

impl From<DatabaseError> for StoreError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::VersionConflict {
                key,
                expected,
                found,
            } => Self::VersionConflict {
                key,
                expected,
                found,
            },
            e if e.is_transient() => Self::Transient(e.to_string()),
            e => Self::Permanent(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_keep_their_shape() {
        let store: StoreError = DatabaseError::VersionConflict {
            key: "c1/2025-03-04".into(),
            expected: 1,
            found: 2,
        }
        .into();
        assert_eq!(
            store,
            StoreError::VersionConflict {
                key: "c1/2025-03-04".into(),
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn decode_failures_are_permanent() {
        let store: StoreError = DatabaseError::InvalidState("bad document".into()).into();
        assert!(matches!(store, StoreError::Permanent(ref m) if m.contains("bad document")));
    }
}
