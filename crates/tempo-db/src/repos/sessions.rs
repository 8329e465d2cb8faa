//! Session document repository.
//!
//! Writes are version-checked: a row is only replaced when its stored version
//! still equals the version the caller read.

use chrono::NaiveDate;

use tempo_core::dates::format_session_date;
use tempo_core::entities::{Session, SessionKey};

use crate::TempoDb;
use crate::error::DatabaseError;
use crate::helpers::{decode_session, encode_session, version_from_sql, version_to_sql};

impl TempoDb {
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or the stored document does
    /// not decode.
    pub async fn get_session(&self, key: &SessionKey) -> Result<Option<Session>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT document, version FROM attendance_sessions WHERE class_id = ?1 AND date = ?2",
                libsql::params![key.class_id(), format_session_date(key.date())],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(decode_session(
                &row.get::<String>(0)?,
                row.get::<i64>(1)?,
            )?)),
            None => Ok(None),
        }
    }

    /// Stored version of `key`, `0` when absent.
    async fn stored_version(&self, key: &SessionKey) -> Result<u64, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT version FROM attendance_sessions WHERE class_id = ?1 AND date = ?2",
                libsql::params![key.class_id(), format_session_date(key.date())],
            )
            .await?;
        match rows.next().await? {
            Some(row) => version_from_sql(row.get::<i64>(0)?),
            None => Ok(0),
        }
    }

    /// Insert or replace `session` if the stored version equals
    /// `expected_version` (`0` meaning "must not exist yet").
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::VersionConflict` if another writer got there
    /// first, or `DatabaseError` if the statement fails.
    pub async fn put_session(
        &self,
        session: &Session,
        expected_version: u64,
    ) -> Result<(), DatabaseError> {
        let document = encode_session(session)?;
        let date = format_session_date(session.key.date());
        let teacher_id = session.teacher_id.clone().unwrap_or_default();
        let updated_at = session
            .updated_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        let version = version_to_sql(session.version)?;

        let affected = if expected_version == 0 {
            self.conn
                .execute(
                    "INSERT INTO attendance_sessions (class_id, date, teacher_id, version, document, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT (class_id, date) DO NOTHING",
                    libsql::params![
                        session.key.class_id(),
                        date,
                        teacher_id,
                        version,
                        document,
                        updated_at
                    ],
                )
                .await?
        } else {
            self.conn
                .execute(
                    "UPDATE attendance_sessions
                     SET teacher_id = ?3, version = ?4, document = ?5, updated_at = ?6
                     WHERE class_id = ?1 AND date = ?2 AND version = ?7",
                    libsql::params![
                        session.key.class_id(),
                        date,
                        teacher_id,
                        version,
                        document,
                        updated_at,
                        version_to_sql(expected_version)?
                    ],
                )
                .await?
        };

        if affected == 0 {
            let found = self.stored_version(&session.key).await?;
            return Err(DatabaseError::VersionConflict {
                key: session.key.to_string(),
                expected: expected_version,
                found,
            });
        }
        tracing::debug!(key = %session.key, version = session.version, "stored session");
        Ok(())
    }

    /// Sessions dated `start..=end`, optionally for one teacher, ordered by
    /// date then class.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a document does not decode.
    pub async fn sessions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        teacher_id: Option<&str>,
    ) -> Result<Vec<Session>, DatabaseError> {
        let start = format_session_date(start);
        let end = format_session_date(end);
        let mut rows = match teacher_id {
            Some(teacher) => {
                self.conn
                    .query(
                        "SELECT document, version FROM attendance_sessions
                         WHERE date BETWEEN ?1 AND ?2 AND teacher_id = ?3
                         ORDER BY date, class_id",
                        libsql::params![start, end, teacher],
                    )
                    .await?
            }
            None => {
                self.conn
                    .query(
                        "SELECT document, version FROM attendance_sessions
                         WHERE date BETWEEN ?1 AND ?2
                         ORDER BY date, class_id",
                        libsql::params![start, end],
                    )
                    .await?
            }
        };

        let mut sessions = Vec::new();
        while let Some(row) = rows.next().await? {
            sessions.push(decode_session(&row.get::<String>(0)?, row.get::<i64>(1)?)?);
        }
        Ok(sessions)
    }

    /// Remove a session document. Administrative only; the engine never
    /// deletes. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the statement fails.
    pub async fn delete_session(&self, key: &SessionKey) -> Result<bool, DatabaseError> {
        let affected = self
            .conn
            .execute(
                "DELETE FROM attendance_sessions WHERE class_id = ?1 AND date = ?2",
                libsql::params![key.class_id(), format_session_date(key.date())],
            )
            .await?;
        Ok(affected > 0)
    }
}
