//! Class catalog repository.

use serde_json::Value;

use tempo_core::entities::ScheduledClass;
use tempo_engine::schedule::decode_catalog;

use crate::TempoDb;
use crate::error::DatabaseError;
use crate::helpers::decode_class;

impl TempoDb {
    /// Insert or replace a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the entry cannot be encoded or stored.
    pub async fn upsert_class(&self, class: &ScheduledClass) -> Result<(), DatabaseError> {
        let document =
            serde_json::to_string(class).map_err(|e| DatabaseError::Other(e.into()))?;
        self.conn
            .execute(
                "INSERT INTO classes (id, teacher_id, document, updated_at)
                 VALUES (?1, ?2, ?3, datetime('now'))
                 ON CONFLICT (id) DO UPDATE SET
                     teacher_id = excluded.teacher_id,
                     document = excluded.document,
                     updated_at = excluded.updated_at",
                libsql::params![class.id.as_str(), class.teacher_id.as_str(), document],
            )
            .await?;
        Ok(())
    }

    /// Decode raw catalog entries and store the valid ones. Returns how many
    /// were stored.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a write fails.
    pub async fn import_catalog(&self, entries: Vec<Value>) -> Result<usize, DatabaseError> {
        let classes = decode_catalog(entries);
        for class in &classes {
            self.upsert_class(class).await?;
        }
        tracing::info!(imported = classes.len(), "imported class catalog");
        Ok(classes.len())
    }

    /// Every catalog entry, ordered by ID. Rows that no longer decode are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_classes(&self) -> Result<Vec<ScheduledClass>, DatabaseError> {
        let mut rows = self
            .conn
            .query("SELECT id, document FROM classes ORDER BY id", ())
            .await?;
        let mut classes = Vec::new();
        while let Some(row) = rows.next().await? {
            let id = row.get::<String>(0)?;
            match decode_class(&row.get::<String>(1)?) {
                Ok(class) => classes.push(class),
                Err(error) => tracing::warn!(id, %error, "skipping stored class"),
            }
        }
        Ok(classes)
    }
}
