//! # tempo-db
//!
//! libSQL persistence for Tempo: versioned session documents and the class
//! catalog. [`TempoDb`] implements the engine's `DocumentStore` and
//! `ClassCatalog` contracts, so it can back an `AttendanceService` directly.
//!
//! Sessions are stored as their normalized JSON document alongside the
//! columns needed for filtering (`date`, `teacher_id`) and optimistic
//! concurrency (`version`).

pub mod error;
mod helpers;
mod migrations;
pub mod repos;
mod store;

use std::path::Path;

use error::DatabaseError;
use libsql::Builder;

/// Database handle for session documents and the class catalog.
pub struct TempoDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl TempoDb {
    /// Open a local database at `path`, or `":memory:"`.
    ///
    /// Creates missing parent directories and runs migrations.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Other(e.into()))?;
            }
        }

        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        let tempo_db = Self { db, conn };
        tempo_db.run_migrations().await?;
        tracing::debug!(path, "opened attendance database");
        Ok(tempo_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }
}
