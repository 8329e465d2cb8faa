//! Collaborator contracts: the remote document store and the class catalog.
//!
//! All operations are async. Implementations classify their failures as
//! [`StoreError::Transient`] (retry later) or [`StoreError::Permanent`];
//! a timeout is always transient.

mod memory;

pub use memory::{MemoryStore, StoreOp};

use chrono::NaiveDate;

use tempo_core::entities::{ScheduledClass, Session, SessionKey};

use crate::error::StoreError;

pub trait DocumentStore: Send + Sync {
    fn get_document(
        &self,
        key: &SessionKey,
    ) -> impl Future<Output = Result<Option<Session>, StoreError>> + Send;

    /// Write `session` if the stored version still equals `expected_version`
    /// (`0` for a document that does not exist yet).
    ///
    /// Fails with [`StoreError::VersionConflict`] otherwise.
    fn put_document(
        &self,
        session: &Session,
        expected_version: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Sessions dated within `start..=end`, optionally for one teacher,
    /// ordered by date then class.
    fn query_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        teacher_id: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Session>, StoreError>> + Send;
}

pub trait ClassCatalog: Send + Sync {
    fn list_classes(&self) -> impl Future<Output = Result<Vec<ScheduledClass>, StoreError>> + Send;
}
