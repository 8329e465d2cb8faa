//! Engine store contracts backed by libSQL.

use chrono::NaiveDate;

use tempo_core::entities::{ScheduledClass, Session, SessionKey};
use tempo_engine::StoreError;
use tempo_engine::store::{ClassCatalog, DocumentStore};

use crate::TempoDb;

impl DocumentStore for TempoDb {
    async fn get_document(&self, key: &SessionKey) -> Result<Option<Session>, StoreError> {
        Ok(self.get_session(key).await?)
    }

    async fn put_document(&self, session: &Session, expected_version: u64) -> Result<(), StoreError> {
        Ok(self.put_session(session, expected_version).await?)
    }

    async fn query_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        teacher_id: Option<&str>,
    ) -> Result<Vec<Session>, StoreError> {
        Ok(self.sessions_between(start, end, teacher_id).await?)
    }
}

impl ClassCatalog for TempoDb {
    async fn list_classes(&self) -> Result<Vec<ScheduledClass>, StoreError> {
        Ok(Self::list_classes(self).await?)
    }
}
