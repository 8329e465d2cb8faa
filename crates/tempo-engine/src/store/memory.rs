//! In-process store with fault injection, for tests and offline demos.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::NaiveDate;

use tempo_core::entities::{ScheduledClass, Session, SessionKey};

use super::{ClassCatalog, DocumentStore};
use crate::error::StoreError;

/// Operation a scripted fault applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    Put,
    Query,
    ListClasses,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<BTreeMap<SessionKey, Session>>,
    classes: Mutex<Vec<ScheduledClass>>,
    faults: Mutex<HashMap<StoreOp, VecDeque<StoreError>>>,
    puts: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a session as-is, bypassing the version check.
    pub fn insert(&self, session: Session) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.key.clone(), session);
    }

    /// Delete a session, as an administrator would.
    pub fn remove(&self, key: &SessionKey) -> Option<Session> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    #[must_use]
    pub fn snapshot(&self, key: &SessionKey) -> Option<Session> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn set_classes(&self, classes: Vec<ScheduledClass>) {
        *self.classes.lock().unwrap_or_else(PoisonError::into_inner) = classes;
    }

    /// Make the next call of `op` fail with `error`. Faults queue up per op.
    pub fn fail_next(&self, op: StoreOp, error: StoreError) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Successful and rejected `put_document` calls so far.
    #[must_use]
    pub fn put_calls(&self) -> usize {
        self.puts.load(Ordering::Relaxed)
    }

    fn take_fault(&self, op: StoreOp) -> Result<(), StoreError> {
        let mut faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        match faults.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn get_document(&self, key: &SessionKey) -> Result<Option<Session>, StoreError> {
        self.take_fault(StoreOp::Get)?;
        Ok(self.snapshot(key))
    }

    async fn put_document(&self, session: &Session, expected_version: u64) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.take_fault(StoreOp::Put)?;

        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let found = sessions.get(&session.key).map_or(0, |s| s.version);
        if found != expected_version {
            return Err(StoreError::VersionConflict {
                key: session.key.to_string(),
                expected: expected_version,
                found,
            });
        }
        sessions.insert(session.key.clone(), session.clone());
        Ok(())
    }

    async fn query_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        teacher_id: Option<&str>,
    ) -> Result<Vec<Session>, StoreError> {
        self.take_fault(StoreOp::Query)?;

        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<Session> = sessions
            .values()
            .filter(|s| (start..=end).contains(&s.key.date()))
            .filter(|s| teacher_id.is_none_or(|t| s.teacher_id.as_deref() == Some(t)))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            (a.key.date(), a.key.class_id()).cmp(&(b.key.date(), b.key.class_id()))
        });
        Ok(found)
    }
}

impl ClassCatalog for MemoryStore {
    async fn list_classes(&self) -> Result<Vec<ScheduledClass>, StoreError> {
        self.take_fault(StoreOp::ListClasses)?;
        Ok(self
            .classes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
