//! Service layer wiring the engine pieces around a document store.
//!
//! `AttendanceService` owns the caches, the offline queue, the per-session
//! locks, and the stale-query guard. Nothing here is global: tests build
//! isolated instances over a [`MemoryStore`](crate::store::MemoryStore).
//!
//! Write protocol for [`AttendanceService::record`]:
//! 1. Reject malformed intents
//! 2. If the session already has queued mutations, queue behind them
//! 3. Otherwise lock the session, read the remote copy, apply, and write with
//!    the read version as the expected version (rebasing on conflict)
//! 4. On success invalidate overlapping cache entries, then cache the result
//! 5. On a transient failure queue the mutation; on a permanent one return it

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;

use tempo_config::TempoConfig;
use tempo_core::entities::{MutationKind, PendingMutation, ScheduledClass, Session, SessionKey};

use crate::aggregate::{AttendancePolicy, AttendanceReport, DateRange, aggregate};
use crate::cache::{Invalidation, TtlCache};
use crate::clock::Clock;
use crate::error::{EngineError, StoreError};
use crate::guard::QueryGuard;
use crate::locks::KeyedLocks;
use crate::queue::{MutationQueue, ReplayReport};
use crate::reconciler::{apply_mutation, optimistic_view};
use crate::schedule::{DayClassItem, classes_for_day};
use crate::store::{ClassCatalog, DocumentStore};

const RANGE_PREFIX: &str = "range/";
const CATALOG_KEY: &str = "catalog";

/// How a recorded intent ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Written to the store. Carries the stored session.
    Committed(Session),
    /// Queued for replay. Carries the optimistic view shown meanwhile.
    Queued {
        mutation: PendingMutation,
        view: Session,
    },
}

impl RecordOutcome {
    /// The session as the user should now see it.
    #[must_use]
    pub const fn session(&self) -> &Session {
        match self {
            Self::Committed(session) | Self::Queued { view: session, .. } => session,
        }
    }

    #[must_use]
    pub const fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }
}

pub struct AttendanceService<S> {
    store: S,
    queue: MutationQueue,
    documents: TtlCache<Session>,
    queries: TtlCache<Vec<Session>>,
    catalog: TtlCache<Vec<ScheduledClass>>,
    guard: QueryGuard,
    /// Bumped by every invalidation; a range fetch that straddles a bump is
    /// returned but not cached.
    generation: AtomicU64,
    locks: Arc<KeyedLocks>,
    clock: Arc<dyn Clock>,
    policy: AttendancePolicy,
    max_rebase_attempts: u32,
}

impl<S> AttendanceService<S> {
    /// Build a service with an empty queue. The journal is written to but
    /// not read; use [`Self::open`] to restore it.
    #[must_use]
    pub fn new(store: S, config: &TempoConfig, clock: Arc<dyn Clock>) -> Self {
        let locks = Arc::new(KeyedLocks::new());
        let queue = MutationQueue::new(&config.queue, Arc::clone(&clock), Arc::clone(&locks));
        Self::assemble(store, config, clock, locks, queue)
    }

    /// Build a service and restore queued mutations from the journal.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Journal` if the journal cannot be read.
    pub fn open(store: S, config: &TempoConfig, clock: Arc<dyn Clock>) -> Result<Self, EngineError> {
        let locks = Arc::new(KeyedLocks::new());
        let queue = MutationQueue::open(&config.queue, Arc::clone(&clock), Arc::clone(&locks))?;
        Ok(Self::assemble(store, config, clock, locks, queue))
    }

    fn assemble(
        store: S,
        config: &TempoConfig,
        clock: Arc<dyn Clock>,
        locks: Arc<KeyedLocks>,
        queue: MutationQueue,
    ) -> Self {
        let query_ttl = Some(config.cache.query_ttl());
        Self {
            store,
            queue,
            documents: TtlCache::manual(Arc::clone(&clock)),
            queries: TtlCache::new(query_ttl, Arc::clone(&clock)),
            catalog: TtlCache::new(query_ttl, Arc::clone(&clock)),
            guard: QueryGuard::new(),
            generation: AtomicU64::new(0),
            locks,
            clock,
            policy: AttendancePolicy::from(&config.report),
            max_rebase_attempts: config.queue.max_rebase_attempts,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn queue(&self) -> &MutationQueue {
        &self.queue
    }

    /// The current-document cache (no TTL).
    #[must_use]
    pub const fn documents(&self) -> &TtlCache<Session> {
        &self.documents
    }

    /// The date-range query cache.
    #[must_use]
    pub const fn queries(&self) -> &TtlCache<Vec<Session>> {
        &self.queries
    }

    #[must_use]
    pub const fn policy(&self) -> AttendancePolicy {
        self.policy
    }

    #[must_use]
    pub fn has_pending(&self, key: &SessionKey) -> bool {
        self.queue.has_pending(key)
    }

    /// Drop every cache entry a write to `key` can affect.
    pub fn invalidate_session(&self, key: &SessionKey) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.documents.invalidate(Invalidation::Key(&key.cache_key()));
        self.queries.invalidate(Invalidation::Prefix(RANGE_PREFIX));
    }

    /// Drop cached documents of one class, e.g. after a roster change.
    pub fn invalidate_class(&self, class_id: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.documents
            .invalidate(Invalidation::Prefix(&SessionKey::class_prefix(class_id)));
        self.queries.invalidate(Invalidation::Prefix(RANGE_PREFIX));
    }

    /// Cached copy (or skeleton) overlaid with queued mutations. Never
    /// touches the store.
    fn local_view(&self, key: &SessionKey) -> Session {
        let base = self
            .documents
            .get(&key.cache_key())
            .unwrap_or_else(|| Session::skeleton(key.clone()));
        optimistic_view(&base, &self.queue.pending_for(key)).into_owned()
    }

    /// Queue `kind` behind the mutations already pending for `key`.
    fn queue_behind(&self, key: SessionKey, kind: MutationKind) -> Result<RecordOutcome, EngineError> {
        let base_version = self
            .queue
            .pending_for(&key)
            .last()
            .map_or(0, |m| m.base_version);
        let mutation = self.queue.draft(key, kind, base_version)?;
        self.queue_mutation(mutation)
    }

    fn queue_mutation(&self, mutation: PendingMutation) -> Result<RecordOutcome, EngineError> {
        let key = mutation.key.clone();
        self.queue.push(mutation.clone())?;
        Ok(RecordOutcome::Queued {
            mutation,
            view: self.local_view(&key),
        })
    }
}

impl<S: DocumentStore> AttendanceService<S> {
    /// Session as the user should see it: the optimistic view while
    /// mutations are queued, else the cached or freshly fetched document.
    /// A session never written reads as an empty skeleton.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` if the document must be fetched and the
    /// store fails.
    pub async fn load_session(&self, key: &SessionKey) -> Result<Session, EngineError> {
        let cache_key = key.cache_key();
        let base = match self.documents.get(&cache_key) {
            Some(cached) => cached,
            None => match self.store.get_document(key).await {
                Ok(Some(remote)) => {
                    self.documents.set(&cache_key, &remote);
                    remote
                }
                Ok(None) => Session::skeleton(key.clone()),
                // Queued edits stay visible even when the store is unreachable.
                Err(error) if error.is_transient() && self.queue.has_pending(key) => {
                    tracing::debug!(%key, %error, "serving local view while offline");
                    return Ok(self.local_view(key));
                }
                Err(error) => return Err(error.into()),
            },
        };

        let pending = self.queue.pending_for(key);
        if pending.is_empty() {
            Ok(base)
        } else {
            Ok(optimistic_view(&base, &pending).into_owned())
        }
    }

    /// Drop the cached document and read it again.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` if the store fails.
    pub async fn refresh_session(&self, key: &SessionKey) -> Result<Session, EngineError> {
        self.documents.invalidate(Invalidation::Key(&key.cache_key()));
        self.load_session(key).await
    }

    /// Create a session document carrying its teacher and roster, if it does
    /// not exist yet. Returns the stored document either way.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` if the store fails.
    pub async fn start_session(
        &self,
        key: &SessionKey,
        teacher_id: Option<String>,
        roster: Vec<String>,
    ) -> Result<Session, EngineError> {
        let _guard = self.locks.lock(key).await;
        if let Some(existing) = self.store.get_document(key).await? {
            self.documents.set(&key.cache_key(), &existing);
            return Ok(existing);
        }

        let mut session = Session::skeleton(key.clone());
        session.teacher_id = teacher_id;
        session.roster = roster;
        session.version = 1;
        session.updated_at = Some(self.clock.now());

        match self.store.put_document(&session, 0).await {
            Ok(()) => {
                self.invalidate_session(key);
                self.documents.set(&key.cache_key(), &session);
                tracing::info!(%key, "session started");
                Ok(session)
            }
            // Someone else created it first.
            Err(StoreError::VersionConflict { .. }) => match self.store.get_document(key).await? {
                Some(existing) => Ok(existing),
                None => Err(StoreError::Transient(format!("{key} vanished while starting")).into()),
            },
            Err(error) => Err(error.into()),
        }
    }

    /// Record one intent against a session.
    ///
    /// # Errors
    ///
    /// - `EngineError::Core` for a malformed intent (never queued)
    /// - `EngineError::QueueFull` if the write must be queued but cannot be
    /// - `EngineError::PermanentFailure` if the store or the session state
    ///   rejects the intent for good; the mutation is returned intact
    pub async fn record(&self, key: SessionKey, kind: MutationKind) -> Result<RecordOutcome, EngineError> {
        // Keep per-session order: never overtake queued mutations.
        if self.queue.has_pending(&key) {
            return self.queue_behind(key, kind);
        }

        let _guard = self.locks.lock(&key).await;
        // The write that held the lock may have fallen back to the queue.
        if self.queue.has_pending(&key) {
            return self.queue_behind(key, kind);
        }
        let mut mutation = self.queue.draft(key.clone(), kind, 0)?;
        let mut rebases = 0;

        loop {
            let remote = match self.store.get_document(&key).await {
                Ok(remote) => remote,
                Err(error) => return self.fall_back(mutation, error),
            };
            let expected = remote.as_ref().map_or(0, |s| s.version);
            mutation.base_version = expected;
            let mut working = remote.unwrap_or_else(|| Session::skeleton(key.clone()));

            if let Err(error) = apply_mutation(&mut working, &mutation) {
                return Err(EngineError::PermanentFailure {
                    mutation: Box::new(mutation),
                    reason: error.to_string(),
                });
            }
            working.version = expected + 1;

            match self.store.put_document(&working, expected).await {
                Ok(()) => {
                    self.invalidate_session(&key);
                    self.documents.set(&key.cache_key(), &working);
                    tracing::debug!(%key, version = working.version, op = mutation.kind.label(), "recorded");
                    return Ok(RecordOutcome::Committed(working));
                }
                Err(StoreError::VersionConflict { found, .. })
                    if rebases < self.max_rebase_attempts =>
                {
                    rebases += 1;
                    tracing::debug!(%key, expected, found, rebases, "rebasing write");
                }
                Err(error) => return self.fall_back(mutation, error),
            }
        }
    }

    fn fall_back(&self, mutation: PendingMutation, error: StoreError) -> Result<RecordOutcome, EngineError> {
        match error {
            StoreError::Permanent(reason) => Err(EngineError::PermanentFailure {
                mutation: Box::new(mutation),
                reason,
            }),
            StoreError::Transient(_) | StoreError::VersionConflict { .. } => {
                tracing::warn!(key = %mutation.key, %error, "write failed, queueing for replay");
                self.queue_mutation(mutation)
            }
        }
    }

    /// Replay queued mutations and drop cache entries they touched.
    pub async fn replay(&self) -> ReplayReport {
        let report = self.queue.replay(&self.store).await;
        for m in &report.applied {
            self.invalidate_session(&m.key);
        }
        for failure in &report.failures {
            if let EngineError::PermanentFailure { mutation, .. } = failure {
                self.invalidate_session(&mutation.key);
            }
        }
        report
    }

    /// Sessions in `range` for the query slot `slot`.
    ///
    /// Returns `Ok(None)` when a newer request for the same slot started
    /// while this one was in flight; its result must not be applied.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` if the fetch fails.
    pub async fn sessions_in_range(
        &self,
        slot: &str,
        range: DateRange,
        teacher_id: Option<&str>,
    ) -> Result<Option<Vec<Session>>, EngineError> {
        let ticket = self.guard.begin(slot);
        let sessions = self.fetch_range(range, teacher_id).await?;
        if self.guard.is_current(&ticket) {
            Ok(Some(sessions))
        } else {
            tracing::debug!(slot, "dropping superseded range result");
            Ok(None)
        }
    }

    /// Range query through the TTL cache, overlaid with queued edits.
    async fn fetch_range(
        &self,
        range: DateRange,
        teacher_id: Option<&str>,
    ) -> Result<Vec<Session>, EngineError> {
        let cache_key = format!(
            "{RANGE_PREFIX}{}/{}/{}",
            range.start(),
            range.end(),
            teacher_id.unwrap_or("*")
        );
        let remote = match self.queries.get(&cache_key) {
            Some(cached) => cached,
            None => {
                let generation = self.generation.load(Ordering::SeqCst);
                let fetched = self
                    .store
                    .query_by_date_range(range.start(), range.end(), teacher_id)
                    .await?;
                if self.generation.load(Ordering::SeqCst) == generation {
                    self.queries.set(&cache_key, &fetched);
                } else {
                    tracing::debug!(%cache_key, "write landed during range fetch; not caching");
                }
                fetched
            }
        };
        Ok(self.overlay(remote, range, teacher_id))
    }

    fn overlay(&self, remote: Vec<Session>, range: DateRange, teacher_id: Option<&str>) -> Vec<Session> {
        let mut sessions: Vec<Session> = remote
            .into_iter()
            .map(|s| {
                let pending = self.queue.pending_for(&s.key);
                if pending.is_empty() {
                    s
                } else {
                    optimistic_view(&s, &pending).into_owned()
                }
            })
            .collect();

        // Sessions that exist only as queued edits so far. Their teacher is
        // unknown, so they only show up in unfiltered queries.
        if teacher_id.is_none() {
            let known: Vec<SessionKey> = sessions.iter().map(|s| s.key.clone()).collect();
            let mut offline_only: Vec<SessionKey> = self
                .queue
                .snapshot()
                .into_iter()
                .map(|m| m.key)
                .filter(|k| range.contains(k.date()) && !known.contains(k))
                .collect();
            offline_only.sort();
            offline_only.dedup();
            sessions.extend(offline_only.iter().map(|k| self.local_view(k)));
        }

        sessions.sort_by(|a, b| {
            (a.key.date(), a.key.class_id()).cmp(&(b.key.date(), b.key.class_id()))
        });
        sessions
    }

    /// Attendance report for `range` under the configured policy.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` if the fetch fails.
    pub async fn report(
        &self,
        range: DateRange,
        teacher_id: Option<&str>,
    ) -> Result<AttendanceReport, EngineError> {
        let sessions = self.fetch_range(range, teacher_id).await?;
        Ok(aggregate(&sessions, range, self.policy))
    }
}

impl<S: DocumentStore + ClassCatalog> AttendanceService<S> {
    /// The class catalog, cached with the query TTL.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` if the catalog cannot be listed.
    pub async fn classes(&self) -> Result<Vec<ScheduledClass>, EngineError> {
        if let Some(cached) = self.catalog.get(CATALOG_KEY) {
            return Ok(cached);
        }
        let classes = self.store.list_classes().await?;
        self.catalog.set(CATALOG_KEY, &classes);
        Ok(classes)
    }

    /// Force the next catalog read to hit the store.
    pub fn refresh_catalog(&self) {
        self.catalog.invalidate(Invalidation::All);
    }

    /// What `teacher_id` must account for on `date`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` if the catalog cannot be listed.
    pub async fn day_agenda(
        &self,
        date: NaiveDate,
        teacher_id: &str,
    ) -> Result<Vec<DayClassItem>, EngineError> {
        let classes = self.classes().await?;
        Ok(classes_for_day(&classes, date, teacher_id))
    }
}
