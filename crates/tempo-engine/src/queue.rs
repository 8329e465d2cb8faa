//! Offline mutation queue.
//!
//! Holds intents that could not be committed, replays them in arrival order
//! per session, and surfaces the ones that can never apply.
//!
//! Replay of one session folds every due mutation onto a fresh remote copy
//! and writes the result with the remote version as the expected version.
//! A version conflict rebases onto the newer copy (bounded by
//! `max_rebase_attempts`, after which it counts as transient). Transient
//! failures push the whole batch into backoff; permanent ones surface each
//! affected mutation through [`EngineError::PermanentFailure`].

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;

use tempo_config::QueueConfig;
use tempo_core::CoreError;
use tempo_core::entities::{MutationKind, PendingMutation, Session, SessionKey};
use tempo_core::enums::MutationState;

use crate::clock::Clock;
use crate::error::{EngineError, StoreError};
use crate::locks::KeyedLocks;
use crate::reconciler::apply_mutation;
use crate::retry::RetryConfig;
use crate::store::DocumentStore;

/// Outcome of one replay pass.
#[derive(Debug, Default)]
pub struct ReplayReport {
    /// Mutations now committed remotely, in the state `applied`.
    pub applied: Vec<PendingMutation>,
    /// Mutations left queued: in backoff or just failed transiently.
    pub deferred: usize,
    /// `EngineError::PermanentFailure` for every mutation removed unapplied.
    pub failures: Vec<EngineError>,
}

impl ReplayReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.deferred == 0 && self.failures.is_empty()
    }

    fn merge(&mut self, other: Self) {
        self.applied.extend(other.applied);
        self.deferred += other.deferred;
        self.failures.extend(other.failures);
    }
}

#[derive(Debug, Default)]
struct QueueState {
    by_key: BTreeMap<SessionKey, VecDeque<PendingMutation>>,
    next_seq: u64,
}

impl QueueState {
    fn len(&self) -> usize {
        self.by_key.values().map(VecDeque::len).sum()
    }

    fn remove(&mut self, key: &SessionKey, id: &str) -> Option<PendingMutation> {
        let queue = self.by_key.get_mut(key)?;
        let position = queue.iter().position(|m| m.id == id)?;
        let removed = queue.remove(position);
        if queue.is_empty() {
            self.by_key.remove(key);
        }
        removed
    }

    fn get_mut(&mut self, key: &SessionKey, id: &str) -> Option<&mut PendingMutation> {
        self.by_key.get_mut(key)?.iter_mut().find(|m| m.id == id)
    }
}

pub struct MutationQueue {
    state: Mutex<QueueState>,
    capacity: usize,
    retry: RetryConfig,
    max_rebase_attempts: u32,
    journal: Option<PathBuf>,
    clock: Arc<dyn Clock>,
    locks: Arc<KeyedLocks>,
}

impl MutationQueue {
    #[must_use]
    pub fn new(config: &QueueConfig, clock: Arc<dyn Clock>, locks: Arc<KeyedLocks>) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            capacity: config.capacity,
            retry: RetryConfig::from(config),
            max_rebase_attempts: config.max_rebase_attempts,
            journal: config.journal(),
            clock,
            locks,
        }
    }

    /// Build a queue and restore whatever its journal holds.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Journal` if the journal exists but cannot be read.
    pub fn open(
        config: &QueueConfig,
        clock: Arc<dyn Clock>,
        locks: Arc<KeyedLocks>,
    ) -> Result<Self, EngineError> {
        let queue = Self::new(config, clock, locks);
        if let Some(path) = queue.journal.clone() {
            let restored = queue.load_journal(&path)?;
            if restored > 0 {
                tracing::info!(restored, path = %path.display(), "restored queued mutations");
            }
        }
        Ok(queue)
    }

    /// Record an intent. Invalid intents are rejected, never queued.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Core` for a malformed intent and
    /// `EngineError::QueueFull` at capacity.
    pub fn enqueue(
        &self,
        key: SessionKey,
        kind: MutationKind,
        base_version: u64,
    ) -> Result<PendingMutation, EngineError> {
        let mutation = self.draft(key, kind, base_version)?;
        self.push(mutation.clone())?;
        Ok(mutation)
    }

    /// Stamp an intent with the next sequence number without queueing it.
    ///
    /// Online writes use drafts so that a write falling back to the queue
    /// keeps its identity and timestamp.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Core` for a malformed intent.
    pub fn draft(
        &self,
        key: SessionKey,
        kind: MutationKind,
        base_version: u64,
    ) -> Result<PendingMutation, EngineError> {
        kind.validate()?;
        let seq = {
            let mut state = self.lock_state();
            state.next_seq += 1;
            state.next_seq
        };
        Ok(PendingMutation::new(key, kind, seq, self.clock.now(), base_version))
    }

    /// Queue a drafted mutation behind the session's other pending ones.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::QueueFull` at capacity.
    pub fn push(&self, mutation: PendingMutation) -> Result<(), EngineError> {
        {
            let mut state = self.lock_state();
            if state.len() >= self.capacity {
                return Err(EngineError::QueueFull {
                    capacity: self.capacity,
                });
            }
            tracing::info!(
                mutation = %mutation.id,
                key = %mutation.key,
                op = mutation.kind.label(),
                "queued mutation"
            );
            state
                .by_key
                .entry(mutation.key.clone())
                .or_default()
                .push_back(mutation);
        }
        self.persist();
        Ok(())
    }

    /// Whether `key` has mutations that are not yet committed.
    #[must_use]
    pub fn has_pending(&self, key: &SessionKey) -> bool {
        self.lock_state().by_key.contains_key(key)
    }

    /// Queued mutations of `key`, in replay order.
    #[must_use]
    pub fn pending_for(&self, key: &SessionKey) -> Vec<PendingMutation> {
        self.lock_state()
            .by_key
            .get(key)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every queued mutation, ordered by `seq`.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PendingMutation> {
        let mut all: Vec<PendingMutation> = self
            .lock_state()
            .by_key
            .values()
            .flat_map(|q| q.iter().cloned())
            .collect();
        all.sort_by_key(|m| m.seq);
        all
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_state().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_state().by_key.is_empty()
    }

    /// Drop a queued mutation the user chose to abandon.
    pub fn discard(&self, key: &SessionKey, mutation_id: &str) -> Option<PendingMutation> {
        let removed = self.lock_state().remove(key, mutation_id);
        if removed.is_some() {
            self.persist();
        }
        removed
    }

    /// Put a surfaced mutation back at the end of its session's queue.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::QueueFull` at capacity.
    pub fn requeue(&self, mut mutation: PendingMutation) -> Result<(), EngineError> {
        {
            let mut state = self.lock_state();
            if state.len() >= self.capacity {
                return Err(EngineError::QueueFull {
                    capacity: self.capacity,
                });
            }
            mutation.state = MutationState::Pending;
            mutation.attempts = 0;
            mutation.next_attempt_at = None;
            mutation.last_error = None;
            state
                .by_key
                .entry(mutation.key.clone())
                .or_default()
                .push_back(mutation);
        }
        self.persist();
        Ok(())
    }

    /// Replay every session whose queue is due. Sessions replay concurrently;
    /// mutations of one session replay in order under its lock.
    pub async fn replay<S: DocumentStore>(&self, store: &S) -> ReplayReport {
        let keys: Vec<SessionKey> = self.lock_state().by_key.keys().cloned().collect();
        tracing::debug!(sessions = keys.len(), "replaying offline queue");

        let reports = join_all(keys.into_iter().map(|key| self.replay_key(store, key))).await;
        let mut report = ReplayReport::default();
        for r in reports {
            report.merge(r);
        }
        self.locks.prune();
        self.persist();

        tracing::info!(
            applied = report.applied.len(),
            deferred = report.deferred,
            failed = report.failures.len(),
            "queue replay finished"
        );
        report
    }

    /// Replay one session's queue. Caller must not hold the session's lock.
    pub async fn replay_key<S: DocumentStore>(&self, store: &S, key: SessionKey) -> ReplayReport {
        let _guard = self.locks.lock(&key).await;
        let mut report = ReplayReport::default();

        let waiting = self.waiting_on_backoff(&key);
        if waiting > 0 {
            report.deferred = waiting;
            return report;
        }

        let mut rebases = 0;
        loop {
            let batch = self.begin_attempt(&key);
            if batch.is_empty() {
                return report;
            }

            let remote = match store.get_document(&key).await {
                Ok(remote) => remote,
                Err(error) => {
                    self.settle_store_error(&key, batch, &error, &mut report);
                    return report;
                }
            };
            let expected = remote.as_ref().map_or(0, |s| s.version);
            let exists = remote.is_some();
            let mut working = remote.unwrap_or_else(|| Session::skeleton(key.clone()));

            let mut accepted = Vec::with_capacity(batch.len());
            for mutation in batch {
                if !exists && mutation.base_version > 0 {
                    let reason = CoreError::NotFound {
                        entity_type: "session".to_string(),
                        id: key.to_string(),
                    }
                    .to_string();
                    report.failures.push(self.surface(mutation, reason));
                    continue;
                }
                match apply_mutation(&mut working, &mutation) {
                    Ok(_) => accepted.push(mutation),
                    Err(error) => report.failures.push(self.surface(mutation, error.to_string())),
                }
            }
            if accepted.is_empty() {
                return report;
            }

            working.version = expected + 1;
            match store.put_document(&working, expected).await {
                Ok(()) => {
                    self.complete(&key, accepted, &mut report);
                    return report;
                }
                Err(StoreError::VersionConflict { found, .. })
                    if rebases < self.max_rebase_attempts =>
                {
                    rebases += 1;
                    tracing::debug!(%key, expected, found, rebases, "rebasing queued mutations");
                }
                Err(error) => {
                    self.settle_store_error(&key, accepted, &error, &mut report);
                    return report;
                }
            }
        }
    }

    /// Number of queued mutations of `key` still inside their backoff window.
    fn waiting_on_backoff(&self, key: &SessionKey) -> usize {
        let now = self.clock.now();
        let state = self.lock_state();
        let Some(queue) = state.by_key.get(key) else {
            return 0;
        };
        if queue
            .iter()
            .any(|m| m.next_attempt_at.is_some_and(|at| at > now))
        {
            queue.len()
        } else {
            0
        }
    }

    /// Move failed mutations of `key` back to pending and return the batch.
    fn begin_attempt(&self, key: &SessionKey) -> Vec<PendingMutation> {
        let mut state = self.lock_state();
        let Some(queue) = state.by_key.get_mut(key) else {
            return Vec::new();
        };
        for m in queue.iter_mut() {
            if m.state == MutationState::Failed {
                transition_or_log(m, MutationState::Pending);
            }
            m.next_attempt_at = None;
        }
        queue.iter().cloned().collect()
    }

    fn complete(&self, key: &SessionKey, accepted: Vec<PendingMutation>, report: &mut ReplayReport) {
        let mut state = self.lock_state();
        for mut m in accepted {
            state.remove(key, &m.id);
            transition_or_log(&mut m, MutationState::Applied);
            tracing::debug!(mutation = %m.id, %key, "mutation applied");
            report.applied.push(m);
        }
    }

    fn settle_store_error(
        &self,
        key: &SessionKey,
        batch: Vec<PendingMutation>,
        error: &StoreError,
        report: &mut ReplayReport,
    ) {
        if matches!(error, StoreError::Permanent(_)) {
            for m in batch {
                report.failures.push(self.surface(m, error.to_string()));
            }
            return;
        }

        let now = self.clock.now();
        let mut state = self.lock_state();
        for m in &batch {
            if let Some(queued) = state.get_mut(key, &m.id) {
                queued.attempts += 1;
                let delay = self.retry.delay_for(queued.attempts);
                queued.next_attempt_at = TimeDelta::from_std(delay)
                    .ok()
                    .and_then(|d| now.checked_add_signed(d))
                    .or(Some(DateTime::<Utc>::MAX_UTC));
                queued.last_error = Some(error.to_string());
                transition_or_log(queued, MutationState::Failed);
                report.deferred += 1;
            }
        }
        tracing::warn!(%key, %error, deferred = batch.len(), "replay deferred");
    }

    /// Remove a mutation that can never apply and wrap it for the caller.
    fn surface(&self, mut mutation: PendingMutation, reason: String) -> EngineError {
        self.lock_state().remove(&mutation.key, &mutation.id);
        transition_or_log(&mut mutation, MutationState::Failed);
        mutation.last_error = Some(reason.clone());
        tracing::warn!(mutation = %mutation.id, key = %mutation.key, %reason, "mutation failed permanently");
        EngineError::PermanentFailure {
            mutation: Box::new(mutation),
            reason,
        }
    }

    // -----------------------------------------------------------------------
    // Journal
    // -----------------------------------------------------------------------

    /// Write every queued mutation to `path`, one JSON object per line.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Journal` if the file cannot be written.
    pub fn save_journal(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::Journal(e.to_string()))?;
        }
        serde_jsonlines::write_json_lines(path, self.snapshot())
            .map_err(|e| EngineError::Journal(e.to_string()))
    }

    /// Restore mutations from `path`. A missing file restores nothing.
    ///
    /// Mutations already queued (same ID) are skipped; `applied` lines are
    /// ignored. Returns how many were restored.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Journal` if the file exists but a line is not a
    /// valid mutation.
    pub fn load_journal(&self, path: &Path) -> Result<usize, EngineError> {
        if !path.exists() {
            return Ok(0);
        }
        let lines: Vec<PendingMutation> = serde_jsonlines::json_lines(path)
            .map_err(|e| EngineError::Journal(e.to_string()))?
            .collect::<std::io::Result<_>>()
            .map_err(|e| EngineError::Journal(format!("{}: {e}", path.display())))?;

        let mut state = self.lock_state();
        let mut restored = 0;
        for m in lines {
            if m.state == MutationState::Applied {
                continue;
            }
            let known = state
                .by_key
                .get(&m.key)
                .is_some_and(|q| q.iter().any(|queued| queued.id == m.id));
            if known {
                continue;
            }
            state.next_seq = state.next_seq.max(m.seq);
            let queue = state.by_key.entry(m.key.clone()).or_default();
            let position = queue.partition_point(|q| q.seq < m.seq);
            queue.insert(position, m);
            restored += 1;
        }
        Ok(restored)
    }

    /// Rewrite the configured journal. Failures are logged, not raised: the
    /// in-memory queue stays authoritative.
    fn persist(&self) {
        let Some(path) = &self.journal else {
            return;
        };
        if let Err(error) = self.save_journal(path) {
            tracing::warn!(path = %path.display(), %error, "failed to persist queue journal");
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn transition_or_log(m: &mut PendingMutation, next: MutationState) {
    if let Err(error) = m.transition(next) {
        tracing::debug!(mutation = %m.id, %error, "ignoring redundant state change");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{MemoryStore, StoreOp};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tempo_core::enums::CanonicalStatus;

    fn config() -> QueueConfig {
        QueueConfig {
            capacity: 4,
            base_delay_ms: 1_000,
            max_delay_ms: 8_000,
            max_rebase_attempts: 2,
            journal_path: String::new(),
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 4, 18, 0, 0).unwrap(),
        ))
    }

    fn queue(clock: Arc<ManualClock>) -> MutationQueue {
        MutationQueue::new(&config(), clock, Arc::new(KeyedLocks::new()))
    }

    fn key(class: &str) -> SessionKey {
        SessionKey::parse(class, "2025-03-04").unwrap()
    }

    #[test]
    fn enqueue_assigns_increasing_seq() {
        let q = queue(clock());
        let a = q.enqueue(key("c1"), MutationKind::observe("a"), 0).unwrap();
        let b = q.enqueue(key("c2"), MutationKind::observe("b"), 0).unwrap();
        assert!(b.seq > a.seq);
        assert!(q.has_pending(&key("c1")));
        assert!(!q.has_pending(&key("c3")));
        assert_eq!(q.snapshot().len(), 2);
    }

    #[test]
    fn invalid_intent_is_never_queued() {
        let q = queue(clock());
        let err = q
            .enqueue(key("c1"), MutationKind::set_status("", CanonicalStatus::Late), 0)
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::Validation(_))));
        assert!(q.is_empty());
    }

    #[test]
    fn capacity_is_enforced() {
        let q = queue(clock());
        for i in 0..4 {
            q.enqueue(key("c1"), MutationKind::observe(format!("n{i}")), 0)
                .unwrap();
        }
        let err = q.enqueue(key("c1"), MutationKind::observe("x"), 0).unwrap_err();
        assert!(matches!(err, EngineError::QueueFull { capacity: 4 }));
    }

    #[tokio::test]
    async fn replay_applies_in_order_and_drains() {
        let q = queue(clock());
        let store = MemoryStore::new();
        q.enqueue(key("c1"), MutationKind::set_status("s1", CanonicalStatus::Late), 0)
            .unwrap();
        q.enqueue(key("c1"), MutationKind::set_status("s1", CanonicalStatus::Present), 0)
            .unwrap();

        let report = q.replay(&store).await;
        assert!(report.is_clean());
        assert_eq!(report.applied.len(), 2);
        assert!(report.applied.iter().all(|m| m.state == MutationState::Applied));
        assert!(q.is_empty());

        let stored = store.snapshot(&key("c1")).unwrap();
        assert_eq!(stored.present, vec!["s1".to_string()]);
        assert!(stored.late.is_empty());
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn transient_failure_backs_off_without_immediate_retry() {
        let clock = clock();
        let q = queue(clock.clone());
        let store = MemoryStore::new();
        store.fail_next(StoreOp::Put, StoreError::Transient("timeout".into()));
        q.enqueue(key("c1"), MutationKind::observe("hi"), 0).unwrap();

        let first = q.replay(&store).await;
        assert_eq!(first.deferred, 1);
        let queued = &q.pending_for(&key("c1"))[0];
        assert_eq!(queued.state, MutationState::Failed);
        assert_eq!(queued.attempts, 1);

        // Still inside the backoff window: no store call at all.
        let puts = store.put_calls();
        let second = q.replay(&store).await;
        assert_eq!(second.deferred, 1);
        assert_eq!(store.put_calls(), puts);

        clock.advance(TimeDelta::seconds(1));
        let third = q.replay(&store).await;
        assert!(third.is_clean());
        assert_eq!(third.applied.len(), 1);
    }

    #[tokio::test]
    async fn version_conflict_rebases_onto_newer_remote() {
        let q = queue(clock());
        let store = MemoryStore::new();
        q.enqueue(key("c1"), MutationKind::set_status("s1", CanonicalStatus::Present), 0)
            .unwrap();

        // Another device wrote in between the read and the write.
        store.fail_next(
            StoreOp::Put,
            StoreError::VersionConflict {
                key: key("c1").to_string(),
                expected: 0,
                found: 1,
            },
        );
        let mut theirs = Session::skeleton(key("c1"));
        theirs.absent.push("s2".into());
        theirs.version = 1;
        store.insert(theirs);

        let report = q.replay(&store).await;
        assert!(report.is_clean());
        let stored = store.snapshot(&key("c1")).unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.present, vec!["s1".to_string()]);
        assert_eq!(stored.absent, vec!["s2".to_string()]);
    }

    #[tokio::test]
    async fn endless_conflicts_become_transient() {
        let q = queue(clock());
        let store = MemoryStore::new();
        for _ in 0..3 {
            store.fail_next(
                StoreOp::Put,
                StoreError::VersionConflict {
                    key: key("c1").to_string(),
                    expected: 0,
                    found: 9,
                },
            );
        }
        q.enqueue(key("c1"), MutationKind::observe("x"), 0).unwrap();

        let report = q.replay(&store).await;
        assert_eq!(report.deferred, 1);
        assert!(report.failures.is_empty());
        assert_eq!(store.put_calls(), 3);
    }

    #[tokio::test]
    async fn remotely_deleted_session_surfaces_not_found() {
        let q = queue(clock());
        let store = MemoryStore::new();
        let m = q
            .enqueue(key("c1"), MutationKind::set_status("s1", CanonicalStatus::Absent), 3)
            .unwrap();

        let report = q.replay(&store).await;
        assert_eq!(report.failures.len(), 1);
        match &report.failures[0] {
            EngineError::PermanentFailure { mutation, reason } => {
                assert_eq!(mutation.id, m.id);
                assert_eq!(mutation.kind, m.kind);
                assert!(reason.contains("Not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(q.is_empty());
        assert_eq!(store.put_calls(), 0);
    }

    #[tokio::test]
    async fn roster_conflict_surfaces_only_the_bad_mutation() {
        let q = queue(clock());
        let store = MemoryStore::new();
        let mut remote = Session::skeleton(key("c1"));
        remote.roster = vec!["s1".into()];
        remote.version = 1;
        store.insert(remote);

        q.enqueue(key("c1"), MutationKind::set_status("ghost", CanonicalStatus::Present), 1)
            .unwrap();
        q.enqueue(key("c1"), MutationKind::set_status("s1", CanonicalStatus::Present), 1)
            .unwrap();

        let report = q.replay(&store).await;
        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(store.snapshot(&key("c1")).unwrap().present, vec!["s1".to_string()]);
    }

    #[tokio::test]
    async fn permanent_store_error_keeps_mutation_intact() {
        let q = queue(clock());
        let store = MemoryStore::new();
        store.fail_next(StoreOp::Put, StoreError::Permanent("rejected".into()));
        let m = q.enqueue(key("c1"), MutationKind::justify("s1", "ill"), 0).unwrap();

        let report = q.replay(&store).await;
        let EngineError::PermanentFailure { mutation, .. } = &report.failures[0] else {
            panic!("expected permanent failure");
        };
        assert_eq!(mutation.kind, m.kind);
        assert_eq!(mutation.state, MutationState::Failed);

        q.requeue(*mutation.clone()).unwrap();
        assert!(q.replay(&store).await.is_clean());
    }

    #[test]
    fn journal_roundtrip_restores_order_and_seq() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("queue.jsonl");

        let q = queue(clock());
        q.enqueue(key("c2"), MutationKind::observe("b"), 0).unwrap();
        q.enqueue(key("c1"), MutationKind::observe("a"), 0).unwrap();
        q.save_journal(&path).unwrap();

        let restored = queue(clock());
        assert_eq!(restored.load_journal(&path).unwrap(), 2);
        assert_eq!(restored.snapshot(), q.snapshot());
        // Loading twice does not duplicate.
        assert_eq!(restored.load_journal(&path).unwrap(), 0);

        let next = restored.enqueue(key("c1"), MutationKind::observe("c"), 0).unwrap();
        assert_eq!(next.seq, 3);
    }

    #[test]
    fn open_persists_through_configured_journal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");
        let cfg = QueueConfig {
            journal_path: path.display().to_string(),
            ..config()
        };

        let first = MutationQueue::open(&cfg, clock(), Arc::new(KeyedLocks::new())).unwrap();
        first.enqueue(key("c1"), MutationKind::observe("keep me"), 0).unwrap();

        let second = MutationQueue::open(&cfg, clock(), Arc::new(KeyedLocks::new())).unwrap();
        assert_eq!(second.len(), 1);
        assert!(second.has_pending(&key("c1")));
    }

    #[test]
    fn missing_journal_restores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let q = queue(clock());
        assert_eq!(q.load_journal(&dir.path().join("absent.jsonl")).unwrap(), 0);
    }
}
