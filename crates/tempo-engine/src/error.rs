//! Error types for tempo-engine.

use thiserror::Error;

use tempo_core::CoreError;
use tempo_core::entities::PendingMutation;

/// Errors reported by a `DocumentStore` or `ClassCatalog` implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Network, timeout, or contention failure. Safe to retry later.
    #[error("Transient store error: {0}")]
    Transient(String),

    /// The store rejected the request and will keep rejecting it.
    #[error("Permanent store error: {0}")]
    Permanent(String),

    /// The stored document moved on since it was read.
    #[error("Version conflict on {key}: expected {expected}, found {found}")]
    VersionConflict {
        key: String,
        expected: u64,
        found: u64,
    },
}

impl StoreError {
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Errors surfaced by the engine to the surrounding application.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The offline queue cannot take another mutation.
    #[error("Offline queue is full ({capacity} mutations)")]
    QueueFull { capacity: usize },

    /// A write failed irrecoverably. The mutation is returned intact so the
    /// caller can offer retry or discard.
    #[error("Mutation {} on {} failed permanently: {reason}", .mutation.id, .mutation.key)]
    PermanentFailure {
        mutation: Box<PendingMutation>,
        reason: String,
    },

    /// Reading or writing the queue journal failed.
    #[error("Queue journal error: {0}")]
    Journal(String),
}
