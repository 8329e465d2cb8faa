//! Cross-cutting error types for Tempo.
//!
//! This module defines errors that can originate from any crate in the system.
//! Storage errors (`StoreError`) live in `tempo-engine` next to the store
//! traits, and `DatabaseError` in `tempo-db`.

use thiserror::Error;

/// Errors that can be raised by any Tempo crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed input (dates, identifiers, document shape). Never queued.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A session or class lookup returned no result where one was required.
    #[error("Not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// A mutation cannot be reconciled against the current session state.
    #[error("Conflict on {key}: {reason}")]
    Conflict { key: String, reason: String },

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
