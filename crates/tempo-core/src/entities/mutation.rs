use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::SessionKey;
use crate::enums::{CanonicalStatus, MutationState};
use crate::errors::CoreError;
use crate::ids::{PREFIX_MUTATION, format_id};

const fn default_approved() -> bool {
    true
}

/// A user intent against one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MutationKind {
    SetStatus {
        student_id: String,
        status: CanonicalStatus,
    },
    AddOrUpdateJustification {
        student_id: String,
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attachment_ref: Option<String>,
        /// Justifications recorded by the teacher are approved unless stated.
        #[serde(default = "default_approved")]
        approved: bool,
    },
    UpdateObservations {
        text: String,
    },
}

impl MutationKind {
    pub fn set_status(student_id: impl Into<String>, status: CanonicalStatus) -> Self {
        Self::SetStatus {
            student_id: student_id.into(),
            status,
        }
    }

    pub fn justify(student_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AddOrUpdateJustification {
            student_id: student_id.into(),
            reason: reason.into(),
            attachment_ref: None,
            approved: true,
        }
    }

    pub fn observe(text: impl Into<String>) -> Self {
        Self::UpdateObservations { text: text.into() }
    }

    #[must_use]
    pub fn student_id(&self) -> Option<&str> {
        match self {
            Self::SetStatus { student_id, .. }
            | Self::AddOrUpdateJustification { student_id, .. } => Some(student_id.as_str()),
            Self::UpdateObservations { .. } => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SetStatus { .. } => "set_status",
            Self::AddOrUpdateJustification { .. } => "justification",
            Self::UpdateObservations { .. } => "observations",
        }
    }

    /// Reject intents that can never apply, before they reach the queue.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for blank student IDs or blank
    /// observation text.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::SetStatus { student_id, .. }
            | Self::AddOrUpdateJustification { student_id, .. }
                if student_id.trim().is_empty() =>
            {
                Err(CoreError::validation(format!(
                    "{}: student id must not be empty",
                    self.label()
                )))
            }
            Self::UpdateObservations { text } if text.trim().is_empty() => Err(
                CoreError::validation("observations: text must not be empty"),
            ),
            _ => Ok(()),
        }
    }
}

/// A not-yet-committed intent, queued for replay against the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMutation {
    pub id: String,
    pub key: SessionKey,
    pub kind: MutationKind,
    /// Logical timestamp; strictly increasing in enqueue order.
    pub seq: u64,
    pub created_at: DateTime<Utc>,
    /// Version of the session the user was looking at when acting.
    #[serde(default)]
    pub base_version: u64,
    pub state: MutationState,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_attempt_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl PendingMutation {
    #[must_use]
    pub fn new(
        key: SessionKey,
        kind: MutationKind,
        seq: u64,
        created_at: DateTime<Utc>,
        base_version: u64,
    ) -> Self {
        Self {
            id: format_id(PREFIX_MUTATION, seq),
            key,
            kind,
            seq,
            created_at,
            base_version,
            state: MutationState::Pending,
            attempts: 0,
            next_attempt_at: None,
            last_error: None,
        }
    }

    /// Move to `next`, enforcing the replay state machine.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` if the move is not allowed.
    pub fn transition(&mut self, next: MutationState) -> Result<(), CoreError> {
        if !self.state.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                entity_type: "mutation".to_string(),
                id: self.id.clone(),
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }
}
