//! Document reconciliation.
//!
//! Folds pending mutations, in arrival order, onto the last known remote
//! session (or an empty skeleton). The remote copy is never modified: when no
//! mutation changes anything the input is handed back borrowed.

use std::borrow::Cow;

use tempo_core::CoreError;
use tempo_core::entities::{Justification, MutationKind, PendingMutation, Session, SessionKey};
use tempo_core::enums::CanonicalStatus;

/// Apply `mutations` for `remote.key` on top of `remote`.
///
/// Mutations for other sessions are ignored. All-or-nothing: on error no
/// partial result escapes.
///
/// # Errors
///
/// Returns `CoreError::Conflict` if a mutation names a student outside a
/// non-empty roster.
pub fn reconcile<'a>(
    remote: &'a Session,
    mutations: &[PendingMutation],
) -> Result<Cow<'a, Session>, CoreError> {
    let mut working: Option<Session> = None;
    for m in mutations.iter().filter(|m| m.key == remote.key) {
        let session = working.get_or_insert_with(|| remote.clone());
        apply_mutation(session, m)?;
    }
    Ok(finish(remote, working))
}

/// Like [`reconcile`], starting from an empty skeleton when the remote
/// document does not exist.
///
/// # Errors
///
/// Returns `CoreError::Conflict` if a mutation cannot be applied.
pub fn reconcile_or_skeleton(
    remote: Option<Session>,
    key: &SessionKey,
    mutations: &[PendingMutation],
) -> Result<Session, CoreError> {
    let base = remote.unwrap_or_else(|| Session::skeleton(key.clone()));
    Ok(reconcile(&base, mutations)?.into_owned())
}

/// The view shown to the user while writes are in flight.
///
/// Unlike [`reconcile`], a mutation that conflicts is skipped rather than
/// failing the whole view; replay reports it separately.
#[must_use]
pub fn optimistic_view<'a>(remote: &'a Session, mutations: &[PendingMutation]) -> Cow<'a, Session> {
    let mut working: Option<Session> = None;
    for m in mutations.iter().filter(|m| m.key == remote.key) {
        let session = working.get_or_insert_with(|| remote.clone());
        if let Err(error) = apply_mutation(session, m) {
            tracing::debug!(mutation = %m.id, %error, "skipping mutation in optimistic view");
        }
    }
    finish(remote, working)
}

fn finish(remote: &Session, working: Option<Session>) -> Cow<'_, Session> {
    match working {
        Some(session) if session != *remote => Cow::Owned(session),
        _ => Cow::Borrowed(remote),
    }
}

/// Apply a single mutation in place. Returns whether the session changed.
///
/// On error the session is left untouched.
///
/// # Errors
///
/// Returns `CoreError::Conflict` if the mutation names a student outside a
/// non-empty roster.
pub fn apply_mutation(session: &mut Session, m: &PendingMutation) -> Result<bool, CoreError> {
    if let Some(student) = m.kind.student_id() {
        if !session.admits(student) {
            return Err(CoreError::Conflict {
                key: session.key.to_string(),
                reason: format!("student {student} is not on the roster ({})", m.id),
            });
        }
    }

    let before = session.clone();
    match &m.kind {
        MutationKind::SetStatus { student_id, status } => {
            set_status(session, student_id, *status, m);
        }
        MutationKind::AddOrUpdateJustification {
            student_id,
            reason,
            attachment_ref,
            approved,
        } => {
            upsert_justification(
                session,
                Justification {
                    student_id: student_id.clone(),
                    reason: reason.clone(),
                    attachment_ref: attachment_ref.clone(),
                    approved: *approved,
                    timestamp: Some(m.created_at),
                },
            );
        }
        MutationKind::UpdateObservations { text } => {
            session.observations.update(text, m.created_at);
        }
    }

    let changed = *session != before;
    if changed {
        session.updated_at = Some(m.created_at);
    }
    Ok(changed)
}

fn remove_from_lists(session: &mut Session, student_id: &str) {
    for list in [&mut session.present, &mut session.absent, &mut session.late] {
        list.retain(|s| s != student_id);
    }
}

fn set_status(session: &mut Session, student_id: &str, status: CanonicalStatus, m: &PendingMutation) {
    remove_from_lists(session, student_id);
    let list = match status {
        CanonicalStatus::Present => &mut session.present,
        CanonicalStatus::Absent => &mut session.absent,
        // Justified students keep the legacy categorical shape: stored as
        // late, marked by an approved justification.
        CanonicalStatus::Late | CanonicalStatus::Justified => &mut session.late,
    };
    list.push(student_id.to_string());

    if status == CanonicalStatus::Justified {
        match session
            .justifications
            .iter_mut()
            .find(|j| j.student_id == student_id)
        {
            Some(existing) => existing.approved = true,
            None => session.justifications.push(Justification {
                student_id: student_id.to_string(),
                reason: String::new(),
                attachment_ref: None,
                approved: true,
                timestamp: Some(m.created_at),
            }),
        }
    } else {
        // An explicit status replaces any earlier excuse.
        session.justifications.retain(|j| j.student_id != student_id);
    }
}

fn upsert_justification(session: &mut Session, incoming: Justification) {
    let student_id = incoming.student_id.clone();
    let approved = incoming.approved;

    match session
        .justifications
        .iter_mut()
        .find(|j| j.student_id == student_id)
    {
        Some(existing) => {
            existing.reason = incoming.reason;
            if incoming.attachment_ref.is_some() {
                existing.attachment_ref = incoming.attachment_ref;
            }
            existing.approved = incoming.approved;
            existing.timestamp = incoming.timestamp;
        }
        None => session.justifications.push(incoming),
    }

    // A justified student must sit in late or absent, never in present.
    if approved {
        let in_late = session.late.iter().any(|s| *s == student_id);
        let in_absent = session.absent.iter().any(|s| *s == student_id);
        if !in_late && !in_absent {
            session.present.retain(|s| *s != student_id);
            session.late.push(student_id);
        }
    }
}
