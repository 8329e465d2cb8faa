//! Entity structs for Tempo attendance documents.
//!
//! Wire shapes are camelCase JSON documents as stored by the remote document
//! store. Legacy shapes (justification maps, single-string observations,
//! compact dates, stray non-string IDs) are normalized here, on read, so no
//! code further down the pipeline branches on shape.

mod class;
mod justification;
mod mutation;
mod session;

pub use class::{
    CollaboratorEntry, CollaboratorGrant, CollaboratorPermissions, ScheduleSlot, ScheduledClass,
};
pub use justification::{Justification, normalize_justifications};
pub use mutation::{MutationKind, PendingMutation};
pub use session::{ObservationEntry, Observations, Session, SessionDocument, SessionKey};
