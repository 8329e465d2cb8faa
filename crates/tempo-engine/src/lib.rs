//! # tempo-engine
//!
//! Attendance reconciliation for Tempo.
//!
//! Pure pieces: [`resolver`] (canonical status per student), [`reconciler`]
//! (pending mutations folded onto a session), [`schedule`] (a teacher's
//! classes for a day), and [`aggregate`] (date-range reports).
//!
//! Stateful pieces, all constructed explicitly: [`cache::TtlCache`],
//! [`queue::MutationQueue`], [`locks::KeyedLocks`], [`guard::QueryGuard`], and
//! the [`service::AttendanceService`] that wires them around a
//! [`store::DocumentStore`].

pub mod aggregate;
pub mod cache;
pub mod clock;
pub mod error;
pub mod guard;
pub mod locks;
pub mod queue;
pub mod reconciler;
pub mod resolver;
pub mod retry;
pub mod schedule;
pub mod service;
pub mod store;

pub use aggregate::{AttendancePolicy, AttendanceReport, DateRange, aggregate};
pub use error::{EngineError, StoreError};
pub use reconciler::reconcile;
pub use resolver::resolve;
pub use schedule::classes_for_day;
pub use service::{AttendanceService, RecordOutcome};
