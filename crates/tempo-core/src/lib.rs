//! # tempo-core
//!
//! Core types, date handling, and error types for Tempo.
//!
//! This crate provides the foundational types shared across all Tempo crates:
//! - Session documents and their identity (`SessionKey`)
//! - Canonical attendance status and mutation state machines
//! - Boundary normalization of legacy document shapes (justification maps,
//!   single-string observations, compact dates)
//! - Scheduled class catalog entries with collaborator permissions
//! - Cross-cutting error types

pub mod dates;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;

pub use errors::CoreError;
