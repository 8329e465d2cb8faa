//! Repository methods on [`TempoDb`](crate::TempoDb), one module per table.

pub mod classes;
pub mod sessions;
